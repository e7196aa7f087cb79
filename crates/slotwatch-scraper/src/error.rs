use thiserror::Error;

/// Failures of the anonymized transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("identity rotation failed: {0}")]
    IdentityRotation(String),
}

impl TransportError {
    /// Classifies a `reqwest` failure for `url`, splitting timeouts out so
    /// callers can log them distinctly.
    pub(crate) fn from_request(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            TransportError::Timeout {
                url: url.to_owned(),
            }
        } else {
            TransportError::Network {
                url: url.to_owned(),
                source,
            }
        }
    }
}

/// The calendar page did not have the expected structure.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no calendar widget found on {url}")]
    MissingCalendar { url: String },

    #[error("unparsable day \"{text}\" on {url}")]
    UnparsableDay { url: String, text: String },

    #[error("day {day} does not exist in {year}-{month:02} ({url})")]
    InvalidDay {
        url: String,
        year: i32,
        month: u32,
        day: u32,
    },
}
