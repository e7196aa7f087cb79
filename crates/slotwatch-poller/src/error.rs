use slotwatch_scraper::{ExtractionError, TransportError};
use thiserror::Error;

/// Why one attempt of a target's pipeline failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Returns `true` if retrying the whole pipeline may succeed.
    ///
    /// Retriable:
    /// - [`PipelineError::HttpStatus`]: the origin answered with anything but 200.
    /// - [`TransportError::Network`] and [`TransportError::Timeout`].
    ///
    /// Not retriable:
    /// - [`TransportError::IdentityRotation`]: fetching without a fresh
    ///   identity is never acceptable.
    /// - [`PipelineError::Extraction`]: the same page would fail the same way.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            PipelineError::HttpStatus { .. }
            | PipelineError::Transport(TransportError::Network { .. } | TransportError::Timeout { .. }) => {
                true
            }
            PipelineError::Transport(
                TransportError::IdentityRotation(_) | TransportError::ClientBuild(_),
            )
            | PipelineError::Extraction(_)
            | PipelineError::RetriesExhausted { .. } => false,
        }
    }

    #[must_use]
    pub fn is_identity_rotation(&self) -> bool {
        matches!(
            self,
            PipelineError::Transport(TransportError::IdentityRotation(_))
        )
    }
}

/// Conditions that stop the scheduler and the process.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("anonymizing transport is broken: {consecutive} consecutive identity rotations failed")]
    TransportBroken { consecutive: u32 },

    #[error("result log is broken: {consecutive} consecutive writes failed")]
    ResultLogBroken { consecutive: u32 },
}
