use thiserror::Error;

/// Errors that can occur while notifying the operator.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// The result log could not durably record a slot.
#[derive(Debug, Error)]
pub enum LogWriteError {
    #[error("failed to write result log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode result record: {0}")]
    Encode(#[from] serde_json::Error),
}
