/// Error types for the report engine.
///
/// Only structural problems are errors. Missing or malformed *values* are
/// coerced (usually to zero) and never reach this type.

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Malformed record at position {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Column '{0}' not found in layout")]
    UnknownColumn(String),

    #[error("Record source error: {0}")]
    Source(String),
}

impl ReportError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        ReportError::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
