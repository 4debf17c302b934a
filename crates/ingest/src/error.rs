//! Ingestion errors

use thiserror::Error;

/// Result type for ingestion
pub type Result<T> = std::result::Result<T, IngestError>;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reading or writing the stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not a JSON object of the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV row does not fit the expected columns
    #[error("CSV error: {0}")]
    Csv(csv::Error),

    /// A timestamp matches none of the accepted formats
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// An integer column holds something that is not a whole number
    #[error("invalid integer for '{field}': {value}")]
    InvalidInteger {
        /// Column name
        field: &'static str,
        /// Raw value
        value: String,
    },

    /// The store refused the record
    #[error(transparent)]
    Rejected(#[from] ticketlog_core::Error),
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        if e.is_io_error() {
            IngestError::Io(e.into())
        } else {
            IngestError::Csv(e)
        }
    }
}

impl IngestError {
    /// Whether the record parsed but failed validation
    pub fn is_validation(&self) -> bool {
        matches!(self, IngestError::Rejected(e) if e.is_validation())
    }
}
