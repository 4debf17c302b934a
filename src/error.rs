//! Unified error types for TicketLog.
//!
//! This module provides a clean error type that wraps the errors of the
//! member crates and presents a consistent interface to users.

use thiserror::Error;
use ticketlog_core::{InvalidFilterError, ValidationError};
use ticketlog_durability::RecoveryError;
use ticketlog_ingest::IngestError;

/// All TicketLog errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A record was rejected by the data-model contract
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A scan predicate is malformed
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] InvalidFilterError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error (WAL write, corrupt file)
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The WAL could not be replayed on open
    #[error("recovery failed: {0}")]
    Recovery(#[from] RecoveryError),

    /// The log was closed; no further appends are accepted
    #[error("ticket log is closed")]
    Closed,
}

/// Result type for TicketLog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if a record was rejected by validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if a scan filter was malformed.
    pub fn is_invalid_filter(&self) -> bool {
        matches!(self, Error::InvalidFilter(_))
    }

    /// Check if the log was already closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }

    /// The validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}

// Convert from internal core errors
impl From<ticketlog_core::Error> for Error {
    fn from(e: ticketlog_core::Error) -> Self {
        use ticketlog_core::Error as CoreError;
        match e {
            CoreError::Validation(v) => Error::Validation(v),
            CoreError::InvalidFilter(f) => Error::InvalidFilter(f),
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Storage(msg) => Error::Storage(msg),
            CoreError::Corruption(msg) => Error::Storage(format!("corruption: {}", msg)),
        }
    }
}

impl From<IngestError> for Error {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Io(io_err) => Error::Io(io_err),
            IngestError::Json(err) => Error::Serialization(err.to_string()),
            IngestError::Rejected(core) => core.into(),
            other => Error::Serialization(other.to_string()),
        }
    }
}
