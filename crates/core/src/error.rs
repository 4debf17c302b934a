//! Error types for the event log
//!
//! Two caller-facing families:
//! - [`ValidationError`]: a candidate record broke the data-model contract
//! - [`InvalidFilterError`]: a scan predicate is malformed
//!
//! An unknown ticket is never an error. Reads for it return an empty result.

use crate::event::{EventKey, Timestamp};
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A candidate record was rejected at ingestion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A mandatory attribute is absent or blank
    #[error("missing mandatory field: {field}")]
    MissingField {
        /// Name of the absent field
        field: &'static str,
    },

    /// `duration_sec` is present and below zero
    #[error("negative duration for {key}: {duration_sec}s")]
    NegativeDuration {
        /// Key of the rejected record
        key: EventKey,
        /// The offending value
        duration_sec: i64,
    },

    /// `(ticket_id, event_order)` is already stored
    #[error("duplicate event key {key}")]
    DuplicateKey {
        /// The colliding key
        key: EventKey,
    },

    /// The record's timestamp disagrees with a neighbouring event's ordering
    #[error(
        "ordering violation: {key} at {timestamp} conflicts with order {neighbor} at {neighbor_timestamp}"
    )]
    OrderingViolation {
        /// Key of the rejected record
        key: EventKey,
        /// Timestamp of the rejected record
        timestamp: Timestamp,
        /// `event_order` of the stored neighbour it conflicts with
        neighbor: i64,
        /// Timestamp of that neighbour
        neighbor_timestamp: Timestamp,
    },
}

impl ValidationError {
    /// Key of the rejected record, if it had one
    pub fn key(&self) -> Option<&EventKey> {
        match self {
            ValidationError::MissingField { .. } => None,
            ValidationError::NegativeDuration { key, .. }
            | ValidationError::DuplicateKey { key }
            | ValidationError::OrderingViolation { key, .. } => Some(key),
        }
    }
}

/// A scan predicate is malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFilterError {
    /// An exact-match criterion was given an empty value
    #[error("empty value for filter field '{field}'")]
    EmptyValue {
        /// Filter field name
        field: &'static str,
    },

    /// `from` is not strictly before `until`
    #[error("empty time range: from {from} is not before until {until}")]
    EmptyTimeRange {
        /// Inclusive lower bound
        from: Timestamp,
        /// Exclusive upper bound
        until: Timestamp,
    },

    /// A duration bound is below zero
    #[error("negative duration bound '{field}': {value}")]
    NegativeDurationBound {
        /// Which bound
        field: &'static str,
        /// The offending value
        value: i64,
    },

    /// `min_duration_sec` exceeds `max_duration_sec`
    #[error("inverted duration range: min {min} > max {max}")]
    InvertedDurationRange {
        /// Lower bound
        min: i64,
        /// Upper bound
        max: i64,
    },

    /// Two criteria that no event can satisfy together
    #[error("filter criteria '{0}' and '{1}' exclude each other")]
    Conflicting(&'static str, &'static str),

    /// Textual filter names a field that does not exist
    #[error("unknown filter key '{0}'")]
    UnknownKey(String),

    /// Textual filter clause is not `key=value`
    #[error("malformed filter clause '{0}'")]
    MalformedClause(String),

    /// Textual filter value cannot be parsed for its field
    #[error("invalid value '{value}' for filter key '{key}'")]
    InvalidValue {
        /// Filter key
        key: String,
        /// Raw value
        value: String,
    },
}

/// Error type for the event log crates
#[derive(Debug, Error)]
pub enum Error {
    /// Record rejected by the data-model contract
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed scan predicate
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] InvalidFilterError),

    /// Backing storage failed
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persisted data failed an integrity check
    #[error("corruption: {0}")]
    Corruption(String),
}

impl Error {
    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a filter failure
    pub fn is_invalid_filter(&self) -> bool {
        matches!(self, Error::InvalidFilter(_))
    }

    /// The validation error, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(e) => Some(e),
            _ => None,
        }
    }
}
