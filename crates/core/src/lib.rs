//! Core types for TicketLog
//!
//! This crate defines the event-log data model and its integrity contract:
//! - [`Event`]: one accepted, immutable activity occurrence for a ticket
//! - [`NewEvent`]: a candidate record as it arrives from a log source
//! - [`EventKey`]: the logical key `(ticket_id, event_order)`
//! - [`EventFilter`]: conjunctive predicate used by scans
//! - [`OrderingPolicy`]: how timestamp/order disagreements are resolved
//! - [`ValidationError`], [`InvalidFilterError`], [`Error`]: error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod filter;
pub mod policy;
pub mod validate;

pub use error::{Error, InvalidFilterError, Result, ValidationError};
pub use event::{Event, EventKey, NewEvent, Timestamp};
pub use filter::EventFilter;
pub use policy::OrderingPolicy;
pub use validate::{check_neighbors, validate};
