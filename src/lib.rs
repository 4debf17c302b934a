//! # TicketLog
//!
//! Validated event log for process mining over ticket systems.
//!
//! Every event belongs to a case (a ticket) and carries its activity,
//! timestamp and position within the case. The log accepts events only if
//! they keep each case's trace consistent, then serves traces and filtered
//! scans to mining code.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ticketlog::prelude::*;
//!
//! let log = TicketLog::open("./incidents")?;
//!
//! log.append(NewEvent::new("INC-7", "Open", ts, 1).queue_name("Q01"))?;
//! log.append(NewEvent::new("INC-7", "Resolve", ts2, 2).queue_name("Q01"))?;
//!
//! // One case, ordered by event_order
//! let trace = log.get_trace("INC-7");
//!
//! // All events of one queue, case by case
//! let scan = log.scan(Some(EventFilter::all().queue_name("Q01")))?;
//! for event in &scan {
//!     println!("{} {}", event.ticket_id, event.activity);
//! }
//! ```
//!
//! ## Crates
//!
//! - `ticketlog-core`: data model, validation, filters, errors
//! - `ticketlog-storage`: the in-memory store and its read views
//! - `ticketlog-durability`: write-ahead log and recovery
//! - `ticketlog-ingest`: CSV / JSON Lines import and export, normalization

#![warn(missing_docs)]

mod database;
mod error;

pub mod prelude;

// Re-export main entry points
pub use database::{TicketLog, TicketLogBuilder};
pub use error::{Error, Result};

// Re-export member crate types
pub use ticketlog_core::{
    Event, EventFilter, EventKey, InvalidFilterError, NewEvent, OrderingPolicy, Timestamp,
    ValidationError,
};
pub use ticketlog_durability::{DurabilityMode, RecoveryOptions, RecoveryResult};
pub use ticketlog_ingest::{ImportReport, LineError, NormalizeOptions};
pub use ticketlog_storage::{EventLogStore, EventSink, Scan, StoreSnapshot, Trace};
