//! Storage layer for TicketLog
//!
//! This crate implements the validated event log store:
//! - EventLogStore: per-ticket index of `Arc<Vec<Event>>` sorted by `event_order`
//! - Single writer (Mutex) / many readers (RwLock held only to swap Arcs)
//! - StoreSnapshot: consistent point-in-time view for readers
//! - Trace / Scan: immutable, restartable read views
//! - EventSink: hook for durable backing, called before a record is published

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sink;
pub mod snapshot;
pub mod store;
pub mod trace;

pub use sink::EventSink;
pub use snapshot::{Scan, ScanIter, StoreSnapshot};
pub use store::EventLogStore;
pub use trace::Trace;
