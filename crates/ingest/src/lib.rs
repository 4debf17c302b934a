//! Log ingestion for TicketLog
//!
//! Turns raw ticket-system exports into validated store appends:
//! - [`RawRecord`]: one input row, column aliases and lenient scalars
//! - [`normalize`]: sort by case and time, derive `event_order` / `duration_sec`
//! - [`import_jsonl`] / [`import_csv`]: read JSON Lines or CSV into a store,
//!   collecting per-line failures in an [`ImportReport`]
//! - [`write_jsonl`] / [`write_csv`]: export events with the persisted field names

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delimited;
pub mod error;
pub mod jsonl;
pub mod normalize;
pub mod raw;
pub mod report;

pub use delimited::{import_csv, parse_csv, write_csv};
pub use error::{IngestError, Result};
pub use jsonl::{import_jsonl, parse_jsonl, write_jsonl};
pub use normalize::{normalize, NormalizeOptions};
pub use raw::{parse_timestamp, IntLike, RawRecord, TextLike};
pub use report::{ImportReport, LineError};
