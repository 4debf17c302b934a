//! Convenient imports for TicketLog.
//!
//! ```ignore
//! use ticketlog::prelude::*;
//!
//! let log = TicketLog::ephemeral();
//! ```

// Main entry point
pub use crate::database::{TicketLog, TicketLogBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Data model
pub use ticketlog_core::{Event, EventFilter, EventKey, NewEvent, OrderingPolicy, Timestamp};

// Read views
pub use ticketlog_storage::{Scan, Trace};

// Configuration
pub use ticketlog_durability::{DurabilityMode, RecoveryOptions};
pub use ticketlog_ingest::NormalizeOptions;
