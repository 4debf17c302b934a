//! TicketLog Integration Test Suite
//!
//! Exercises the public `TicketLog` facade end to end: appends and
//! validation, trace/scan/case_ids reads, concurrency, WAL durability and
//! recovery, and CSV / JSON Lines ingestion.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test eventlog
//!
//! # Run durability tests only
//! cargo test --test eventlog durability::
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use chrono::{Duration, TimeZone, Utc};
pub use ticketlog::prelude::*;
pub use ticketlog::{ValidationError, InvalidFilterError};

// Test modules
pub mod basic_ops;
pub mod durability;
pub mod edge_cases;
pub mod properties;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Route `tracing` output to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Fixed reference time for all tests
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// `t0` plus `minutes`
pub fn at(minutes: i64) -> Timestamp {
    t0() + Duration::minutes(minutes)
}

/// Candidate with the mandatory fields and a queue
pub fn ev(ticket: &str, activity: &str, minute: i64, order: i64) -> NewEvent {
    NewEvent::new(ticket, activity, at(minute), order).queue_name("Q01")
}

/// Ticket ids and event orders of a trace, as `"T#n"` strings
pub fn keys(events: impl IntoIterator<Item = Event>) -> Vec<String> {
    events.into_iter().map(|e| e.key().to_string()).collect()
}

/// A disk-backed log in its own temp directory that can be reopened
pub struct TestLog {
    dir: TempDir,
    builder: fn(&Path) -> TicketLogBuilder,
    log: Option<TicketLog>,
}

impl TestLog {
    fn with(builder: fn(&Path) -> TicketLogBuilder) -> Self {
        init_tracing();
        let dir = TempDir::new().expect("Failed to create temp dir");
        let log = builder(dir.path()).open().expect("Failed to open log");
        Self {
            dir,
            builder,
            log: Some(log),
        }
    }

    /// fsync on every append
    pub fn new_strict() -> Self {
        Self::with(|p| TicketLog::builder().path(p).strict())
    }

    /// Default batched fsync
    pub fn new_buffered() -> Self {
        Self::with(|p| TicketLog::builder().path(p).buffered())
    }

    /// Files in a directory, but no WAL
    pub fn new_no_durability() -> Self {
        Self::with(|p| TicketLog::builder().path(p).no_durability())
    }

    /// The open log
    pub fn log(&self) -> &TicketLog {
        self.log.as_ref().expect("log is open")
    }

    /// Drop the log without closing it and open the directory again
    pub fn reopen(&mut self) {
        self.log = None;
        self.log = Some(
            (self.builder)(self.dir.path())
                .open()
                .expect("Failed to reopen log"),
        );
    }

    /// Reopen with explicit recovery options
    pub fn reopen_with(&mut self, options: RecoveryOptions) -> ticketlog::Result<()> {
        self.log = None;
        self.log = Some((self.builder)(self.dir.path()).recovery_options(options).open()?);
        Ok(())
    }

    /// Data directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// WAL file path
    pub fn wal_path(&self) -> PathBuf {
        RecoveryOptions::default().wal_path(self.dir.path())
    }

    /// Drop the open log, leaving only the files
    pub fn shutdown(&mut self) {
        self.log = None;
    }
}
