//! Main entry point for TicketLog.
//!
//! This module provides the `TicketLog` struct: a validated, per-ticket event
//! log backed by an optional write-ahead log.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use ticketlog_core::{Event, EventFilter, EventKey, NewEvent, OrderingPolicy};
use ticketlog_durability::{DurabilityMode, Recovery, RecoveryOptions, RecoveryResult, Wal};
use ticketlog_ingest::{ImportReport, NormalizeOptions};
use ticketlog_storage::{EventLogStore, Scan, StoreSnapshot, Trace};
use tracing::{debug, info};

/// The ticket event log.
///
/// Create one with [`TicketLog::open`], [`TicketLog::ephemeral`] or
/// [`TicketLog::builder`].
///
/// # Example
///
/// ```ignore
/// use ticketlog::prelude::*;
///
/// let log = TicketLog::open("./incidents")?;
/// log.append(NewEvent::new("INC-1", "Open", Utc::now(), 1).queue_name("Q01"))?;
///
/// for event in log.get_trace("INC-1").iter() {
///     println!("{} {}", event.event_order, event.activity);
/// }
///
/// log.close()?;
/// ```
pub struct TicketLog {
    store: EventLogStore,
    wal: Option<Arc<Wal>>,
    data_dir: Option<PathBuf>,
    mode: DurabilityMode,
    recovery: Option<RecoveryResult>,
    /// `true` once closed; appends hold the read side for their duration
    closed: RwLock<bool>,
    /// Set for [`TicketLog::open_temp`]; removed after the WAL is dropped
    temp_dir: Option<TempDir>,
}

impl TicketLog {
    /// Open a ticket log at the given directory.
    ///
    /// Uses default settings (buffered durability, `OrderingPolicy::Reject`).
    /// An existing WAL in the directory is replayed first.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an ephemeral log with no disk I/O.
    ///
    /// | Method | Disk Files | Recovery |
    /// |--------|------------|----------|
    /// | `TicketLog::ephemeral()` | None | No |
    /// | `TicketLog::open_temp()` | Temp dir | Yes |
    /// | `TicketLog::open(path)` | User dir | Yes |
    pub fn ephemeral() -> Self {
        Self {
            store: EventLogStore::new(),
            wal: None,
            data_dir: None,
            mode: DurabilityMode::None,
            recovery: None,
            closed: RwLock::new(false),
            temp_dir: None,
        }
    }

    /// Open a durable log in a fresh temporary directory.
    ///
    /// The directory is deleted when the log is dropped.
    pub fn open_temp() -> Result<Self> {
        Self::builder().open_temp()
    }

    /// Create a builder for log configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let log = TicketLog::builder()
    ///     .path("./incidents")
    ///     .strict()
    ///     .ordering_policy(OrderingPolicy::TrustOrder)
    ///     .open()?;
    /// ```
    pub fn builder() -> TicketLogBuilder {
        TicketLogBuilder::new()
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Validate and add one event.
    ///
    /// # Errors
    ///
    /// - `Validation`: missing field, negative duration, duplicate key, or
    ///   ordering violation under `OrderingPolicy::Reject`
    /// - `Io` / `Storage`: the WAL write failed; nothing was stored
    /// - `Closed`: [`TicketLog::close`] was called
    pub fn append(&self, candidate: NewEvent) -> Result<Event> {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::Closed);
        }
        self.store.append(candidate).map_err(Error::from)
    }

    /// Append records one by one; each result stands on its own.
    pub fn append_batch<I>(&self, candidates: I) -> Result<Vec<Result<Event>>>
    where
        I: IntoIterator<Item = NewEvent>,
    {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::Closed);
        }
        Ok(self
            .store
            .append_batch(candidates)
            .into_iter()
            .map(|r| r.map_err(Error::from))
            .collect())
    }

    /// Import a JSON Lines file.
    ///
    /// Bad lines are reported, not fatal. With `normalize` set, the file's
    /// records are sorted per case and get derived `event_order` /
    /// `duration_sec` before they are appended.
    pub fn import_jsonl(
        &self,
        path: impl AsRef<Path>,
        normalize: Option<&NormalizeOptions>,
    ) -> Result<ImportReport> {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::Closed);
        }
        let path = path.as_ref();
        debug!(path = %path.display(), "Importing JSON Lines");
        let reader = BufReader::new(File::open(path)?);
        Ok(ticketlog_ingest::import_jsonl(reader, &self.store, normalize)?)
    }

    /// Import a CSV file with a header row.
    ///
    /// Same rules as [`TicketLog::import_jsonl`]; line numbers in the report
    /// count the header as line 1.
    pub fn import_csv(
        &self,
        path: impl AsRef<Path>,
        normalize: Option<&NormalizeOptions>,
    ) -> Result<ImportReport> {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::Closed);
        }
        let path = path.as_ref();
        debug!(path = %path.display(), "Importing CSV");
        let reader = BufReader::new(File::open(path)?);
        Ok(ticketlog_ingest::import_csv(reader, &self.store, normalize)?)
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Events of one ticket in ascending `event_order`.
    ///
    /// An unknown ticket yields an empty trace, not an error.
    pub fn get_trace(&self, ticket_id: &str) -> Trace {
        self.store.get_trace(ticket_id)
    }

    /// Events matching `filter` (all events for `None`).
    ///
    /// Cases come in first-seen order, events within a case in
    /// `event_order`. The scan is lazy and may be iterated repeatedly.
    pub fn scan(&self, filter: Option<EventFilter>) -> Result<Scan> {
        Ok(self.store.scan(filter)?)
    }

    /// Distinct ticket ids in first-seen order.
    pub fn case_ids(&self) -> Vec<String> {
        self.store.case_ids()
    }

    /// Consistent point-in-time view for multi-step reads.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Whether an event with this key is stored.
    pub fn contains(&self, key: &EventKey) -> bool {
        self.store.contains(key)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when no event is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of distinct tickets.
    pub fn case_count(&self) -> usize {
        self.store.case_count()
    }

    /// Write matching events as JSON Lines, returning how many were written.
    pub fn export_jsonl(&self, path: impl AsRef<Path>, filter: Option<EventFilter>) -> Result<usize> {
        let scan = self.store.scan(filter)?;
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let count = ticketlog_ingest::write_jsonl(writer, &scan)?;
        debug!(path = %path.as_ref().display(), count, "Exported JSON Lines");
        Ok(count)
    }

    /// Write matching events as CSV, returning how many were written.
    pub fn export_csv(&self, path: impl AsRef<Path>, filter: Option<EventFilter>) -> Result<usize> {
        let scan = self.store.scan(filter)?;
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let count = ticketlog_ingest::write_csv(writer, &scan)?;
        debug!(path = %path.as_ref().display(), count, "Exported CSV");
        Ok(count)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Force pending WAL records to disk.
    ///
    /// In buffered mode fsyncs are batched; call `flush()` to make every
    /// accepted event durable now.
    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.flush()?;
        }
        Ok(())
    }

    /// Flush and stop accepting appends.
    ///
    /// Reads keep working on the in-memory state. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut closed = self.closed.write();
        if *closed {
            return Ok(());
        }
        self.flush()?;
        self.store.detach_sink();
        *closed = true;
        info!(events = self.store.len(), cases = self.store.case_count(), "Closed ticket log");
        Ok(())
    }

    /// Whether [`TicketLog::close`] has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Data directory, if the log lives on disk.
    pub fn path(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Current durability mode.
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Current ordering policy.
    pub fn ordering_policy(&self) -> OrderingPolicy {
        self.store.policy()
    }

    /// Check if this is an ephemeral (no-disk) log.
    pub fn is_ephemeral(&self) -> bool {
        self.data_dir.is_none()
    }

    /// What WAL replay did when this log was opened.
    pub fn recovery_result(&self) -> Option<&RecoveryResult> {
        self.recovery.as_ref()
    }
}

impl std::fmt::Debug for TicketLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketLog")
            .field("data_dir", &self.data_dir)
            .field("mode", &self.mode)
            .field("events", &self.store.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builder for log configuration.
///
/// # Example
///
/// ```ignore
/// // Production: disk-backed, batched fsync
/// let log = TicketLog::builder().path("./incidents").buffered().open()?;
///
/// // Audit trail: fsync every append
/// let log = TicketLog::builder().path("./audit").strict().open()?;
///
/// // Unit testing: no disk at all
/// let log = TicketLog::ephemeral();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TicketLogBuilder {
    path: Option<PathBuf>,
    mode: DurabilityMode,
    policy: OrderingPolicy,
    recovery: RecoveryOptions,
}

impl TicketLogBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// No WAL: nothing is read from or written to the data directory.
    ///
    /// Without a path this is the same as [`TicketLog::ephemeral`].
    pub fn no_durability(mut self) -> Self {
        self.mode = DurabilityMode::None;
        self
    }

    /// Batched fsync (default): 100ms or 1000 appends.
    pub fn buffered(mut self) -> Self {
        self.mode = DurabilityMode::buffered_default();
        self
    }

    /// Batched fsync with custom parameters.
    ///
    /// # Arguments
    ///
    /// * `flush_interval_ms` - Maximum time between fsyncs
    /// * `max_pending_writes` - Maximum appends before forced fsync
    pub fn buffered_with(mut self, flush_interval_ms: u64, max_pending_writes: usize) -> Self {
        self.mode = DurabilityMode::Batched {
            interval_ms: flush_interval_ms,
            batch_size: max_pending_writes,
        };
        self
    }

    /// fsync every append (safest, slowest).
    pub fn strict(mut self) -> Self {
        self.mode = DurabilityMode::Strict;
        self
    }

    /// How to treat timestamps that disagree with `event_order`.
    ///
    /// Replay applies the same policy, so reopen a log with the policy it
    /// was written under.
    pub fn ordering_policy(mut self, policy: OrderingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Corruption tolerance and file name used on replay.
    pub fn recovery_options(mut self, options: RecoveryOptions) -> Self {
        self.recovery = options;
        self
    }

    /// Open the log.
    ///
    /// Uses the configured path, or a temp directory if none set.
    pub fn open(self) -> Result<TicketLog> {
        match self.path.clone() {
            Some(path) => self.open_at(path),
            None if !self.mode.requires_wal() => {
                let mut log = TicketLog::ephemeral();
                log.store = EventLogStore::with_policy(self.policy);
                Ok(log)
            }
            None => self.open_temp(),
        }
    }

    /// Open in a unique temporary directory, deleted when the log is dropped.
    pub fn open_temp(self) -> Result<TicketLog> {
        let dir = tempfile::Builder::new().prefix("ticketlog-").tempdir()?;
        let mut log = self.open_at(dir.path().to_path_buf())?;
        log.temp_dir = Some(dir);
        Ok(log)
    }

    fn open_at(self, path: PathBuf) -> Result<TicketLog> {
        std::fs::create_dir_all(&path)?;
        let store = EventLogStore::with_policy(self.policy);

        let (wal, recovery) = if self.mode.requires_wal() {
            let recovery = Recovery::recover(&path, &self.recovery, &store)?;
            let wal = Arc::new(Wal::open(self.recovery.wal_path(&path), self.mode)?);
            store.attach_sink(wal.clone());
            (Some(wal), Some(recovery))
        } else {
            (None, None)
        };

        info!(
            path = %path.display(),
            mode = self.mode.description(),
            events = store.len(),
            cases = store.case_count(),
            "Opened ticket log"
        );

        Ok(TicketLog {
            store,
            wal,
            data_dir: Some(path),
            mode: self.mode,
            recovery,
            closed: RwLock::new(false),
            temp_dir: None,
        })
    }
}
