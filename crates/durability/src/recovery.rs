//! Crash recovery by WAL replay
//!
//! Rebuilds an [`EventLogStore`] from its WAL. Each decoded record goes
//! back through [`EventLogStore::append`], so the recovered store obeys the
//! same invariants as one built by live appends.
//!
//! ## Recovery Sequence
//!
//! 1. Validate the header (a file shorter than a header is treated as empty)
//! 2. Replay verified records in file order
//! 3. Skip damaged records (bad checksum or damaged length), up to `max_corrupt_entries`
//! 4. Truncate a torn tail so new appends start on a record boundary
//!
//! ## Usage
//!
//! ```ignore
//! let store = EventLogStore::new();
//! let result = Recovery::recover(data_dir, &RecoveryOptions::default(), &store)?;
//! println!("{}", result.summary());
//! ```

use crate::format::HEADER_SIZE;
use crate::wal::{ReadOutcome, WalReader};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use ticketlog_core::NewEvent;
use ticketlog_storage::EventLogStore;
use tracing::{debug, info, warn};

// ============================================================================
// Recovery Options
// ============================================================================

/// Recovery options
#[derive(Debug, Clone)]
pub struct RecoveryOptions {
    /// Maximum corrupt records to tolerate before failing
    pub max_corrupt_entries: usize,
    /// Whether to cut a torn tail off the file
    pub truncate_torn_tail: bool,
    /// WAL file name inside the data directory
    pub wal_filename: String,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 10,
            truncate_torn_tail: true,
            wal_filename: "events.wal".to_string(),
        }
    }
}

impl RecoveryOptions {
    /// Fail on any corruption
    pub fn strict() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 0,
            ..Default::default()
        }
    }

    /// Tolerate more corruption
    pub fn permissive() -> Self {
        RecoveryOptions {
            max_corrupt_entries: 100,
            ..Default::default()
        }
    }

    /// Path of the WAL inside `data_dir`
    pub fn wal_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.wal_filename)
    }
}

// ============================================================================
// Recovery Result
// ============================================================================

/// What recovery did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Verified records read from the WAL
    pub records_read: u64,
    /// Records accepted into the store
    pub events_replayed: u64,
    /// Records the store rejected on replay (for example duplicate keys)
    pub records_rejected: u64,
    /// Records skipped because their checksum or payload was bad
    pub corrupt_entries_skipped: u64,
    /// Bytes removed from the end of the file
    pub torn_tail_bytes: u64,
    /// Offset just past the last complete record
    pub valid_end_offset: u64,
    /// Total recovery time (microseconds)
    pub recovery_time_micros: u64,
}

impl RecoveryResult {
    /// Human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Recovery complete: {} events replayed of {} records, {} rejected, {} corrupt, {} torn bytes, {:.2}ms",
            self.events_replayed,
            self.records_read,
            self.records_rejected,
            self.corrupt_entries_skipped,
            self.torn_tail_bytes,
            self.recovery_time_micros as f64 / 1000.0,
        )
    }

    /// Whether anything was lost or skipped
    pub fn has_issues(&self) -> bool {
        self.records_rejected > 0 || self.corrupt_entries_skipped > 0 || self.torn_tail_bytes > 0
    }
}

// ============================================================================
// Recovery Error
// ============================================================================

/// Recovery errors
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Too many corrupt records
    #[error("Too many corrupt entries: {0} (max allowed: {1})")]
    TooManyCorruptEntries(u64, usize),

    /// The file is not a WAL this version can read
    #[error("Invalid WAL header in {path}: {reason}")]
    InvalidHeader {
        /// WAL file
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// WAL read failed
    #[error("WAL error: {0}")]
    Wal(#[from] ticketlog_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Recovery
// ============================================================================

/// WAL replay entry point
pub struct Recovery;

impl Recovery {
    /// Replay the WAL in `data_dir` into `store`
    ///
    /// `store` should be empty and have no sink attached. A missing WAL is
    /// not an error; the result is then all zeros.
    pub fn recover(
        data_dir: &Path,
        options: &RecoveryOptions,
        store: &EventLogStore,
    ) -> Result<RecoveryResult, RecoveryError> {
        let start = Instant::now();
        let path = options.wal_path(data_dir);
        let mut result = RecoveryResult::default();

        if !path.exists() {
            debug!(path = %path.display(), "No WAL to recover");
            return Ok(result);
        }

        let file_len = std::fs::metadata(&path)?.len();
        if file_len < HEADER_SIZE as u64 {
            // Crashed while writing the header of a new file
            warn!(path = %path.display(), file_len, "WAL shorter than its header, discarding");
            if options.truncate_torn_tail {
                OpenOptions::new().write(true).open(&path)?.set_len(0)?;
            }
            result.torn_tail_bytes = file_len;
            result.recovery_time_micros = start.elapsed().as_micros() as u64;
            return Ok(result);
        }

        let mut reader = WalReader::open(&path).map_err(|e| match e {
            ticketlog_core::Error::Corruption(reason) => RecoveryError::InvalidHeader {
                path: path.clone(),
                reason,
            },
            other => RecoveryError::Wal(other),
        })?;

        loop {
            match reader.next_record()? {
                ReadOutcome::Record { event, offset } => {
                    result.records_read += 1;
                    let key = event.key();
                    match store.append(NewEvent::from(event)) {
                        Ok(_) => result.events_replayed += 1,
                        Err(e) => {
                            warn!(%key, offset, error = %e, "Replayed record rejected");
                            result.records_rejected += 1;
                        }
                    }
                }
                ReadOutcome::Corrupt { offset } => {
                    result.corrupt_entries_skipped += 1;
                    warn!(offset, "Skipping corrupt WAL record");
                    if result.corrupt_entries_skipped > options.max_corrupt_entries as u64 {
                        return Err(RecoveryError::TooManyCorruptEntries(
                            result.corrupt_entries_skipped,
                            options.max_corrupt_entries,
                        ));
                    }
                }
                ReadOutcome::TornTail { offset } => {
                    result.valid_end_offset = offset;
                    result.torn_tail_bytes = file_len - offset;
                    warn!(
                        offset,
                        bytes = result.torn_tail_bytes,
                        "Torn tail at end of WAL"
                    );
                    if options.truncate_torn_tail {
                        OpenOptions::new().write(true).open(&path)?.set_len(offset)?;
                        debug!(offset, "Truncated WAL");
                    }
                    break;
                }
                ReadOutcome::End => {
                    result.valid_end_offset = reader.offset();
                    break;
                }
            }
        }

        result.recovery_time_micros = start.elapsed().as_micros() as u64;
        info!("{}", result.summary());
        Ok(result)
    }
}
