//! Write-ahead log file
//!
//! One append-only file per store. Every accepted event is written as a
//! single checksummed record before it becomes visible to readers (the
//! store calls [`EventSink::persist`] under its writer lock).
//!
//! ## Write atomicity
//!
//! A record is written with one `write_all`. If that write or the fsync
//! that follows it fails, the file is cut back to the previous end: the
//! caller sees the append fail, so the record must not come back on replay.
//! A crash in the middle of a write leaves a torn tail, which [`WalReader`]
//! reports and recovery truncates.

use crate::format::{
    decode_header, decode_prefix, decode_record, encode_header, encode_record, find_record,
    HEADER_SIZE, RECORD_PREFIX_SIZE,
};
use crate::mode::DurabilityMode;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use ticketlog_core::{Error, Event, Result};
use ticketlog_storage::EventSink;
use tracing::{debug, error, trace};

// ============================================================================
// Writer
// ============================================================================

struct WalState {
    file: File,
    /// End of the last complete record
    offset: u64,
    /// Records written since the last fsync
    unsynced: usize,
    last_sync: Instant,
    #[cfg(test)]
    fail_sync: bool,
}

impl WalState {
    fn sync(&mut self) -> Result<()> {
        #[cfg(test)]
        if self.fail_sync {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "sync failed").into());
        }
        self.file.sync_data()?;
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Cut the file back to `start`, dropping everything written after it
    fn rollback(&mut self, start: u64) -> Result<()> {
        self.file.set_len(start)?;
        self.file.seek(SeekFrom::Start(start))?;
        self.offset = start;
        Ok(())
    }
}

/// Append-only event log file
pub struct Wal {
    path: PathBuf,
    mode: DurabilityMode,
    state: Mutex<WalState>,
}

impl Wal {
    /// Open or create the WAL at `path`
    ///
    /// A new file gets a header. An existing file must carry a valid one;
    /// appends continue at its current end. Run recovery first so a torn
    /// tail is gone before new records land behind it.
    pub fn open(path: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(&encode_header())?;
            file.sync_all()?;
            debug!(path = %path.display(), "Created WAL");
        } else {
            let mut header = [0u8; HEADER_SIZE];
            file.read_exact(&mut header).map_err(|_| {
                Error::Corruption(format!("WAL header truncated in {}", path.display()))
            })?;
            decode_header(&header)?;
        }

        let offset = file.seek(SeekFrom::End(0))?;
        debug!(path = %path.display(), offset, mode = mode.description(), "Opened WAL");

        Ok(Self {
            path,
            mode,
            state: Mutex::new(WalState {
                file,
                offset,
                unsynced: 0,
                last_sync: Instant::now(),
                #[cfg(test)]
                fail_sync: false,
            }),
        })
    }

    /// Path of the WAL file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durability mode the WAL was opened with
    pub fn mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Current end offset in bytes
    pub fn size(&self) -> u64 {
        self.state.lock().offset
    }

    /// Append one event, returning the offset its record starts at
    ///
    /// On error the file is back at its previous end.
    pub fn append(&self, event: &Event) -> Result<u64> {
        let record = encode_record(event)?;
        let mut state = self.state.lock();
        let start = state.offset;

        if let Err(e) = state.file.write_all(&record) {
            error!(offset = start, error = %e, "WAL write failed, rolling back partial record");
            state.rollback(start)?;
            return Err(e.into());
        }
        state.offset = start + record.len() as u64;
        state.unsynced += 1;
        trace!(key = %event.key(), offset = start, "WAL append");

        if self.sync_due(&state) {
            if let Err(e) = state.sync() {
                error!(offset = start, error = %e, "WAL sync failed, rolling back record");
                state.unsynced -= 1;
                state.rollback(start)?;
                return Err(e);
            }
        }

        Ok(start)
    }

    /// Make every following fsync fail until switched off
    #[cfg(test)]
    pub(crate) fn set_fail_sync(&self, fail: bool) {
        self.state.lock().fail_sync = fail;
    }

    fn sync_due(&self, state: &WalState) -> bool {
        if self.mode.requires_immediate_fsync() {
            return true;
        }
        match self.mode {
            DurabilityMode::Batched {
                interval_ms,
                batch_size,
            } => {
                state.unsynced >= batch_size
                    || state.last_sync.elapsed() >= Duration::from_millis(interval_ms)
            }
            _ => false,
        }
    }

    /// Force pending records to disk
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.unsynced > 0 {
            state.sync()?;
        }
        Ok(())
    }
}

impl EventSink for Wal {
    fn persist(&self, event: &Event) -> Result<()> {
        self.append(event).map(|_| ())
    }
}

impl Drop for Wal {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.unsynced > 0 {
            if let Err(e) = state.sync() {
                error!(path = %self.path.display(), error = %e, "Failed to sync WAL on drop");
            }
        }
    }
}

impl std::fmt::Debug for Wal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wal")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Result of reading the next record
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A verified record
    Record {
        /// Decoded event
        event: Event,
        /// Offset the record starts at
        offset: u64,
    },
    /// A damaged record; reading continues at the next verified record
    Corrupt {
        /// Offset the record starts at
        offset: u64,
    },
    /// The remaining bytes do not form a complete record
    TornTail {
        /// End of the last complete record
        offset: u64,
    },
    /// Clean end of file
    End,
}

/// Sequential WAL reader
pub struct WalReader {
    reader: BufReader<File>,
    offset: u64,
    file_len: u64,
    done: bool,
}

impl WalReader {
    /// Open `path` and validate its header
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header).map_err(|_| {
            Error::Corruption(format!("WAL header truncated in {}", path.display()))
        })?;
        decode_header(&header)?;

        Ok(Self {
            reader,
            offset: HEADER_SIZE as u64,
            file_len,
            done: false,
        })
    }

    /// Offset of the next unread record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// File length at open time
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Read the next record
    ///
    /// After `TornTail` or `End` every further call returns `End`.
    pub fn next_record(&mut self) -> Result<ReadOutcome> {
        if self.done {
            return Ok(ReadOutcome::End);
        }
        let remaining = self.file_len - self.offset;
        if remaining == 0 {
            self.done = true;
            return Ok(ReadOutcome::End);
        }
        if remaining < RECORD_PREFIX_SIZE as u64 {
            self.done = true;
            return Ok(ReadOutcome::TornTail {
                offset: self.offset,
            });
        }

        let start = self.offset;
        let mut prefix = [0u8; RECORD_PREFIX_SIZE];
        self.reader.read_exact(&mut prefix)?;

        let (len, crc) = match decode_prefix(&prefix) {
            Some(parsed) => parsed,
            None => return self.resync(start),
        };
        // The length is verified, so a payload running past the end is a
        // write cut short by a crash.
        if (len as u64) > remaining - RECORD_PREFIX_SIZE as u64 {
            self.done = true;
            return Ok(ReadOutcome::TornTail { offset: start });
        }

        let mut payload = vec![0u8; len];
        self.reader.read_exact(&mut payload)?;
        self.offset += (RECORD_PREFIX_SIZE + len) as u64;

        if crc32fast::hash(&payload) != crc {
            return Ok(ReadOutcome::Corrupt { offset: start });
        }
        match decode_record(&payload) {
            Ok(event) => Ok(ReadOutcome::Record {
                event,
                offset: start,
            }),
            Err(_) => Ok(ReadOutcome::Corrupt { offset: start }),
        }
    }

    /// Skip a record whose length is damaged
    ///
    /// Resumes at the next verified record after `start` and reports the
    /// skipped bytes as `Corrupt`. With no verified record left, everything
    /// from `start` on is a torn tail.
    fn resync(&mut self, start: u64) -> Result<ReadOutcome> {
        let scan_from = start + 1;
        self.reader.seek(SeekFrom::Start(scan_from))?;
        let mut rest = Vec::new();
        (&mut self.reader)
            .take(self.file_len - scan_from)
            .read_to_end(&mut rest)?;

        match find_record(&rest) {
            Some(skip) => {
                let next = scan_from + skip as u64;
                self.reader.seek(SeekFrom::Start(next))?;
                self.offset = next;
                Ok(ReadOutcome::Corrupt { offset: start })
            }
            None => {
                self.done = true;
                Ok(ReadOutcome::TornTail { offset: start })
            }
        }
    }

    /// Read every verified record, stopping at the first torn tail
    ///
    /// Corrupt records are skipped. Returns the events and the number skipped.
    pub fn read_all(&mut self) -> Result<(Vec<Event>, usize)> {
        let mut events = Vec::new();
        let mut corrupt = 0;
        loop {
            match self.next_record()? {
                ReadOutcome::Record { event, .. } => events.push(event),
                ReadOutcome::Corrupt { .. } => corrupt += 1,
                ReadOutcome::TornTail { .. } | ReadOutcome::End => break,
            }
        }
        Ok((events, corrupt))
    }
}
