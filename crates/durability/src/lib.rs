//! Durability layer for TicketLog
//!
//! This crate implements the write-ahead log behind a durable store:
//! - DurabilityMode: None, Strict, Batched (default)
//! - Record encoding with length prefix and CRC32 checksum
//! - Wal: append-only file, plugged into the store as an `EventSink`
//! - Recovery: replay the WAL through normal validation, truncate torn tails

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod mode;
pub mod recovery;
pub mod wal;

pub use format::{
    decode_prefix, decode_record, encode_record, find_record, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    RECORD_PREFIX_SIZE,
};
pub use mode::DurabilityMode;
pub use recovery::{Recovery, RecoveryError, RecoveryOptions, RecoveryResult};
pub use wal::{ReadOutcome, Wal, WalReader};
