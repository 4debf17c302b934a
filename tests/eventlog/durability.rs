//! Durability Tests
//!
//! - events survive reopen in strict and buffered modes
//! - no_durability writes nothing
//! - torn tails and corrupt records on recovery
//! - close semantics

use crate::*;
use std::fs::{self, OpenOptions};

// =============================================================================
// REOPEN
// =============================================================================

#[test]
fn test_strict_events_survive_reopen() {
    let mut test_log = TestLog::new_strict();
    test_log.log().append(ev("T1", "open", 0, 1)).unwrap();
    test_log.log().append(ev("T2", "open", 1, 1)).unwrap();
    test_log
        .log()
        .append(ev("T1", "close", 5, 2).description("done"))
        .unwrap();
    let before = test_log.log().scan(None).unwrap().to_vec();

    test_log.reopen();

    let log = test_log.log();
    assert_eq!(log.case_ids(), vec!["T1", "T2"]);
    assert_eq!(log.scan(None).unwrap().to_vec(), before);
    let recovery = log.recovery_result().unwrap();
    assert_eq!(recovery.events_replayed, 3);
    assert!(!recovery.has_issues());
}

#[test]
fn test_buffered_events_survive_flush_and_reopen() {
    let mut test_log = TestLog::new_buffered();
    for i in 0..50 {
        test_log.log().append(ev("T1", "step", i, i)).unwrap();
    }
    test_log.log().flush().unwrap();

    test_log.reopen();
    assert_eq!(test_log.log().get_trace("T1").len(), 50);
}

#[test]
fn test_reopened_log_keeps_validating_against_recovered_state() {
    let mut test_log = TestLog::new_strict();
    test_log.log().append(ev("T1", "open", 10, 1)).unwrap();
    test_log.reopen();

    let err = test_log.log().append(ev("T1", "again", 20, 1)).unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::DuplicateKey { .. })
    ));
    let err = test_log.log().append(ev("T1", "early", 0, 2)).unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::OrderingViolation { .. })
    ));
    test_log.log().append(ev("T1", "close", 30, 2)).unwrap();

    test_log.reopen();
    assert_eq!(test_log.log().get_trace("T1").len(), 2);
}

#[test]
fn test_rejected_appends_are_not_persisted() {
    let mut test_log = TestLog::new_strict();
    test_log.log().append(ev("T1", "a", 0, 1)).unwrap();
    let size = fs::metadata(test_log.wal_path()).unwrap().len();

    assert!(test_log.log().append(ev("T1", "dup", 1, 1)).is_err());
    assert!(test_log.log().append(ev("T1", "neg", 1, 2).duration_sec(-3)).is_err());
    assert_eq!(fs::metadata(test_log.wal_path()).unwrap().len(), size);

    test_log.reopen();
    assert_eq!(test_log.log().len(), 1);
}

#[test]
fn test_no_durability_writes_no_wal() {
    let mut test_log = TestLog::new_no_durability();
    test_log.log().append(ev("T1", "a", 0, 1)).unwrap();
    assert!(!test_log.wal_path().exists());
    assert_eq!(test_log.log().durability_mode(), DurabilityMode::None);

    test_log.reopen();
    assert!(test_log.log().is_empty());
}

#[test]
fn test_open_temp_is_disk_backed() {
    let log = TicketLog::open_temp().unwrap();
    assert!(!log.is_ephemeral());
    let dir = log.path().unwrap().to_path_buf();
    assert!(dir.exists());
    log.append(ev("T1", "a", 0, 1)).unwrap();
    log.close().unwrap();
    fs::remove_dir_all(dir).unwrap();
}

// =============================================================================
// DAMAGED WAL
// =============================================================================

#[test]
fn test_torn_tail_is_truncated_on_reopen() {
    let mut test_log = TestLog::new_strict();
    test_log.log().append(ev("T1", "a", 0, 1)).unwrap();
    test_log.log().append(ev("T1", "b", 1, 2)).unwrap();
    test_log.shutdown();

    // Simulate a crash in the middle of the second record
    let len = fs::metadata(test_log.wal_path()).unwrap().len();
    OpenOptions::new()
        .write(true)
        .open(test_log.wal_path())
        .unwrap()
        .set_len(len - 4)
        .unwrap();

    test_log.reopen();
    let log = test_log.log();
    assert_eq!(keys(log.get_trace("T1").to_vec()), vec!["T1#1"]);
    let recovery = log.recovery_result().unwrap();
    assert!(recovery.torn_tail_bytes > 0);
    assert!(recovery.has_issues());

    // The lost record can be written again and survives
    log.append(ev("T1", "b", 1, 2)).unwrap();
    test_log.reopen();
    assert_eq!(test_log.log().get_trace("T1").len(), 2);
    assert_eq!(test_log.log().recovery_result().unwrap().torn_tail_bytes, 0);
}

#[test]
fn test_corrupt_record_skipped_or_fatal_by_options() {
    let mut test_log = TestLog::new_strict();
    for i in 1..=3 {
        test_log.log().append(ev("T1", "x", i, i)).unwrap();
    }
    test_log.shutdown();

    // Flip the last byte of the file: inside the final record's payload
    let mut bytes = fs::read(test_log.wal_path()).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x5a;
    fs::write(test_log.wal_path(), &bytes).unwrap();

    let err = test_log.reopen_with(RecoveryOptions::strict()).unwrap_err();
    assert!(matches!(err, Error::Recovery(_)));

    test_log.reopen_with(RecoveryOptions::default()).unwrap();
    let log = test_log.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log.recovery_result().unwrap().corrupt_entries_skipped, 1);
}

#[test]
fn test_foreign_file_is_not_a_wal() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(RecoveryOptions::default().wal_path(dir.path()), b"id,activity\n1,open\n").unwrap();

    let err = TicketLog::builder().path(dir.path()).open().unwrap_err();
    assert!(matches!(err, Error::Recovery(_)));
}

// =============================================================================
// CLOSE
// =============================================================================

#[test]
fn test_close_flushes_and_rejects_appends() {
    let mut test_log = TestLog::new_buffered();
    test_log.log().append(ev("T1", "a", 0, 1)).unwrap();
    test_log.log().close().unwrap();
    assert!(test_log.log().is_closed());

    let err = test_log.log().append(ev("T1", "b", 1, 2)).unwrap_err();
    assert!(err.is_closed());
    assert_eq!(test_log.log().get_trace("T1").len(), 1);

    test_log.reopen();
    assert_eq!(test_log.log().len(), 1);
    assert!(!test_log.log().is_closed());
}
