//! Basic Operations Tests
//!
//! - append / get_trace ordering
//! - duplicate keys leave the log unchanged
//! - case_ids in first-seen order
//! - scan over all cases

use crate::*;

// =============================================================================
// APPEND + TRACE
// =============================================================================

#[test]
fn test_open_close_duplicate_scenario() {
    let log = TicketLog::ephemeral();

    log.append(ev("T1", "open", 0, 0)).unwrap();
    log.append(ev("T1", "close", 10, 1)).unwrap();

    let activities: Vec<String> = log
        .get_trace("T1")
        .iter()
        .map(|e| e.activity.clone())
        .collect();
    assert_eq!(activities, vec!["open", "close"]);

    let err = log.append(ev("T1", "dup", 20, 0)).unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::DuplicateKey { .. })
    ));

    let activities: Vec<String> = log
        .get_trace("T1")
        .iter()
        .map(|e| e.activity.clone())
        .collect();
    assert_eq!(activities, vec!["open", "close"]);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_append_returns_stored_event() {
    let log = TicketLog::ephemeral();
    let stored = log
        .append(
            ev("INC-9", "Assigned", 5, 2)
                .user_name("amy")
                .team("Network Ops")
                .priority("P2")
                .duration_sec(300),
        )
        .unwrap();

    assert_eq!(stored.ticket_id, "INC-9");
    assert_eq!(stored.queue_name, "Q01");
    assert_eq!(stored.user_name.as_deref(), Some("amy"));
    assert_eq!(stored.duration_sec, Some(300));
    assert_eq!(log.get_trace("INC-9").first(), Some(&stored));
    assert!(log.contains(&EventKey::new("INC-9", 2)));
}

#[test]
fn test_out_of_order_arrival_is_placed_by_event_order() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "c", 30, 3)).unwrap();
    log.append(ev("T1", "a", 10, 1)).unwrap();
    log.append(ev("T1", "b", 20, 2)).unwrap();

    assert_eq!(
        keys(log.get_trace("T1").to_vec()),
        vec!["T1#1", "T1#2", "T1#3"]
    );
}

#[test]
fn test_unknown_ticket_is_empty_trace() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "open", 0, 1)).unwrap();

    let trace = log.get_trace("nope");
    assert!(trace.is_empty());
    assert_eq!(trace.ticket_id(), "nope");
    assert!(trace.first().is_none());
}

// =============================================================================
// CASE IDS + SCAN
// =============================================================================

#[test]
fn test_case_ids_first_seen_order() {
    let log = TicketLog::ephemeral();
    log.append(ev("T3", "a", 0, 1)).unwrap();
    log.append(ev("T1", "a", 0, 1)).unwrap();
    log.append(ev("T3", "b", 5, 2)).unwrap();
    log.append(ev("T2", "a", 0, 1)).unwrap();

    assert_eq!(log.case_ids(), vec!["T3", "T1", "T2"]);
    assert_eq!(log.case_count(), 3);
}

#[test]
fn test_scan_all_groups_by_case() {
    let log = TicketLog::ephemeral();
    log.append(ev("B", "x", 0, 2)).unwrap();
    log.append(ev("A", "x", 0, 1)).unwrap();
    log.append(ev("B", "x", -5, 1)).unwrap();

    let scan = log.scan(None).unwrap();
    assert_eq!(keys(scan.to_vec()), vec!["B#1", "B#2", "A#1"]);

    // Restartable
    assert_eq!(scan.iter().count(), 3);
    assert_eq!(scan.iter().count(), 3);
}

#[test]
fn test_batch_append_per_record_results() {
    let log = TicketLog::ephemeral();
    let results = log
        .append_batch(vec![
            ev("T1", "a", 0, 1),
            ev("T1", "dup", 1, 1),
            NewEvent::default(),
            ev("T2", "a", 0, 1),
        ])
        .unwrap();

    assert!(results[0].is_ok());
    assert!(results[1].as_ref().unwrap_err().is_validation());
    assert!(results[2].as_ref().unwrap_err().is_validation());
    assert!(results[3].is_ok());
    assert_eq!(log.len(), 2);
}

#[test]
fn test_snapshot_is_stable() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "a", 0, 1)).unwrap();
    let snap = log.snapshot();

    log.append(ev("T1", "b", 1, 2)).unwrap();
    log.append(ev("T2", "a", 0, 1)).unwrap();

    assert_eq!(snap.len(), 1);
    assert_eq!(snap.get_trace("T1").len(), 1);
    assert_eq!(snap.case_ids(), vec!["T1"]);
    assert_eq!(log.len(), 3);
}
