//! Edge Case Tests
//!
//! - mandatory fields, blank strings
//! - duration boundaries
//! - timestamp / event_order disagreement under both policies
//! - unusual ticket ids and orders

use crate::*;

// =============================================================================
// MANDATORY FIELDS
// =============================================================================

#[test]
fn test_each_mandatory_field_is_required() {
    let log = TicketLog::ephemeral();
    let full = ev("T1", "open", 0, 1);

    let cases: Vec<(&str, NewEvent)> = vec![
        ("ticket_id", NewEvent { ticket_id: None, ..full.clone() }),
        ("activity", NewEvent { activity: None, ..full.clone() }),
        ("timestamp", NewEvent { timestamp: None, ..full.clone() }),
        ("event_order", NewEvent { event_order: None, ..full.clone() }),
    ];

    for (field, candidate) in cases {
        let err = log.append(candidate).unwrap_err();
        assert_eq!(
            err.as_validation(),
            Some(&ValidationError::MissingField { field }),
            "field {}",
            field
        );
    }
    assert!(log.is_empty());
    assert!(log.case_ids().is_empty());
}

#[test]
fn test_blank_strings_count_as_missing() {
    let log = TicketLog::ephemeral();
    let err = log.append(ev("   ", "open", 0, 1)).unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::MissingField { field: "ticket_id" })
    );

    let err = log.append(ev("T1", "", 0, 1)).unwrap_err();
    assert_eq!(
        err.as_validation(),
        Some(&ValidationError::MissingField { field: "activity" })
    );
}

#[test]
fn test_optional_fields_may_be_absent() {
    let log = TicketLog::ephemeral();
    let stored = log
        .append(NewEvent::new("T1", "open", at(0), 1))
        .unwrap();
    assert_eq!(stored.queue_name, "");
    assert!(stored.user_name.is_none());
    assert!(stored.duration_sec.is_none());
}

// =============================================================================
// DURATION
// =============================================================================

#[test]
fn test_zero_duration_accepted_negative_rejected() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "a", 0, 1).duration_sec(0)).unwrap();

    let err = log.append(ev("T1", "b", 1, 2).duration_sec(-1)).unwrap_err();
    match err.as_validation() {
        Some(ValidationError::NegativeDuration { key, duration_sec }) => {
            assert_eq!(key, &EventKey::new("T1", 2));
            assert_eq!(*duration_sec, -1);
        }
        other => panic!("Expected NegativeDuration, got {:?}", other),
    }
    assert_eq!(log.get_trace("T1").len(), 1);
}

// =============================================================================
// ORDERING POLICY
// =============================================================================

#[test]
fn test_reject_policy_refuses_skewed_timestamp() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "a", 10, 1)).unwrap();
    log.append(ev("T1", "c", 30, 3)).unwrap();

    // Later order, earlier time
    let err = log.append(ev("T1", "d", 5, 4)).unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::OrderingViolation { neighbor: 3, .. })
    ));

    // Inserted between 1 and 3 but after 3's time
    let err = log.append(ev("T1", "b", 40, 2)).unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::OrderingViolation { neighbor: 3, .. })
    ));

    assert_eq!(keys(log.get_trace("T1").to_vec()), vec!["T1#1", "T1#3"]);
}

#[test]
fn test_equal_timestamps_are_not_a_violation() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "a", 0, 1)).unwrap();
    log.append(ev("T1", "b", 0, 2)).unwrap();
    assert_eq!(log.get_trace("T1").len(), 2);
}

#[test]
fn test_trust_order_keeps_event_order_authoritative() {
    let log = TicketLog::builder()
        .no_durability()
        .ordering_policy(OrderingPolicy::TrustOrder)
        .open()
        .unwrap();
    log.append(ev("T1", "late", 30, 1)).unwrap();
    log.append(ev("T1", "early", 0, 2)).unwrap();

    let trace = log.get_trace("T1");
    assert_eq!(trace.activities().collect::<Vec<_>>(), vec!["late", "early"]);
}

#[test]
fn test_ordering_is_per_case() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "a", 100, 1)).unwrap();
    // Earlier time, but a different case
    log.append(ev("T2", "a", 0, 2)).unwrap();
    assert_eq!(log.case_count(), 2);
}

// =============================================================================
// UNUSUAL VALUES
// =============================================================================

#[test]
fn test_negative_and_sparse_orders() {
    let log = TicketLog::ephemeral();
    log.append(ev("T1", "x", 0, -5)).unwrap();
    log.append(ev("T1", "y", 10, 1_000_000)).unwrap();
    log.append(ev("T1", "z", 5, 0)).unwrap();
    assert_eq!(
        keys(log.get_trace("T1").to_vec()),
        vec!["T1#-5", "T1#0", "T1#1000000"]
    );
}

#[test]
fn test_unicode_ticket_ids() {
    let log = TicketLog::ephemeral();
    log.append(ev("票-1", "开启", 0, 1)).unwrap();
    assert_eq!(log.get_trace("票-1").len(), 1);
    assert_eq!(log.case_ids(), vec!["票-1"]);
}

#[test]
fn test_ticket_ids_are_case_sensitive() {
    let log = TicketLog::ephemeral();
    log.append(ev("inc1", "a", 0, 1)).unwrap();
    log.append(ev("INC1", "a", 0, 1)).unwrap();
    assert_eq!(log.case_count(), 2);
}
