//! Property Tests
//!
//! - round trip: N valid events over K cases come back exactly once each
//! - every accepted trace is ordered by event_order with non-decreasing time
//! - a failed append leaves the log unchanged
//! - WAL replay reproduces the log

use crate::*;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// (case index, minute) pairs; event_order is derived from the minute so
/// every generated batch is valid under `OrderingPolicy::Reject`
fn batch() -> impl Strategy<Value = Vec<(usize, i64)>> {
    prop::collection::vec((0usize..8, 0i64..10_000), 1..200)
}

/// Deduplicate keys and build candidates in the generated (arbitrary) order
fn candidates(raw: &[(usize, i64)]) -> Vec<NewEvent> {
    let mut seen = BTreeSet::new();
    raw.iter()
        .filter(|(case, minute)| seen.insert((*case, *minute)))
        .map(|(case, minute)| ev(&format!("CASE-{}", case), "act", *minute, *minute))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_round_trip(raw in batch()) {
        let input = candidates(&raw);
        let log = TicketLog::ephemeral();
        for c in &input {
            log.append(c.clone()).unwrap();
        }

        let distinct: BTreeSet<String> = input
            .iter()
            .map(|c| c.ticket_id.clone().unwrap())
            .collect();
        let ids: BTreeSet<String> = log.case_ids().into_iter().collect();
        prop_assert_eq!(ids, distinct);
        prop_assert_eq!(log.case_ids().len(), log.case_count());

        let mut from_traces: Vec<String> = log
            .case_ids()
            .iter()
            .flat_map(|id| log.get_trace(id).to_vec())
            .map(|e| e.key().to_string())
            .collect();
        let mut expected: Vec<String> = input
            .iter()
            .map(|c| format!("{}#{}", c.ticket_id.as_deref().unwrap(), c.event_order.unwrap()))
            .collect();
        prop_assert_eq!(from_traces.len(), input.len());
        from_traces.sort();
        expected.sort();
        prop_assert_eq!(from_traces, expected);
    }

    #[test]
    fn prop_traces_are_ordered(raw in batch()) {
        let log = TicketLog::ephemeral();
        for c in candidates(&raw) {
            log.append(c).unwrap();
        }
        for id in log.case_ids() {
            let trace = log.get_trace(&id);
            for pair in trace.as_slice().windows(2) {
                prop_assert!(pair[0].event_order < pair[1].event_order);
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
        }
    }

    #[test]
    fn prop_failed_append_changes_nothing(raw in batch(), pick in any::<prop::sample::Index>()) {
        let input = candidates(&raw);
        let log = TicketLog::ephemeral();
        for c in &input {
            log.append(c.clone()).unwrap();
        }
        let before = log.scan(None).unwrap().to_vec();
        let ids_before = log.case_ids();

        let mut dup = pick.get(&input).clone();
        dup.activity = Some("duplicate".into());
        prop_assert!(log.append(dup).unwrap_err().is_validation());

        prop_assert_eq!(log.scan(None).unwrap().to_vec(), before);
        prop_assert_eq!(log.case_ids(), ids_before);
    }

    #[test]
    fn prop_trust_order_accepts_any_timestamps(
        rows in prop::collection::vec((0i64..50, -1000i64..1000), 1..100)
    ) {
        let log = TicketLog::builder()
            .no_durability()
            .ordering_policy(OrderingPolicy::TrustOrder)
            .open()
            .unwrap();
        let mut unique = HashMap::new();
        for (order, minute) in rows {
            unique.entry(order).or_insert(minute);
        }
        for (order, minute) in &unique {
            log.append(ev("T", "x", *minute, *order)).unwrap();
        }
        let orders: Vec<i64> = log.get_trace("T").iter().map(|e| e.event_order).collect();
        let mut expected: Vec<i64> = unique.keys().copied().collect();
        expected.sort();
        prop_assert_eq!(orders, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_wal_replay_reproduces_log(raw in batch()) {
        let mut test_log = TestLog::new_buffered();
        for c in candidates(&raw) {
            test_log.log().append(c).unwrap();
        }
        let before = test_log.log().scan(None).unwrap().to_vec();
        let ids = test_log.log().case_ids();
        test_log.log().flush().unwrap();

        test_log.reopen();
        prop_assert_eq!(test_log.log().scan(None).unwrap().to_vec(), before);
        prop_assert_eq!(test_log.log().case_ids(), ids);
    }
}
