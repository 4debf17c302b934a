//! Case-wise normalization of raw exports
//!
//! Exports often lack `event_order` and `duration_sec`. Both can be derived
//! from timestamps once the records of a case are in time order:
//! `event_order` is the 1-based position within the case and `duration_sec`
//! the seconds until the case's next event (0 for its last event).

use std::collections::BTreeMap;
use ticketlog_core::NewEvent;

/// What normalization is allowed to change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Stable sort by `(ticket_id, timestamp)`
    pub sort: bool,
    /// Overwrite `event_order` with the position within the case
    pub assign_event_order: bool,
    /// Overwrite `duration_sec` with the gap to the next event
    pub derive_durations: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            sort: true,
            assign_event_order: true,
            derive_durations: true,
        }
    }
}

impl NormalizeOptions {
    /// Sort only, keep provided orders and durations
    pub fn sort_only() -> Self {
        Self {
            sort: true,
            assign_event_order: false,
            derive_durations: false,
        }
    }
}

/// Normalize candidates in place
///
/// Records without a `ticket_id` or `timestamp` are left untouched (and sort
/// first); validation rejects them on append.
pub fn normalize(events: &mut [NewEvent], options: &NormalizeOptions) {
    normalize_by(events, |e| e, options);
}

/// Normalize any records that carry a candidate
pub(crate) fn normalize_by<T, F>(items: &mut [T], mut candidate: F, options: &NormalizeOptions)
where
    F: FnMut(&mut T) -> &mut NewEvent,
{
    if options.sort {
        // Sort keys are cloned once up front; `candidate` needs `&mut`.
        let mut keyed: Vec<_> = items
            .iter_mut()
            .map(|item| {
                let c = candidate(item);
                (c.ticket_id.clone(), c.timestamp)
            })
            .zip(0..)
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let order: Vec<usize> = keyed.into_iter().map(|(_, i)| i).collect();
        apply_permutation(items, &order);
    }

    if !options.assign_event_order && !options.derive_durations {
        return;
    }

    let mut cases: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, item) in items.iter_mut().enumerate() {
        let c = candidate(item);
        if let (Some(ticket), Some(_)) = (&c.ticket_id, c.timestamp) {
            cases.entry(ticket.clone()).or_default().push(i);
        }
    }

    for positions in cases.values() {
        for (n, &i) in positions.iter().enumerate() {
            let next_ts = positions
                .get(n + 1)
                .and_then(|&j| candidate(&mut items[j]).timestamp);
            let c = candidate(&mut items[i]);
            if options.assign_event_order {
                c.event_order = Some(n as i64 + 1);
            }
            if options.derive_durations {
                let gap = match (c.timestamp, next_ts) {
                    (Some(ts), Some(next)) => (next - ts).num_seconds().max(0),
                    _ => 0,
                };
                c.duration_sec = Some(gap);
            }
        }
    }
}

/// Reorder `items` so that position `k` holds the element previously at `order[k]`
fn apply_permutation<T>(items: &mut [T], order: &[usize]) {
    for k in 0..items.len() {
        // Elements before `k` have been swapped away; follow where they went.
        let mut src = order[k];
        while src < k {
            src = order[src];
        }
        items.swap(k, src);
    }
}
