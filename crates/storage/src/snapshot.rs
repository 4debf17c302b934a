//! Point-in-time views over the store
//!
//! The published store state is a pair of `Arc`s (case list + ticket index).
//! A snapshot is a clone of that pair: O(1) to take, and unaffected by later
//! appends because writers replace the `Arc`s instead of mutating through
//! them while a reader holds a copy.

use crate::trace::Trace;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use ticketlog_core::{Event, EventFilter, EventKey, InvalidFilterError};

/// One case: its id and its events sorted by `event_order`
#[derive(Debug, Clone)]
pub(crate) struct CaseSlot {
    pub(crate) ticket_id: Arc<str>,
    pub(crate) events: Arc<Vec<Event>>,
}

/// Consistent view of the store as of one version
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub(crate) index: Arc<FxHashMap<Arc<str>, usize>>,
    pub(crate) cases: Arc<Vec<CaseSlot>>,
    pub(crate) len: usize,
    pub(crate) version: u64,
}

impl StoreSnapshot {
    /// Number of accepted appends when the snapshot was taken
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no event is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of distinct tickets
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    /// Ordered events for `ticket_id`; empty when the ticket is unknown
    pub fn get_trace(&self, ticket_id: &str) -> Trace {
        match self.index.get(ticket_id) {
            Some(&i) => {
                let slot = &self.cases[i];
                Trace::new(slot.ticket_id.clone(), slot.events.clone())
            }
            None => Trace::empty(ticket_id),
        }
    }

    /// Events matching `filter`, cases in first-seen order
    pub fn scan(&self, filter: Option<EventFilter>) -> Result<Scan, InvalidFilterError> {
        Scan::new(self.cases.clone(), filter)
    }

    /// Distinct ticket ids, in first-seen order
    pub fn case_ids(&self) -> Vec<String> {
        self.cases.iter().map(|c| c.ticket_id.to_string()).collect()
    }

    /// Whether an event with this key is stored
    pub fn contains(&self, key: &EventKey) -> bool {
        self.index
            .get(key.ticket_id.as_str())
            .map(|&i| {
                self.cases[i]
                    .events
                    .binary_search_by_key(&key.event_order, |e| e.event_order)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

/// Lazy, restartable sequence of matching events
///
/// Holds the case list as of the call that created it. Every call to
/// [`Scan::iter`] starts again from the first case.
#[derive(Debug, Clone)]
pub struct Scan {
    cases: Arc<Vec<CaseSlot>>,
    filter: Option<EventFilter>,
}

impl Scan {
    pub(crate) fn new(
        cases: Arc<Vec<CaseSlot>>,
        filter: Option<EventFilter>,
    ) -> Result<Self, InvalidFilterError> {
        if let Some(f) = &filter {
            f.validate()?;
        }
        // An unrestricted filter is the same as none; skip per-event checks.
        let filter = filter.filter(|f| !f.is_unrestricted());
        Ok(Self { cases, filter })
    }

    /// Iterate matching events from the beginning
    pub fn iter(&self) -> ScanIter<'_> {
        ScanIter {
            cases: self.cases.iter(),
            current: None,
            filter: self.filter.as_ref(),
        }
    }

    /// Owned copies of all matching events
    pub fn to_vec(&self) -> Vec<Event> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a Scan {
    type Item = &'a Event;
    type IntoIter = ScanIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Scan::iter`]
pub struct ScanIter<'a> {
    cases: std::slice::Iter<'a, CaseSlot>,
    current: Option<std::slice::Iter<'a, Event>>,
    filter: Option<&'a EventFilter>,
}

impl<'a> Iterator for ScanIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(events) = self.current.as_mut() {
                for event in events.by_ref() {
                    if self.filter.map_or(true, |f| f.matches(event)) {
                        return Some(event);
                    }
                }
            }
            self.current = Some(self.cases.next()?.events.iter());
        }
    }
}
