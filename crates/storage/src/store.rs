//! Validated event log store
//!
//! # Design
//!
//! - Index: ticket id → position in a first-seen case list
//! - Each case: `Arc<Vec<Event>>` kept sorted by `event_order`
//! - Writer: one `Mutex` serialises validate → persist → publish
//! - Readers: take the `RwLock` read guard only long enough to clone `Arc`s
//!
//! # Append Sequence
//!
//! ```text
//! 1. validate() - mandatory fields, non-negative duration (no lock)
//! 2. lock writer
//! 3. locate insert position by binary search; duplicate order → reject
//! 4. check_neighbors() - timestamp monotonicity per OrderingPolicy
//! 5. build the new case vector (copy-on-write)
//! 6. sink.persist() - durable backing, failure aborts
//! 7. write guard: swap the case Arc, bump len/version
//! ```
//!
//! Nothing is visible to readers before step 7, so a failure in steps 1-6
//! leaves the store exactly as it was.

use crate::sink::EventSink;
use crate::snapshot::{CaseSlot, Scan, StoreSnapshot};
use crate::trace::Trace;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use ticketlog_core::{
    check_neighbors, validate, Event, EventFilter, EventKey, InvalidFilterError, NewEvent,
    OrderingPolicy, Result, ValidationError,
};
use tracing::{debug, warn};

/// Shared, append-only store of ticket events
///
/// # Thread Safety
///
/// `EventLogStore` is `Send + Sync`. Appends are serialised; reads run
/// concurrently with each other and with an in-flight append, and always
/// observe a state that existed at some point (never a half-applied record).
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use ticketlog_core::NewEvent;
/// use ticketlog_storage::EventLogStore;
///
/// let store = EventLogStore::new();
/// store.append(NewEvent::new("T1", "Open", Utc::now(), 1)).unwrap();
/// assert_eq!(store.get_trace("T1").len(), 1);
/// assert!(store.get_trace("T2").is_empty());
/// ```
pub struct EventLogStore {
    state: RwLock<StoreSnapshot>,
    /// Writer lock; also guards the sink so it cannot change mid-append
    writer: Mutex<Option<Arc<dyn EventSink>>>,
    policy: OrderingPolicy,
}

impl EventLogStore {
    /// Empty store with the default ordering policy
    pub fn new() -> Self {
        Self::with_policy(OrderingPolicy::default())
    }

    /// Empty store with an explicit ordering policy
    pub fn with_policy(policy: OrderingPolicy) -> Self {
        Self {
            state: RwLock::new(StoreSnapshot::default()),
            writer: Mutex::new(None),
            policy,
        }
    }

    /// Ordering policy applied on append
    pub fn policy(&self) -> OrderingPolicy {
        self.policy
    }

    /// Route every subsequently accepted event through `sink`
    pub fn attach_sink(&self, sink: Arc<dyn EventSink>) {
        *self.writer.lock() = Some(sink);
    }

    /// Stop persisting accepted events
    pub fn detach_sink(&self) -> Option<Arc<dyn EventSink>> {
        self.writer.lock().take()
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Validate and add one record
    ///
    /// Returns the accepted event. On error nothing is stored.
    ///
    /// # Errors
    ///
    /// - `Validation(MissingField)`: ticket_id, activity, timestamp or event_order absent
    /// - `Validation(NegativeDuration)`: duration_sec < 0
    /// - `Validation(DuplicateKey)`: (ticket_id, event_order) already stored
    /// - `Validation(OrderingViolation)`: timestamp out of order under `OrderingPolicy::Reject`
    /// - any error returned by the attached sink
    pub fn append(&self, candidate: NewEvent) -> Result<Event> {
        let event = validate(candidate)?;

        let sink = self.writer.lock();

        let (slot, current) = {
            let state = self.state.read();
            match state.index.get(event.ticket_id.as_str()) {
                Some(&i) => (Some(i), state.cases[i].events.clone()),
                None => (None, Arc::new(Vec::new())),
            }
        };

        let pos = match current.binary_search_by_key(&event.event_order, |e| e.event_order) {
            Ok(_) => {
                return Err(ValidationError::DuplicateKey { key: event.key() }.into());
            }
            Err(pos) => pos,
        };

        let predecessor = pos.checked_sub(1).map(|i| &current[i]);
        let successor = current.get(pos);
        check_neighbors(&event, predecessor, successor, self.policy)?;
        if !self.policy.enforces_monotonic_time()
            && check_neighbors(&event, predecessor, successor, OrderingPolicy::Reject).is_err()
        {
            warn!(
                key = %event.key(),
                timestamp = %event.timestamp,
                "Accepting event whose timestamp disagrees with event_order"
            );
        }

        let mut events = Vec::with_capacity(current.len() + 1);
        events.extend_from_slice(&current[..pos]);
        events.push(event.clone());
        events.extend_from_slice(&current[pos..]);
        drop(current);

        if let Some(sink) = sink.as_ref() {
            sink.persist(&event)?;
        }

        let mut state = self.state.write();
        let events = Arc::new(events);
        match slot {
            Some(i) => {
                Arc::make_mut(&mut state.cases)[i].events = events;
            }
            None => {
                let ticket_id: Arc<str> = Arc::from(event.ticket_id.as_str());
                let i = state.cases.len();
                Arc::make_mut(&mut state.cases).push(CaseSlot {
                    ticket_id: ticket_id.clone(),
                    events,
                });
                Arc::make_mut(&mut state.index).insert(ticket_id, i);
                debug!(ticket_id = %event.ticket_id, "New case");
            }
        }
        state.len += 1;
        state.version += 1;

        Ok(event)
    }

    /// Append records one by one
    ///
    /// Each record succeeds or fails on its own; a rejected record does not
    /// undo earlier ones. Results are returned in input order.
    pub fn append_batch<I>(&self, candidates: I) -> Vec<Result<Event>>
    where
        I: IntoIterator<Item = NewEvent>,
    {
        candidates.into_iter().map(|c| self.append(c)).collect()
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Consistent view of the whole store
    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.read().clone()
    }

    /// Ordered events for `ticket_id`; empty when the ticket is unknown
    pub fn get_trace(&self, ticket_id: &str) -> Trace {
        let state = self.state.read();
        match state.index.get(ticket_id) {
            Some(&i) => {
                let slot = &state.cases[i];
                Trace::new(slot.ticket_id.clone(), slot.events.clone())
            }
            None => Trace::empty(ticket_id),
        }
    }

    /// Events matching `filter` (all events for `None`), cases in first-seen
    /// order and events by `event_order` within a case
    pub fn scan(&self, filter: Option<EventFilter>) -> std::result::Result<Scan, InvalidFilterError> {
        let cases = self.state.read().cases.clone();
        Scan::new(cases, filter)
    }

    /// Distinct ticket ids, in first-seen order
    pub fn case_ids(&self) -> Vec<String> {
        self.snapshot().case_ids()
    }

    /// Whether an event with this key is stored
    pub fn contains(&self, key: &EventKey) -> bool {
        self.snapshot().contains(key)
    }

    /// Number of events in one case
    pub fn trace_len(&self, ticket_id: &str) -> usize {
        let state = self.state.read();
        state
            .index
            .get(ticket_id)
            .map(|&i| state.cases[i].events.len())
            .unwrap_or(0)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.state.read().len
    }

    /// True when no event is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct tickets
    pub fn case_count(&self) -> usize {
        self.state.read().cases.len()
    }

    /// Number of accepted appends so far
    pub fn version(&self) -> u64 {
        self.state.read().version
    }
}

impl Default for EventLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("EventLogStore")
            .field("len", &state.len)
            .field("cases", &state.cases.len())
            .field("version", &state.version)
            .field("policy", &self.policy)
            .finish()
    }
}
