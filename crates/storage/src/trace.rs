//! Trace view: the ordered events of one ticket

use std::sync::Arc;
use ticketlog_core::{Event, Timestamp};

/// Ordered sequence of events for one ticket
///
/// A `Trace` shares the store's copy of the case and is never modified after
/// it is handed out; later appends publish a new copy instead. It can be
/// iterated any number of times.
#[derive(Debug, Clone)]
pub struct Trace {
    ticket_id: Arc<str>,
    events: Arc<Vec<Event>>,
}

impl Trace {
    pub(crate) fn new(ticket_id: Arc<str>, events: Arc<Vec<Event>>) -> Self {
        Self { ticket_id, events }
    }

    pub(crate) fn empty(ticket_id: &str) -> Self {
        Self {
            ticket_id: Arc::from(ticket_id),
            events: Arc::new(Vec::new()),
        }
    }

    /// Ticket this trace belongs to
    pub fn ticket_id(&self) -> &str {
        &self.ticket_id
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True for an unknown ticket
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events in ascending `event_order`
    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Events as a slice
    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// First event by order
    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    /// Last event by order
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Activity labels in trace order
    pub fn activities(&self) -> impl Iterator<Item = &str> + '_ {
        self.events.iter().map(|e| e.activity.as_str())
    }

    /// Timestamps of the first and last event
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }

    /// Owned copy of the events
    pub fn to_vec(&self) -> Vec<Event> {
        self.events.as_ref().clone()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
