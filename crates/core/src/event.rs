//! Event types for the ticket event log
//!
//! These types define the shape of one row of the event log. Field names and
//! their declaration order are the persisted layout shared with downstream
//! mining tools, so neither may change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wall-clock time of an event
pub type Timestamp = DateTime<Utc>;

/// Logical identity of an event: `(ticket_id, event_order)`
///
/// The event log declares no primary key of its own; this pair is enforced
/// as unique by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    /// Case identifier
    pub ticket_id: String,
    /// Position of the event within its case
    pub event_order: i64,
}

impl EventKey {
    /// Create a new key
    pub fn new(ticket_id: impl Into<String>, event_order: i64) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            event_order,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ticket_id, self.event_order)
    }
}

/// An accepted event in the log
///
/// Events are immutable once accepted. Every `Event` has passed validation,
/// so the mandatory fields are plain values here rather than options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Case identifier; groups events into a trace
    pub ticket_id: String,
    /// Organizational queue the ticket was in at event time
    pub queue_name: String,
    /// Name of the activity performed
    pub activity: String,
    /// Time the event occurred
    pub timestamp: Timestamp,
    /// Actor who performed the activity
    pub user_name: Option<String>,
    /// Team of the actor
    pub team: Option<String>,
    /// Case priority at event time
    pub priority: Option<String>,
    /// Case category
    pub category: Option<String>,
    /// Case status at event time
    pub status: Option<String>,
    /// Free-text annotation
    pub description: Option<String>,
    /// Sequence index of this event within its case
    pub event_order: i64,
    /// Elapsed time attributed to this activity, in seconds
    pub duration_sec: Option<i64>,
}

impl Event {
    /// Logical key of this event
    pub fn key(&self) -> EventKey {
        EventKey::new(self.ticket_id.clone(), self.event_order)
    }
}

/// A candidate event as produced by a log source
///
/// Every attribute is optional so that a record missing a mandatory field
/// deserializes cleanly and is rejected by validation instead of by the
/// parser. Use [`crate::validate`] to turn it into an [`Event`].
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ticketlog_core::NewEvent;
///
/// let candidate = NewEvent::new("T1", "Open", Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(), 1)
///     .queue_name("Q01")
///     .team("Network Ops");
/// assert_eq!(candidate.ticket_id.as_deref(), Some("T1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewEvent {
    /// Case identifier (mandatory)
    pub ticket_id: Option<String>,
    /// Queue name; stored as empty when absent
    pub queue_name: Option<String>,
    /// Activity name (mandatory)
    pub activity: Option<String>,
    /// Event time (mandatory)
    pub timestamp: Option<Timestamp>,
    /// Actor
    pub user_name: Option<String>,
    /// Team of the actor
    pub team: Option<String>,
    /// Case priority
    pub priority: Option<String>,
    /// Case category
    pub category: Option<String>,
    /// Case status
    pub status: Option<String>,
    /// Free-text annotation
    pub description: Option<String>,
    /// Sequence index within the case (required: half of the logical key)
    pub event_order: Option<i64>,
    /// Duration in seconds, non-negative when present
    pub duration_sec: Option<i64>,
}

impl NewEvent {
    /// Candidate with the key fields and timestamp filled in
    pub fn new(
        ticket_id: impl Into<String>,
        activity: impl Into<String>,
        timestamp: Timestamp,
        event_order: i64,
    ) -> Self {
        Self {
            ticket_id: Some(ticket_id.into()),
            activity: Some(activity.into()),
            timestamp: Some(timestamp),
            event_order: Some(event_order),
            ..Default::default()
        }
    }

    /// Set the queue name
    pub fn queue_name(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = Some(queue_name.into());
        self
    }

    /// Set the actor
    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// Set the team
    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Set the priority
    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Set the category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the status
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the duration in seconds
    pub fn duration_sec(mut self, duration_sec: i64) -> Self {
        self.duration_sec = Some(duration_sec);
        self
    }
}

impl From<Event> for NewEvent {
    fn from(e: Event) -> Self {
        Self {
            ticket_id: Some(e.ticket_id),
            queue_name: Some(e.queue_name),
            activity: Some(e.activity),
            timestamp: Some(e.timestamp),
            user_name: e.user_name,
            team: e.team,
            priority: e.priority,
            category: e.category,
            status: e.status,
            description: e.description,
            event_order: Some(e.event_order),
            duration_sec: e.duration_sec,
        }
    }
}
