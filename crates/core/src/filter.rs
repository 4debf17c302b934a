//! Scan predicates
//!
//! An [`EventFilter`] is a conjunction of optional criteria over the event
//! attributes. An empty filter matches everything.
//!
//! Exact-match values must be non-empty. Events stored without a queue have
//! an empty `queue_name`; select them with [`EventFilter::queue_absent`].
//!
//! Filters can be built programmatically or parsed from a compact textual
//! form, one `key=value` clause per `;`:
//!
//! ```
//! use ticketlog_core::EventFilter;
//!
//! let filter: EventFilter = "team=Network Ops; priority=P1; from=2024-01-01T00:00:00Z"
//!     .parse()
//!     .unwrap();
//! assert_eq!(filter.team.as_deref(), Some("Network Ops"));
//! ```

use crate::error::InvalidFilterError;
use crate::event::{Event, Timestamp};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Conjunctive predicate over event attributes
#[derive(Clone, Default)]
pub struct EventFilter {
    /// Exact `ticket_id`
    pub ticket_id: Option<String>,
    /// Exact `queue_name`
    pub queue_name: Option<String>,
    /// Only events stored without a queue (empty `queue_name`)
    pub queue_absent: bool,
    /// Exact `activity`
    pub activity: Option<String>,
    /// Exact `user_name`
    pub user_name: Option<String>,
    /// Exact `team`
    pub team: Option<String>,
    /// Exact `priority`
    pub priority: Option<String>,
    /// Exact `category`
    pub category: Option<String>,
    /// Exact `status`
    pub status: Option<String>,
    /// Inclusive lower time bound
    pub from: Option<Timestamp>,
    /// Exclusive upper time bound
    pub until: Option<Timestamp>,
    /// Inclusive lower duration bound, seconds
    pub min_duration_sec: Option<i64>,
    /// Inclusive upper duration bound, seconds
    pub max_duration_sec: Option<i64>,
    predicate: Option<Predicate>,
}

impl EventFilter {
    /// Filter that matches every event
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to one ticket
    pub fn ticket_id(mut self, v: impl Into<String>) -> Self {
        self.ticket_id = Some(v.into());
        self
    }

    /// Restrict to one queue
    pub fn queue_name(mut self, v: impl Into<String>) -> Self {
        self.queue_name = Some(v.into());
        self
    }

    /// Restrict to events that were stored without a queue
    pub fn queue_absent(mut self) -> Self {
        self.queue_absent = true;
        self
    }

    /// Restrict to one activity
    pub fn activity(mut self, v: impl Into<String>) -> Self {
        self.activity = Some(v.into());
        self
    }

    /// Restrict to one actor
    pub fn user_name(mut self, v: impl Into<String>) -> Self {
        self.user_name = Some(v.into());
        self
    }

    /// Restrict to one team
    pub fn team(mut self, v: impl Into<String>) -> Self {
        self.team = Some(v.into());
        self
    }

    /// Restrict to one priority
    pub fn priority(mut self, v: impl Into<String>) -> Self {
        self.priority = Some(v.into());
        self
    }

    /// Restrict to one category
    pub fn category(mut self, v: impl Into<String>) -> Self {
        self.category = Some(v.into());
        self
    }

    /// Restrict to one status
    pub fn status(mut self, v: impl Into<String>) -> Self {
        self.status = Some(v.into());
        self
    }

    /// Events at or after `from`
    pub fn from(mut self, from: Timestamp) -> Self {
        self.from = Some(from);
        self
    }

    /// Events strictly before `until`
    pub fn until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    /// Events with `duration_sec >= secs`
    pub fn min_duration_sec(mut self, secs: i64) -> Self {
        self.min_duration_sec = Some(secs);
        self
    }

    /// Events with `duration_sec <= secs`
    pub fn max_duration_sec(mut self, secs: i64) -> Self {
        self.max_duration_sec = Some(secs);
        self
    }

    /// Add an arbitrary predicate, AND-ed with the other criteria
    pub fn matching<F>(mut self, f: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(f));
        self
    }

    /// Check the filter is well-formed
    pub fn validate(&self) -> Result<(), InvalidFilterError> {
        let exact = [
            ("ticket_id", &self.ticket_id),
            ("queue_name", &self.queue_name),
            ("activity", &self.activity),
            ("user_name", &self.user_name),
            ("team", &self.team),
            ("priority", &self.priority),
            ("category", &self.category),
            ("status", &self.status),
        ];
        for (field, value) in exact {
            if matches!(value, Some(v) if v.is_empty()) {
                return Err(InvalidFilterError::EmptyValue { field });
            }
        }

        if self.queue_absent && self.queue_name.is_some() {
            return Err(InvalidFilterError::Conflicting("queue_name", "queue_absent"));
        }

        if let (Some(from), Some(until)) = (self.from, self.until) {
            if from >= until {
                return Err(InvalidFilterError::EmptyTimeRange { from, until });
            }
        }

        for (field, bound) in [
            ("min_duration_sec", self.min_duration_sec),
            ("max_duration_sec", self.max_duration_sec),
        ] {
            if let Some(value) = bound {
                if value < 0 {
                    return Err(InvalidFilterError::NegativeDurationBound { field, value });
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_duration_sec, self.max_duration_sec) {
            if min > max {
                return Err(InvalidFilterError::InvertedDurationRange { min, max });
            }
        }

        Ok(())
    }

    /// Whether `event` satisfies every criterion
    pub fn matches(&self, event: &Event) -> bool {
        fn eq(want: &Option<String>, got: &str) -> bool {
            want.as_deref().map_or(true, |w| w == got)
        }
        fn eq_opt(want: &Option<String>, got: &Option<String>) -> bool {
            match want {
                None => true,
                Some(w) => got.as_deref() == Some(w.as_str()),
            }
        }

        eq(&self.ticket_id, &event.ticket_id)
            && eq(&self.queue_name, &event.queue_name)
            && (!self.queue_absent || event.queue_name.is_empty())
            && eq(&self.activity, &event.activity)
            && eq_opt(&self.user_name, &event.user_name)
            && eq_opt(&self.team, &event.team)
            && eq_opt(&self.priority, &event.priority)
            && eq_opt(&self.category, &event.category)
            && eq_opt(&self.status, &event.status)
            && self.from.map_or(true, |from| event.timestamp >= from)
            && self.until.map_or(true, |until| event.timestamp < until)
            && self.duration_in_bounds(event.duration_sec)
            && self.predicate.as_ref().map_or(true, |p| p(event))
    }

    fn duration_in_bounds(&self, duration: Option<i64>) -> bool {
        if self.min_duration_sec.is_none() && self.max_duration_sec.is_none() {
            return true;
        }
        match duration {
            None => false,
            Some(d) => {
                self.min_duration_sec.map_or(true, |min| d >= min)
                    && self.max_duration_sec.map_or(true, |max| d <= max)
            }
        }
    }

    /// True when no criterion is set
    pub fn is_unrestricted(&self) -> bool {
        self.ticket_id.is_none()
            && self.queue_name.is_none()
            && !self.queue_absent
            && self.activity.is_none()
            && self.user_name.is_none()
            && self.team.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.from.is_none()
            && self.until.is_none()
            && self.min_duration_sec.is_none()
            && self.max_duration_sec.is_none()
            && self.predicate.is_none()
    }
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventFilter")
            .field("ticket_id", &self.ticket_id)
            .field("queue_name", &self.queue_name)
            .field("queue_absent", &self.queue_absent)
            .field("activity", &self.activity)
            .field("user_name", &self.user_name)
            .field("team", &self.team)
            .field("priority", &self.priority)
            .field("category", &self.category)
            .field("status", &self.status)
            .field("from", &self.from)
            .field("until", &self.until)
            .field("min_duration_sec", &self.min_duration_sec)
            .field("max_duration_sec", &self.max_duration_sec)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

fn parse_time(key: &str, value: &str) -> Result<Timestamp, InvalidFilterError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| InvalidFilterError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_secs(key: &str, value: &str) -> Result<i64, InvalidFilterError> {
    value.parse().map_err(|_| InvalidFilterError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl FromStr for EventFilter {
    type Err = InvalidFilterError;

    /// Parse `key=value` clauses separated by `;`. Whitespace around keys and
    /// values is trimmed. The result is validated before it is returned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = EventFilter::all();

        for clause in s.split(';') {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            let (key, value) = clause
                .split_once('=')
                .ok_or_else(|| InvalidFilterError::MalformedClause(clause.to_string()))?;
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() {
                return Err(InvalidFilterError::MalformedClause(clause.to_string()));
            }

            match key {
                "ticket_id" | "ticket" => filter.ticket_id = Some(value.to_string()),
                "queue_name" | "queue" => filter.queue_name = Some(value.to_string()),
                "queue_absent" => {
                    filter.queue_absent = value.parse().map_err(|_| InvalidFilterError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?
                }
                "activity" => filter.activity = Some(value.to_string()),
                "user_name" | "user" => filter.user_name = Some(value.to_string()),
                "team" => filter.team = Some(value.to_string()),
                "priority" => filter.priority = Some(value.to_string()),
                "category" => filter.category = Some(value.to_string()),
                "status" => filter.status = Some(value.to_string()),
                "from" => filter.from = Some(parse_time(key, value)?),
                "until" => filter.until = Some(parse_time(key, value)?),
                "min_duration_sec" | "min_duration" => {
                    filter.min_duration_sec = Some(parse_secs(key, value)?)
                }
                "max_duration_sec" | "max_duration" => {
                    filter.max_duration_sec = Some(parse_secs(key, value)?)
                }
                other => return Err(InvalidFilterError::UnknownKey(other.to_string())),
            }
        }

        filter.validate()?;
        Ok(filter)
    }
}
