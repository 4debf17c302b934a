//! Record validation
//!
//! Split in two stages:
//! 1. [`validate`]: checks that need only the record itself (mandatory
//!    fields, non-negative duration)
//! 2. [`check_neighbors`]: timestamp monotonicity against the stored events
//!    immediately before and after the record's `event_order`
//!
//! Key uniqueness needs the case index and is checked by the store.

use crate::error::ValidationError;
use crate::event::{Event, EventKey, NewEvent};
use crate::policy::OrderingPolicy;

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField { field }),
    }
}

/// Turn a candidate into an [`Event`], or report why it cannot represent a
/// real observation.
pub fn validate(candidate: NewEvent) -> Result<Event, ValidationError> {
    let ticket_id = required(candidate.ticket_id, "ticket_id")?;
    let activity = required(candidate.activity, "activity")?;
    let timestamp = candidate
        .timestamp
        .ok_or(ValidationError::MissingField { field: "timestamp" })?;
    let event_order = candidate
        .event_order
        .ok_or(ValidationError::MissingField {
            field: "event_order",
        })?;

    if let Some(duration_sec) = candidate.duration_sec {
        if duration_sec < 0 {
            return Err(ValidationError::NegativeDuration {
                key: EventKey::new(ticket_id, event_order),
                duration_sec,
            });
        }
    }

    Ok(Event {
        ticket_id,
        queue_name: candidate.queue_name.unwrap_or_default(),
        activity,
        timestamp,
        user_name: candidate.user_name,
        team: candidate.team,
        priority: candidate.priority,
        category: candidate.category,
        status: candidate.status,
        description: candidate.description,
        event_order,
        duration_sec: candidate.duration_sec,
    })
}

/// Check `event` against the stored events with the next lower and next
/// higher `event_order` in the same case.
///
/// Under [`OrderingPolicy::TrustOrder`] this always succeeds.
pub fn check_neighbors(
    event: &Event,
    predecessor: Option<&Event>,
    successor: Option<&Event>,
    policy: OrderingPolicy,
) -> Result<(), ValidationError> {
    if !policy.enforces_monotonic_time() {
        return Ok(());
    }

    let violation = |neighbor: &Event| ValidationError::OrderingViolation {
        key: event.key(),
        timestamp: event.timestamp,
        neighbor: neighbor.event_order,
        neighbor_timestamp: neighbor.timestamp,
    };

    if let Some(prev) = predecessor {
        if prev.timestamp > event.timestamp {
            return Err(violation(prev));
        }
    }
    if let Some(next) = successor {
        if next.timestamp < event.timestamp {
            return Err(violation(next));
        }
    }
    Ok(())
}
