//! Raw records as they appear in ticket-system exports
//!
//! Exports name some columns differently (`user`, `queue_id`,
//! `assignment_group`), number tickets with plain integers, and carry
//! numbers as floats or strings. A [`RawRecord`] accepts all of that and
//! converts to a [`NewEvent`]; it does not check mandatory fields, which is
//! left to store validation. Columns it does not know (`sla_met`, ...) are
//! ignored.

use crate::error::{IngestError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use ticketlog_core::{NewEvent, Timestamp};

/// Naive layouts accepted for `timestamp`, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse RFC 3339 or a naive `YYYY-MM-DD HH:MM:SS[.fff]` timestamp
///
/// ```
/// use ticketlog_ingest::parse_timestamp;
///
/// let a = parse_timestamp("2024-01-01T10:00:00+02:00").unwrap();
/// let b = parse_timestamp("2024-01-01 08:00:00").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Integer column as exported: a JSON integer, a float, or a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IntLike {
    /// Plain integer
    Int(i64),
    /// Float; must have no fractional part
    Float(f64),
    /// Text holding either of the above
    Text(String),
}

impl IntLike {
    fn to_i64(&self, field: &'static str) -> Result<Option<i64>> {
        let invalid = |value: String| IngestError::InvalidInteger { field, value };
        match self {
            IntLike::Int(v) => Ok(Some(*v)),
            IntLike::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(*f as i64)),
            IntLike::Float(f) => Err(invalid(f.to_string())),
            IntLike::Text(s) if s.trim().is_empty() => Ok(None),
            IntLike::Text(s) => {
                let t = s.trim();
                if let Ok(v) = t.parse::<i64>() {
                    return Ok(Some(v));
                }
                match t.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
                    _ => Err(invalid(s.clone())),
                }
            }
        }
    }
}

/// Identifier column: text, or a number as written by generators that count tickets
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextLike {
    /// Plain text
    Text(String),
    /// Integer id
    Int(i64),
    /// Float id, as spreadsheets tend to write integers
    Float(f64),
}

impl TextLike {
    fn into_text(self) -> String {
        match self {
            TextLike::Text(s) => s,
            TextLike::Int(v) => v.to_string(),
            TextLike::Float(f) if f.fract() == 0.0 && f.is_finite() => (f as i64).to_string(),
            TextLike::Float(f) => f.to_string(),
        }
    }
}

/// One row of a ticket-system export
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Case identifier
    pub ticket_id: Option<TextLike>,
    /// Queue; exports may call it `queue_id`
    #[serde(alias = "queue_id")]
    pub queue_name: Option<String>,
    /// Activity name
    pub activity: Option<String>,
    /// Timestamp text
    pub timestamp: Option<String>,
    /// Actor; exports may call it `user`
    #[serde(alias = "user")]
    pub user_name: Option<String>,
    /// Team; exports may call it `assignment_group`
    #[serde(alias = "assignment_group")]
    pub team: Option<String>,
    /// Priority
    pub priority: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Status
    pub status: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Position within the case
    pub event_order: Option<IntLike>,
    /// Duration in seconds
    pub duration_sec: Option<IntLike>,
}

impl RawRecord {
    /// Convert to a store candidate
    ///
    /// # Errors
    ///
    /// - `InvalidTimestamp`: `timestamp` is present and unparseable
    /// - `InvalidInteger`: `event_order` or `duration_sec` is not a whole number
    pub fn into_candidate(self) -> Result<NewEvent> {
        let timestamp = match self.timestamp {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(parse_timestamp(&raw).ok_or(IngestError::InvalidTimestamp(raw))?),
            None => None,
        };
        let event_order = match &self.event_order {
            Some(v) => v.to_i64("event_order")?,
            None => None,
        };
        let duration_sec = match &self.duration_sec {
            Some(v) => v.to_i64("duration_sec")?,
            None => None,
        };

        Ok(NewEvent {
            ticket_id: self.ticket_id.map(TextLike::into_text),
            queue_name: self.queue_name,
            activity: self.activity,
            timestamp,
            user_name: self.user_name,
            team: self.team,
            priority: self.priority,
            category: self.category,
            status: self.status,
            description: self.description,
            event_order,
            duration_sec,
        })
    }
}
