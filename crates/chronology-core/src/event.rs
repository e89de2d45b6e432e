//! Scheduled events and the raw rows they are normalized from.
//!
//! An [`Event`] is a `(timestamp, action)` pair with no identity beyond its
//! two fields. A subject's queue is an [`EventList`] kept in storage order;
//! nothing here ever sorts by time.

use crate::error::{ChronologyError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Unix seconds, UTC.
    #[serde(deserialize_with = "deserialize_epoch")]
    pub timestamp: i64,
    pub action: String,
}

impl Event {
    pub fn new(timestamp: i64, action: impl Into<String>) -> Self {
        Self {
            timestamp,
            action: action.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.action, self.timestamp)
    }
}

pub type EventList = Vec<Event>;

/// Stored timestamps may be integers or numeric strings.
fn deserialize_epoch<'de, D>(d: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Int(i64),
        Text(String),
    }

    match Epoch::deserialize(d)? {
        Epoch::Int(n) => Ok(n),
        Epoch::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("non-numeric timestamp '{s}'"))),
    }
}

// ---------------------------------------------------------------------------
// EventContext
// ---------------------------------------------------------------------------

/// Correlating context handed to the scheduling facility with every
/// register/deregister call. Built from the subject id alone, so all events
/// of one subject share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub subject_id: u64,
}

impl EventContext {
    pub fn for_subject(subject_id: u64) -> Self {
        Self { subject_id }
    }
}

// ---------------------------------------------------------------------------
// Stored shape
// ---------------------------------------------------------------------------

/// Coerce a stored value into an event list.
///
/// Missing values, scalars and maps become an empty list. Array elements that
/// do not decode as events are skipped.
pub fn decode_event_list(value: Option<serde_json::Value>) -> EventList {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Event>(item) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed stored event");
                    None
                }
            })
            .collect(),
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(other) => {
            tracing::warn!(value = %other, "stored queue is not a list; treating as empty");
            Vec::new()
        }
    }
}

pub fn encode_event_list(events: &[Event]) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(events)?)
}

// ---------------------------------------------------------------------------
// RawEntry
// ---------------------------------------------------------------------------

/// One submitted row, before validation. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "deserialize_loose_string")]
    pub action: Option<String>,
}

impl RawEntry {
    pub fn new(timestamp: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            action: Some(action.into()),
        }
    }
}

/// Form values arrive as strings, but numbers and booleans are tolerated.
fn deserialize_loose_string<'de, D>(d: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(if b { "1".into() } else { String::new() }),
        Some(_) => None,
    })
}

/// Parse a whole submission.
///
/// Accepts a JSON array of rows or an object of arbitrarily-keyed rows. Row
/// keys carry no meaning; object rows keep the order they were posted in.
/// Rows that are not objects become empty entries and are dropped during
/// normalization.
pub fn parse_submission(value: &serde_json::Value) -> Result<Vec<RawEntry>> {
    let rows: Vec<&serde_json::Value> = match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        serde_json::Value::Object(map) => map.values().collect(),
        other => {
            return Err(ChronologyError::InvalidSubmission(format!(
                "expected a list or map of rows, got {other}"
            )))
        }
    };
    Ok(rows
        .into_iter()
        .map(|row| serde_json::from_value(row.clone()).unwrap_or_default())
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_compare_on_both_fields() {
        assert_eq!(Event::new(10, "publish_post"), Event::new(10, "publish_post"));
        assert_ne!(Event::new(10, "publish_post"), Event::new(11, "publish_post"));
        assert_ne!(Event::new(10, "publish_post"), Event::new(10, "trash_post"));
    }

    #[test]
    fn decode_missing_value_is_empty() {
        assert!(decode_event_list(None).is_empty());
        assert!(decode_event_list(Some(serde_json::Value::Null)).is_empty());
    }

    #[test]
    fn decode_scalar_value_is_empty() {
        assert!(decode_event_list(Some(json!("foo"))).is_empty());
        assert!(decode_event_list(Some(json!(42))).is_empty());
        assert!(decode_event_list(Some(json!({"timestamp": 1, "action": "a"}))).is_empty());
    }

    #[test]
    fn decode_accepts_numeric_string_timestamps() {
        let events = decode_event_list(Some(json!([
            {"timestamp": "1700000000", "action": "publish_post"},
            {"timestamp": 1700000060, "action": "trash_post"},
        ])));
        assert_eq!(
            events,
            vec![
                Event::new(1_700_000_000, "publish_post"),
                Event::new(1_700_000_060, "trash_post"),
            ]
        );
    }

    #[test]
    fn decode_skips_malformed_elements_and_keeps_order() {
        let events = decode_event_list(Some(json!([
            {"timestamp": 30, "action": "c"},
            "foo",
            {"timestamp": "soon", "action": "b"},
            {"timestamp": 10, "action": "a"},
        ])));
        assert_eq!(events, vec![Event::new(30, "c"), Event::new(10, "a")]);
    }

    #[test]
    fn encode_then_decode_preserves_list() {
        let list = vec![Event::new(5, "b"), Event::new(1, "a"), Event::new(5, "b")];
        let value = encode_event_list(&list).unwrap();
        assert_eq!(decode_event_list(Some(value)), list);
    }

    #[test]
    fn parse_submission_from_keyed_rows() {
        let rows = parse_submission(&json!({
            "row-a": {"timestamp": "2026-01-01 09:00", "action": "publish_post"},
            "row-b": {"action": "trash_post"},
        }))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawEntry::new("2026-01-01 09:00", "publish_post"));
        assert_eq!(rows[1].timestamp, None);
    }

    #[test]
    fn parse_submission_keeps_object_rows_in_posted_order() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{"10": {"timestamp": "1", "action": "ten"},
                "9": {"timestamp": "2", "action": "nine"},
                "row-a": {"timestamp": "3", "action": "a"}}"#,
        )
        .unwrap();
        let actions: Vec<_> = parse_submission(&value)
            .unwrap()
            .into_iter()
            .filter_map(|row| row.action)
            .collect();
        assert_eq!(actions, vec!["ten", "nine", "a"]);
    }

    #[test]
    fn parse_submission_tolerates_odd_rows() {
        let rows = parse_submission(&json!([
            {"timestamp": 1700000000, "action": "publish_post"},
            "not a row",
        ]))
        .unwrap();
        assert_eq!(rows[0].timestamp.as_deref(), Some("1700000000"));
        assert_eq!(rows[1], RawEntry::default());
    }

    #[test]
    fn parse_submission_rejects_scalars() {
        let err = parse_submission(&json!("nope")).unwrap_err();
        assert!(matches!(err, ChronologyError::InvalidSubmission(_)));
    }

    #[test]
    fn context_serializes_subject_id() {
        let value = serde_json::to_value(EventContext::for_subject(123)).unwrap();
        assert_eq!(value, json!({"subject_id": 123}));
    }
}
