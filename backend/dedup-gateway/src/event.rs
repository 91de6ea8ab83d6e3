//! Wire decoding and validation of inbound frames into `dedup_store::EventRecord`.

use chrono::{DateTime, Utc};
use dedup_store::EventRecord;
use serde::Deserialize;

const MAX_EVENT_ID_LEN: usize = 255;
const MAX_EVENT_TYPE_LEN: usize = 100;

#[derive(Debug, Deserialize)]
struct EventFrame {
    event_id: Option<String>,
    event_type: Option<String>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    created_at: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    InvalidJson,
    MissingEventId,
    MissingEventType,
    EventIdTooLong,
    EventTypeTooLong,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DecodeError::InvalidJson => "invalid JSON",
            DecodeError::MissingEventId => "missing event_id",
            DecodeError::MissingEventType => "missing event_type",
            DecodeError::EventIdTooLong => "event_id exceeds 255 bytes",
            DecodeError::EventTypeTooLong => "event_type exceeds 100 bytes",
        };
        write!(f, "{msg}")
    }
}

/// Decode and validate one text frame. A malformed `created_at` is dropped,
/// not fatal — it is advisory only (spec.md §4.A).
pub fn decode(text: &str) -> Result<EventRecord, DecodeError> {
    let frame: EventFrame = serde_json::from_str(text).map_err(|_| DecodeError::InvalidJson)?;

    let event_id = frame.event_id.filter(|s| !s.is_empty()).ok_or(DecodeError::MissingEventId)?;
    if event_id.len() > MAX_EVENT_ID_LEN {
        return Err(DecodeError::EventIdTooLong);
    }

    let event_type = frame
        .event_type
        .filter(|s| !s.is_empty())
        .ok_or(DecodeError::MissingEventType)?;
    if event_type.len() > MAX_EVENT_TYPE_LEN {
        return Err(DecodeError::EventTypeTooLong);
    }

    let payload = frame.payload.unwrap_or_else(|| serde_json::json!({}));
    let created_at = frame
        .created_at
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(EventRecord {
        event_id,
        event_type,
        payload,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_frame() {
        let record = decode(r#"{"event_id":"E1","event_type":"t","payload":{"a":1}}"#).unwrap();
        assert_eq!(record.event_id, "E1");
        assert_eq!(record.event_type, "t");
        assert_eq!(record.payload, serde_json::json!({"a": 1}));
        assert!(record.created_at.is_none());
    }

    #[test]
    fn payload_defaults_to_empty_object() {
        let record = decode(r#"{"event_id":"E1","event_type":"t"}"#).unwrap();
        assert_eq!(record.payload, serde_json::json!({}));
    }

    #[test]
    fn rejects_missing_event_id() {
        assert_eq!(
            decode(r#"{"event_type":"t"}"#).unwrap_err(),
            DecodeError::MissingEventId
        );
    }

    #[test]
    fn rejects_empty_event_id() {
        assert_eq!(
            decode(r#"{"event_id":"","event_type":"t"}"#).unwrap_err(),
            DecodeError::MissingEventId
        );
    }

    #[test]
    fn rejects_missing_event_type() {
        assert_eq!(
            decode(r#"{"event_id":"E1"}"#).unwrap_err(),
            DecodeError::MissingEventType
        );
    }

    #[test]
    fn rejects_oversized_event_id() {
        let huge = "x".repeat(256);
        let frame = serde_json::json!({"event_id": huge, "event_type": "t"}).to_string();
        assert_eq!(decode(&frame).unwrap_err(), DecodeError::EventIdTooLong);
    }

    #[test]
    fn accepts_event_id_at_the_maximum() {
        let max = "x".repeat(255);
        let frame = serde_json::json!({"event_id": max, "event_type": "t"}).to_string();
        assert!(decode(&frame).is_ok());
    }

    #[test]
    fn malformed_timestamp_is_dropped_not_fatal() {
        let frame = r#"{"event_id":"E1","event_type":"t","created_at":"not-a-date"}"#;
        let record = decode(frame).unwrap();
        assert!(record.created_at.is_none());
    }

    #[test]
    fn well_formed_timestamp_is_parsed() {
        let frame = r#"{"event_id":"E1","event_type":"t","created_at":"2026-01-01T00:00:00Z"}"#;
        let record = decode(frame).unwrap();
        assert!(record.created_at.is_some());
    }

    #[test]
    fn rejects_invalid_json() {
        assert_eq!(decode("not json").unwrap_err(), DecodeError::InvalidJson);
    }
}
