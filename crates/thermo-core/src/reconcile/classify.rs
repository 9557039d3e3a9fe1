// ── Message classification ──
//
// The controller multiplexes telemetry and alarms on one channel with no
// type tag. Decoding happens once, here, into `Inbound`; consumers match
// on the variant and never probe fields themselves.

use serde_json::Value;
use thermo_api::{AlarmFrame, TelemetryFrame};
use thiserror::Error;

/// Key whose non-empty string value marks a payload as an alarm.
pub const ALARM_KEY: &str = "alarmDescription";

/// One decoded inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Alarm(AlarmFrame),
    Telemetry(TelemetryFrame),
}

/// A payload that cannot be decoded. Dropped by the caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("malformed {kind} payload: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode and classify raw payload text.
pub fn classify(payload: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(payload).map_err(DecodeError::Json)?;
    classify_value(value)
}

/// Classify an already-parsed JSON value.
///
/// An object with a non-empty string under `alarmDescription` is an
/// alarm; every other object is telemetry.
pub fn classify_value(value: Value) -> Result<Inbound, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::NotAnObject(json_kind(&value)));
    }

    let is_alarm = value
        .get(ALARM_KEY)
        .and_then(Value::as_str)
        .is_some_and(|d| !d.is_empty());

    if is_alarm {
        serde_json::from_value(value)
            .map(Inbound::Alarm)
            .map_err(|source| DecodeError::Shape {
                kind: "alarm",
                source,
            })
    } else {
        serde_json::from_value(value)
            .map(Inbound::Telemetry)
            .map_err(|source| DecodeError::Shape {
                kind: "telemetry",
                source,
            })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn description_routes_to_alarm() {
        let inbound = classify(r#"{"alarmDescription": "High Temp"}"#).unwrap();
        match inbound {
            Inbound::Alarm(frame) => assert_eq!(frame.alarm_description, "High Temp"),
            Inbound::Telemetry(_) => panic!("expected alarm"),
        }
    }

    #[test]
    fn temperature_routes_to_telemetry() {
        let inbound = classify(r#"{"temperature": 24.5}"#).unwrap();
        match inbound {
            Inbound::Telemetry(frame) => assert_eq!(frame.temperature, Some(24.5)),
            Inbound::Alarm(_) => panic!("expected telemetry"),
        }
    }

    #[test]
    fn empty_description_is_telemetry() {
        let inbound = classify(r#"{"alarmDescription": ""}"#).unwrap();
        assert!(matches!(inbound, Inbound::Telemetry(_)));
    }

    #[test]
    fn non_string_description_is_telemetry() {
        let inbound = classify(r#"{"alarmDescription": 7, "temperature": 20.0}"#).unwrap();
        assert!(matches!(inbound, Inbound::Telemetry(_)));
    }

    #[test]
    fn mixed_payload_is_an_alarm() {
        // Only the description decides; telemetry keys alongside it are ignored.
        let inbound =
            classify(r#"{"alarmDescription": "Window open", "temperature": 19.0}"#).unwrap();
        assert!(matches!(inbound, Inbound::Alarm(_)));
    }

    #[test]
    fn empty_object_is_telemetry() {
        let inbound = classify("{}").unwrap();
        assert_eq!(inbound, Inbound::Telemetry(TelemetryFrame::default()));
    }

    #[test]
    fn malformed_payloads_fail_to_decode() {
        assert!(matches!(classify("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(classify("[1, 2]"), Err(DecodeError::NotAnObject("array"))));
        assert!(matches!(
            classify(r#""Server says: hi""#),
            Err(DecodeError::NotAnObject("string"))
        ));
        assert!(matches!(
            classify(r#"{"temperature": "warm"}"#),
            Err(DecodeError::Shape { kind: "telemetry", .. })
        ));
        assert!(matches!(
            classify(r#"{"alarmDescription": "Door open", "timestamp": 12}"#),
            Err(DecodeError::Shape { kind: "alarm", .. })
        ));
    }
}
