// Wire types for the controller's HTTP endpoints and event stream.
//
// Field names follow the controller's JSON exactly; every telemetry
// field is optional because the device only reports what changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Partial telemetry snapshot pushed on the event stream.
///
/// An absent or `null` key means "no change" to the receiver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryFrame {
    pub temperature: Option<f64>,
    /// `"on"` when someone is present; any other value means absent.
    pub switch_someone_present: Option<String>,
    /// `"on"` when the window contact is active.
    pub switch_window: Option<String>,
    /// Fan LED bit-mask as reported by the device.
    pub leds_on: Option<u64>,
    /// Wire mode token: `manual`, `auto` or `pid`.
    pub mode: Option<String>,
    /// Last PID controller output, in percent.
    pub pid_value: Option<f64>,
    pub device_id: Option<String>,
    pub status_message: Option<String>,
}

impl TelemetryFrame {
    /// True when the frame carries none of the known telemetry fields,
    /// e.g. a relay acknowledgement like `{"data": "..."}`.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Alarm event pushed on the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmFrame {
    #[serde(rename = "alarmDescription")]
    pub alarm_description: String,

    /// Device-local timestamp string, passed through untouched.
    #[serde(default)]
    pub timestamp: Option<String>,

    /// All remaining fields the controller sends.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Gains and setpoint for the controller's PID loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidParams {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub target_temp: f64,
}

impl Default for PidParams {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.1,
            kd: 0.01,
            target_temp: 22.0,
        }
    }
}

/// One point of the recent temperature history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureSample {
    #[serde(deserialize_with = "deserialize_sample_time")]
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Acknowledgement body of `POST /mode`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModeAck {
    pub mode: Option<String>,
}

/// Acknowledgement body of `POST /manual_speed`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FanSpeedAck {
    pub fan_speed: Option<u8>,
}

/// Error body the controller attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// History timestamps arrive as RFC 3339 or, from Flask's `jsonify`,
/// as RFC 2822 HTTP dates (`Tue, 15 Oct 2024 10:00:00 GMT`).
fn deserialize_sample_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .or_else(|_| DateTime::parse_from_rfc2822(&raw))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| serde::de::Error::custom(format!("invalid sample time {raw:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn telemetry_frame_tolerates_missing_and_null_fields() {
        let frame: TelemetryFrame =
            serde_json::from_str(r#"{"temperature": 23.1, "mode": null, "extra": 1}"#).unwrap();
        assert_eq!(frame.temperature, Some(23.1));
        assert!(frame.mode.is_none());
        assert!(frame.leds_on.is_none());
    }

    #[test]
    fn frame_without_known_fields_is_empty() {
        let ack: TelemetryFrame =
            serde_json::from_str(r#"{"data": "Response from server"}"#).unwrap();
        assert!(ack.is_empty());

        let nulls: TelemetryFrame = serde_json::from_str(r#"{"mode": null}"#).unwrap();
        assert!(nulls.is_empty());

        let pid: TelemetryFrame = serde_json::from_str(r#"{"pid_value": 0.0}"#).unwrap();
        assert!(!pid.is_empty());
    }

    #[test]
    fn telemetry_frame_rejects_wrong_types() {
        let res = serde_json::from_str::<TelemetryFrame>(r#"{"temperature": "hot"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn alarm_frame_keeps_extra_fields() {
        let frame: AlarmFrame = serde_json::from_str(
            r#"{"alarmDescription": "High temperature", "timestamp": "2025-05-01T10:00:00.123", "zone": 2}"#,
        )
        .unwrap();
        assert_eq!(frame.alarm_description, "High temperature");
        assert_eq!(frame.timestamp.as_deref(), Some("2025-05-01T10:00:00.123"));
        assert_eq!(frame.extra["zone"], 2);
    }

    #[test]
    fn sample_time_accepts_rfc3339_and_http_dates() {
        let a: TemperatureSample =
            serde_json::from_str(r#"{"time": "2024-10-15T10:00:00Z", "value": 21.5}"#).unwrap();
        let b: TemperatureSample =
            serde_json::from_str(r#"{"time": "Tue, 15 Oct 2024 10:00:00 GMT", "value": 21.5}"#)
                .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 10, 15, 10, 0, 0).unwrap();
        assert_eq!(a.time, expected);
        assert_eq!(b.time, expected);
    }

    #[test]
    fn pid_params_serialize_with_wire_names() {
        let json = serde_json::to_value(PidParams::default()).unwrap();
        assert_eq!(json["target_temp"], 22.0);
        assert_eq!(json["kd"], 0.01);
    }
}
