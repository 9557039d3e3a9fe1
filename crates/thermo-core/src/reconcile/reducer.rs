// ── Status reducer ──
//
// Pure merge of a partial telemetry frame into the status record.
// Absent fields keep their prior value.

use thermo_api::TelemetryFrame;
use tracing::debug;

use super::translate::to_internal;
use crate::model::{DeviceStatus, FanSpeed, Presence, WindowState};

const SWITCH_ON: &str = "on";

/// Merge `frame` into `current`, returning the new record.
pub fn apply(current: &DeviceStatus, frame: &TelemetryFrame) -> DeviceStatus {
    let mut next = current.clone();

    if let Some(t) = frame.temperature {
        next.temperature = Some(t);
    }

    if let Some(raw) = frame.switch_someone_present.as_deref() {
        next.presence = if raw == SWITCH_ON {
            Presence::Active
        } else {
            Presence::Inactive
        };
    }

    if let Some(raw) = frame.switch_window.as_deref() {
        next.window = if raw == SWITCH_ON {
            WindowState::Active
        } else {
            WindowState::Closed
        };
    }

    if let Some(mask) = frame.leds_on {
        if mask & !FanSpeed::LED_MASK != 0 {
            debug!(leds_on = mask, "ignoring LED bits outside the fan speed mask");
        }
        next.fan_speed = FanSpeed::from_mask(mask);
    }

    if let Some(token) = frame.mode.as_deref() {
        match to_internal(token) {
            Some(mode) => next.mode = mode,
            None => debug!(token, "unrecognized mode token, keeping current mode"),
        }
    }

    if let Some(pid) = frame.pid_value {
        next.pid_output = Some(pid);
    }

    if let Some(id) = &frame.device_id {
        next.device_id = Some(id.clone());
    }

    if let Some(msg) = &frame.status_message {
        next.status_message = Some(msg.clone());
    }

    next
}
