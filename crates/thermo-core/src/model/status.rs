// ── Device status record ──

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::Display;

use super::mode::Mode;

/// Occupancy switch, display form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Presence {
    Active,
    #[default]
    Inactive,
}

/// Window contact, display form.
///
/// Labelled `Active`/`Closed` rather than mirroring `Presence`; the
/// controller UI has always shown it this way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum WindowState {
    Active,
    #[default]
    Closed,
}

/// Fan speed level, `0..=3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanSpeed(u8);

impl FanSpeed {
    pub const MAX: Self = Self(3);

    /// Bits of `leds_on` that carry the speed; the rest are ignored.
    pub const LED_MASK: u64 = 0b111;

    /// Build from a level, rejecting anything above 3.
    pub fn new(level: u8) -> Option<Self> {
        (level <= Self::MAX.0).then_some(Self(level))
    }

    /// Decode the controller's LED mask.
    ///
    /// The device lights LEDs as a thermometer (speed 2 = LED1+LED2), so
    /// the level is the position of the highest lit LED. Partial patterns
    /// such as `0b010` still decode by their highest bit.
    pub fn from_mask(mask: u64) -> Self {
        let leds = mask & Self::LED_MASK;
        let level = u64::BITS - leds.leading_zeros();
        Self(u8::try_from(level).unwrap_or(Self::MAX.0))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Best-known state of the controlled device.
///
/// Once a field has a value it keeps one; telemetry frames only ever
/// replace values, never clear them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Degrees Celsius. `None` until the first report.
    pub temperature: Option<f64>,
    pub presence: Presence,
    pub window: WindowState,
    pub fan_speed: FanSpeed,
    pub mode: Mode,
    /// Last PID output in percent. `None` until reported.
    pub pid_output: Option<f64>,
    pub device_id: Option<String>,
    pub status_message: Option<String>,
}

impl DeviceStatus {
    pub fn temperature_display(&self) -> String {
        self.temperature
            .map_or_else(|| "unknown".to_owned(), |t| format!("{t:.1} °C"))
    }

    pub fn pid_output_display(&self) -> String {
        self.pid_output
            .map_or_else(|| "unknown".to_owned(), |p| format!("{p:.2}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_decodes_to_highest_lit_led() {
        let cases = [
            (0b000, 0),
            (0b001, 1),
            (0b010, 2),
            (0b011, 2),
            (0b100, 3),
            (0b111, 3),
        ];
        for (mask, level) in cases {
            assert_eq!(FanSpeed::from_mask(mask).level(), level, "mask {mask:#05b}");
        }
    }

    #[test]
    fn mask_ignores_bits_above_the_leds() {
        assert_eq!(FanSpeed::from_mask(0b1000).level(), 0);
        assert_eq!(FanSpeed::from_mask(0b1_0011).level(), 2);
        assert_eq!(FanSpeed::from_mask(u64::MAX).level(), 3);
    }

    #[test]
    fn fan_speed_bounds() {
        assert_eq!(FanSpeed::new(3), Some(FanSpeed::MAX));
        assert_eq!(FanSpeed::new(4), None);
    }

    #[test]
    fn placeholder_record() {
        let s = DeviceStatus::default();
        assert_eq!(s.presence, Presence::Inactive);
        assert_eq!(s.window, WindowState::Closed);
        assert_eq!(s.fan_speed.level(), 0);
        assert_eq!(s.mode, Mode::Manual);
        assert_eq!(s.pid_output_display(), "unknown");
        assert_eq!(s.temperature_display(), "unknown");
    }

    #[test]
    fn pid_output_formats_two_decimals() {
        let s = DeviceStatus {
            pid_output: Some(42.0 / 3.0),
            ..DeviceStatus::default()
        };
        assert_eq!(s.pid_output_display(), "14.00%");
    }
}
