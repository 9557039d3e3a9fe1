// ── Domain model ──
//
// Display-side representation of the controller: the long-lived status
// record, accepted alarms, and the two mode vocabularies.

pub mod alarm;
pub mod mode;
pub mod status;

pub use alarm::Alarm;
pub use mode::{Mode, ModeToken, UnsupportedMode};
pub use status::{DeviceStatus, FanSpeed, Presence, WindowState};

// Wire types that pass through the core unchanged.
pub use thermo_api::{PidParams, TemperatureSample};
