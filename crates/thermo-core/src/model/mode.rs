// ── Control modes ──
//
// Two vocabularies: `Mode` is what the dashboard shows, `ModeToken` is
// what the controller speaks. Translation lives in `reconcile::translate`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// Internal (display) operating mode.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
pub enum Mode {
    #[serde(rename = "off")]
    #[strum(serialize = "off")]
    Off,
    #[serde(rename = "eco")]
    #[strum(serialize = "eco")]
    Eco,
    #[default]
    #[serde(rename = "manual")]
    #[strum(serialize = "manual")]
    Manual,
    #[serde(rename = "auto_3speed")]
    #[strum(serialize = "auto_3speed")]
    Auto3Speed,
    #[serde(rename = "auto_pid")]
    #[strum(serialize = "auto_pid")]
    AutoPid,
}

impl Mode {
    /// Human label for tables.
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Eco => "Eco",
            Self::Manual => "Manual",
            Self::Auto3Speed => "Auto (3-speed)",
            Self::AutoPid => "Auto (PID)",
        }
    }

    /// Whether the controller has a wire token for this mode.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Off | Self::Eco)
    }
}

/// Wire-level mode token accepted and reported by the controller.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModeToken {
    Manual,
    Auto,
    Pid,
}

impl ModeToken {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Returned when a reserved mode (`off`, `eco`) is translated outbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mode '{0}' is not supported by the controller")]
pub struct UnsupportedMode(pub Mode);
