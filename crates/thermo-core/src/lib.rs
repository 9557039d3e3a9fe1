//! Reactive reconciliation layer between `thermo-api` and the CLI.
//!
//! The controller pushes telemetry snapshots and alarm events on one
//! untagged stream. This crate turns that stream into derived state:
//!
//! - **[`reconcile`]**: the synchronous core. [`classify`](reconcile::classify)
//!   decodes a payload into [`Inbound`](reconcile::Inbound),
//!   [`apply`](reconcile::apply) merges partial telemetry into a
//!   [`DeviceStatus`], [`AlarmAdmission`](reconcile::AlarmAdmission)
//!   rate-limits alarms against an injected [`Clock`](reconcile::Clock), and
//!   [`to_external`](reconcile::to_external) / [`to_internal`](reconcile::to_internal)
//!   map between display modes and wire tokens.
//!
//! - **[`DataStore`]**: the status record and the newest-first alarm log,
//!   published through `tokio::sync::watch` channels.
//!
//! - **[`Controller`]**: lifecycle facade: opens the event stream, feeds
//!   frames through the core in delivery order, and routes [`Command`]s to
//!   the HTTP API through a single processor task.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{ControllerConfig, TlsVerification};
pub use controller::{
    ConnectionState, Controller, Ingested, PID_KI_KD_MAX, PID_KP_MAX, PID_TARGET_RANGE,
};
pub use error::CoreError;
pub use store::DataStore;
pub use stream::StateStream;

pub use model::{
    Alarm, DeviceStatus, FanSpeed, Mode, ModeToken, PidParams, Presence, TemperatureSample,
    UnsupportedMode, WindowState,
};
pub use reconcile::{Admission, Clock, ManualClock, SystemClock};

// Transport settings the CLI passes straight through.
pub use thermo_api::{ReconnectConfig, StreamProtocol};
