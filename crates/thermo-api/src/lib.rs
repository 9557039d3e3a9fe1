// thermo-api: Async Rust client for a thermostat/HVAC controller (HTTP commands + live event stream)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

pub use client::ThermostatClient;
pub use error::Error;
pub use models::{AlarmFrame, FanSpeedAck, ModeAck, PidParams, TelemetryFrame, TemperatureSample};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{InboundFrame, ReconnectConfig, StreamHandle, StreamProtocol};
