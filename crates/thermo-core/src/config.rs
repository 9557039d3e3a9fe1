// ── Runtime connection configuration ──
//
// Describes *how* to reach a thermostat controller. Never touches disk;
// the CLI builds a `ControllerConfig` from its profile and hands it in.

use std::time::Duration;

use thermo_api::{ReconnectConfig, StreamProtocol};
use url::Url;

use crate::reconcile::DEFAULT_ALARM_WINDOW;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one controller session.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP command API root (e.g. `http://localhost:5000`).
    pub api_url: Url,
    /// Event stream endpoint (e.g. `http://localhost:5001`).
    pub stream_url: Url,
    /// Framing spoken on `stream_url`.
    pub stream_protocol: StreamProtocol,
    pub tls: TlsVerification,
    /// Per-request timeout for commands.
    pub timeout: Duration,
    /// Minimum spacing between accepted alarms.
    pub alarm_window: Duration,
    /// Keep at most this many alarms; `None` keeps all of them.
    pub alarm_retention: Option<usize>,
    /// Open the event stream on connect.
    pub websocket_enabled: bool,
    pub reconnect: ReconnectConfig,
}

impl ControllerConfig {
    /// Config with default tuning for the given endpoints.
    pub fn new(api_url: Url, stream_url: Url) -> Self {
        Self {
            api_url,
            stream_url,
            stream_protocol: StreamProtocol::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            alarm_window: DEFAULT_ALARM_WINDOW,
            alarm_retention: None,
            websocket_enabled: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}
