// ── Core error types ──
//
// User-facing errors from thermo-core. Consumers never match on HTTP or
// JSON failures directly; `From<thermo_api::Error>` folds them into the
// variants below.

use thiserror::Error;

use crate::model::Mode;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Mode '{mode}' is not supported by the controller")]
    UnsupportedMode { mode: Mode },

    #[error("Controller rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<thermo_api::Error> for CoreError {
    fn from(err: thermo_api::Error) -> Self {
        match err {
            thermo_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if let Some(status) = e.status() {
                    CoreError::Rejected {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            thermo_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            thermo_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            thermo_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            thermo_api::Error::Api { status, message } => CoreError::Rejected { status, message },
            thermo_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event stream connection failed: {reason}"),
            },
            thermo_api::Error::WebSocketClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event stream closed (code {code}): {reason}"),
            },
            thermo_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_rejection_keeps_status_and_message() {
        let err = CoreError::from(thermo_api::Error::Api {
            status: 400,
            message: "Invalid mode".into(),
        });
        assert!(matches!(
            err,
            CoreError::Rejected { status: 400, ref message } if message == "Invalid mode"
        ));
    }

    #[test]
    fn unsupported_mode_message() {
        let err = CoreError::UnsupportedMode { mode: Mode::Eco };
        assert_eq!(err.to_string(), "Mode 'eco' is not supported by the controller");
    }
}
