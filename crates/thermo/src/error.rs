//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use thermo_config::ConfigError;
use thermo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(thermo::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Reason: {reason}\n\
             Override the endpoint with --api-url / --stream-url."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(thermo::timeout),
        help(
            "The controller did not answer in time.\n\
             Raise --timeout for commands, or --wait for `thermo status`."
        )
    )]
    Timeout { seconds: u64 },

    // ── Controller ───────────────────────────────────────────────────
    #[error("Mode '{mode}' is not supported by the controller")]
    #[diagnostic(
        code(thermo::unsupported_mode),
        help("Supported modes: {supported}\nRun: thermo mode list")
    )]
    UnsupportedMode { mode: String, supported: String },

    #[error("Controller rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(thermo::rejected))]
    Rejected { status: u16, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(thermo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(thermo::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: thermo config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Profile '{name}' already exists")]
    #[diagnostic(
        code(thermo::profile_exists),
        help("Pass --force to overwrite it.")
    )]
    ProfileExists { name: String },

    #[error(transparent)]
    #[diagnostic(code(thermo::config))]
    Config(Box<ConfigError>),

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(thermo::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::UnsupportedMode { .. } | Self::Validation { .. } | Self::ProfileExists { .. } => {
                exit_code::USAGE
            }
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::ControllerDisconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "controller connection was lost".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::UnsupportedMode { mode } => CliError::UnsupportedMode {
                mode: mode.to_string(),
                supported: "manual, auto_3speed, auto_pid".into(),
            },

            CoreError::Rejected { status, message } => CliError::Rejected { status, message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(unknown)".into(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermo_core::Mode;

    #[test]
    fn exit_codes_follow_error_class() {
        let cases = [
            (
                CliError::from(CoreError::ConnectionFailed {
                    url: "http://localhost:5000".into(),
                    reason: "refused".into(),
                }),
                exit_code::CONNECTION,
            ),
            (
                CliError::from(CoreError::Timeout { timeout_secs: 3 }),
                exit_code::TIMEOUT,
            ),
            (
                CliError::from(CoreError::UnsupportedMode { mode: Mode::Eco }),
                exit_code::USAGE,
            ),
            (
                CliError::from(CoreError::Rejected {
                    status: 500,
                    message: "relay busy".into(),
                }),
                exit_code::GENERAL,
            ),
            (
                CliError::from(ConfigError::UnknownProfile { name: "lab".into() }),
                exit_code::NOT_FOUND,
            ),
        ];

        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn unsupported_mode_names_the_mode() {
        let err = CliError::from(CoreError::UnsupportedMode { mode: Mode::Off });
        assert_eq!(
            err.to_string(),
            "Mode 'off' is not supported by the controller"
        );
    }
}
