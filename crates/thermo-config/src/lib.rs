//! Shared configuration for the thermo CLI.
//!
//! TOML profiles and translation to `thermo_core::ControllerConfig`.
//! The CLI layers flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use thermo_core::{ControllerConfig, StreamProtocol, TlsVerification};

/// Command API of a controller on the local machine.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// Event stream of a controller on the local machine.
pub const DEFAULT_STREAM_URL: &str = "http://localhost:5001";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile, falling back to `default_profile`.
    ///
    /// `Ok(None)` means no profile was asked for and none is configured.
    pub fn profile(&self, name: Option<&str>) -> Result<Option<(String, &Profile)>, ConfigError> {
        let wanted = name.map(str::to_owned).or_else(|| self.default_profile.clone());
        let Some(wanted) = wanted else {
            return Ok(None);
        };

        match self.profiles.get(&wanted) {
            Some(p) => Ok(Some((wanted, p))),
            // An implicit default that was never written is not an error.
            None if name.is_none() => Ok(None),
            None => Err(ConfigError::UnknownProfile { name: wanted }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named controller profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// HTTP command API root.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Event stream endpoint.
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// `socketio` (default) or `json`.
    #[serde(default)]
    pub stream_protocol: StreamProtocol,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout, seconds.
    pub timeout: Option<u64>,

    /// Minimum spacing between accepted alarms, milliseconds.
    pub alarm_window_ms: Option<u64>,

    /// Keep at most this many alarms.
    pub alarm_retention: Option<usize>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            stream_url: default_stream_url(),
            stream_protocol: StreamProtocol::default(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            alarm_window_ms: None,
            alarm_retention: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "thermo", "thermo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("thermo");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then `THERMO_`-prefixed environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("THERMO_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

/// Build a `ControllerConfig` from a profile, without CLI flag overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let stream_url = parse_url("stream_url", &profile.stream_url)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    if profile.alarm_retention == Some(0) {
        return Err(ConfigError::Validation {
            field: "alarm_retention".into(),
            reason: "must be at least 1 (omit it to keep every alarm)".into(),
        });
    }

    let mut config = ControllerConfig::new(api_url, stream_url);
    config.stream_protocol = profile.stream_protocol;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(ms) = profile.alarm_window_ms {
        config.alarm_window = Duration::from_millis(ms);
    }
    config.alarm_retention = profile.alarm_retention;
    Ok(config)
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(url),
        other => Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
