//! CLI configuration: thin wrapper around `thermo_config`.
//!
//! Adds the resolution step that layers `GlobalOpts` flag overrides
//! (--api-url, --stream-url, --insecure, --timeout) over the profile.

use std::time::Duration;

use thermo_core::{ControllerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use thermo_config::{
    Config, ConfigError, Profile, config_path, load_config, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, sorted, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build the runtime `ControllerConfig` for this invocation.
///
/// An explicitly named profile must exist. Without one, the built-in
/// local endpoints are used. Flags win over profile values either way.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<ControllerConfig, CliError> {
    let profile = match config.profile(global.profile.as_deref()) {
        Ok(found) => found.map(|(_, p)| p.clone()).unwrap_or_default(),
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(config),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let profile = apply_overrides(profile, global);
    let mut controller = thermo_config::profile_to_controller_config(&profile, &config.defaults)?;

    if global.insecure {
        controller.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        controller.timeout = Duration::from_secs(secs);
    }
    Ok(controller)
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(ref url) = global.stream_url {
        profile.stream_url.clone_from(url);
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::{ColorMode, OutputFormat};

    fn global() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            api_url: None,
            stream_url: None,
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            log_json: false,
            quiet: false,
            insecure: false,
            timeout: None,
        }
    }

    fn config_with(name: &str, profile: Profile) -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(name.into(), profile);
        cfg.default_profile = Some(name.into());
        cfg
    }

    #[test]
    fn no_profile_uses_local_defaults() {
        let resolved = resolve(&global(), &Config::default()).unwrap();
        assert_eq!(resolved.api_url.as_str(), "http://localhost:5000/");
        assert_eq!(resolved.stream_url.as_str(), "http://localhost:5001/");
        assert_eq!(resolved.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with(
            "lab",
            Profile {
                api_url: "http://lab.local:5000".into(),
                timeout: Some(3),
                ..Profile::default()
            },
        );
        let mut g = global();
        g.api_url = Some("http://10.0.0.5:8080".into());
        g.insecure = true;
        g.timeout = Some(30);

        let resolved = resolve(&g, &cfg).unwrap();
        assert_eq!(resolved.api_url.as_str(), "http://10.0.0.5:8080/");
        assert_eq!(resolved.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(resolved.timeout, Duration::from_secs(30));
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let cfg = config_with(
            "lab",
            Profile {
                stream_url: "ws://lab.local:5001".into(),
                timeout: Some(3),
                ..Profile::default()
            },
        );
        let resolved = resolve(&global(), &cfg).unwrap();
        assert_eq!(resolved.stream_url.as_str(), "ws://lab.local:5001/");
        assert_eq!(resolved.timeout, Duration::from_secs(3));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = config_with("lab", Profile::default());
        let mut g = global();
        g.profile = Some("plant".into());

        let err = resolve(&g, &cfg).unwrap_err();
        assert!(
            matches!(err, CliError::ProfileNotFound { ref name, ref available } if name == "plant" && available == "lab"),
            "got {err:?}"
        );
    }

    #[test]
    fn bad_url_flag_is_a_validation_error() {
        let mut g = global();
        g.api_url = Some("ftp://example.com".into());
        let err = resolve(&g, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "api_url"));
    }
}
