//! Config subcommand handlers. None of these touch the network.

use serde::Serialize;
use tabled::Tabled;

use thermo_config::{DEFAULT_API_URL, DEFAULT_STREAM_URL};
use thermo_core::StreamProtocol;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, StreamProtocolArg};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Records ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ProfileInfo {
    name: String,
    default: bool,
    api_url: String,
    stream_url: String,
    stream_protocol: StreamProtocol,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default")]
    default: String,
    #[tabled(rename = "API")]
    api_url: String,
    #[tabled(rename = "Stream")]
    stream_url: String,
}

impl From<&ProfileInfo> for ProfileRow {
    fn from(p: &ProfileInfo) -> Self {
        Self {
            name: p.name.clone(),
            default: if p.default { "*" } else { "" }.into(),
            api_url: p.api_url.clone(),
            stream_url: format!("{} ({:?})", p.stream_url, p.stream_protocol),
        }
    }
}

fn profile_infos(cfg: &Config) -> Vec<ProfileInfo> {
    let default = cfg.default_profile.as_deref();
    let mut infos: Vec<ProfileInfo> = cfg
        .profiles
        .iter()
        .map(|(name, p)| ProfileInfo {
            name: name.clone(),
            default: Some(name.as_str()) == default,
            api_url: p.api_url.clone(),
            stream_url: p.stream_url.clone(),
            stream_protocol: p.stream_protocol,
        })
        .collect();
    infos.sort_by(|a, b| a.name.cmp(&b.name));
    infos
}

fn protocol_from_arg(arg: StreamProtocolArg) -> StreamProtocol {
    match arg {
        StreamProtocolArg::Socketio => StreamProtocol::SocketIo,
        StreamProtocolArg::Json => StreamProtocol::Json,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            name,
            stream_protocol,
            force,
        } => {
            let mut cfg = config::load_config()?;
            if cfg.profiles.contains_key(&name) && !force {
                return Err(CliError::ProfileExists { name });
            }

            let profile = Profile {
                api_url: global
                    .api_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_URL.into()),
                stream_url: global
                    .stream_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STREAM_URL.into()),
                stream_protocol: protocol_from_arg(stream_protocol),
                insecure: global.insecure.then_some(true),
                timeout: global.timeout,
                ..Profile::default()
            };

            // Refuse to write a profile that could never connect.
            thermo_config::profile_to_controller_config(&profile, &cfg.defaults)?;

            cfg.profiles.insert(name.clone(), profile);
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!(
                    "✓ Profile '{name}' written to {}",
                    config::config_path().display()
                );
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                global.output,
                &cfg,
                |c| {
                    toml::to_string_pretty(c)
                        .unwrap_or_else(|e| format!("(config cannot be shown as TOML: {e})"))
                },
                |c| c.default_profile.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                if !global.quiet {
                    eprintln!("No profiles configured. Run: thermo config init");
                }
                return Ok(());
            }

            let infos = profile_infos(&cfg);
            let out = output::render_list(
                global.output,
                &infos,
                |p| ProfileRow::from(p),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
