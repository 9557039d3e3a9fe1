//! `thermo mode`: vocabulary listing and mode changes.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use thermo_core::reconcile::to_external;
use thermo_core::{CommandResult, Controller, ControllerConfig, Mode, ModeToken};

use crate::cli::{GlobalOpts, ModeArg, ModeArgs, ModeCommand};
use crate::error::CliError;
use crate::output;

// ── Records ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ModeInfo {
    mode: Mode,
    label: &'static str,
    token: Option<ModeToken>,
}

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Controller token")]
    token: String,
}

impl From<&ModeInfo> for ModeRow {
    fn from(m: &ModeInfo) -> Self {
        Self {
            mode: m.mode.to_string(),
            label: m.label.into(),
            token: m
                .token
                .map_or_else(|| "(unsupported)".into(), |t| t.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ModeChange {
    mode: Mode,
    token: ModeToken,
    acknowledged: Option<String>,
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn from_arg(arg: ModeArg) -> Mode {
    match arg {
        ModeArg::Off => Mode::Off,
        ModeArg::Eco => Mode::Eco,
        ModeArg::Manual => Mode::Manual,
        ModeArg::Auto3Speed => Mode::Auto3Speed,
        ModeArg::AutoPid => Mode::AutoPid,
    }
}

/// Print every dashboard mode with its controller token. Needs no
/// connection.
pub fn list(global: &GlobalOpts) -> Result<(), CliError> {
    let modes: Vec<ModeInfo> = Mode::iter()
        .map(|mode| ModeInfo {
            mode,
            label: mode.label(),
            token: to_external(mode).ok(),
        })
        .collect();

    let out = output::render_list(
        global.output,
        &modes,
        |m| ModeRow::from(m),
        |m| {
            let token = m.token.map_or_else(|| "-".into(), |t| t.to_string());
            format!("{}\t{token}", m.mode)
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    config: ControllerConfig,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ModeCommand::List => list(global),

        ModeCommand::Set { mode } => {
            let mode = from_arg(mode);
            let result =
                Controller::oneshot(config, |c| async move { c.set_mode(mode).await }).await?;

            let CommandResult::Mode(acknowledged) = result else {
                return Err(CliError::Internal(format!(
                    "unexpected result for mode change: {result:?}"
                )));
            };
            let token = to_external(mode).map_err(|e| CliError::Internal(e.to_string()))?;
            let change = ModeChange {
                mode,
                token,
                acknowledged,
            };

            let out = output::render_single(
                global.output,
                &change,
                |c| format!("Mode set to {} (controller token '{}')", c.mode.label(), c.token),
                |c| c.mode.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
