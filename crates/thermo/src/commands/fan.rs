//! `thermo fan <0..3>`.

use serde::Serialize;
use thermo_core::{CommandResult, Controller, ControllerConfig};

use crate::cli::{FanArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct FanChange {
    speed: u8,
    acknowledged: Option<u8>,
}

pub async fn handle(
    config: ControllerConfig,
    args: FanArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let speed = args.speed;
    let result =
        Controller::oneshot(config, |c| async move { c.set_fan_speed(speed).await }).await?;

    let CommandResult::FanSpeed(acknowledged) = result else {
        return Err(CliError::Internal(format!(
            "unexpected result for fan speed: {result:?}"
        )));
    };
    let change = FanChange {
        speed,
        acknowledged,
    };

    let out = output::render_single(
        global.output,
        &change,
        |c| format!("Fan speed set to {}", c.speed),
        |c| c.speed.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
