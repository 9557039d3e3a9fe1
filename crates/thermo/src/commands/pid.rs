//! `thermo pid`: push gains and setpoint.

use serde::Serialize;
use thermo_core::{CommandResult, Controller, ControllerConfig, PidParams};

use crate::cli::{GlobalOpts, PidArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PidChange {
    sent: PidParams,
    echo: serde_json::Value,
}

/// Fill unspecified flags from the controller's stock tuning.
fn params_from(args: &PidArgs) -> PidParams {
    let stock = PidParams::default();
    PidParams {
        kp: args.kp.unwrap_or(stock.kp),
        ki: args.ki.unwrap_or(stock.ki),
        kd: args.kd.unwrap_or(stock.kd),
        target_temp: args.target.unwrap_or(stock.target_temp),
    }
}

pub async fn handle(
    config: ControllerConfig,
    args: PidArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = params_from(&args);
    let result =
        Controller::oneshot(config, |c| async move { c.set_pid_params(params).await }).await?;

    let CommandResult::PidParams(echo) = result else {
        return Err(CliError::Internal(format!(
            "unexpected result for PID parameters: {result:?}"
        )));
    };
    let change = PidChange { sent: params, echo };

    let out = output::render_single(
        global.output,
        &change,
        |c| {
            format!(
                "PID updated: kp={} ki={} kd={} target={:.1} °C",
                c.sent.kp, c.sent.ki, c.sent.kd, c.sent.target_temp
            )
        },
        |c| {
            format!(
                "{} {} {} {}",
                c.sent.kp, c.sent.ki, c.sent.kd, c.sent.target_temp
            )
        },
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn missing_flags_take_stock_values() {
        let args = PidArgs {
            kp: Some(2.5),
            ki: None,
            kd: None,
            target: Some(24.0),
        };
        let params = params_from(&args);
        assert_eq!(params.kp, 2.5);
        assert_eq!(params.ki, PidParams::default().ki);
        assert_eq!(params.kd, PidParams::default().kd);
        assert_eq!(params.target_temp, 24.0);
    }
}
