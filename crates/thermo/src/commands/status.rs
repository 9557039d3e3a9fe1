//! `thermo status`: one reconciled snapshot.

use std::time::Duration;

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    config: thermo_core::ControllerConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = util::connect_live(config).await?;
    let waited = controller
        .wait_for_telemetry(Duration::from_secs(args.wait))
        .await;
    controller.disconnect().await;

    let status = waited?;
    let out = output::render_single(
        global.output,
        status.as_ref(),
        util::status_detail,
        util::status_plain,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
