//! Command dispatch: bridges CLI args -> core calls -> output formatting.

pub mod alarms;
pub mod config_cmd;
pub mod fan;
pub mod history;
pub mod mode;
pub mod pid;
pub mod status;
pub mod util;
pub mod watch;

use thermo_core::ControllerConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Alarms(args) => alarms::handle(config, args, global).await,
        Command::Mode(args) => mode::handle(config, args, global).await,
        Command::Fan(args) => fan::handle(config, args, global).await,
        Command::Pid(args) => pid::handle(config, args, global).await,
        Command::History => history::handle(config, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
