// ── Command API ──
//
// Every write to the controller flows through `Command` and the
// controller's command processor task.

use thermo_api::PidParams;

use crate::error::CoreError;
use crate::model::{FanSpeed, ModeToken};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Write operations against the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetMode(ModeToken),
    SetFanSpeed(FanSpeed),
    SetPidParams(PidParams),
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Mode acknowledged; carries the token the controller echoed, if any.
    Mode(Option<String>),
    /// Fan speed acknowledged; carries the echoed level, if any.
    FanSpeed(Option<u8>),
    /// PID parameters accepted; the controller's echo body.
    PidParams(serde_json::Value),
}
