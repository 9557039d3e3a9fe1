//! Shared helpers for command handlers.

use thermo_core::{Alarm, Controller, ControllerConfig, DeviceStatus};

use crate::error::CliError;

/// Connect with the event stream enabled.
///
/// The stream itself comes up in the background; callers wait on
/// telemetry or alarms rather than on the socket.
pub async fn connect_live(mut config: ControllerConfig) -> Result<Controller, CliError> {
    config.websocket_enabled = true;

    let controller = Controller::new(config);
    controller.connect().await?;
    Ok(controller)
}

/// Key/value view of the status record for table output.
pub fn status_detail(s: &DeviceStatus) -> String {
    let lines = [
        format!("Device:       {}", s.device_id.as_deref().unwrap_or("-")),
        format!("Temperature:  {}", s.temperature_display()),
        format!("Mode:         {}", s.mode.label()),
        format!("Fan speed:    {}", s.fan_speed),
        format!("Window:       {}", s.window),
        format!("Presence:     {}", s.presence),
        format!("PID output:   {}", s.pid_output_display()),
        format!("Status:       {}", s.status_message.as_deref().unwrap_or("-")),
    ];
    lines.join("\n")
}

/// `key=value` lines for plain output.
pub fn status_plain(s: &DeviceStatus) -> String {
    let temperature = s.temperature.map_or_else(String::new, |t| t.to_string());
    let pid = s.pid_output.map_or_else(String::new, |p| p.to_string());
    [
        format!("temperature={temperature}"),
        format!("mode={}", s.mode),
        format!("fan_speed={}", s.fan_speed),
        format!("window={}", s.window),
        format!("presence={}", s.presence),
        format!("pid_output={pid}"),
    ]
    .join("\n")
}

/// One-line status summary for streaming output.
pub fn status_summary(s: &DeviceStatus) -> String {
    format!(
        "{}  mode={}  fan={}  window={}  presence={}  pid={}",
        s.temperature_display(),
        s.mode,
        s.fan_speed,
        s.window,
        s.presence,
        s.pid_output_display(),
    )
}

/// One-line alarm summary for streaming output.
pub fn alarm_summary(a: &Alarm) -> String {
    match a.reported_at {
        Some(ref reported) => format!("ALARM {} (device time {reported})", a.description),
        None => format!("ALARM {}", a.description),
    }
}
