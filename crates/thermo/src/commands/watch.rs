//! `thermo watch`: live status changes and accepted alarms.

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use thermo_core::{Alarm, ControllerConfig, DeviceStatus};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// One line of `watch` output in structured formats.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WatchEvent<'a> {
    Status(&'a DeviceStatus),
    Alarm(&'a Alarm),
}

pub async fn handle(
    config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let controller = util::connect_live(config).await?;

    let mut status = controller.status();
    let mut alarms = controller.alarm_notifications();

    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", controller.config().stream_url);
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),

            changed = status.changed(), if !args.alarms_only => {
                let Some(snapshot) = changed else {
                    break Ok(());
                };
                if let Err(e) = print_status(&snapshot, global, color) {
                    break Err(e);
                }
            }

            alarm = alarms.recv() => match alarm {
                Ok(alarm) => {
                    if let Err(e) = print_alarm(&alarm, global, color) {
                        break Err(e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "alarm notifications lagged; some were not printed");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    controller.disconnect().await;
    result
}

fn print_status(
    snapshot: &Arc<DeviceStatus>,
    global: &GlobalOpts,
    color: bool,
) -> Result<(), CliError> {
    let event = WatchEvent::Status(snapshot.as_ref());
    let out = output::render_stream_item(global.output, &event, || {
        format!(
            "{} {}",
            output::paint(&timestamp(), output::dim_style(), color),
            util::status_summary(snapshot)
        )
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_alarm(alarm: &Arc<Alarm>, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let event = WatchEvent::Alarm(alarm.as_ref());
    let out = output::render_stream_item(global.output, &event, || {
        format!(
            "{} {}",
            output::paint(&timestamp(), output::dim_style(), color),
            output::paint(&util::alarm_summary(alarm), output::alarm_style(), color)
        )
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged() {
        let status = DeviceStatus {
            temperature: Some(21.0),
            ..DeviceStatus::default()
        };
        let json = serde_json::to_value(WatchEvent::Status(&status)).unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["temperature"], 21.0);
        assert_eq!(json["mode"], "manual");
    }
}
