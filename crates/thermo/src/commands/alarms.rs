//! `thermo alarms`: collect for a while, print newest first.

use std::time::Duration;

use tabled::Tabled;
use thermo_core::{Alarm, ControllerConfig};

use crate::cli::{AlarmsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AlarmRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Accepted")]
    accepted: String,
    #[tabled(rename = "Device time")]
    reported: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&Alarm> for AlarmRow {
    fn from(a: &Alarm) -> Self {
        let mut id = a.id.to_string();
        id.truncate(8);
        Self {
            id,
            accepted: a
                .accepted_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S%.3f")
                .to_string(),
            reported: a.reported_at.clone().unwrap_or_else(|| "-".into()),
            description: a.description.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: ControllerConfig,
    args: AlarmsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = util::connect_live(config).await?;

    if !global.quiet {
        eprintln!("Collecting alarms for {}s (Ctrl-C to stop early)", args.duration);
    }
    tokio::select! {
        () = tokio::time::sleep(Duration::from_secs(args.duration)) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
    controller.disconnect().await;

    let log = controller.alarms_snapshot();
    if log.is_empty() && global.output == OutputFormat::Table {
        if !global.quiet {
            eprintln!("No alarms accepted");
        }
        return Ok(());
    }

    let out = output::render_list(
        global.output,
        log.as_slice(),
        |a| AlarmRow::from(a.as_ref()),
        |a| a.description.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn alarm(reported_at: Option<&str>) -> Alarm {
        Alarm {
            id: "6f1c2a3e-0000-4000-8000-000000000000".parse().unwrap(),
            accepted_at: Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(),
            description: "High temperature".into(),
            reported_at: reported_at.map(str::to_owned),
        }
    }

    #[test]
    fn row_shortens_id_and_fills_missing_device_time() {
        let row = AlarmRow::from(&alarm(None));
        assert_eq!(row.id, "6f1c2a3e");
        assert_eq!(row.reported, "-");
        assert_eq!(row.description, "High temperature");

        let row = AlarmRow::from(&alarm(Some("2025-05-01T10:00:00.123")));
        assert_eq!(row.reported, "2025-05-01T10:00:00.123");
    }
}
