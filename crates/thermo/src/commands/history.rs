//! `thermo history`: recent temperature samples.

use tabled::Tabled;
use thermo_core::{Controller, ControllerConfig, TemperatureSample};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Temperature")]
    value: String,
}

impl From<&TemperatureSample> for SampleRow {
    fn from(s: &TemperatureSample) -> Self {
        Self {
            time: s
                .time
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            value: format!("{:.1} °C", s.value),
        }
    }
}

pub async fn handle(config: ControllerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let samples =
        Controller::oneshot(config, |c| async move { c.recent_temperatures().await }).await?;

    let out = output::render_list(global.output, &samples, |s| SampleRow::from(s), |s| {
        format!("{}\t{}", s.time.to_rfc3339(), s.value)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
