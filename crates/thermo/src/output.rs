//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Style as ColorStyle};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Paint `text` with `style` when color is enabled.
pub fn paint(text: &str, style: ColorStyle, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_owned()
    }
}

pub fn alarm_style() -> ColorStyle {
    ColorStyle::new().red().bold()
}

pub fn dim_style() -> ColorStyle {
    ColorStyle::new().dimmed()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact` / `yaml`: serializes the original data via serde
/// - `plain`: calls `line_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    line_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&line_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-record views are a
/// key/value listing rather than a `Tabled` row.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(plain_fn(data)),
    }
}

/// Render one item of a live stream.
///
/// Structured formats emit one document per item: compact JSON lines for
/// both JSON variants, `---`-separated documents for YAML.
pub fn render_stream_item<T>(
    format: OutputFormat,
    data: &T,
    line_fn: impl FnOnce() -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(line_fn()),
        OutputFormat::Json | OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => Ok(format!("---\n{}", render_yaml(data)?.trim_end())),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Internal(format!("JSON serialization failed: {e}")))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data)
        .map_err(|e| CliError::Internal(format!("YAML serialization failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
        value: u8,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "a",
                value: 1,
            },
            Item {
                name: "b",
                value: 2,
            },
        ]
    }

    fn render(format: OutputFormat) -> String {
        render_list(
            format,
            &items(),
            |i| ItemRow {
                name: i.name.into(),
            },
            |i| format!("{}={}", i.name, i.value),
        )
        .unwrap()
    }

    #[test]
    fn list_formats() {
        assert_eq!(render(OutputFormat::Plain), "a=1\nb=2");
        assert_eq!(
            render(OutputFormat::JsonCompact),
            r#"[{"name":"a","value":1},{"name":"b","value":2}]"#
        );
        assert!(render(OutputFormat::Yaml).contains("name: a"));

        let table = render(OutputFormat::Table);
        assert!(table.contains("Name"));
        assert!(!table.contains("value"));
    }

    #[test]
    fn stream_items_are_single_documents() {
        let item = Item {
            name: "a",
            value: 1,
        };
        let json = render_stream_item(OutputFormat::Json, &item, || unreachable!()).unwrap();
        assert_eq!(json, r#"{"name":"a","value":1}"#);

        let yaml = render_stream_item(OutputFormat::Yaml, &item, || unreachable!()).unwrap();
        assert!(yaml.starts_with("---\nname: a"), "{yaml}");

        let line = render_stream_item(OutputFormat::Table, &item, || "a=1".into()).unwrap();
        assert_eq!(line, "a=1");
    }

    #[test]
    fn paint_is_identity_without_color() {
        assert_eq!(paint("alarm", alarm_style(), false), "alarm");
        assert_ne!(paint("alarm", alarm_style(), true), "alarm");
    }
}
