//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use lokiwatch_core::{DisplayBody, DisplayModel, DisplayRow};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Applies colors only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(mode: &ColorMode) -> Self {
        Self {
            enabled: should_color(mode),
        }
    }

    pub fn good(self, text: &str) -> String {
        if self.enabled { text.green().to_string() } else { text.to_owned() }
    }

    pub fn bad(self, text: &str) -> String {
        if self.enabled { text.red().bold().to_string() } else { text.to_owned() }
    }

    pub fn warn(self, text: &str) -> String {
        if self.enabled { text.yellow().to_string() } else { text.to_owned() }
    }

    pub fn dim(self, text: &str) -> String {
        if self.enabled { text.dimmed().to_string() } else { text.to_owned() }
    }

    pub fn accent(self, text: &str) -> String {
        if self.enabled { text.cyan().bold().to_string() } else { text.to_owned() }
    }

    /// Color a severity or status word by how bad it sounds.
    pub fn level(self, text: &str) -> String {
        match text.to_ascii_lowercase().as_str() {
            "critical" | "high" | "disabled" | "inactive" | "ongoing" => self.bad(text),
            "medium" | "warning" => self.warn(text),
            "low" | "info" | "enabled" | "active" | "ended" => self.good(text),
            _ => text.to_owned(),
        }
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format.
///
/// - `table`: builds rows via `to_rows` and lays them out with `tabled`
/// - `json` / `json-compact` / `yaml`: serializes `data` via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_rows: impl FnOnce(&[T]) -> Vec<R>,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => render_table(&to_rows(data)),
        OutputFormat::Json => render_json_pretty(data)?,
        OutputFormat::JsonCompact => render_json_compact(data)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are laid out
/// as `Label: value` lines rather than a table.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json_pretty(data)?,
        OutputFormat::JsonCompact => render_json_compact(data)?,
        OutputFormat::Yaml => render_yaml(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Render one fetched list view.
///
/// Tables come from the projected display rows; every other format
/// serializes the records themselves.
pub fn render_view<T, R>(
    format: &OutputFormat,
    data: &[T],
    model: &DisplayModel,
    to_row: impl Fn(&DisplayRow) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => Ok(render_view_table(model, to_row)),
        other => render_list(other, data, |_| Vec::<R>::new(), id_fn),
    }
}

/// Table body for a list view: the rows, or the view's placeholder.
fn render_view_table<R: Tabled>(
    model: &DisplayModel,
    to_row: impl Fn(&DisplayRow) -> R,
) -> String {
    match &model.body {
        DisplayBody::Rows { rows } => render_table(&rows.iter().map(to_row).collect::<Vec<_>>()),
        DisplayBody::Empty { placeholder } => placeholder.clone(),
    }
}

/// `Label: value` lines with labels padded to a common width.
pub fn detail_lines(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(l, _)| l.len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(label, value)| format!("{:<width$} {value}", format!("{label}:")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Print a status line to stderr, respecting quiet mode.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(
    data: &T,
) -> Result<String, CliError> {
    Ok(serde_json::to_string(data)?)
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal {
        message: format!("YAML serialization failed: {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "sqli" }, Item { id: 2, name: "xss" }]
    }

    #[test]
    fn plain_lists_identifiers() {
        let out = render_list(
            &OutputFormat::Plain,
            &items(),
            |_| Vec::<ItemRow>::new(),
            |i| i.id.to_string(),
        )
        .unwrap();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn table_uses_row_builder() {
        let out = render_list(
            &OutputFormat::Table,
            &items(),
            |data| {
                data.iter()
                    .map(|i| ItemRow {
                        name: i.name.to_owned(),
                    })
                    .collect()
            },
            |i| i.id.to_string(),
        )
        .unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("xss"));
    }

    #[test]
    fn compact_json_is_one_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &items(),
            |_| Vec::<ItemRow>::new(),
            |i| i.id.to_string(),
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":1,"name":"sqli"},{"id":2,"name":"xss"}]"#);
    }

    #[test]
    fn detail_lines_align_values() {
        let out = detail_lines(&[("ID", "7".into()), ("Pattern", "UNION".into())]);
        assert_eq!(out, "ID:      7\nPattern: UNION");
    }

    #[test]
    fn palette_without_color_is_identity() {
        let p = Palette::new(&ColorMode::Never);
        assert_eq!(p.level("critical"), "critical");
        assert_eq!(p.accent("x"), "x");
    }
}
