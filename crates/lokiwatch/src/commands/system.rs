//! Dashboard summary and health handlers.

use std::fmt::Write as _;

use lokiwatch_api::LokiClient;
use lokiwatch_api::models::HealthResponse;
use lokiwatch_core::{Dashboard, DisplayBody, SummaryModel};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Palette};

use super::alerts::AlertRow;

/// Dashboard screen as text: status line, counters, breakdown, top
/// attackers and the most recent alerts.
fn summary_text(s: &SummaryModel, palette: Palette) -> String {
    let mut out = String::new();
    let status = if s.ids_running {
        palette.good(&s.status_label)
    } else {
        palette.bad(&s.status_label)
    };
    let _ = writeln!(out, "{status}  (engine {})", s.engine_label);
    let _ = writeln!(out);

    let counters: Vec<(&str, String)> = s
        .counters
        .iter()
        .map(|f| (f.label.as_str(), f.value.clone()))
        .collect();
    let _ = writeln!(out, "{}", output::detail_lines(&counters));

    if !s.by_type.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", palette.accent("Alerts by type"));
        let by_type: Vec<(&str, String)> = s
            .by_type
            .iter()
            .map(|f| (f.label.as_str(), f.value.clone()))
            .collect();
        let _ = writeln!(out, "{}", output::detail_lines(&by_type));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", palette.accent("Top attacking IPs"));
    match &s.top_ips {
        DisplayBody::Rows { rows } => {
            for row in rows {
                let count = row.field("Alerts").unwrap_or("-");
                let _ = writeln!(out, "  {:<40} {count}", row.title);
            }
        }
        DisplayBody::Empty { placeholder } => {
            let _ = writeln!(out, "  {}", palette.dim(placeholder));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", palette.accent("Recent alerts"));
    match &s.recent_alerts {
        DisplayBody::Rows { rows } => {
            let rows: Vec<AlertRow> = rows.iter().map(AlertRow::from).collect();
            let _ = write!(out, "{}", output::render_table(&rows));
        }
        DisplayBody::Empty { placeholder } => {
            let _ = write!(out, "  {}", palette.dim(placeholder));
        }
    }
    out
}

fn health_detail(h: &HealthResponse) -> String {
    output::detail_lines(&[
        ("Status", h.status.clone()),
        ("Database", h.database.clone().unwrap_or_else(|| "-".into())),
        ("Checked", h.timestamp.clone().unwrap_or_else(|| "-".into())),
    ])
}

pub async fn status(dashboard: &Dashboard<LokiClient>, global: &GlobalOpts) -> Result<(), CliError> {
    dashboard.refresh_summary().await?;
    let Some(summary) = dashboard.summary().borrow().clone() else {
        return Err(CliError::Internal {
            message: "summary missing after a refresh".into(),
        });
    };
    let palette = Palette::new(&global.color_mode());
    let out = output::render_single(
        &global.format(),
        summary.as_ref(),
        |s| summary_text(s, palette),
        |s| s.status_label.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn health(dashboard: &Dashboard<LokiClient>, global: &GlobalOpts) -> Result<(), CliError> {
    let health = dashboard.gateway().health().await?;
    let out = output::render_single(&global.format(), &health, health_detail, |h| {
        h.status.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
