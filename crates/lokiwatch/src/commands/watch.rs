//! Live alert stream over the backend push channel.

use tokio::sync::broadcast::error::RecvError;

use lokiwatch_api::LokiClient;
use lokiwatch_core::render::format_time;
use lokiwatch_core::{
    Alert, AlertKind, ConnectionState, Dashboard, Screen, ViewKind, ViewStateStore,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output::{self, Palette};

use super::alerts::AlertRow;

fn endpoint(ip: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{ip}:{port}"),
        None => ip.to_owned(),
    }
}

/// One line per alert: time, type, source -> destination, message.
fn alert_line(alert: &Alert, palette: Palette) -> String {
    let src = endpoint(&alert.src_ip, alert.src_port);
    let dst = alert
        .dst_ip
        .as_deref()
        .map_or_else(|| "-".to_owned(), |ip| endpoint(ip, alert.dst_port));
    let kind = match alert.kind {
        AlertKind::Behavior => palette.bad(alert.kind.as_str()),
        AlertKind::Signature => palette.warn(alert.kind.as_str()),
        _ => palette.accent(alert.kind.as_str()),
    };
    format!(
        "{} {kind} {src} -> {dst} {}",
        palette.dim(&format_time(alert.timestamp)),
        alert.message
    )
}

fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "push stream disconnected, retrying",
        ConnectionState::Connecting => "connecting to push stream",
        ConnectionState::Connected => "push stream connected",
    }
}

fn wanted(alert: &Alert, filter: Option<&AlertKind>) -> bool {
    filter.is_none_or(|kind| &alert.kind == kind)
}

fn print_alert(alert: &Alert, palette: Palette, global: &GlobalOpts) -> Result<(), CliError> {
    let out = match global.format() {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(alert)?,
        OutputFormat::Plain => alert.id.to_string(),
        OutputFormat::Table | OutputFormat::Yaml => alert_line(alert, palette),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Limit the alerts page to one alert type.
fn narrow_page(views: &ViewStateStore, kind: &AlertKind) {
    views.set_filter(ViewKind::Alerts, "alert_type", kind.as_str());
}

pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = args.alert_type.as_deref().map(AlertKind::from);
    if let Some(ref kind) = filter {
        narrow_page(dashboard.views(), kind);
    }

    // The alerts screen keeps the page fresh on push; the dashboard
    // screen keeps the summary fresh instead.
    if args.page {
        dashboard.show_screen(Screen::Alerts).await?;
    }

    let mut alerts = dashboard.new_alerts();
    let mut conn = dashboard.connection_state();
    let mut page = dashboard.display(ViewKind::Alerts);
    page.mark_unchanged();

    dashboard.start().await?;
    output::print_status("Watching for alerts (Ctrl-C to stop)", global.quiet);

    let palette = Palette::new(&global.color_mode());
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),

            received = alerts.recv() => match received {
                Ok(alert) => {
                    if wanted(&alert, filter.as_ref()) {
                        if let Err(e) = print_alert(&alert, palette, global) {
                            break Err(e);
                        }
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "alert stream lagged");
                }
                Err(RecvError::Closed) => break Ok(()),
            },

            changed = conn.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let state = *conn.borrow_and_update();
                output::print_status(connection_label(state), global.quiet);
            }

            changed = page.changed(), if args.page => {
                if changed.is_err() {
                    break Ok(());
                }
                let model = page.borrow_and_update().clone();
                if let Some(model) = model {
                    let table = output::render_view(
                        &OutputFormat::Table,
                        &[] as &[Alert],
                        &model,
                        |r| AlertRow::from(r),
                        |a| a.id.to_string(),
                    );
                    match table {
                        Ok(table) => {
                            output::print_output(&table, global.quiet);
                            output::print_status(&model.summary, global.quiet);
                        }
                        Err(e) => break Err(e),
                    }
                }
            }
        }
    };

    dashboard.shutdown().await;
    result
}
