//! Alert command handlers.

use tabled::Tabled;

use lokiwatch_api::LokiClient;
use lokiwatch_core::render::format_time;
use lokiwatch_core::{
    Alert, Dashboard, DisplayRow, Gateway, Record, RecordKey, ViewKind, ViewPage,
};

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&DisplayRow> for AlertRow {
    fn from(row: &DisplayRow) -> Self {
        Self {
            id: row.id.clone(),
            time: util::field(row, "Time"),
            kind: row.title.clone(),
            tags: util::badges(row),
            source: util::field(row, "Source"),
            destination: util::field(row, "Destination"),
            severity: util::field(row, "Severity"),
            message: util::field(row, "Message"),
        }
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn detail(a: &Alert) -> String {
    let mut pairs = vec![
        ("ID", a.id.to_string()),
        ("Time", format_time(a.timestamp)),
        ("Type", a.kind.to_string()),
        ("Subtype", opt(a.subtype.as_deref())),
        ("Pattern", opt(a.pattern.as_deref())),
        ("Status", opt(a.status.as_deref())),
        ("Source", format!("{}:{}", a.src_ip, opt(a.src_port))),
        (
            "Destination",
            format!("{}:{}", opt(a.dst_ip.as_deref()), opt(a.dst_port)),
        ),
        ("Severity", opt(a.severity.as_deref())),
        ("Message", a.message.clone()),
    ];
    if a.has_ended() {
        pairs.push(("Total Packets", opt(a.total_packets)));
        pairs.push((
            "Total Duration",
            opt(a.total_duration_secs.map(|s| format!("{s:.1}s"))),
        ));
        pairs.push((
            "Average Rate",
            opt(a.average_rate_pps.map(|r| format!("{r:.1} pps"))),
        ));
    } else if a.packet_count.is_some() {
        pairs.push(("Packets", opt(a.packet_count)));
        pairs.push((
            "Duration",
            opt(a.duration_secs.map(|s| format!("{s:.1}s"))),
        ));
        pairs.push((
            "Rate",
            opt(a.attack_rate_pps.map(|r| format!("{r:.1} pps"))),
        ));
    }
    if a.first_seen.is_some() || a.last_seen.is_some() {
        pairs.push(("First Seen", format_time(a.first_seen)));
        pairs.push(("Last Seen", format_time(a.last_seen)));
    }
    output::detail_lines(&pairs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AlertsCommand::List { list, filter } => {
            let (page, model) =
                util::fetch_view(dashboard, ViewKind::Alerts, &list, &filter.pairs()).await?;
            let ViewPage::Alerts(page) = page else {
                return Err(CliError::Internal {
                    message: "alerts view returned another record type".into(),
                });
            };
            let out = output::render_view(
                &global.format(),
                &page.items,
                &model,
                |r| AlertRow::from(r),
                |a| a.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_page_footer(&model, global);
            Ok(())
        }

        AlertsCommand::Get { id } => {
            let Record::Alert(alert) = dashboard.gateway().get(&RecordKey::Alert(id)).await? else {
                return Err(CliError::Internal {
                    message: format!("alert {id} came back as another record type"),
                });
            };
            let out =
                output::render_single(&global.format(), &alert, detail, |a| a.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Delete { id } => {
            let confirmer = util::confirmer(global, "alerts delete")?;
            let outcome = dashboard.dispatcher(confirmer).delete_alert(id).await?;
            util::report(&outcome, &format!("Alert {id} deleted"), global);
            Ok(())
        }
    }
}
