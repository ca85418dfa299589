//! Blacklist command handlers.

use tabled::Tabled;

use lokiwatch_api::LokiClient;
use lokiwatch_core::render::{format_time, project_blacklist};
use lokiwatch_core::{AutoConfirm, BlacklistDraft, BlacklistEntry, Dashboard, DisplayRow};

use crate::cli::{BlacklistArgs, BlacklistCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct BlacklistRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Added")]
    added: String,
}

impl From<&DisplayRow> for BlacklistRow {
    fn from(row: &DisplayRow) -> Self {
        Self {
            ip: row.title.clone(),
            state: util::badges(row),
            reason: util::field(row, "Reason"),
            added: util::field(row, "Added"),
        }
    }
}

fn detail(e: &BlacklistEntry) -> String {
    output::detail_lines(&[
        ("IP", e.ip.clone()),
        ("Active", e.active.to_string()),
        ("Reason", e.reason.clone().unwrap_or_else(|| "-".into())),
        ("Added", format_time(e.added_at)),
    ])
}

pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: BlacklistArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BlacklistCommand::List => {
            let entries = dashboard.refresh_blacklist().await?;
            let out = if entries.is_empty() && global.format() == crate::cli::OutputFormat::Table {
                "No blacklisted IPs".to_owned()
            } else {
                output::render_list(
                    &global.format(),
                    &entries,
                    |data| project_blacklist(data).iter().map(BlacklistRow::from).collect(),
                    |e| e.ip.clone(),
                )?
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BlacklistCommand::Add { ip, reason } => {
            let entry = dashboard
                .dispatcher(AutoConfirm(true))
                .add_blacklist(BlacklistDraft { ip, reason })
                .await?;
            let out = output::render_single(&global.format(), &entry, detail, |e| e.ip.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        BlacklistCommand::Remove { ip } => {
            let confirmer = util::confirmer(global, "blacklist remove")?;
            let outcome = dashboard.dispatcher(confirmer).remove_blacklist(&ip).await?;
            util::report(&outcome, &format!("{ip} removed from the blacklist"), global);
            Ok(())
        }
    }
}
