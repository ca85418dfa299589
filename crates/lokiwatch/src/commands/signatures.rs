//! Signature command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tabled::Tabled;

use lokiwatch_api::LokiClient;
use lokiwatch_api::models::SyncResponse;
use lokiwatch_core::render::format_time;
use lokiwatch_core::{
    AutoConfirm, ConfirmRequest, Confirmer, Dashboard, DisplayRow, Gateway, Record, RecordKey,
    Signature, SignatureDraft, SignatureUpload, ViewKind, ViewPage,
};

use crate::cli::{GlobalOpts, SignaturesArgs, SignaturesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SignatureRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&DisplayRow> for SignatureRow {
    fn from(row: &DisplayRow) -> Self {
        Self {
            id: row.id.clone(),
            name: row.title.clone(),
            state: util::badges(row),
            pattern: util::field(row, "Pattern"),
            description: util::field(row, "Description"),
        }
    }
}

fn detail(s: &Signature) -> String {
    output::detail_lines(&[
        ("ID", s.id.to_string()),
        ("Name", s.name.clone()),
        ("Pattern", s.pattern.clone()),
        ("Action", s.action.to_uppercase()),
        ("Enabled", s.enabled.to_string()),
        ("Description", s.description.clone().unwrap_or_else(|| "-".into())),
        ("Created", format_time(s.created_at)),
        ("Updated", format_time(s.updated_at)),
    ])
}

fn sync_detail(r: &SyncResponse) -> String {
    let mut pairs = vec![
        ("Result", r.message.clone().unwrap_or_else(|| "done".into())),
        ("Rules", r.count.to_string()),
    ];
    if let Some(ref method) = r.method {
        pairs.push(("Method", method.clone()));
    }
    if let Some(ref file) = r.yaml_file {
        pairs.push(("YAML file", file.clone()));
    }
    if let Some(ref note) = r.note {
        pairs.push(("Note", note.clone()));
    }
    output::detail_lines(&pairs)
}

async fn fetch(dashboard: &Dashboard<LokiClient>, id: i64) -> Result<Signature, CliError> {
    match dashboard.gateway().get(&RecordKey::Signature(id)).await? {
        Record::Signature(sig) => Ok(sig),
        _ => Err(CliError::Internal {
            message: format!("signature {id} came back as another record type"),
        }),
    }
}

/// Asks first, then shows an upload spinner once the import is approved.
struct ImportConfirmer {
    prompt: util::PromptConfirmer,
    progress: ProgressBar,
    message: String,
    quiet: bool,
}

impl Confirmer for ImportConfirmer {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        let approved = self.prompt.confirm(request).await;
        if approved && !self.quiet {
            self.progress.set_draw_target(ProgressDrawTarget::stderr());
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                self.progress.set_style(style);
            }
            self.progress.set_message(self.message.clone());
            self.progress.enable_steady_tick(Duration::from_millis(80));
        }
        approved
    }
}

async fn toggle(
    dashboard: &Dashboard<LokiClient>,
    id: i64,
    enabled: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let sig = dashboard
        .dispatcher(AutoConfirm(true))
        .toggle_signature(id, enabled)
        .await?;
    let state = if sig.enabled { "enabled" } else { "disabled" };
    output::print_status(&format!("Signature {id} ({}) {state}", sig.name), global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    dashboard: &Dashboard<LokiClient>,
    args: SignaturesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SignaturesCommand::List {
            list,
            search,
            action,
            enabled,
        } => {
            let enabled = enabled.map(|e| e.to_string());
            let filters = [
                ("search", search.as_deref()),
                ("action", action.as_deref()),
                ("enabled", enabled.as_deref()),
            ];
            let (page, model) =
                util::fetch_view(dashboard, ViewKind::Signatures, &list, &filters).await?;
            let ViewPage::Signatures(page) = page else {
                return Err(CliError::Internal {
                    message: "signatures view returned another record type".into(),
                });
            };
            let out = output::render_view(
                &global.format(),
                &page.items,
                &model,
                |r| SignatureRow::from(r),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_page_footer(&model, global);
            Ok(())
        }

        SignaturesCommand::Get { id } => {
            let sig = fetch(dashboard, id).await?;
            let out = output::render_single(&global.format(), &sig, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SignaturesCommand::Create {
            name,
            pattern,
            action,
            description,
            disabled,
        } => {
            let draft = SignatureDraft {
                action,
                description,
                enabled: !disabled,
                ..SignatureDraft::new(name, pattern)
            };
            let sig = dashboard
                .dispatcher(AutoConfirm(true))
                .save_signature(None, draft)
                .await?;
            let out = output::render_single(&global.format(), &sig, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SignaturesCommand::Update {
            id,
            name,
            pattern,
            action,
            description,
        } => {
            let current = fetch(dashboard, id).await?;
            let mut draft = SignatureDraft::from(&current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(pattern) = pattern {
                draft.pattern = pattern;
            }
            if let Some(action) = action {
                draft.action = action;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            let sig = dashboard
                .dispatcher(AutoConfirm(true))
                .save_signature(Some(id), draft)
                .await?;
            let out = output::render_single(&global.format(), &sig, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SignaturesCommand::Enable { id } => toggle(dashboard, id, true, global).await,

        SignaturesCommand::Disable { id } => toggle(dashboard, id, false, global).await,

        SignaturesCommand::Delete { id } => {
            let confirmer = util::confirmer(global, "signatures delete")?;
            let outcome = dashboard.dispatcher(confirmer).delete_signature(id).await?;
            util::report(&outcome, &format!("Signature {id} deleted"), global);
            Ok(())
        }

        SignaturesCommand::Import { file } => {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let contents = tokio::fs::read(&file).await?;
            let upload = SignatureUpload::new(file_name, contents)?;

            let confirmer = ImportConfirmer {
                prompt: util::confirmer(global, "signatures import")?,
                progress: ProgressBar::hidden(),
                message: format!("Importing {}", upload.file_name()),
                quiet: global.quiet,
            };
            let progress = confirmer.progress.clone();
            let outcome = dashboard
                .dispatcher(confirmer)
                .import_signatures(upload)
                .await;
            progress.finish_and_clear();

            let outcome = outcome?;
            if let Some(summary) = outcome.done() {
                let out = output::render_single(
                    &global.format(),
                    &summary,
                    |s| {
                        output::detail_lines(&[
                            ("Result", s.message.clone().unwrap_or_else(|| "imported".into())),
                            ("Rules", s.count.to_string()),
                        ])
                    },
                    |s| s.count.to_string(),
                )?;
                output::print_output(&out, global.quiet);
            } else {
                output::print_status("Cancelled", global.quiet);
            }
            Ok(())
        }

        SignaturesCommand::Sync => {
            let resp = dashboard.gateway().sync_signatures_to_yaml().await?;
            let out =
                output::render_single(&global.format(), &resp, sync_detail, |r| r.count.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SignaturesCommand::ReloadEngine => {
            let resp = dashboard.gateway().reload_engine().await?;
            let out =
                output::render_single(&global.format(), &resp, sync_detail, |r| r.count.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
