//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use lokiwatch_api::LokiClient;
use lokiwatch_core::{
    ConfirmRequest, Confirmer, Dashboard, DisplayModel, Outcome, ViewKind, ViewPage,
};

use crate::cli::{GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

// ── Confirmation ────────────────────────────────────────────────────

/// Confirms at the terminal with `dialoguer`, or approves everything
/// under `--yes`.
#[derive(Debug, Clone, Copy)]
pub struct PromptConfirmer {
    assume_yes: bool,
}

impl Confirmer for PromptConfirmer {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        if self.assume_yes {
            return true;
        }
        let prompt = prompt_text(&request);
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;
        match answer {
            Ok(Ok(approved)) => approved,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "confirmation prompt failed");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "confirmation prompt task failed");
                false
            }
        }
    }
}

/// The request messages already end in their own question.
fn prompt_text(request: &ConfirmRequest) -> String {
    format!("{}: {}", request.title, request.message)
}

/// Confirmer for a destructive `action`.
///
/// Without `--yes` a terminal is required to ask on.
pub fn confirmer(global: &GlobalOpts, action: &str) -> Result<PromptConfirmer, CliError> {
    if !global.yes && !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Ok(PromptConfirmer {
        assume_yes: global.yes,
    })
}

/// Report a finished or cancelled action on stderr.
pub fn report<T>(outcome: &Outcome<T>, done: &str, global: &GlobalOpts) {
    let message = if outcome.is_cancelled() { "Cancelled" } else { done };
    output::print_status(message, global.quiet);
}

// ── List views ──────────────────────────────────────────────────────

/// Apply list flags and filters to `view`, fetch it, and return the page
/// with its display model.
///
/// Filters and page size reset the page, so the page is applied last.
pub async fn fetch_view(
    dashboard: &Dashboard<LokiClient>,
    view: ViewKind,
    list: &ListArgs,
    filters: &[(&str, Option<&str>)],
) -> Result<(ViewPage, Arc<DisplayModel>), CliError> {
    let views = dashboard.views();
    if let Some(size) = list.page_size {
        if !(1..=200).contains(&size) {
            return Err(CliError::Validation {
                field: "page-size".into(),
                reason: format!("{size} is outside 1..=200"),
            });
        }
        views.set_page_size(view, size);
    }
    for (key, value) in filters {
        if let Some(value) = value {
            views.set_filter(view, key, value);
        }
    }
    if list.sort.is_some() {
        views.set_sort(view, list.sort.as_deref());
    }
    views.set_page(view, list.page);

    dashboard.refresh(view).await?;

    let page = dashboard.current_page(view);
    let model = dashboard.display(view).borrow().clone();
    match (page, model) {
        (Some(page), Some(model)) => Ok((page, model)),
        _ => Err(CliError::Internal {
            message: format!("{view} view has no data after a refresh"),
        }),
    }
}

/// `Page P of T (N total)` footer for table output.
pub fn print_page_footer(model: &DisplayModel, global: &GlobalOpts) {
    if global.format() == crate::cli::OutputFormat::Table {
        output::print_status(&model.summary, global.quiet);
    }
}

/// Join badges for a table cell.
pub fn badges(row: &lokiwatch_core::DisplayRow) -> String {
    row.badges.join(", ")
}

/// A row field or `-`.
pub fn field(row: &lokiwatch_core::DisplayRow, label: &str) -> String {
    row.field(label).unwrap_or("-").to_owned()
}
