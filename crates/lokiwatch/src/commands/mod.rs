//! Command dispatch: bridges CLI args -> dashboard / dispatcher -> output.

pub mod alerts;
pub mod blacklist;
pub mod config_cmd;
pub mod devices;
pub mod mqtt;
pub mod signatures;
pub mod system;
pub mod util;
pub mod watch;

use lokiwatch_api::LokiClient;
use lokiwatch_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard<LokiClient>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Alerts(args) => alerts::handle(dashboard, args, global).await,
        Command::Signatures(args) => signatures::handle(dashboard, args, global).await,
        Command::Blacklist(args) => blacklist::handle(dashboard, args, global).await,
        Command::Devices(args) => devices::handle(dashboard, args, global).await,
        Command::Mqtt(args) => mqtt::handle(dashboard, args, global).await,
        Command::Status => system::status(dashboard, global).await,
        Command::Health => system::health(dashboard, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Unsupported {
            operation: "config and completions need no backend".into(),
        }),
    }
}
