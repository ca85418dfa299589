mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "lokictl", &mut std::io::stdout());
            Ok(())
        }

        // Config commands work on the file itself, never the backend
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // All other commands talk to a backend
        cmd => {
            let cfg = config::load_config()?;
            config::apply_defaults(&mut cli.global, &cfg);
            let dash_config = config::dashboard_config(&cli.global, &cfg)?;
            let dashboard = config::connect(dash_config)?;

            tracing::debug!(command = ?cmd, url = %dashboard.config().url, "dispatching command");
            commands::dispatch(cmd, &dashboard, &cli.global).await
        }
    }
}
