//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DEFAULT_PROFILE, Profile};
use crate::error::CliError;
use crate::output;

const DEFAULT_URL: &str = "http://127.0.0.1:8080";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config as the TOML a user would write by hand.
///
/// Sections are separated by one blank line and the text carries no
/// trailing newline.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(websocket) = p.websocket {
            let _ = writeln!(out, "websocket = {websocket}");
        }
        for (key, value) in [
            ("reconnect_delay_secs", p.reconnect_delay_secs),
            ("summary_interval_secs", p.summary_interval_secs),
            ("device_poll_interval_secs", p.device_poll_interval_secs),
            ("debounce_ms", p.debounce_ms),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "{key} = {value}");
            }
        }

        let sizes = [
            ("alerts", p.page_sizes.alerts),
            ("signatures", p.page_sizes.signatures),
            ("devices", p.page_sizes.devices),
        ];
        if sizes.iter().any(|(_, v)| v.is_some()) {
            let _ = writeln!(out);
            let _ = writeln!(out, "[profiles.{name}.page_sizes]");
            for (key, value) in sizes {
                if let Some(value) = value {
                    let _ = writeln!(out, "{key} = {value}");
                }
            }
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn save(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let mut cfg = config::load_config()?;
            eprintln!("Loki IDS dashboard setup");
            eprintln!("   Config path: {}\n", config::config_path().display());

            let name: String = Input::new()
                .with_prompt("Profile name")
                .default(DEFAULT_PROFILE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Backend URL")
                .default(DEFAULT_URL.into())
                .interact_text()
                .map_err(prompt_err)?;

            let insecure = Confirm::new()
                .with_prompt("Accept self-signed TLS certificates?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let profile = Profile {
                insecure: insecure.then_some(true),
                ..Profile::new(url)
            };
            // Reject a bad URL before it reaches the file
            config::profile_to_dashboard_config(&profile, &cfg.defaults)?;

            cfg.profiles.insert(name.clone(), profile);
            if cfg
                .default_profile
                .as_ref()
                .is_none_or(|d| !cfg.profiles.contains_key(d))
            {
                cfg.default_profile = Some(name.clone());
            }
            let path = save(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Profile: {name}");
            eprintln!("\n  Test it: lokictl health");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(&global.format(), &cfg, format_config, |c| {
                config::active_profile_name(global, c)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── SetDefault <name> ───────────────────────────────────────
        ConfigCommand::SetDefault { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                let available: Vec<_> = cfg.profiles.keys().cloned().collect();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
            cfg.default_profile = Some(name.clone());
            save(&cfg)?;
            output::print_status(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
