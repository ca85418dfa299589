//! CLI configuration -- thin wrapper around `lokiwatch_config`.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --insecure, --timeout).

use clap::ValueEnum;

use lokiwatch_api::LokiClient;
use lokiwatch_core::{Dashboard, DashboardConfig};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use lokiwatch_config::{
    Config, DEFAULT_PROFILE, Profile, config_path, load_config, profile_to_dashboard_config,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.into())
}

/// Fill `--output` / `--color` from `[defaults]` when not given.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&config.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&config.defaults.color, true).ok();
    }
}

/// Pick the profile to use, with CLI flag overrides applied.
///
/// `--url` works without any config file; otherwise the named (or
/// default) profile must exist.
pub fn resolve_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    let name = active_profile_name(global, config);
    let mut profile = match (config.profiles.get(&name), &global.url) {
        (Some(profile), _) => profile.clone(),
        (None, Some(url)) => Profile::new(url.clone()),
        (None, None) if config.profiles.is_empty() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        (None, None) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: config
                    .profiles
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    };

    // Flag > env > profile
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    Ok(profile)
}

/// Translate config file + flags into a `DashboardConfig`.
pub fn dashboard_config(global: &GlobalOpts, config: &Config) -> Result<DashboardConfig, CliError> {
    let profile = resolve_profile(global, config)?;
    Ok(profile_to_dashboard_config(&profile, &config.defaults)?)
}

/// Build the HTTP client and a dashboard over it. Nothing is fetched yet.
pub fn connect(dash_config: DashboardConfig) -> Result<Dashboard<LokiClient>, CliError> {
    let client = LokiClient::new(dash_config.url.as_str(), &dash_config.transport())?;
    Ok(Dashboard::new(dash_config, client))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["lokictl"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(names: &[(&str, &str)]) -> Config {
        let mut cfg = Config::default();
        for (name, url) in names {
            cfg.profiles.insert((*name).into(), Profile::new(*url));
        }
        cfg
    }

    #[test]
    fn url_flag_works_without_config() {
        let profile = resolve_profile(
            &global(&["--url", "http://10.0.0.5:8080"]),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(profile.url, "http://10.0.0.5:8080");
    }

    #[test]
    fn missing_config_and_url_is_no_config() {
        let err = resolve_profile(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = config_with(&[("lab", "http://a:8080"), ("edge", "http://b:8080")]);
        let err = resolve_profile(&global(&["--profile", "prod"]), &cfg).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "edge, lab");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with(&[("default", "http://a:8080")]);
        let dash = dashboard_config(
            &global(&["--url", "https://b:8443", "-k", "--timeout", "5"]),
            &cfg,
        )
        .unwrap();
        assert_eq!(dash.url.as_str(), "https://b:8443/");
        assert_eq!(dash.timeout, std::time::Duration::from_secs(5));
        assert_eq!(dash.tls, lokiwatch_core::TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn output_defaults_come_from_config() {
        let mut cfg = Config::default();
        cfg.defaults.output = "json".into();
        let mut g = global(&[]);
        apply_defaults(&mut g, &cfg);
        assert_eq!(g.format(), OutputFormat::Json);

        let mut g = global(&["-o", "yaml"]);
        apply_defaults(&mut g, &cfg);
        assert_eq!(g.format(), OutputFormat::Yaml);
    }
}
