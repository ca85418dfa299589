//! Shared configuration for Loki IDS dashboard tools.
//!
//! TOML profiles merged with `LOKIWATCH_` environment overrides, and
//! translation to `lokiwatch_core::DashboardConfig`. The CLI layers its
//! own flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lokiwatch_core::{DashboardConfig, PageSizes, TlsVerification};

/// Profile used when neither the caller nor the file names one.
pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick a profile: `name` if given, else `default_profile`, else
    /// `"default"`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or(DEFAULT_PROFILE);
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile. Unset fields fall back to `[defaults]`, then
/// to the dashboard's built-in values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://10.0.0.5:8080").
    pub url: String,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Subscribe to the alert push stream.
    pub websocket: Option<bool>,

    pub reconnect_delay_secs: Option<u64>,
    pub summary_interval_secs: Option<u64>,
    pub device_poll_interval_secs: Option<u64>,
    pub debounce_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "PageSizeOverrides::is_empty")]
    pub page_sizes: PageSizeOverrides,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageSizeOverrides {
    pub alerts: Option<u32>,
    pub signatures: Option<u32>,
    pub devices: Option<u32>,
}

impl PageSizeOverrides {
    fn is_empty(&self) -> bool {
        self.alerts.is_none() && self.signatures.is_none() && self.devices.is_none()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "lokiwatch", "lokiwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lokiwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys nest on double underscores:
/// `LOKIWATCH_PROFILES__LAB__URL=http://10.0.0.9:8080`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOKIWATCH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile and the global defaults.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected an http(s) URL, got scheme '{}'", url.scheme()),
        });
    }

    let mut config = DashboardConfig::new(url);

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(nonzero(
        "timeout",
        profile.timeout.unwrap_or(defaults.timeout),
    )?);
    if let Some(enabled) = profile.websocket {
        config.websocket_enabled = enabled;
    }
    if let Some(secs) = profile.reconnect_delay_secs {
        config.reconnect_delay = Duration::from_secs(nonzero("reconnect_delay_secs", secs)?);
    }
    // Zero disables the timer.
    if let Some(secs) = profile.summary_interval_secs {
        config.summary_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = profile.device_poll_interval_secs {
        config.device_poll_interval = Duration::from_secs(secs);
    }
    if let Some(ms) = profile.debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }

    let defaults_sizes = PageSizes::default();
    let sizes = profile.page_sizes;
    config.page_sizes = PageSizes {
        alerts: page_size("page_sizes.alerts", sizes.alerts, defaults_sizes.alerts)?,
        signatures: page_size(
            "page_sizes.signatures",
            sizes.signatures,
            defaults_sizes.signatures,
        )?,
        devices: page_size("page_sizes.devices", sizes.devices, defaults_sizes.devices)?,
    };

    Ok(config)
}

fn nonzero(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

/// The backend caps `page_size` at 200.
fn page_size(field: &str, value: Option<u32>, default: u32) -> Result<u32, ConfigError> {
    match value {
        None => Ok(default),
        Some(n @ 1..=200) => Ok(n),
        Some(n) => Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("{n} is outside 1..=200"),
        }),
    }
}
