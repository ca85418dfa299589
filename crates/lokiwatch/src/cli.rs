//! Clap derive structures for the `lokictl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lokictl -- terminal dashboard for a Loki IDS backend
#[derive(Debug, Parser)]
#[command(
    name = "lokictl",
    version,
    about = "Watch and manage a Loki IDS from the command line",
    long_about = "Browse alerts, manage detection signatures, the IP blacklist and\n\
        IoT responders of a Loki IDS dashboard backend.\n\n\
        `lokictl watch` follows the live alert stream.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "LOKIWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'u', env = "LOKIWATCH_URL", global = true)]
    pub url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "LOKIWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LOKIWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LOKIWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// Selected output format, after config defaults were applied.
    pub fn format(&self) -> OutputFormat {
        self.output.clone().unwrap_or(OutputFormat::Table)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color.clone().unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and delete alerts
    #[command(alias = "a")]
    Alerts(AlertsArgs),

    /// Manage detection signatures
    #[command(alias = "sig", alias = "s")]
    Signatures(SignaturesArgs),

    /// Manage the IP blacklist
    #[command(alias = "bl")]
    Blacklist(BlacklistArgs),

    /// List and command IoT responders
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// MQTT bridge status and connection
    Mqtt(MqttArgs),

    /// Dashboard summary: counters, top attackers, recent alerts
    Status,

    /// Backend and database health
    Health,

    /// Follow the live alert stream
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

/// Shared pagination arguments for all list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Page to show (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Items per page (1-200) [default: from profile]
    #[arg(long, short = 'l')]
    pub page_size: Option<u32>,

    /// Sort key; prefix with '-' for descending
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts, newest first
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        #[command(flatten)]
        filter: AlertFilterArgs,
    },

    /// Show one alert
    Get {
        /// Alert ID
        id: i64,
    },

    /// Delete an alert
    #[command(alias = "rm")]
    Delete {
        /// Alert ID
        id: i64,
    },
}

/// Server-side alert filters.
#[derive(Debug, Clone, Default, Args)]
pub struct AlertFilterArgs {
    /// Alert type (SIGNATURE, BEHAVIOR, SYSTEM)
    #[arg(long = "type", short = 't')]
    pub alert_type: Option<String>,

    /// Alert subtype (e.g. syn_flood)
    #[arg(long)]
    pub subtype: Option<String>,

    /// Matched signature pattern name
    #[arg(long)]
    pub pattern: Option<String>,

    /// Lifecycle status (ongoing, ended)
    #[arg(long)]
    pub status: Option<String>,

    /// Source IP
    #[arg(long)]
    pub src_ip: Option<String>,

    /// Destination IP
    #[arg(long)]
    pub dst_ip: Option<String>,
}

impl AlertFilterArgs {
    /// Filter pairs keyed by wire parameter name.
    pub fn pairs(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("alert_type", self.alert_type.as_deref()),
            ("subtype", self.subtype.as_deref()),
            ("pattern", self.pattern.as_deref()),
            ("status", self.status.as_deref()),
            ("src_ip", self.src_ip.as_deref()),
            ("dst_ip", self.dst_ip.as_deref()),
        ]
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SIGNATURES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SignaturesArgs {
    #[command(subcommand)]
    pub command: SignaturesCommand,
}

#[derive(Debug, Subcommand)]
pub enum SignaturesCommand {
    /// List signatures
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Match name, pattern or description
        #[arg(long)]
        search: Option<String>,

        /// Action (alert, log, drop)
        #[arg(long)]
        action: Option<String>,

        /// Only enabled (true) or disabled (false) rules
        #[arg(long)]
        enabled: Option<bool>,
    },

    /// Show one signature
    Get {
        /// Signature ID
        id: i64,
    },

    /// Create a signature
    Create {
        /// Rule name
        #[arg(long)]
        name: String,

        /// Match pattern
        #[arg(long)]
        pattern: String,

        /// Action taken on match
        #[arg(long, default_value = "alert")]
        action: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Create the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Change fields of a signature; unspecified fields keep their value
    Update {
        /// Signature ID
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        pattern: Option<String>,

        #[arg(long)]
        action: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Enable a signature
    Enable {
        /// Signature ID
        id: i64,
    },

    /// Disable a signature
    Disable {
        /// Signature ID
        id: i64,
    },

    /// Delete a signature
    #[command(alias = "rm")]
    Delete {
        /// Signature ID
        id: i64,
    },

    /// Import rules from a YAML file
    Import {
        /// Path to a .yaml or .yml rule file
        file: PathBuf,
    },

    /// Write database rules to the engine's YAML file
    Sync,

    /// Make the running engine reload its rules
    ReloadEngine,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BLACKLIST
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BlacklistArgs {
    #[command(subcommand)]
    pub command: BlacklistCommand,
}

#[derive(Debug, Subcommand)]
pub enum BlacklistCommand {
    /// List blacklisted IPs
    #[command(alias = "ls")]
    List,

    /// Blacklist an IP
    Add {
        /// IPv4 or IPv6 address
        ip: String,

        /// Why it is blacklisted
        #[arg(long, short = 'r')]
        reason: Option<String>,
    },

    /// Remove an IP from the blacklist
    #[command(alias = "rm")]
    Remove {
        /// IPv4 or IPv6 address
        ip: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List registered devices
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,

        /// Device type (bulb, alarm, buzzer, led, motion_sensor)
        #[arg(long = "type", short = 't')]
        device_type: Option<String>,
    },

    /// Show the latest reported state of a device
    State {
        /// Device ID
        device: String,
    },

    /// Switch a smart bulb
    Bulb {
        /// Device ID
        device: String,

        /// on or off
        #[arg(value_parser = parse_on_off, action = clap::ArgAction::Set)]
        state: bool,

        /// Brightness 0-255
        #[arg(long, short = 'b')]
        brightness: Option<u8>,
    },

    /// Control an alarm (enable, disable, test)
    Alarm {
        /// Device ID
        device: String,

        action: String,
    },

    /// Control a buzzer (on, off, beep)
    Buzzer {
        /// Device ID
        device: String,

        action: String,

        /// Beep length in milliseconds
        #[arg(long, short = 'd')]
        duration: Option<u32>,
    },

    /// Control a status LED (on, off, auto)
    Led {
        /// Device ID
        device: String,

        action: String,
    },
}

fn parse_on_off(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{other}'")),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MQTT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MqttArgs {
    #[command(subcommand)]
    pub command: MqttCommand,
}

#[derive(Debug, Subcommand)]
pub enum MqttCommand {
    /// Show bridge status
    Status,

    /// Connect the bridge to a broker
    Connect {
        /// Broker host; repeat to try several in order [default: 127.0.0.1, localhost, 10.0.0.1]
        #[arg(long)]
        host: Vec<String>,

        #[arg(long, default_value = "1883")]
        port: u16,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only print alerts of this type
    #[arg(long = "type", short = 't')]
    pub alert_type: Option<String>,

    /// Reprint the alerts page after each new alert
    #[arg(long)]
    pub page: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile setup
    Init,

    /// Show the current configuration
    Show,

    /// Print the config file path
    Path,

    /// Choose the profile used when --profile is not given
    SetDefault {
        /// Profile name
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
