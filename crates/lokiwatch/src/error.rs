//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lokiwatch_config::ConfigError;
use lokiwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the IDS backend at {url}")]
    #[diagnostic(
        code(lokictl::connection_failed),
        help(
            "Check that the dashboard backend is running and reachable.\n\
             Try: lokictl health --url http://<host>:8080"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(lokictl::tls_error),
        help(
            "For a self-signed backend use --insecure (-k),\n\
             or set ca_cert in your profile."
        )
    )]
    TlsError { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(lokictl::timeout),
        help("Increase the timeout with --timeout or check backend load.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(lokictl::not_found),
        help("Run: lokictl {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Backend ──────────────────────────────────────────────────────

    #[error("Backend error (HTTP {status}): {message}")]
    #[diagnostic(code(lokictl::api_error))]
    ApiError { status: u16, message: String },

    #[error("Device {device_id} rejected the command: {message}")]
    #[diagnostic(
        code(lokictl::device_rejected),
        help("Check the bridge with: lokictl mqtt status")
    )]
    DeviceRejected { device_id: String, message: String },

    #[error("Operation not supported: {operation}")]
    #[diagnostic(code(lokictl::unsupported))]
    Unsupported { operation: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(lokictl::internal),
        help("Re-run with -vv to see the raw exchange.")
    )]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lokictl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lokictl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lokictl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(lokictl::no_config),
        help(
            "Create a profile with: lokictl config init\n\
             or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(lokictl::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(lokictl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(lokictl::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::DeviceRejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                if reason.starts_with("TLS error") {
                    CliError::TlsError { reason }
                } else {
                    CliError::ConnectionFailed {
                        url,
                        source: reason.into(),
                    }
                }
            }

            CoreError::Timeout => CliError::Timeout,

            CoreError::NotFound { entity, identifier } => CliError::NotFound {
                list_command: list_command_for(&entity).into(),
                resource_type: entity,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Unsupported { operation } => CliError::Unsupported { operation },

            CoreError::DeviceCommandFailed { device_id, message } => {
                CliError::DeviceRejected { device_id, message }
            }

            CoreError::Api { status, message } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

impl From<lokiwatch_api::Error> for CliError {
    fn from(err: lokiwatch_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

fn list_command_for(entity: &str) -> &'static str {
    match entity.to_ascii_lowercase().as_str() {
        "signature" => "signatures list",
        "blacklist entry" => "blacklist list",
        "device" => "devices list",
        _ => "alerts list",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let not_found = CliError::from(CoreError::NotFound {
            entity: "Signature".into(),
            identifier: "9".into(),
        });
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            not_found,
            CliError::NotFound { ref list_command, .. } if list_command == "signatures list"
        ));

        let rejected = CliError::from(CoreError::DeviceCommandFailed {
            device_id: "esp32-bulb".into(),
            message: "MQTT not connected".into(),
        });
        assert_eq!(rejected.exit_code(), exit_code::REJECTED);

        let tls = CliError::from(CoreError::ConnectionFailed {
            url: String::new(),
            reason: "TLS error: bad CA".into(),
        });
        assert!(matches!(tls, CliError::TlsError { .. }));
        assert_eq!(tls.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "url".into(),
            reason: "invalid URL: nope".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
