// ── Core error types ──
//
// User-facing errors from lokiwatch-core. Consumers never match on HTTP
// plumbing directly; the `From<lokiwatch_api::Error>` impl translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the IDS backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("IDS backend did not answer in time")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Operation not supported: {operation}")]
    Unsupported { operation: String },

    #[error("Device {device_id} rejected the command: {message}")]
    DeviceCommandFailed { device_id: String, message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether an explicit user action should surface this error.
    ///
    /// Everything except internal bookkeeping failures is shown; internal
    /// errors are logged and the previous display is kept.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lokiwatch_api::Error> for CoreError {
    fn from(err: lokiwatch_api::Error) -> Self {
        if err.is_not_found() {
            let identifier = match err {
                lokiwatch_api::Error::Api { message, .. } => message,
                other => other.to_string(),
            };
            return CoreError::NotFound {
                entity: "Resource".into(),
                identifier,
            };
        }
        match err {
            lokiwatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        status: e.status().map_or(0, |s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            lokiwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            lokiwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            lokiwatch_api::Error::Api { status, message } => CoreError::Api { status, message },
            lokiwatch_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            lokiwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            lokiwatch_api::Error::Validation { field, reason } => CoreError::ValidationFailed {
                message: format!("{field}: {reason}"),
            },
        }
    }
}
