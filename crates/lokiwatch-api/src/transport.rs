//! HTTP transport settings for talking to a Loki IDS backend.
//!
//! Sensors usually run the backend on a LAN host over plain HTTP, but a
//! deployment behind a reverse proxy may serve HTTPS with a private CA or
//! a self-signed certificate. [`TransportConfig`] carries that choice and
//! the per-request timeout into the `reqwest::Client` every
//! [`LokiClient`](crate::LokiClient) call goes through. The push listener
//! connects on its own and only reads the backend URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("lokiwatch/", env!("CARGO_PKG_VERSION"));

/// How server certificates are checked on HTTPS backends.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Trust the PEM-encoded CA at this path in addition to the system store.
    CustomCa(PathBuf),
    /// Accept any certificate, for sensors with a self-signed cert.
    DangerAcceptInvalid,
}

/// TLS and timeout settings applied to every REST request.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request timeout, connect through body.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build the `reqwest::Client` used by [`LokiClient`](crate::LokiClient).
    ///
    /// Fails with [`Error::Tls`] if a custom CA can't be read or parsed.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem)
        .map_err(|e| Error::Tls(format!("invalid CA cert {}: {e}", path.display())))
}
