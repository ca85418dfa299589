// ── Runtime dashboard configuration ──
//
// Describes how to reach the IDS backend and how often to refresh.
// Never touches disk: the CLI builds a `DashboardConfig` from its
// profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use lokiwatch_api::transport::{TlsMode, TransportConfig};
use lokiwatch_api::websocket::ReconnectConfig;

use crate::view::ViewKind;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed sensors).
    DangerAcceptInvalid,
}

/// Default page size per list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizes {
    pub alerts: u32,
    pub signatures: u32,
    pub devices: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            alerts: 25,
            signatures: 20,
            devices: 20,
        }
    }
}

impl PageSizes {
    pub fn for_view(&self, view: ViewKind) -> u32 {
        match view {
            ViewKind::Alerts => self.alerts,
            ViewKind::Signatures => self.signatures,
            ViewKind::Devices => self.devices,
        }
    }
}

/// Configuration for one dashboard session against one backend.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend URL (e.g., `http://10.0.0.1:8080`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Subscribe to `/ws/alerts` for live invalidation.
    pub websocket_enabled: bool,
    /// Fixed wait between push-stream reconnect attempts.
    pub reconnect_delay: Duration,
    /// Push-stream keepalive interval. `None` disables pings.
    pub keepalive: Option<Duration>,
    /// Dashboard summary refresh period. Zero disables it.
    pub summary_interval: Duration,
    /// Device list polling period while the devices screen is visible.
    /// Zero disables polling.
    pub device_poll_interval: Duration,
    /// Quiet period before a filter edit triggers a fetch.
    pub debounce: Duration,
    pub page_sizes: PageSizes,
}

impl DashboardConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            websocket_enabled: true,
            reconnect_delay: Duration::from_secs(5),
            keepalive: Some(Duration::from_secs(30)),
            summary_interval: Duration::from_secs(30),
            device_poll_interval: Duration::from_secs(10),
            debounce: Duration::from_millis(300),
            page_sizes: PageSizes::default(),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }

    pub fn reconnect(&self) -> ReconnectConfig {
        ReconnectConfig {
            delay: self.reconnect_delay,
            keepalive: self.keepalive,
        }
    }
}
