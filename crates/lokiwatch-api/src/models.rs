// Wire types for the Loki IDS dashboard API
//
// These mirror the backend's JSON shapes. Fields use `#[serde(default)]`
// liberally because the backend omits optional columns instead of sending
// nulls, and older deployments return some lists without an envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

// ── List envelopes ───────────────────────────────────────────────────

/// A list payload as the backend sends it.
///
/// Paginated endpoints answer `{ <items>, total, page, page_size }` where
/// the items field is named after the resource (`alerts`, `signatures`,
/// `devices`, `entries`). Some deployments return a bare JSON array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListBody<T> {
    Envelope(ListEnvelope<T>),
    Bare(Vec<T>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    #[serde(
        alias = "alerts",
        alias = "signatures",
        alias = "devices",
        alias = "entries",
        alias = "blacklist"
    )]
    items: Vec<T>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    page_size: Option<u32>,
}

/// Normalized list response.
///
/// `total`, `page` and `page_size` are `None` when the endpoint does not
/// paginate server-side; callers paginate the full list themselves.
#[derive(Debug, Clone)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl<T> From<ListBody<T>> for ListResponse<T> {
    fn from(body: ListBody<T>) -> Self {
        match body {
            ListBody::Envelope(env) => Self {
                items: env.items,
                total: env.total,
                page: env.page,
                page_size: env.page_size,
            },
            ListBody::Bare(items) => Self {
                items,
                total: None,
                page: None,
                page_size: None,
            },
        }
    }
}

impl<T> ListResponse<T> {
    /// Whether the backend paginated this list itself.
    pub fn is_paginated(&self) -> bool {
        self.total.is_some()
    }
}

// ── Error body ───────────────────────────────────────────────────────

/// Error body shape: `{"detail": "..."}` for handler errors, or
/// `{"detail": [{"loc": [...], "msg": "..."}]}` for request validation.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub(crate) fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

// ── Alerts ───────────────────────────────────────────────────────────

/// An alert row from `GET /api/alerts` or `GET /api/alerts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub id: i64,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub src_ip: String,
    #[serde(default)]
    pub src_port: Option<u16>,
    #[serde(default)]
    pub dst_ip: Option<String>,
    #[serde(default)]
    pub dst_port: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,

    // Lifecycle counters (ONGOING / ENDED behaviour alerts)
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub packet_count: Option<u64>,
    #[serde(default)]
    pub attack_rate_pps: Option<f64>,
    #[serde(default)]
    pub total_duration_seconds: Option<f64>,
    #[serde(default)]
    pub total_packets: Option<u64>,
    #[serde(default)]
    pub average_rate_pps: Option<f64>,
    #[serde(default)]
    pub first_seen: Option<String>,
    #[serde(default)]
    pub last_seen: Option<String>,
}

/// Body for `POST /api/alerts` and `PUT /api/alerts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRequest {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub src_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

// ── Signatures ───────────────────────────────────────────────────────

/// A signature rule from `GET /api/signatures[/{id}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub id: i64,
    pub name: String,
    pub pattern: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub description: Option<String>,
    /// The backend stores this as an integer column; newer builds send booleans.
    #[serde(default = "default_true", deserialize_with = "bool_or_int")]
    pub enabled: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body for `POST /api/signatures` and `PUT /api/signatures/{id}`.
///
/// Updates always carry the full record: the backend treats omitted
/// fields as "leave unchanged" but the dashboard never relies on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub name: String,
    pub pattern: String,
    pub action: String,
    pub description: String,
    pub enabled: bool,
}

/// Response of `POST /api/signatures/reload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_action() -> String {
    "alert".into()
}

fn default_true() -> bool {
    true
}

fn bool_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(n)) => n != 0,
        None => true,
    })
}

// ── Blacklist ────────────────────────────────────────────────────────

/// An entry from `GET /api/blacklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistResponse {
    #[serde(alias = "ip_address")]
    pub ip: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "timestamp", alias = "created_at")]
    pub added_at: Option<String>,
    #[serde(default = "default_true", deserialize_with = "bool_or_int")]
    pub active: bool,
}

/// Body for `POST /api/blacklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistRequest {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ── IoT ──────────────────────────────────────────────────────────────

/// A registered IoT device from `GET /api/iot/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResponse {
    pub device_id: String,
    pub device_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mqtt_topic: Option<String>,
    #[serde(default = "default_true", deserialize_with = "bool_or_int")]
    pub enabled: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub state: serde_json::Map<String, serde_json::Value>,
}

/// Latest reported state from `GET /api/iot/devices/{id}/state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStateResponse {
    pub device_id: String,
    #[serde(default)]
    pub state: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Acknowledgement returned by the device command endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// MQTT bridge status from `GET /api/iot/mqtt/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttStatusResponse {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub broker_host: Option<String>,
    #[serde(default)]
    pub broker_port: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
}

// ── System ───────────────────────────────────────────────────────────

/// Alert statistics from `GET /api/stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_alerts: u64,
    #[serde(default)]
    pub alerts_by_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_attacking_ips: Vec<IpCount>,
    #[serde(default)]
    pub alerts_last_24h: u64,
    #[serde(default)]
    pub alerts_last_hour: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: String,
    pub count: u64,
}

/// IDS process status from `GET /api/system/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatusResponse {
    #[serde(default)]
    pub ids_running: bool,
    #[serde(default)]
    pub uptime: Option<String>,
    #[serde(default)]
    pub packets_processed: Option<u64>,
    #[serde(default)]
    pub alerts_count_24h: Option<u64>,
    #[serde(default)]
    pub blacklist_size: Option<u64>,
}

/// Backend health from `GET /api/system/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Result of asking the backend to push database rules to the engine
/// (`POST /api/signatures/sync-to-yaml`, `POST /api/system/reload-signatures`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub yaml_file: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Plain `{"message": "..."}` acknowledgement (deletes, connects).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
}
