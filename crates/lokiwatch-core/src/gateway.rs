// ── Fetch gateway ──
//
// The one seam between dashboard logic and the network. Every operation
// is a single attempt; failures come back as `CoreError`. `LokiClient`
// is the production implementation; tests substitute an in-memory one.

use std::fmt;
use std::future::Future;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use lokiwatch_api::LokiClient;
use lokiwatch_api::models::{AlertRequest, BlacklistRequest, SignatureRequest};

use crate::error::CoreError;
use crate::model::{Alert, AlertKind, BlacklistEntry, Device, MqttStatus, Signature, Summary};
use crate::page::Page;
use crate::view::{ViewKind, ViewState};

/// How many alerts the dashboard summary lists.
pub const RECENT_ALERTS: u32 = 10;

// ── Keys and records ─────────────────────────────────────────────────

/// Identifies one backend record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Alert(i64),
    Signature(i64),
    Blacklist(String),
    Device(String),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alert(id) => write!(f, "alert {id}"),
            Self::Signature(id) => write!(f, "signature {id}"),
            Self::Blacklist(ip) => write!(f, "blacklist entry {ip}"),
            Self::Device(id) => write!(f, "device {id}"),
        }
    }
}

/// A single record returned by `get`/`create`/`update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum Record {
    Alert(Alert),
    Signature(Signature),
    Blacklist(BlacklistEntry),
    Device(Device),
}

/// One page of whichever view was asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewPage {
    Alerts(Page<Alert>),
    Signatures(Page<Signature>),
    Devices(Page<Device>),
}

impl ViewPage {
    pub fn view(&self) -> ViewKind {
        match self {
            Self::Alerts(_) => ViewKind::Alerts,
            Self::Signatures(_) => ViewKind::Signatures,
            Self::Devices(_) => ViewKind::Devices,
        }
    }

    pub fn total_count(&self) -> u64 {
        match self {
            Self::Alerts(p) => p.total_count,
            Self::Signatures(p) => p.total_count,
            Self::Devices(p) => p.total_count,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Self::Alerts(p) => p.page,
            Self::Signatures(p) => p.page,
            Self::Devices(p) => p.page,
        }
    }

    pub fn page_size(&self) -> u32 {
        match self {
            Self::Alerts(p) => p.page_size,
            Self::Signatures(p) => p.page_size,
            Self::Devices(p) => p.page_size,
        }
    }

    pub fn total_pages(&self) -> u32 {
        crate::page::total_pages(self.total_count(), self.page_size())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Alerts(p) => p.items.len(),
            Self::Signatures(p) => p.items.len(),
            Self::Devices(p) => p.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the `enabled` flag of one signature in place and return the
    /// previous value.
    ///
    /// Returns `None` if the page doesn't hold that signature.
    pub(crate) fn set_signature_enabled(&mut self, id: i64, enabled: bool) -> Option<bool> {
        let Self::Signatures(page) = self else {
            return None;
        };
        let sig = page.items.iter_mut().find(|s| s.id == id)?;
        Some(std::mem::replace(&mut sig.enabled, enabled))
    }
}

// ── Drafts ───────────────────────────────────────────────────────────

/// Fields for creating or replacing an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: AlertKind,
    pub subtype: Option<String>,
    pub pattern: Option<String>,
    pub status: Option<String>,
    pub src_ip: String,
    pub src_port: Option<u16>,
    pub dst_ip: Option<String>,
    pub dst_port: Option<u16>,
    pub message: String,
    pub severity: Option<String>,
}

impl AlertDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.src_ip.parse::<IpAddr>().is_err() {
            return Err(CoreError::validation(format!(
                "source IP {:?} is not an IP address",
                self.src_ip
            )));
        }
        if self.message.trim().is_empty() {
            return Err(CoreError::validation("alert message must not be empty"));
        }
        Ok(())
    }

    fn into_request(self) -> AlertRequest {
        AlertRequest {
            timestamp: self
                .timestamp
                .unwrap_or_else(Utc::now)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
            alert_type: self.kind.as_str().to_owned(),
            subtype: self.subtype,
            pattern: self.pattern,
            status: self.status,
            src_ip: self.src_ip,
            src_port: self.src_port,
            dst_ip: self.dst_ip,
            dst_port: self.dst_port,
            message: self.message,
            severity: self.severity,
        }
    }
}

/// Fields for creating or replacing a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDraft {
    pub name: String,
    pub pattern: String,
    pub action: String,
    pub description: String,
    pub enabled: bool,
}

impl SignatureDraft {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            action: "alert".into(),
            description: String::new(),
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("signature name must not be empty"));
        }
        if self.pattern.trim().is_empty() {
            return Err(CoreError::validation("signature pattern must not be empty"));
        }
        Ok(())
    }

    fn into_request(self) -> SignatureRequest {
        SignatureRequest {
            name: self.name,
            pattern: self.pattern,
            action: self.action,
            description: self.description,
            enabled: self.enabled,
        }
    }
}

impl From<&Signature> for SignatureDraft {
    fn from(sig: &Signature) -> Self {
        Self {
            name: sig.name.clone(),
            pattern: sig.pattern.clone(),
            action: sig.action.clone(),
            description: sig.description.clone().unwrap_or_default(),
            enabled: sig.enabled,
        }
    }
}

/// A new blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistDraft {
    pub ip: String,
    pub reason: Option<String>,
}

impl BlacklistDraft {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.ip
            .trim()
            .parse::<IpAddr>()
            .map(|_| ())
            .map_err(|_| CoreError::validation(format!("{:?} is not an IP address", self.ip)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Alert(AlertDraft),
    Signature(SignatureDraft),
    Blacklist(BlacklistDraft),
}

impl Draft {
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Alert(d) => d.validate(),
            Self::Signature(d) => d.validate(),
            Self::Blacklist(d) => d.validate(),
        }
    }
}

// ── Uploads ──────────────────────────────────────────────────────────

/// A YAML rule file to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureUpload {
    file_name: String,
    contents: Vec<u8>,
}

impl SignatureUpload {
    /// Rejects names without a `.yaml`/`.yml` extension.
    pub fn new(file_name: impl Into<String>, contents: Vec<u8>) -> Result<Self, CoreError> {
        let file_name = file_name.into();
        if !lokiwatch_api::is_yaml_file_name(&file_name) {
            return Err(CoreError::validation(format!(
                "{file_name} is not a .yaml or .yml file"
            )));
        }
        Ok(Self {
            file_name,
            contents,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub message: Option<String>,
    pub count: u64,
    pub file_name: Option<String>,
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AlarmAction {
    Enable,
    Disable,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BuzzerAction {
    On,
    Off,
    Beep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LedAction {
    On,
    Off,
    Auto,
}

/// A command for one device, sent through the MQTT bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    /// `brightness` defaults to full (255) on the backend.
    Bulb { on: bool, brightness: Option<u8> },
    Alarm(AlarmAction),
    /// `duration_ms` only matters for `Beep`; the backend default is 1000.
    Buzzer {
        action: BuzzerAction,
        duration_ms: Option<u32>,
    },
    Led(LedAction),
}

impl DeviceCommand {
    /// Last path segment of the command endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Bulb { .. } => "bulb",
            Self::Alarm(_) => "alarm",
            Self::Buzzer { .. } => "buzzer",
            Self::Led(_) => "led",
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match *self {
            Self::Bulb { on, brightness } => {
                let mut q = vec![("state", if on { "on" } else { "off" }.to_owned())];
                if let Some(b) = brightness {
                    q.push(("brightness", b.to_string()));
                }
                q
            }
            Self::Alarm(action) => vec![("action", action.to_string())],
            Self::Buzzer {
                action,
                duration_ms,
            } => {
                let mut q = vec![("action", action.to_string())];
                if let Some(ms) = duration_ms {
                    q.push(("duration", ms.to_string()));
                }
                q
            }
            Self::Led(action) => vec![("action", action.to_string())],
        }
    }
}

/// Backend acknowledgement of a device command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
    pub message: Option<String>,
}

// ── Gateway trait ────────────────────────────────────────────────────

/// Typed access to the IDS backend.
pub trait Gateway: Send + Sync + 'static {
    fn list(
        &self,
        view: ViewKind,
        state: &ViewState,
    ) -> impl Future<Output = Result<ViewPage, CoreError>> + Send;

    fn get(&self, key: &RecordKey) -> impl Future<Output = Result<Record, CoreError>> + Send;

    fn create(&self, draft: Draft) -> impl Future<Output = Result<Record, CoreError>> + Send;

    fn update(
        &self,
        key: &RecordKey,
        draft: Draft,
    ) -> impl Future<Output = Result<Record, CoreError>> + Send;

    fn remove(&self, key: &RecordKey) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn blacklist(&self) -> impl Future<Output = Result<Vec<BlacklistEntry>, CoreError>> + Send;

    fn import_signatures(
        &self,
        upload: SignatureUpload,
    ) -> impl Future<Output = Result<ImportSummary, CoreError>> + Send;

    fn set_device_state(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<CommandAck, CoreError>> + Send;

    fn summary(&self) -> impl Future<Output = Result<Summary, CoreError>> + Send;

    fn mqtt_status(&self) -> impl Future<Output = Result<MqttStatus, CoreError>> + Send;

    fn mqtt_connect(
        &self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── Client-side filtering ────────────────────────────────────────────

/// Apply signature filters locally (for backends that return every rule).
pub(crate) fn filter_signatures(items: Vec<Signature>, state: &ViewState) -> Vec<Signature> {
    let search = state.filter("search").map(str::to_lowercase);
    let action = state.filter("action");
    let enabled = state.filter("enabled").and_then(parse_flag);

    let mut out: Vec<Signature> = items
        .into_iter()
        .filter(|s| {
            search.as_deref().is_none_or(|q| {
                s.name.to_lowercase().contains(q)
                    || s.pattern.to_lowercase().contains(q)
                    || s.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(q))
            })
        })
        .filter(|s| action.is_none_or(|a| s.action.eq_ignore_ascii_case(a)))
        .filter(|s| enabled.is_none_or(|e| s.enabled == e))
        .collect();

    if let Some((key, descending)) = sort_key(state) {
        match key {
            "id" => out.sort_by_key(|s| s.id),
            "name" => out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
            "action" => out.sort_by(|a, b| a.action.cmp(&b.action)),
            _ => {}
        }
        if descending {
            out.reverse();
        }
    }
    out
}

/// Apply device filters locally; the backend never filters devices.
pub(crate) fn filter_devices(items: Vec<Device>, state: &ViewState) -> Vec<Device> {
    let device_type = state.filter("device_type");
    let enabled = state.filter("enabled").and_then(parse_flag);

    let mut out: Vec<Device> = items
        .into_iter()
        .filter(|d| device_type.is_none_or(|t| d.device_type.eq_ignore_ascii_case(t)))
        .filter(|d| enabled.is_none_or(|e| d.enabled == e))
        .collect();

    if let Some((key, descending)) = sort_key(state) {
        match key {
            "device_id" => out.sort_by(|a, b| a.device_id.cmp(&b.device_id)),
            "name" => out.sort_by(|a, b| a.label().cmp(b.label())),
            "device_type" => out.sort_by(|a, b| a.device_type.cmp(&b.device_type)),
            "last_seen" => out.sort_by_key(|d| d.last_seen),
            _ => {}
        }
        if descending {
            out.reverse();
        }
    }
    out
}

/// `"name"` → `("name", false)`, `"-name"` → `("name", true)`.
fn sort_key(state: &ViewState) -> Option<(&str, bool)> {
    let raw = state.sort.as_deref()?;
    Some(match raw.strip_prefix('-') {
        Some(key) => (key, true),
        None => (raw, false),
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "enabled" => Some(true),
        "false" | "0" | "no" | "disabled" => Some(false),
        _ => None,
    }
}

// ── LokiClient implementation ────────────────────────────────────────

impl Gateway for LokiClient {
    async fn list(&self, view: ViewKind, state: &ViewState) -> Result<ViewPage, CoreError> {
        let page = match view {
            ViewKind::Alerts => {
                let resp = self.list_alerts(&state.query_pairs()).await?;
                let paginated = resp.is_paginated();
                let items: Vec<Alert> = resp.items.into_iter().map(Alert::from).collect();
                ViewPage::Alerts(if paginated {
                    Page::new(
                        items,
                        resp.total.unwrap_or_default(),
                        resp.page.unwrap_or(state.page),
                        resp.page_size.unwrap_or(state.page_size),
                    )
                } else {
                    Page::slice(items, state.page, state.page_size)
                })
            }
            ViewKind::Signatures => {
                let resp = self.list_signatures(&state.query_pairs()).await?;
                let paginated = resp.is_paginated();
                let items: Vec<Signature> = resp.items.into_iter().map(Signature::from).collect();
                ViewPage::Signatures(if paginated {
                    Page::new(
                        items,
                        resp.total.unwrap_or_default(),
                        resp.page.unwrap_or(state.page),
                        resp.page_size.unwrap_or(state.page_size),
                    )
                } else {
                    Page::slice(filter_signatures(items, state), state.page, state.page_size)
                })
            }
            ViewKind::Devices => {
                let resp = self.list_devices().await?;
                let items: Vec<Device> = resp.items.into_iter().map(Device::from).collect();
                ViewPage::Devices(Page::slice(
                    filter_devices(items, state),
                    state.page,
                    state.page_size,
                ))
            }
        };
        Ok(page)
    }

    async fn get(&self, key: &RecordKey) -> Result<Record, CoreError> {
        match key {
            RecordKey::Alert(id) => Ok(Record::Alert(self.get_alert(*id).await?.into())),
            RecordKey::Signature(id) => {
                Ok(Record::Signature(self.get_signature(*id).await?.into()))
            }
            RecordKey::Blacklist(ip) => self
                .list_blacklist()
                .await?
                .items
                .into_iter()
                .find(|e| e.ip == *ip)
                .map(|e| Record::Blacklist(e.into()))
                .ok_or_else(|| not_found(key)),
            RecordKey::Device(id) => self
                .list_devices()
                .await?
                .items
                .into_iter()
                .find(|d| d.device_id == *id)
                .map(|d| Record::Device(d.into()))
                .ok_or_else(|| not_found(key)),
        }
    }

    async fn create(&self, draft: Draft) -> Result<Record, CoreError> {
        draft.validate()?;
        match draft {
            Draft::Alert(d) => {
                let created = self.create_alert(&d.into_request()).await?;
                Ok(Record::Alert(created.into()))
            }
            Draft::Signature(d) => {
                let created = self.create_signature(&d.into_request()).await?;
                Ok(Record::Signature(created.into()))
            }
            Draft::Blacklist(d) => {
                let ip = d.ip.trim().to_owned();
                let request = BlacklistRequest {
                    ip: ip.clone(),
                    reason: d.reason.clone(),
                };
                let resp = self.add_blacklist(&request).await?;
                let entry = serde_json::from_value::<lokiwatch_api::models::BlacklistResponse>(resp)
                    .map_or_else(
                        |_| BlacklistEntry {
                            ip,
                            reason: d.reason,
                            added_at: Some(Utc::now()),
                            active: true,
                        },
                        BlacklistEntry::from,
                    );
                Ok(Record::Blacklist(entry))
            }
        }
    }

    async fn update(&self, key: &RecordKey, draft: Draft) -> Result<Record, CoreError> {
        draft.validate()?;
        match (key, draft) {
            (RecordKey::Alert(id), Draft::Alert(d)) => {
                let updated = self.update_alert(*id, &d.into_request()).await?;
                Ok(Record::Alert(updated.into()))
            }
            (RecordKey::Signature(id), Draft::Signature(d)) => {
                let updated = self.update_signature(*id, &d.into_request()).await?;
                Ok(Record::Signature(updated.into()))
            }
            (key, _) => Err(CoreError::Unsupported {
                operation: format!("update {key} with this draft"),
            }),
        }
    }

    async fn remove(&self, key: &RecordKey) -> Result<(), CoreError> {
        match key {
            RecordKey::Alert(id) => self.delete_alert(*id).await?,
            RecordKey::Signature(id) => self.delete_signature(*id).await?,
            RecordKey::Blacklist(ip) => self.remove_blacklist(ip).await?,
            RecordKey::Device(_) => {
                return Err(CoreError::Unsupported {
                    operation: format!("remove {key}"),
                });
            }
        }
        Ok(())
    }

    async fn blacklist(&self) -> Result<Vec<BlacklistEntry>, CoreError> {
        let resp = self.list_blacklist().await?;
        Ok(resp.items.into_iter().map(BlacklistEntry::from).collect())
    }

    async fn import_signatures(&self, upload: SignatureUpload) -> Result<ImportSummary, CoreError> {
        let resp = LokiClient::import_signatures(self, &upload.file_name, upload.contents).await?;
        Ok(ImportSummary {
            message: resp.message,
            count: resp.count,
            file_name: resp.filename,
        })
    }

    async fn set_device_state(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<CommandAck, CoreError> {
        let resp = self
            .device_command(device_id, command.endpoint(), &command.query())
            .await?;
        Ok(CommandAck {
            success: resp.success,
            message: resp.message,
        })
    }

    async fn summary(&self) -> Result<Summary, CoreError> {
        let recent = vec![
            ("page".to_owned(), "1".to_owned()),
            ("page_size".to_owned(), RECENT_ALERTS.to_string()),
        ];
        let (stats, status, recent) = tokio::try_join!(
            self.stats(),
            self.system_status(),
            self.list_alerts(&recent),
        )?;
        Ok(Summary {
            stats: stats.into(),
            status: status.into(),
            recent_alerts: recent.items.into_iter().map(Alert::from).collect(),
        })
    }

    async fn mqtt_status(&self) -> Result<MqttStatus, CoreError> {
        Ok(LokiClient::mqtt_status(self).await?.into())
    }

    async fn mqtt_connect(&self, host: &str, port: u16) -> Result<(), CoreError> {
        LokiClient::mqtt_connect(self, host, port).await?;
        Ok(())
    }
}

fn not_found(key: &RecordKey) -> CoreError {
    let (entity, identifier) = match key {
        RecordKey::Alert(id) => ("Alert", id.to_string()),
        RecordKey::Signature(id) => ("Signature", id.to_string()),
        RecordKey::Blacklist(ip) => ("Blacklist entry", ip.clone()),
        RecordKey::Device(id) => ("Device", id.clone()),
    };
    CoreError::NotFound {
        entity: entity.into(),
        identifier,
    }
}
