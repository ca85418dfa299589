// ── Render projector ──
//
// Pure functions from fetched data to display models. No I/O, no
// mutation; a UI layer only has to lay these out.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::ViewPage;
use crate::model::{Alert, BlacklistEntry, Device, Signature, Summary};
use crate::view::{ViewKind, ViewState};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MISSING: &str = "N/A";

// ── Display types ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    pub label: String,
    pub value: String,
}

impl DisplayField {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_owned(),
            value: value.into(),
        }
    }
}

/// One rendered list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub id: String,
    pub title: String,
    pub badges: Vec<String>,
    pub fields: Vec<DisplayField>,
    /// Enabled switch state, for rows that have one.
    pub toggle: Option<bool>,
}

impl DisplayRow {
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayBody {
    Rows { rows: Vec<DisplayRow> },
    Empty { placeholder: String },
}

impl DisplayBody {
    fn from_rows(rows: Vec<DisplayRow>, placeholder: &str) -> Self {
        if rows.is_empty() {
            Self::Empty {
                placeholder: placeholder.to_owned(),
            }
        } else {
            Self::Rows { rows }
        }
    }

    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            Self::Rows { rows } => rows,
            Self::Empty { .. } => &[],
        }
    }
}

/// Everything a list screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub view: ViewKind,
    /// `Page P of T (N total)`.
    pub summary: String,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Active filters, for the UI to echo back.
    pub filters: Vec<DisplayField>,
    pub body: DisplayBody,
}

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryModel {
    pub ids_running: bool,
    /// `IDS Online` / `IDS Offline`.
    pub status_label: String,
    /// `Running` / `Stopped`.
    pub engine_label: String,
    pub counters: Vec<DisplayField>,
    /// Alert count per type, largest first.
    pub by_type: Vec<DisplayField>,
    pub top_ips: DisplayBody,
    pub recent_alerts: DisplayBody,
}

// ── Projections ──────────────────────────────────────────────────────

/// Project one fetched page into its display model.
pub fn project(page: &ViewPage, state: &ViewState) -> DisplayModel {
    let (body, view) = match page {
        ViewPage::Alerts(p) => (
            DisplayBody::from_rows(p.items.iter().map(alert_row).collect(), "No alerts found"),
            ViewKind::Alerts,
        ),
        ViewPage::Signatures(p) => (
            DisplayBody::from_rows(
                p.items.iter().map(signature_row).collect(),
                "No signatures found",
            ),
            ViewKind::Signatures,
        ),
        ViewPage::Devices(p) => (
            DisplayBody::from_rows(
                p.items.iter().map(device_row).collect(),
                "No IoT devices registered. Devices will appear here when connected.",
            ),
            ViewKind::Devices,
        ),
    };

    let current = page.page();
    let total_pages = page.total_pages();
    let total_count = page.total_count();

    DisplayModel {
        view,
        summary: format!("Page {current} of {total_pages} ({total_count} total)"),
        page: current,
        total_pages,
        total_count,
        prev_enabled: current > 1,
        next_enabled: current < total_pages,
        filters: state
            .filters
            .iter()
            .map(|(k, v)| DisplayField::new(k, v.clone()))
            .collect(),
        body,
    }
}

pub fn project_summary(summary: &Summary) -> SummaryModel {
    let running = summary.status.ids_running;

    let mut counters = vec![
        DisplayField::new("Total Alerts", summary.stats.total_alerts.to_string()),
        DisplayField::new("Last 24h", summary.stats.alerts_last_24h.to_string()),
        DisplayField::new("Last Hour", summary.stats.alerts_last_hour.to_string()),
    ];
    if let Some(uptime) = &summary.status.uptime {
        counters.push(DisplayField::new("Uptime", uptime.clone()));
    }
    if let Some(n) = summary.status.packets_processed {
        counters.push(DisplayField::new("Packets Processed", n.to_string()));
    }
    if let Some(n) = summary.status.blacklist_size {
        counters.push(DisplayField::new("Blacklisted IPs", n.to_string()));
    }

    let mut by_type: Vec<(&String, &u64)> = summary.stats.alerts_by_type.iter().collect();
    by_type.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let top_ips = summary
        .stats
        .top_attacking_ips
        .iter()
        .map(|ip| DisplayRow {
            id: ip.ip.clone(),
            title: ip.ip.clone(),
            badges: Vec::new(),
            fields: vec![DisplayField::new("Alerts", format!("{} alerts", ip.count))],
            toggle: None,
        })
        .collect();

    SummaryModel {
        ids_running: running,
        status_label: if running { "IDS Online" } else { "IDS Offline" }.to_owned(),
        engine_label: if running { "Running" } else { "Stopped" }.to_owned(),
        counters,
        by_type: by_type
            .into_iter()
            .map(|(kind, n)| DisplayField::new(kind, n.to_string()))
            .collect(),
        top_ips: DisplayBody::from_rows(top_ips, "No attacking IPs in the last 24 hours"),
        recent_alerts: DisplayBody::from_rows(
            summary.recent_alerts.iter().map(alert_row).collect(),
            "No recent alerts",
        ),
    }
}

pub fn project_blacklist(entries: &[BlacklistEntry]) -> Vec<DisplayRow> {
    entries
        .iter()
        .map(|e| {
            let mut fields = Vec::new();
            if let Some(reason) = &e.reason {
                fields.push(DisplayField::new("Reason", reason.clone()));
            }
            if let Some(at) = e.added_at {
                fields.push(DisplayField::new("Added", format_time(Some(at))));
            }
            DisplayRow {
                id: e.ip.clone(),
                title: e.ip.clone(),
                badges: vec![if e.active { "Active" } else { "Inactive" }.to_owned()],
                fields,
                toggle: None,
            }
        })
        .collect()
}

// ── Row builders ─────────────────────────────────────────────────────

fn alert_row(alert: &Alert) -> DisplayRow {
    let mut badges = Vec::new();
    if let Some(subtype) = &alert.subtype {
        badges.push(subtype.replace('_', " "));
    }
    if let Some(pattern) = &alert.pattern {
        badges.push(format!("Pattern: {pattern}"));
    }
    if let Some(status) = &alert.status {
        badges.push(status.clone());
    }

    let mut fields = vec![
        DisplayField::new(
            "Source",
            format!("{}:{}", alert.src_ip, port(alert.src_port)),
        ),
        DisplayField::new(
            "Destination",
            format!(
                "{}:{}",
                alert.dst_ip.as_deref().unwrap_or(MISSING),
                port(alert.dst_port)
            ),
        ),
        DisplayField::new("Message", alert.message.clone()),
    ];
    if let Some(severity) = &alert.severity {
        fields.push(DisplayField::new("Severity", severity.clone()));
    }
    if let Some(packets) = alert.packet_count.filter(|n| *n > 0) {
        fields.push(DisplayField::new("Packets", packets.to_string()));
        fields.push(DisplayField::new("Duration", seconds(alert.duration_secs)));
    }
    if let Some(packets) = alert.total_packets.filter(|n| *n > 0) {
        fields.push(DisplayField::new("Total Packets", packets.to_string()));
        fields.push(DisplayField::new(
            "Total Duration",
            seconds(alert.total_duration_secs),
        ));
    }
    fields.push(DisplayField::new("Time", format_time(alert.timestamp)));

    DisplayRow {
        id: alert.id.to_string(),
        title: alert.kind.to_string(),
        badges,
        fields,
        toggle: None,
    }
}

fn signature_row(sig: &Signature) -> DisplayRow {
    let mut fields = vec![DisplayField::new("Pattern", sig.pattern.clone())];
    if let Some(description) = &sig.description {
        fields.push(DisplayField::new("Description", description.clone()));
    }

    DisplayRow {
        id: sig.id.to_string(),
        title: sig.name.clone(),
        badges: vec![
            enabled_label(sig.enabled).to_owned(),
            sig.action.to_uppercase(),
        ],
        fields,
        toggle: Some(sig.enabled),
    }
}

fn device_row(device: &Device) -> DisplayRow {
    let mut fields = vec![
        DisplayField::new("Type", device.device_type.clone()),
        DisplayField::new("Device ID", device.device_id.clone()),
    ];
    if let Some(description) = &device.description {
        fields.push(DisplayField::new("Description", description.clone()));
    }
    if device.last_seen.is_some() {
        fields.push(DisplayField::new("Last seen", format_time(device.last_seen)));
    }
    if device.is_motion_sensor() {
        let detected = device.motion_detected().unwrap_or(false);
        fields.push(DisplayField::new(
            "Motion Detected",
            if detected { "YES" } else { "NO" },
        ));
    }

    DisplayRow {
        id: device.device_id.clone(),
        title: device.label().to_owned(),
        badges: vec![enabled_label(device.enabled).to_owned()],
        fields,
        toggle: None,
    }
}

// ── Formatting helpers ───────────────────────────────────────────────

fn enabled_label(enabled: bool) -> &'static str {
    if enabled { "Enabled" } else { "Disabled" }
}

fn port(port: Option<u16>) -> String {
    port.filter(|p| *p != 0)
        .map_or_else(|| MISSING.to_owned(), |p| p.to_string())
}

fn seconds(secs: Option<f64>) -> String {
    secs.filter(|s| *s > 0.0)
        .map_or_else(|| MISSING.to_owned(), |s| format!("{s:.1}s"))
}

pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || MISSING.to_owned(),
        |t| t.format(TIMESTAMP_FORMAT).to_string(),
    )
}
