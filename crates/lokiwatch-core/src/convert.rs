// ── API-to-domain type conversions ──
//
// Bridges raw `lokiwatch_api::models` wire types into canonical
// `lokiwatch_core::model` types. Timestamps are parsed here once so the
// render layer only ever formats.

use chrono::{DateTime, NaiveDateTime, Utc};

use lokiwatch_api::models::{
    AlertResponse, BlacklistResponse, DeviceResponse, IpCount as WireIpCount, MqttStatusResponse,
    SignatureResponse, StatsResponse, SystemStatusResponse,
};

use crate::model::{
    Alert, AlertKind, BlacklistEntry, Device, IpCount, MqttStatus, Signature, Stats, SystemStatus,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse a backend timestamp.
///
/// The backend writes naive ISO-8601 (`2025-03-01T10:00:00.123456`) for
/// most columns, which is taken as UTC. RFC 3339 with an offset is also
/// accepted. Unparseable values become `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_opt(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| parse_timestamp(s))
}

/// Drop empty strings the backend sometimes stores instead of NULL.
fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

// ── Alerts ─────────────────────────────────────────────────────────

impl From<AlertResponse> for Alert {
    fn from(a: AlertResponse) -> Self {
        Self {
            id: a.id,
            timestamp: parse_timestamp(&a.timestamp),
            kind: AlertKind::from(a.alert_type.as_str()),
            subtype: non_empty(a.subtype),
            pattern: non_empty(a.pattern),
            status: non_empty(a.status),
            src_ip: a.src_ip,
            src_port: a.src_port,
            dst_ip: non_empty(a.dst_ip),
            dst_port: a.dst_port,
            message: a.message,
            severity: non_empty(a.severity),
            packet_count: a.packet_count,
            duration_secs: a.duration_seconds,
            attack_rate_pps: a.attack_rate_pps,
            total_packets: a.total_packets,
            total_duration_secs: a.total_duration_seconds,
            average_rate_pps: a.average_rate_pps,
            first_seen: parse_opt(a.first_seen.as_ref()),
            last_seen: parse_opt(a.last_seen.as_ref()),
            details: a
                .details
                .filter(|d| !d.is_null() && d.as_object().is_none_or(|o| !o.is_empty())),
        }
    }
}

// ── Signatures ─────────────────────────────────────────────────────

impl From<SignatureResponse> for Signature {
    fn from(s: SignatureResponse) -> Self {
        Self {
            id: s.id,
            name: s.name,
            pattern: s.pattern,
            action: s.action,
            description: non_empty(s.description),
            enabled: s.enabled,
            created_at: parse_opt(s.created_at.as_ref()),
            updated_at: parse_opt(s.updated_at.as_ref()),
        }
    }
}

// ── Blacklist ──────────────────────────────────────────────────────

impl From<BlacklistResponse> for BlacklistEntry {
    fn from(b: BlacklistResponse) -> Self {
        Self {
            ip: b.ip,
            reason: non_empty(b.reason),
            added_at: parse_opt(b.added_at.as_ref()),
            active: b.active,
        }
    }
}

// ── IoT ────────────────────────────────────────────────────────────

impl From<DeviceResponse> for Device {
    fn from(d: DeviceResponse) -> Self {
        Self {
            device_id: d.device_id,
            device_type: d.device_type,
            name: non_empty(d.name),
            description: non_empty(d.description),
            enabled: d.enabled,
            state: d.state,
            last_seen: parse_opt(d.last_seen.as_ref()),
        }
    }
}

impl From<MqttStatusResponse> for MqttStatus {
    fn from(m: MqttStatusResponse) -> Self {
        Self {
            available: m.available,
            connected: m.connected,
            broker_host: m.broker_host,
            broker_port: m.broker_port,
            message: m.message,
        }
    }
}

// ── Summary ────────────────────────────────────────────────────────

impl From<StatsResponse> for Stats {
    fn from(s: StatsResponse) -> Self {
        Self {
            total_alerts: s.total_alerts,
            alerts_last_24h: s.alerts_last_24h,
            alerts_last_hour: s.alerts_last_hour,
            alerts_by_type: s.alerts_by_type,
            top_attacking_ips: s.top_attacking_ips.into_iter().map(IpCount::from).collect(),
        }
    }
}

impl From<WireIpCount> for IpCount {
    fn from(c: WireIpCount) -> Self {
        Self {
            ip: c.ip,
            count: c.count,
        }
    }
}

impl From<SystemStatusResponse> for SystemStatus {
    fn from(s: SystemStatusResponse) -> Self {
        Self {
            ids_running: s.ids_running,
            uptime: s.uptime,
            packets_processed: s.packets_processed,
            blacklist_size: s.blacklist_size,
            alerts_count_24h: s.alerts_count_24h,
        }
    }
}
