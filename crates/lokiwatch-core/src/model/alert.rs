// ── Alert domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert category as reported by the engine.
///
/// The backend accepts `SIGNATURE`, `BEHAVIOR` and `SYSTEM`; anything else
/// is kept verbatim so newer engines don't break older dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    Signature,
    Behavior,
    System,
    Other(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Signature => "SIGNATURE",
            Self::Behavior => "BEHAVIOR",
            Self::System => "SYSTEM",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for AlertKind {
    fn from(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "SIGNATURE" => Self::Signature,
            "BEHAVIOR" => Self::Behavior,
            "SYSTEM" => Self::System,
            _ => Self::Other(raw.to_owned()),
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored alert.
///
/// Behaviour alerts (floods, scans) carry lifecycle counters: the
/// `packet_count`/`duration_secs`/`attack_rate_pps` triple while the attack
/// is ongoing, the `total_*`/`average_rate_pps` triple once it has ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
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

    pub packet_count: Option<u64>,
    pub duration_secs: Option<f64>,
    pub attack_rate_pps: Option<f64>,
    pub total_packets: Option<u64>,
    pub total_duration_secs: Option<f64>,
    pub average_rate_pps: Option<f64>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,

    pub details: Option<serde_json::Value>,
}

impl Alert {
    /// Whether the attack behind this alert has finished.
    pub fn has_ended(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("ENDED"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(AlertKind::from("behavior"), AlertKind::Behavior);
        assert_eq!(AlertKind::from("SIGNATURE"), AlertKind::Signature);
        assert_eq!(
            AlertKind::from("ANOMALY"),
            AlertKind::Other("ANOMALY".into())
        );
        assert_eq!(AlertKind::Other("ANOMALY".into()).to_string(), "ANOMALY");
    }
}
