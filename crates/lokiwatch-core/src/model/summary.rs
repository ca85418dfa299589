// ── Dashboard summary types ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::alert::Alert;

/// Everything the dashboard screen shows at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub stats: Stats,
    pub status: SystemStatus,
    pub recent_alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_alerts: u64,
    pub alerts_last_24h: u64,
    pub alerts_last_hour: u64,
    pub alerts_by_type: BTreeMap<String, u64>,
    pub top_attacking_ips: Vec<IpCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub ids_running: bool,
    pub uptime: Option<String>,
    pub packets_processed: Option<u64>,
    pub blacklist_size: Option<u64>,
    pub alerts_count_24h: Option<u64>,
}
