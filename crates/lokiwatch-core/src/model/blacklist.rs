// ── Blacklist domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blocked source address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub ip: String,
    pub reason: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
    pub active: bool,
}
