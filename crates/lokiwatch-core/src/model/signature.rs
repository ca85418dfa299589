// ── Signature domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pattern-matching rule the engine evaluates against payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: i64,
    pub name: String,
    pub pattern: String,
    pub action: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
