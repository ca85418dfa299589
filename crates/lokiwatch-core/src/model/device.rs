// ── IoT device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A device registered with the MQTT bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub device_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
    /// Last reported values, keyed by state name (`motion_detected`,
    /// `bulb_state`, ...). Values are whatever JSON the device published.
    pub state: serde_json::Map<String, serde_json::Value>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Display name, falling back to the device id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.device_id)
    }

    pub fn is_motion_sensor(&self) -> bool {
        self.device_type == "motion_sensor"
    }

    /// `motion_detected` state, accepting both `true` and `"true"`.
    pub fn motion_detected(&self) -> Option<bool> {
        match self.state.get("motion_detected")? {
            serde_json::Value::Bool(b) => Some(*b),
            serde_json::Value::String(s) => Some(s.eq_ignore_ascii_case("true")),
            _ => None,
        }
    }
}

/// MQTT bridge status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttStatus {
    /// The bridge module is installed on the backend.
    pub available: bool,
    pub connected: bool,
    pub broker_host: Option<String>,
    pub broker_port: Option<u16>,
    pub message: Option<String>,
}

impl MqttStatus {
    pub fn label(&self) -> &'static str {
        if self.connected {
            "Connected"
        } else if self.available {
            "Disconnected"
        } else {
            "Not Available"
        }
    }
}
