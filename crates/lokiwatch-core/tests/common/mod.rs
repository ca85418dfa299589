// In-memory gateway for dashboard and dispatcher tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use url::Url;

use lokiwatch_core::{
    Alert, AlertDraft, AlertKind, BlacklistEntry, CommandAck, CoreError, DashboardConfig, Device,
    DeviceCommand, Draft, Gateway, ImportSummary, IpCount, MqttStatus, Page, PageSizes, Record,
    RecordKey, Signature, SignatureUpload, Stats, Summary, SystemStatus, ViewKind, ViewPage,
    ViewState,
};

// ── Fixtures ────────────────────────────────────────────────────────

pub fn config() -> DashboardConfig {
    let mut config = DashboardConfig::new(Url::parse("http://ids.test:8080").unwrap());
    config.websocket_enabled = false;
    config.page_sizes = PageSizes {
        alerts: 10,
        signatures: 20,
        devices: 20,
    };
    config
}

pub fn alert(id: i64, kind: AlertKind) -> Alert {
    Alert {
        id,
        timestamp: None,
        kind,
        subtype: None,
        pattern: None,
        status: None,
        src_ip: format!("10.0.0.{id}"),
        src_port: Some(40000),
        dst_ip: Some("10.0.0.1".into()),
        dst_port: Some(80),
        message: format!("alert {id}"),
        severity: None,
        packet_count: None,
        duration_secs: None,
        attack_rate_pps: None,
        total_packets: None,
        total_duration_secs: None,
        average_rate_pps: None,
        first_seen: None,
        last_seen: None,
        details: None,
    }
}

pub fn signature(id: i64, name: &str, enabled: bool) -> Signature {
    Signature {
        id,
        name: name.into(),
        pattern: format!("{name}-pattern"),
        action: "alert".into(),
        description: Some(format!("{name} rule")),
        enabled,
        created_at: None,
        updated_at: None,
    }
}

fn alert_from_draft(id: i64, d: AlertDraft) -> Alert {
    Alert {
        timestamp: d.timestamp,
        kind: d.kind,
        subtype: d.subtype,
        pattern: d.pattern,
        status: d.status,
        src_ip: d.src_ip,
        src_port: d.src_port,
        dst_ip: d.dst_ip,
        dst_port: d.dst_port,
        message: d.message,
        severity: d.severity,
        ..alert(id, AlertKind::System)
    }
}

pub fn device(id: &str, device_type: &str) -> Device {
    Device {
        device_id: id.into(),
        device_type: device_type.into(),
        name: None,
        description: None,
        enabled: true,
        state: serde_json::Map::new(),
        last_seen: None,
    }
}

// ── FakeGateway ─────────────────────────────────────────────────────

/// Backend double. Every call is recorded; delays and failures are
/// scripted per test.
pub struct FakeGateway {
    pub alerts: Mutex<Vec<Alert>>,
    pub signatures: Mutex<Vec<Signature>>,
    pub devices: Mutex<Vec<Device>>,
    pub blacklist: Mutex<Vec<BlacklistEntry>>,

    pub list_calls: Mutex<Vec<(ViewKind, ViewState)>>,
    /// Per-view queue of response delays, consumed one per `list` call.
    pub list_delays: Mutex<HashMap<ViewKind, VecDeque<Duration>>>,
    pub fail_lists: AtomicBool,

    pub summary_calls: AtomicUsize,
    pub summary_delay: Mutex<Duration>,

    pub get_calls: AtomicUsize,
    pub get_delay: Mutex<Duration>,
    pub updates: Mutex<Vec<(RecordKey, Draft)>>,
    pub fail_updates: AtomicBool,
    pub creates: Mutex<Vec<Draft>>,
    pub removed: Mutex<Vec<RecordKey>>,
    pub blacklist_calls: AtomicUsize,

    pub imports: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<(String, DeviceCommand)>>,
    pub command_ack: Mutex<CommandAck>,
    pub mqtt_attempts: Mutex<Vec<String>>,
    pub mqtt_ok_host: Mutex<Option<String>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            signatures: Mutex::new(Vec::new()),
            devices: Mutex::new(Vec::new()),
            blacklist: Mutex::new(Vec::new()),
            list_calls: Mutex::new(Vec::new()),
            list_delays: Mutex::new(HashMap::new()),
            fail_lists: AtomicBool::new(false),
            summary_calls: AtomicUsize::new(0),
            summary_delay: Mutex::new(Duration::ZERO),
            get_calls: AtomicUsize::new(0),
            get_delay: Mutex::new(Duration::ZERO),
            updates: Mutex::new(Vec::new()),
            fail_updates: AtomicBool::new(false),
            creates: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            blacklist_calls: AtomicUsize::new(0),
            imports: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            command_ack: Mutex::new(CommandAck {
                success: true,
                message: None,
            }),
            mqtt_attempts: Mutex::new(Vec::new()),
            mqtt_ok_host: Mutex::new(None),
        }
    }
}

impl FakeGateway {
    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        let fake = Self::default();
        *fake.alerts.lock().unwrap() = alerts;
        fake
    }

    pub fn with_signatures(signatures: Vec<Signature>) -> Self {
        let fake = Self::default();
        *fake.signatures.lock().unwrap() = signatures;
        fake
    }

    pub fn list_count(&self, view: ViewKind) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| *v == view)
            .count()
    }

    pub fn last_state(&self, view: ViewKind) -> Option<ViewState> {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(v, _)| *v == view)
            .map(|(_, s)| s.clone())
    }

    pub fn delay_next(&self, view: ViewKind, delay: Duration) {
        self.list_delays
            .lock()
            .unwrap()
            .entry(view)
            .or_default()
            .push_back(delay);
    }

    pub fn summary_count(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    fn next_delay(&self, view: ViewKind) -> Duration {
        self.list_delays
            .lock()
            .unwrap()
            .get_mut(&view)
            .and_then(VecDeque::pop_front)
            .unwrap_or_default()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl Gateway for FakeGateway {
    async fn list(&self, view: ViewKind, state: &ViewState) -> Result<ViewPage, CoreError> {
        self.list_calls.lock().unwrap().push((view, state.clone()));
        pause(self.next_delay(view)).await;
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(CoreError::ConnectionFailed {
                url: "http://ids.test:8080".into(),
                reason: "connection refused".into(),
            });
        }

        let page = match view {
            ViewKind::Alerts => {
                let kind = state.filter("alert_type").map(AlertKind::from);
                let matching: Vec<Alert> = self
                    .alerts
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|a| kind.as_ref().is_none_or(|k| a.kind == *k))
                    .cloned()
                    .collect();
                ViewPage::Alerts(Page::slice(matching, state.page, state.page_size))
            }
            ViewKind::Signatures => {
                let all = self.signatures.lock().unwrap().clone();
                ViewPage::Signatures(Page::slice(all, state.page, state.page_size))
            }
            ViewKind::Devices => {
                let all = self.devices.lock().unwrap().clone();
                ViewPage::Devices(Page::slice(all, state.page, state.page_size))
            }
        };
        Ok(page)
    }

    async fn get(&self, key: &RecordKey) -> Result<Record, CoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.get_delay.lock().unwrap();
        pause(delay).await;

        let found = match key {
            RecordKey::Signature(id) => self
                .signatures
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == *id)
                .cloned()
                .map(Record::Signature),
            RecordKey::Alert(id) => self
                .alerts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == *id)
                .cloned()
                .map(Record::Alert),
            _ => None,
        };
        found.ok_or_else(|| CoreError::NotFound {
            entity: "Resource".into(),
            identifier: key.to_string(),
        })
    }

    async fn create(&self, draft: Draft) -> Result<Record, CoreError> {
        draft.validate()?;
        self.creates.lock().unwrap().push(draft.clone());
        match draft {
            Draft::Signature(d) => {
                let mut sigs = self.signatures.lock().unwrap();
                let id = sigs.iter().map(|s| s.id).max().unwrap_or(0) + 1;
                let sig = Signature {
                    id,
                    name: d.name,
                    pattern: d.pattern,
                    action: d.action,
                    description: Some(d.description).filter(|s| !s.is_empty()),
                    enabled: d.enabled,
                    created_at: None,
                    updated_at: None,
                };
                sigs.push(sig.clone());
                Ok(Record::Signature(sig))
            }
            Draft::Blacklist(d) => {
                let entry = BlacklistEntry {
                    ip: d.ip,
                    reason: d.reason,
                    added_at: None,
                    active: true,
                };
                self.blacklist.lock().unwrap().push(entry.clone());
                Ok(Record::Blacklist(entry))
            }
            Draft::Alert(d) => {
                let mut alerts = self.alerts.lock().unwrap();
                let id = alerts.iter().map(|a| a.id).max().unwrap_or(0) + 1;
                let created = alert_from_draft(id, d);
                alerts.insert(0, created.clone());
                Ok(Record::Alert(created))
            }
        }
    }

    async fn update(&self, key: &RecordKey, draft: Draft) -> Result<Record, CoreError> {
        self.updates.lock().unwrap().push((key.clone(), draft.clone()));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "database is locked".into(),
            });
        }

        if let (RecordKey::Alert(id), Draft::Alert(d)) = (key, &draft) {
            let mut alerts = self.alerts.lock().unwrap();
            let slot = alerts
                .iter_mut()
                .find(|a| a.id == *id)
                .ok_or_else(|| CoreError::NotFound {
                    entity: "Alert".into(),
                    identifier: id.to_string(),
                })?;
            *slot = alert_from_draft(*id, d.clone());
            return Ok(Record::Alert(slot.clone()));
        }
        let (RecordKey::Signature(id), Draft::Signature(d)) = (key, draft) else {
            return Err(CoreError::Unsupported {
                operation: format!("update {key}"),
            });
        };
        let mut sigs = self.signatures.lock().unwrap();
        let sig = sigs
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Signature".into(),
                identifier: id.to_string(),
            })?;
        sig.name = d.name;
        sig.pattern = d.pattern;
        sig.action = d.action;
        sig.description = Some(d.description).filter(|s| !s.is_empty());
        sig.enabled = d.enabled;
        Ok(Record::Signature(sig.clone()))
    }

    async fn remove(&self, key: &RecordKey) -> Result<(), CoreError> {
        self.removed.lock().unwrap().push(key.clone());
        match key {
            RecordKey::Alert(id) => self.alerts.lock().unwrap().retain(|a| a.id != *id),
            RecordKey::Signature(id) => self.signatures.lock().unwrap().retain(|s| s.id != *id),
            RecordKey::Blacklist(ip) => self.blacklist.lock().unwrap().retain(|e| e.ip != *ip),
            RecordKey::Device(_) => {}
        }
        Ok(())
    }

    async fn blacklist(&self) -> Result<Vec<BlacklistEntry>, CoreError> {
        self.blacklist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blacklist.lock().unwrap().clone())
    }

    async fn import_signatures(&self, upload: SignatureUpload) -> Result<ImportSummary, CoreError> {
        self.imports
            .lock()
            .unwrap()
            .push(upload.file_name().to_owned());
        Ok(ImportSummary {
            message: Some("Imported".into()),
            count: 2,
            file_name: Some(upload.file_name().to_owned()),
        })
    }

    async fn set_device_state(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<CommandAck, CoreError> {
        self.commands
            .lock()
            .unwrap()
            .push((device_id.to_owned(), command));
        Ok(self.command_ack.lock().unwrap().clone())
    }

    async fn summary(&self) -> Result<Summary, CoreError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.summary_delay.lock().unwrap();
        pause(delay).await;

        let alerts = self.alerts.lock().unwrap().clone();
        Ok(Summary {
            stats: Stats {
                total_alerts: alerts.len() as u64,
                alerts_last_24h: alerts.len() as u64,
                alerts_last_hour: 0,
                alerts_by_type: Default::default(),
                top_attacking_ips: vec![IpCount {
                    ip: "10.0.0.5".into(),
                    count: 3,
                }],
            },
            status: SystemStatus {
                ids_running: true,
                uptime: None,
                packets_processed: None,
                blacklist_size: None,
                alerts_count_24h: None,
            },
            recent_alerts: alerts.into_iter().take(10).collect(),
        })
    }

    async fn mqtt_status(&self) -> Result<MqttStatus, CoreError> {
        Ok(MqttStatus {
            available: true,
            connected: self.mqtt_ok_host.lock().unwrap().is_some(),
            broker_host: None,
            broker_port: None,
            message: None,
        })
    }

    async fn mqtt_connect(&self, host: &str, _port: u16) -> Result<(), CoreError> {
        self.mqtt_attempts.lock().unwrap().push(host.to_owned());
        if self.mqtt_ok_host.lock().unwrap().as_deref() == Some(host) {
            Ok(())
        } else {
            Err(CoreError::Api {
                status: 200,
                message: format!("Failed to connect to MQTT broker at {host}"),
            })
        }
    }
}
