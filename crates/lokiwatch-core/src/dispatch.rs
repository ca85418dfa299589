// ── Action dispatcher ──
//
// User-initiated mutations. Destructive actions wait on a `Confirmer`
// first; every confirmed action makes exactly one mutating call and then
// refreshes whatever it changed.

use std::fmt;
use std::future::Future;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::dashboard::Dashboard;
use crate::error::CoreError;
use crate::gateway::{
    AlertDraft, BlacklistDraft, CommandAck, DeviceCommand, Draft, Gateway, ImportSummary, Record, RecordKey,
    SignatureDraft, SignatureUpload,
};
use crate::model::{Alert, BlacklistEntry, Signature};
use crate::view::ViewKind;

/// Broker hosts tried, in order, when none is given.
pub const DEFAULT_MQTT_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "10.0.0.1"];
pub const DEFAULT_MQTT_PORT: u16 = 1883;

// ── Confirmation ─────────────────────────────────────────────────────

/// What the user is asked before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub title: String,
    pub message: String,
}

impl ConfirmRequest {
    fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfirmRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Asks the user to approve a destructive action.
///
/// `confirm` may suspend for as long as the user takes; `false` cancels.
pub trait Confirmer: Send + Sync + 'static {
    fn confirm(&self, request: ConfirmRequest) -> impl Future<Output = bool> + Send;
}

/// Answers every request the same way (scripts, `--yes`).
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirmer for AutoConfirm {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        debug!(%request, answer = self.0, "auto-confirm");
        self.0
    }
}

/// A confirmation waiting for the UI to answer.
#[derive(Debug)]
pub struct PendingConfirm {
    pub request: ConfirmRequest,
    reply: oneshot::Sender<bool>,
}

impl PendingConfirm {
    pub fn answer(self, approved: bool) {
        let _ = self.reply.send(approved);
    }
}

/// Forwards requests to a UI task over a channel and waits for its answer.
///
/// A dropped `PendingConfirm` or a closed channel counts as "no".
#[derive(Debug, Clone)]
pub struct ChannelConfirmer {
    tx: mpsc::Sender<PendingConfirm>,
}

impl ChannelConfirmer {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PendingConfirm>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Confirmer for ChannelConfirmer {
    async fn confirm(&self, request: ConfirmRequest) -> bool {
        let (reply, answer) = oneshot::channel();
        if self.tx.send(PendingConfirm { request, reply }).await.is_err() {
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

/// Result of an action that may have been cancelled at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Cancelled,
    Done(T),
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            Self::Cancelled => None,
        }
    }
}

// ── Dispatcher ───────────────────────────────────────────────────────

pub struct Dispatcher<G: Gateway, C: Confirmer> {
    dashboard: Dashboard<G>,
    confirmer: C,
}

impl<G: Gateway, C: Confirmer> Dispatcher<G, C> {
    pub(crate) fn new(dashboard: Dashboard<G>, confirmer: C) -> Self {
        Self {
            dashboard,
            confirmer,
        }
    }

    pub fn dashboard(&self) -> &Dashboard<G> {
        &self.dashboard
    }

    fn gateway(&self) -> &G {
        self.dashboard.gateway()
    }

    // ── Destructive actions ──────────────────────────────────────────

    pub async fn delete_alert(&self, id: i64) -> Result<Outcome<()>, CoreError> {
        let request = ConfirmRequest::new("Delete alert", format!("Delete alert #{id}?"));
        if !self.confirmer.confirm(request).await {
            return Ok(Outcome::Cancelled);
        }

        logged("delete alert", self.gateway().remove(&RecordKey::Alert(id)).await)?;
        info!(id, "alert deleted");
        self.refresh_after(ViewKind::Alerts).await;
        if let Err(e) = self.dashboard.refresh_summary().await {
            warn!(error = %e, "summary refresh after delete failed");
        }
        Ok(Outcome::Done(()))
    }

    pub async fn delete_signature(&self, id: i64) -> Result<Outcome<()>, CoreError> {
        let request = ConfirmRequest::new(
            "Delete signature",
            format!("Delete signature #{id}? The engine stops matching it after a reload."),
        );
        if !self.confirmer.confirm(request).await {
            return Ok(Outcome::Cancelled);
        }

        logged(
            "delete signature",
            self.gateway().remove(&RecordKey::Signature(id)).await,
        )?;
        info!(id, "signature deleted");
        self.refresh_after(ViewKind::Signatures).await;
        Ok(Outcome::Done(()))
    }

    pub async fn remove_blacklist(&self, ip: &str) -> Result<Outcome<()>, CoreError> {
        let request = ConfirmRequest::new("Remove from blacklist", format!("Unblock {ip}?"));
        if !self.confirmer.confirm(request).await {
            return Ok(Outcome::Cancelled);
        }

        logged(
            "remove blacklist entry",
            self.gateway()
                .remove(&RecordKey::Blacklist(ip.to_owned()))
                .await,
        )?;
        info!(ip, "blacklist entry removed");
        self.refresh_blacklist_after().await;
        Ok(Outcome::Done(()))
    }

    /// Upload a YAML rule file after confirmation.
    ///
    /// Existing signatures with the same name are replaced by the backend.
    pub async fn import_signatures(
        &self,
        upload: SignatureUpload,
    ) -> Result<Outcome<ImportSummary>, CoreError> {
        let request = ConfirmRequest::new(
            "Import signatures",
            format!(
                "Import rules from {} ({} bytes)? Signatures with the same name are replaced.",
                upload.file_name(),
                upload.len()
            ),
        );
        if !self.confirmer.confirm(request).await {
            return Ok(Outcome::Cancelled);
        }

        let summary = logged(
            "import signatures",
            self.gateway().import_signatures(upload).await,
        )?;
        info!(count = summary.count, "signatures imported");
        self.refresh_after(ViewKind::Signatures).await;
        Ok(Outcome::Done(summary))
    }

    // ── Non-destructive actions ──────────────────────────────────────

    /// Enable or disable a signature.
    ///
    /// The displayed toggle flips at once. The backend only accepts full
    /// records, so the current one is read, its `enabled` flag replaced and
    /// the whole record written back. On failure the view is re-fetched,
    /// which puts the toggle back where the backend has it. If that fetch
    /// fails too, the toggle is put back to the value it showed before.
    pub async fn toggle_signature(&self, id: i64, enabled: bool) -> Result<Signature, CoreError> {
        let previous = self.dashboard.patch_signature_toggle(id, enabled);

        match self.write_enabled(id, enabled).await {
            Ok(sig) => {
                info!(id, enabled, "signature toggled");
                Ok(sig)
            }
            Err(e) => {
                warn!(id, error = %e, "signature toggle failed, reverting");
                if let Err(refetch) = self.dashboard.refresh(ViewKind::Signatures).await {
                    warn!(id, error = %refetch, "re-fetch after failed toggle failed");
                    if let Some(previous) = previous {
                        self.dashboard.patch_signature_toggle(id, previous);
                    }
                }
                Err(e)
            }
        }
    }

    async fn write_enabled(&self, id: i64, enabled: bool) -> Result<Signature, CoreError> {
        let key = RecordKey::Signature(id);
        let Record::Signature(current) = self.gateway().get(&key).await? else {
            return Err(CoreError::Internal(format!("{key} came back as another record")));
        };

        let mut draft = SignatureDraft::from(&current);
        draft.enabled = enabled;
        match self.gateway().update(&key, Draft::Signature(draft)).await? {
            Record::Signature(updated) => Ok(updated),
            _ => Err(CoreError::Internal(format!("{key} came back as another record"))),
        }
    }

    /// Record an alert by hand (`id == None`) or replace one, then refresh
    /// the alerts view and the summary counters.
    pub async fn save_alert(&self, id: Option<i64>, draft: AlertDraft) -> Result<Alert, CoreError> {
        let draft = Draft::Alert(draft);
        let record = match id {
            Some(id) => logged(
                "update alert",
                self.gateway().update(&RecordKey::Alert(id), draft).await,
            )?,
            None => logged("create alert", self.gateway().create(draft).await)?,
        };
        let Record::Alert(alert) = record else {
            return Err(CoreError::Internal("alert save returned another record".into()));
        };

        info!(id = alert.id, kind = %alert.kind.as_str(), "alert saved");
        self.refresh_after(ViewKind::Alerts).await;
        if let Err(e) = self.dashboard.refresh_summary().await {
            warn!(error = %e, "summary refresh after alert save failed");
        }
        Ok(alert)
    }

    /// Create a signature (`id == None`) or replace one.
    pub async fn save_signature(
        &self,
        id: Option<i64>,
        draft: SignatureDraft,
    ) -> Result<Signature, CoreError> {
        let draft = Draft::Signature(draft);
        let record = match id {
            Some(id) => {
                logged(
                    "update signature",
                    self.gateway().update(&RecordKey::Signature(id), draft).await,
                )?
            }
            None => logged("create signature", self.gateway().create(draft).await)?,
        };
        let Record::Signature(sig) = record else {
            return Err(CoreError::Internal("signature save returned another record".into()));
        };

        info!(id = sig.id, name = %sig.name, "signature saved");
        self.refresh_after(ViewKind::Signatures).await;
        Ok(sig)
    }

    pub async fn add_blacklist(&self, draft: BlacklistDraft) -> Result<BlacklistEntry, CoreError> {
        let record = logged(
            "add blacklist entry",
            self.gateway().create(Draft::Blacklist(draft)).await,
        )?;
        let Record::Blacklist(entry) = record else {
            return Err(CoreError::Internal("blacklist add returned another record".into()));
        };

        info!(ip = %entry.ip, "blacklist entry added");
        self.refresh_blacklist_after().await;
        Ok(entry)
    }

    /// Send a command to one device. A negative acknowledgement is an
    /// error.
    pub async fn device_command(
        &self,
        device_id: &str,
        command: DeviceCommand,
    ) -> Result<CommandAck, CoreError> {
        let ack = logged(
            "device command",
            self.gateway().set_device_state(device_id, command).await,
        )?;
        if !ack.success {
            let err = CoreError::DeviceCommandFailed {
                device_id: device_id.to_owned(),
                message: ack
                    .message
                    .unwrap_or_else(|| "no reason given".to_owned()),
            };
            warn!(error = %err, "device command rejected");
            return Err(err);
        }

        info!(device_id, command = command.endpoint(), "device command sent");
        self.refresh_after(ViewKind::Devices).await;
        Ok(ack)
    }

    /// Connect the MQTT bridge, trying each host in order until one works.
    ///
    /// Returns the host that connected. When every host fails, the last
    /// error is returned.
    pub async fn connect_mqtt(&self, hosts: &[&str], port: u16) -> Result<String, CoreError> {
        let mut last_err = None;
        for host in hosts {
            match self.gateway().mqtt_connect(host, port).await {
                Ok(()) => {
                    info!(host, port, "MQTT bridge connected");
                    return Ok((*host).to_owned());
                }
                Err(e) => {
                    debug!(host, port, error = %e, "MQTT connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| CoreError::validation("no MQTT broker host given"));
        warn!(error = %err, "MQTT bridge connection failed");
        Err(err)
    }

    // ── Follow-up refreshes ──────────────────────────────────────────

    async fn refresh_after(&self, view: ViewKind) {
        if let Err(e) = self.dashboard.refresh(view).await {
            warn!(%view, error = %e, "refresh after action failed");
        }
    }

    async fn refresh_blacklist_after(&self) {
        if let Err(e) = self.dashboard.refresh_blacklist().await {
            warn!(error = %e, "blacklist refresh after action failed");
        }
    }
}

/// Log an explicit action's failure at `warn` and pass it through.
fn logged<T>(action: &str, result: Result<T, CoreError>) -> Result<T, CoreError> {
    if let Err(e) = &result {
        warn!(action, error = %e, "action failed");
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_confirmer_round_trip() {
        let (confirmer, mut rx) = ChannelConfirmer::new(1);
        let ui = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            assert_eq!(pending.request.title, "Delete alert");
            pending.answer(true);
        });

        let approved = confirmer
            .confirm(ConfirmRequest::new("Delete alert", "Delete alert #1?"))
            .await;
        assert!(approved);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_prompt_means_no() {
        let (confirmer, mut rx) = ChannelConfirmer::new(1);
        let ui = tokio::spawn(async move {
            drop(rx.recv().await.unwrap());
        });

        assert!(!confirmer.confirm(ConfirmRequest::new("x", "y")).await);
        ui.await.unwrap();
    }

    #[tokio::test]
    async fn closed_channel_means_no() {
        let (confirmer, rx) = ChannelConfirmer::new(1);
        drop(rx);
        assert!(!confirmer.confirm(ConfirmRequest::new("x", "y")).await);
    }

    #[test]
    fn outcome_helpers() {
        assert!(Outcome::<u8>::Cancelled.is_cancelled());
        assert_eq!(Outcome::Done(3).done(), Some(3));
    }
}
