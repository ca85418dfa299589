//! Alert push stream with auto-reconnect.
//!
//! Connects to the backend's `/ws/alerts` endpoint and streams parsed
//! frames through a [`tokio::sync::broadcast`] channel. After any
//! disconnect the listener waits a fixed delay and dials again, forever,
//! until its [`CancellationToken`] fires.
//!
//! # Example
//!
//! ```rust,ignore
//! use lokiwatch_api::websocket::{PushListener, PushKind, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let listener = PushListener::spawn(client.push_url()?, ReconnectConfig::default(), CancellationToken::new());
//! let mut rx = listener.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if event.kind == PushKind::NewAlert {
//!         println!("new alert: {}", event.data);
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Path of the alert push stream, relative to the base URL.
const PUSH_PATH: &str = "ws/alerts";

/// Text frame the backend answers with `{"type": "pong"}`.
const KEEPALIVE_FRAME: &str = "ping";

// ── PushEvent ────────────────────────────────────────────────────────

/// Interpreted frame type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushKind {
    /// A new alert was stored; `data` carries the alert record.
    NewAlert,
    /// Keepalive answer.
    Pong,
    /// Anything else the backend sends. Carried through untouched.
    Other(String),
}

impl PushKind {
    fn from_type(ty: &str) -> Self {
        match ty {
            "new_alert" => Self::NewAlert,
            "pong" => Self::Pong,
            other => Self::Other(other.to_owned()),
        }
    }
}

/// A parsed frame from the push stream.
#[derive(Debug, Clone)]
pub struct PushEvent {
    pub kind: PushKind,
    /// Payload; `Null` when the frame had none.
    pub data: serde_json::Value,
}

/// Raw frame shape: `{ "type": "...", "data": ... }`.
#[derive(Debug, Serialize, Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    data: serde_json::Value,
}

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle of the single push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Reconnect policy for the push listener.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Fixed wait between a disconnect and the next dial. Default: 5s.
    pub delay: Duration,

    /// Interval for `"ping"` keepalive frames. `None` disables them.
    /// Default: 30s.
    pub keepalive: Option<Duration>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            keepalive: Some(Duration::from_secs(30)),
        }
    }
}

// ── Push URL ─────────────────────────────────────────────────────────

/// WebSocket URL of the alert push stream for a backend base URL.
///
/// `http://host:8080/loki` becomes `ws://host:8080/loki/ws/alerts`;
/// `https` maps to `wss`.
pub fn push_url(base_url: &Url) -> Result<Url, Error> {
    let mut base = base_url.clone();
    let path = base.path().trim_end_matches('/').to_owned();
    base.set_path(&format!("{path}/"));
    base.set_query(None);

    let mut url = base.join(PUSH_PATH)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme).map_err(|()| {
        Error::WebSocketConnect(format!("cannot derive {scheme} URL from {base_url}"))
    })?;
    Ok(url)
}

// ── PushListener ─────────────────────────────────────────────────────

/// Handle to the running push stream task.
pub struct PushListener {
    event_tx: broadcast::Sender<Arc<PushEvent>>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PushListener {
    /// Spawn the connect/read/reconnect loop.
    ///
    /// Returns immediately; the first dial happens in the background.
    pub fn spawn(url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = tokio::spawn(ws_loop(
            url,
            event_tx.clone(),
            state_tx,
            reconnect,
            cancel.clone(),
        ));

        Self {
            event_tx,
            state_rx,
            cancel,
            task,
        }
    }

    /// New receiver for parsed frames. Slow consumers see
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PushEvent>> {
        self.event_tx.subscribe()
    }

    /// Connection state, updated on every transition.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Signal the background task to stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Stop the task and wait for it to exit.
    pub async fn join(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "push listener task panicked");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

async fn ws_loop(
    url: Url,
    event_tx: broadcast::Sender<Arc<PushEvent>>,
    state_tx: watch::Sender<ConnectionState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    loop {
        state_tx.send_replace(ConnectionState::Connecting);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&url, &event_tx, &state_tx, &reconnect, &cancel) => {
                match result {
                    Ok(()) => tracing::info!("push stream closed"),
                    Err(e) => tracing::warn!(error = %e, "push stream error"),
                }
            }
        }

        state_tx.send_replace(ConnectionState::Disconnected);
        if cancel.is_cancelled() {
            break;
        }

        tracing::info!(
            delay_ms = u64::try_from(reconnect.delay.as_millis()).unwrap_or(u64::MAX),
            "reconnecting push stream"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(reconnect.delay) => {}
        }
    }

    state_tx.send_replace(ConnectionState::Disconnected);
    tracing::debug!("push listener exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<PushEvent>>,
    state_tx: &watch::Sender<ConnectionState>,
    reconnect: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting push stream");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    state_tx.send_replace(ConnectionState::Connected);
    tracing::info!("push stream connected");

    let (mut write, mut read) = ws_stream.split();
    let mut keepalive = reconnect
        .keepalive
        .filter(|d| !d.is_zero())
        .map(|d| tokio::time::interval_at(Instant::now() + d, d));

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            () = next_tick(keepalive.as_mut()) => {
                write
                    .send(tungstenite::Message::Text(KEEPALIVE_FRAME.into()))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "push stream close frame");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => return Ok(()),
                    // Binary, Ping, Pong, Frame
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn next_tick(interval: Option<&mut Interval>) {
    match interval {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Parse a text frame and broadcast it. Malformed frames are dropped.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<PushEvent>>) {
    let frame: Frame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed push frame");
            return;
        }
    };

    let event = PushEvent {
        kind: PushKind::from_type(&frame.ty),
        data: frame.data,
    };

    // No subscribers is fine
    let _ = event_tx.send(Arc::new(event));
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.delay, Duration::from_secs(5));
        assert_eq!(config.keepalive, Some(Duration::from_secs(30)));
    }

    #[test]
    fn push_url_keeps_base_path() {
        let base = Url::parse("http://ids.local:8080/loki").unwrap();
        assert_eq!(push_url(&base).unwrap().as_str(), "ws://ids.local:8080/loki/ws/alerts");
        let base = Url::parse("https://ids.local").unwrap();
        assert_eq!(push_url(&base).unwrap().as_str(), "wss://ids.local/ws/alerts");
    }

    #[test]
    fn frame_types_map_to_kinds() {
        assert_eq!(PushKind::from_type("new_alert"), PushKind::NewAlert);
        assert_eq!(PushKind::from_type("pong"), PushKind::Pong);
        assert_eq!(
            PushKind::from_type("stats_update"),
            PushKind::Other("stats_update".into())
        );
    }

    #[test]
    fn new_alert_frame_is_broadcast() {
        let (tx, mut rx) = broadcast::channel(16);

        let raw = serde_json::json!({
            "type": "new_alert",
            "data": { "id": 42, "type": "SIGNATURE", "src_ip": "10.0.0.3" }
        });
        parse_and_broadcast(&raw.to_string(), &tx);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, PushKind::NewAlert);
        assert_eq!(event.data["id"], 42);
    }

    #[test]
    fn frame_without_data_has_null_payload() {
        let (tx, mut rx) = broadcast::channel(16);
        parse_and_broadcast(r#"{"type":"pong"}"#, &tx);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, PushKind::Pong);
        assert!(event.data.is_null());
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let (tx, mut rx) = broadcast::channel(16);

        parse_and_broadcast("not json", &tx);
        parse_and_broadcast(r#"{"data": {}}"#, &tx);
        parse_and_broadcast("[1,2,3]", &tx);

        assert!(rx.try_recv().is_err());
    }
}
