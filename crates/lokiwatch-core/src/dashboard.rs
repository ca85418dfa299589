// ── Dashboard controller ──
//
// Live state for one IDS backend: per-view fetch sequencing, display
// channels, the summary timer, the device poller and the push bridge.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lokiwatch_api::models::AlertResponse;
use lokiwatch_api::websocket::{self, ConnectionState, PushEvent, PushKind, PushListener};

use crate::config::DashboardConfig;
use crate::debounce::Debouncer;
use crate::dispatch::{Confirmer, Dispatcher};
use crate::error::CoreError;
use crate::gateway::{Gateway, ViewPage};
use crate::model::{Alert, BlacklistEntry};
use crate::render::{self, DisplayModel, DisplayRow, SummaryModel};
use crate::view::{Screen, ViewKind, ViewState, ViewStateStore};

const ALERT_CHANNEL_SIZE: usize = 256;

// ── Per-view slot ────────────────────────────────────────────────────

/// Fetch bookkeeping and display channel for one list view.
struct ViewSlot {
    /// Id of the newest request issued for this view.
    seq: AtomicU64,
    /// Page count of the last applied response.
    total_pages: AtomicU32,
    /// Last applied page and the state it was fetched with.
    current: std::sync::Mutex<Option<(ViewPage, ViewState)>>,
    display: watch::Sender<Option<Arc<DisplayModel>>>,
    debouncer: Debouncer,
}

impl ViewSlot {
    fn new(debounce: Duration) -> Self {
        let (display, _) = watch::channel(None);
        Self {
            seq: AtomicU64::new(0),
            total_pages: AtomicU32::new(0),
            current: std::sync::Mutex::new(None),
            display,
            debouncer: Debouncer::new(debounce),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish `page` unless a newer request was issued meanwhile.
    ///
    /// The sequence check runs under the display lock, so two responses
    /// can never interleave between check and publish.
    fn apply(&self, seq: u64, page: ViewPage, state: ViewState) -> bool {
        let model = Arc::new(render::project(&page, &state));
        let total_pages = page.total_pages();
        self.display.send_if_modified(|display| {
            if self.seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            self.total_pages.store(total_pages, Ordering::SeqCst);
            *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some((page, state));
            *display = Some(model);
            true
        })
    }

    /// Set one signature's toggle in the held page and republish it.
    /// Returns the value it had before.
    fn patch_signature(&self, id: i64, enabled: bool) -> Option<bool> {
        let mut previous = None;
        self.display.send_if_modified(|display| {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let Some((page, state)) = current.as_mut() else {
                return false;
            };
            previous = page.set_signature_enabled(id, enabled);
            if previous.is_none() {
                return false;
            }
            *display = Some(Arc::new(render::project(page, state)));
            true
        });
        previous
    }
}

struct Slots {
    alerts: ViewSlot,
    signatures: ViewSlot,
    devices: ViewSlot,
}

impl Slots {
    fn get(&self, view: ViewKind) -> &ViewSlot {
        match view {
            ViewKind::Alerts => &self.alerts,
            ViewKind::Signatures => &self.signatures,
            ViewKind::Devices => &self.devices,
        }
    }

    fn iter(&self) -> impl Iterator<Item = &ViewSlot> {
        [&self.alerts, &self.signatures, &self.devices].into_iter()
    }
}

/// Clears the summary in-flight flag when a refresh ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ── Dashboard ────────────────────────────────────────────────────────

/// Keeps the list views, the summary and the blacklist in step with the
/// backend.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Display models are
/// published on `watch` channels; a UI subscribes and renders whatever
/// arrives. Only the visible screen is ever fetched in the background;
/// switching screens fetches the new one exactly once.
pub struct Dashboard<G: Gateway> {
    inner: Arc<DashboardInner<G>>,
}

impl<G: Gateway> Clone for Dashboard<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DashboardInner<G> {
    config: DashboardConfig,
    gateway: G,
    views: ViewStateStore,
    slots: Slots,
    screen: watch::Sender<Screen>,
    summary: watch::Sender<Option<Arc<SummaryModel>>>,
    summary_in_flight: AtomicBool,
    blacklist: watch::Sender<Arc<Vec<DisplayRow>>>,
    connection: watch::Sender<ConnectionState>,
    alert_tx: broadcast::Sender<Arc<Alert>>,
    cancel: CancellationToken,
    /// Child token for the running session; replaced on shutdown so the
    /// dashboard can be started again.
    cancel_child: Mutex<CancellationToken>,
    /// Token of the armed device poller, if the devices screen is showing.
    device_poll: std::sync::Mutex<Option<CancellationToken>>,
    listener: Mutex<Option<PushListener>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<G: Gateway> Dashboard<G> {
    /// Build a dashboard. Nothing is fetched or spawned until
    /// [`start()`](Self::start).
    pub fn new(config: DashboardConfig, gateway: G) -> Self {
        let views = ViewStateStore::new(config.page_sizes);
        let slots = Slots {
            alerts: ViewSlot::new(config.debounce),
            signatures: ViewSlot::new(config.debounce),
            devices: ViewSlot::new(config.debounce),
        };
        let (screen, _) = watch::channel(Screen::Dashboard);
        let (summary, _) = watch::channel(None);
        let (blacklist, _) = watch::channel(Arc::new(Vec::new()));
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(DashboardInner {
                config,
                gateway,
                views,
                slots,
                screen,
                summary,
                summary_in_flight: AtomicBool::new(false),
                blacklist,
                connection,
                alert_tx,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                device_poll: std::sync::Mutex::new(None),
                listener: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    pub fn views(&self) -> &ViewStateStore {
        &self.inner.views
    }

    /// Action dispatcher bound to this dashboard.
    pub fn dispatcher<C: Confirmer>(&self, confirmer: C) -> Dispatcher<G, C> {
        Dispatcher::new(self.clone(), confirmer)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the current screen, then spawn the summary timer and the push
    /// stream.
    ///
    /// The initial load is an explicit action: its error is returned and
    /// nothing is spawned.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.show_screen(self.screen()).await?;

        let child = self.inner.cancel_child.lock().await.clone();
        let mut handles = self.inner.task_handles.lock().await;

        let interval = self.inner.config.summary_interval;
        if !interval.is_zero() {
            let dash = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(summary_task(dash, interval, cancel)));
        }

        if self.inner.config.websocket_enabled {
            self.spawn_push(&child, &mut handles).await;
        }

        info!(url = %self.inner.config.url, "dashboard started");
        Ok(())
    }

    /// Spawn the push listener and the bridge that turns its events into
    /// view invalidations. Non-fatal on failure: views still refresh on
    /// explicit actions and timers.
    async fn spawn_push(&self, cancel: &CancellationToken, handles: &mut Vec<JoinHandle<()>>) {
        let url = match websocket::push_url(&self.inner.config.url) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "cannot derive push stream URL (live updates disabled)");
                return;
            }
        };

        let listener = PushListener::spawn(url, self.inner.config.reconnect(), cancel.child_token());
        let mut events = listener.subscribe();
        let mut state = listener.state();
        let dash = self.clone();
        let bridge_cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = bridge_cancel.cancelled() => break,
                    changed = state.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *state.borrow_and_update();
                        dash.inner.connection.send_replace(current);
                    }
                    result = events.recv() => match result {
                        Ok(event) => dash.handle_push(&event).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "push bridge lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }));

        *self.inner.listener.lock().await = Some(listener);
        debug!("push stream spawned");
    }

    /// Cancel every background task and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();
        self.disarm_device_poll();
        for slot in self.inner.slots.iter() {
            slot.debouncer.cancel();
        }

        if let Some(listener) = self.inner.listener.lock().await.take() {
            listener.join().await;
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        *self.inner.cancel_child.lock().await = self.inner.cancel.child_token();
        self.inner
            .connection
            .send_replace(ConnectionState::Disconnected);
        debug!("dashboard stopped");
    }

    // ── Observables ──────────────────────────────────────────────────

    pub fn screen(&self) -> Screen {
        *self.inner.screen.borrow()
    }

    pub fn watch_screen(&self) -> watch::Receiver<Screen> {
        self.inner.screen.subscribe()
    }

    /// Display model of one list view. `None` until its first fetch lands.
    pub fn display(&self, view: ViewKind) -> watch::Receiver<Option<Arc<DisplayModel>>> {
        self.inner.slots.get(view).display.subscribe()
    }

    /// The last page applied to `view`.
    pub fn current_page(&self, view: ViewKind) -> Option<ViewPage> {
        self.inner
            .slots
            .get(view)
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(page, _)| page.clone())
    }

    pub fn summary(&self) -> watch::Receiver<Option<Arc<SummaryModel>>> {
        self.inner.summary.subscribe()
    }

    pub fn blacklist(&self) -> watch::Receiver<Arc<Vec<DisplayRow>>> {
        self.inner.blacklist.subscribe()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    /// Alerts announced by the push stream, in arrival order.
    pub fn new_alerts(&self) -> broadcast::Receiver<Arc<Alert>> {
        self.inner.alert_tx.subscribe()
    }

    // ── Screens ──────────────────────────────────────────────────────

    /// Make `screen` visible and fetch it once.
    ///
    /// The device poller runs only while the devices screen is showing.
    pub async fn show_screen(&self, screen: Screen) -> Result<(), CoreError> {
        let previous = self.inner.screen.send_replace(screen);
        debug!(from = %previous, to = %screen, "screen change");

        if screen == Screen::Devices {
            self.arm_device_poll().await;
        } else {
            self.disarm_device_poll();
        }

        match screen.view() {
            Some(view) => self.refresh(view).await.map(drop),
            None => self.refresh_summary().await.map(drop),
        }
    }

    fn is_visible(&self, view: ViewKind) -> bool {
        self.screen().view() == Some(view)
    }

    async fn arm_device_poll(&self) {
        let interval = self.inner.config.device_poll_interval;
        if interval.is_zero() {
            return;
        }

        let token = self.inner.cancel_child.lock().await.child_token();
        let previous = self
            .inner
            .device_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }

        let mut handles = self.inner.task_handles.lock().await;
        handles.retain(|h| !h.is_finished());
        handles.push(tokio::spawn(device_poll_task(self.clone(), interval, token)));
        debug!("device poll armed");
    }

    fn disarm_device_poll(&self) {
        let armed = self
            .inner
            .device_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = armed {
            token.cancel();
            debug!("device poll cancelled");
        }
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Fetch `view` with its current state and publish the result.
    ///
    /// Returns `Ok(false)` when a newer request for the same view was
    /// issued while this one was in flight; its response is discarded.
    pub async fn refresh(&self, view: ViewKind) -> Result<bool, CoreError> {
        let slot = self.inner.slots.get(view);
        let seq = slot.next_seq();
        let state = self.inner.views.state(view);
        debug!(%view, seq, page = state.page, "fetching view");

        let page = self.inner.gateway.list(view, &state).await?;
        if page.view() != view {
            return Err(CoreError::Internal(format!(
                "asked for {view}, got {}",
                page.view()
            )));
        }

        let applied = slot.apply(seq, page, state);
        if !applied {
            debug!(%view, seq, "discarding stale response");
        }
        Ok(applied)
    }

    /// Background refresh: only if visible, errors logged.
    async fn refresh_if_visible(&self, view: ViewKind) {
        if !self.is_visible(view) {
            debug!(%view, "view hidden, not fetching");
            return;
        }
        if let Err(e) = self.refresh(view).await {
            warn!(%view, error = %e, "background refresh failed");
        }
    }

    /// Fetch and publish the dashboard summary.
    ///
    /// Returns `Ok(false)` without a request when another summary refresh
    /// is already running.
    pub async fn refresh_summary(&self) -> Result<bool, CoreError> {
        if self.inner.summary_in_flight.swap(true, Ordering::SeqCst) {
            debug!("summary refresh already in flight");
            return Ok(false);
        }
        let _guard = InFlight(&self.inner.summary_in_flight);

        let summary = self.inner.gateway.summary().await?;
        self.inner
            .summary
            .send_replace(Some(Arc::new(render::project_summary(&summary))));
        Ok(true)
    }

    pub async fn refresh_blacklist(&self) -> Result<Vec<BlacklistEntry>, CoreError> {
        let entries = self.inner.gateway.blacklist().await?;
        self.inner
            .blacklist
            .send_replace(Arc::new(render::project_blacklist(&entries)));
        Ok(entries)
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Jump to `page` (clamped to ≥ 1) and fetch it.
    pub async fn go_to_page(&self, view: ViewKind, page: u32) -> Result<bool, CoreError> {
        self.inner.views.set_page(view, page);
        self.refresh(view).await
    }

    /// Advance one page. `Ok(false)` without a fetch when already on the
    /// last known page.
    pub async fn next_page(&self, view: ViewKind) -> Result<bool, CoreError> {
        let total_pages = self.inner.slots.get(view).total_pages.load(Ordering::SeqCst);
        let current = self.inner.views.state(view).page;
        if current >= total_pages {
            return Ok(false);
        }
        self.inner.views.set_page(view, current + 1);
        self.refresh(view).await?;
        Ok(true)
    }

    /// Go back one page. `Ok(false)` without a fetch on page 1.
    pub async fn prev_page(&self, view: ViewKind) -> Result<bool, CoreError> {
        let current = self.inner.views.state(view).page;
        if current <= 1 {
            return Ok(false);
        }
        self.inner.views.set_page(view, current - 1);
        self.refresh(view).await?;
        Ok(true)
    }

    // ── Filters ──────────────────────────────────────────────────────

    /// Set a filter and fetch right away. Drops any pending debounced
    /// fetch for the view.
    pub async fn set_filter(&self, view: ViewKind, key: &str, value: &str) -> Result<bool, CoreError> {
        self.inner.slots.get(view).debouncer.cancel();
        self.inner.views.set_filter(view, key, value);
        self.refresh(view).await
    }

    /// Set a filter now, fetch once typing has paused.
    ///
    /// The state (and its page reset) changes immediately; only the fetch
    /// is debounced.
    pub fn set_filter_debounced(&self, view: ViewKind, key: &str, value: &str) {
        self.inner.views.set_filter(view, key, value);
        let dash = self.clone();
        self.inner
            .slots
            .get(view)
            .debouncer
            .call(async move { dash.refresh_if_visible(view).await });
    }

    pub async fn clear_filters(&self, view: ViewKind) -> Result<bool, CoreError> {
        self.inner.slots.get(view).debouncer.cancel();
        self.inner.views.clear_filters(view);
        self.refresh(view).await
    }

    pub async fn set_page_size(&self, view: ViewKind, page_size: u32) -> Result<bool, CoreError> {
        self.inner.views.set_page_size(view, page_size);
        self.refresh(view).await
    }

    pub async fn set_sort(&self, view: ViewKind, sort: Option<&str>) -> Result<bool, CoreError> {
        self.inner.views.set_sort(view, sort);
        self.refresh(view).await
    }

    // ── Push handling ────────────────────────────────────────────────

    /// React to one push event.
    ///
    /// A new alert refreshes the alerts view or the summary, whichever is
    /// showing. Hidden views are left alone; they are fetched when shown.
    pub async fn handle_push(&self, event: &PushEvent) {
        match &event.kind {
            PushKind::NewAlert => {
                // The screen at arrival decides what gets refreshed.
                let screen = self.screen();
                match serde_json::from_value::<AlertResponse>(event.data.clone()) {
                    Ok(wire) => {
                        let _ = self.inner.alert_tx.send(Arc::new(Alert::from(wire)));
                    }
                    Err(e) => debug!(error = %e, "new_alert payload is not an alert"),
                }

                match screen {
                    Screen::Alerts => self.refresh_if_visible(ViewKind::Alerts).await,
                    Screen::Dashboard => {
                        if let Err(e) = self.refresh_summary().await {
                            warn!(error = %e, "summary refresh after push failed");
                        }
                    }
                    Screen::Signatures | Screen::Devices => {
                        debug!("new alert while alert views are hidden");
                    }
                }
            }
            PushKind::Pong => {}
            PushKind::Other(kind) => debug!(kind = %kind, "ignoring push event"),
        }
    }

    // ── Optimistic patches ───────────────────────────────────────────

    /// Flip a signature's toggle in the published display without a fetch.
    ///
    /// Returns the toggle's previous value, or `None` when the displayed
    /// page doesn't hold that signature.
    pub(crate) fn patch_signature_toggle(&self, id: i64, enabled: bool) -> Option<bool> {
        self.inner.slots.get(ViewKind::Signatures).patch_signature(id, enabled)
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Refresh the summary on a fixed interval, whatever screen is showing.
/// Overlapping ticks are dropped by the in-flight guard.
async fn summary_task<G: Gateway>(dash: Dashboard<G>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + every, every);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = dash.refresh_summary().await {
                    warn!(error = %e, "periodic summary refresh failed");
                }
            }
        }
    }
}

async fn device_poll_task<G: Gateway>(dash: Dashboard<G>, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + every, every);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => dash.refresh_if_visible(ViewKind::Devices).await,
        }
    }
}
