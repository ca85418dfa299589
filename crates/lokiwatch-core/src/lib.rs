//! Live-state layer between `lokiwatch-api` and UI consumers (the CLI).
//!
//! This crate keeps several independently paginated, filtered and
//! push-updated views of a Loki IDS backend consistent with server state,
//! without throwing away the page and filter context a user has set up:
//!
//! - **[`ViewStateStore`]**: per-view page, page size, filters and sort.
//!   Filter and page-size changes reset to page 1; page changes keep
//!   filters.
//!
//! - **[`Gateway`]**: typed fetch and mutation operations, implemented for
//!   [`lokiwatch_api::LokiClient`]. The seam tests substitute.
//!
//! - **[`render`]**: pure projection from fetched pages to display models
//!   (row fields, badges, placeholders, `Page P of T (N total)`).
//!
//! - **[`Dashboard`]**: owns the display `watch` channels, discards stale
//!   responses per view, refreshes the summary on a timer, polls devices
//!   while they are showing and turns push events into invalidations of
//!   whatever is visible.
//!
//! - **[`Dispatcher`]**: user mutations. Destructive ones wait on a
//!   [`Confirmer`]; signature toggles are optimistic and revert on failure.

pub mod config;
pub mod convert;
pub mod dashboard;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod model;
pub mod page;
pub mod render;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DashboardConfig, PageSizes, TlsVerification};
pub use dashboard::Dashboard;
pub use dispatch::{
    AutoConfirm, ChannelConfirmer, ConfirmRequest, Confirmer, DEFAULT_MQTT_HOSTS,
    DEFAULT_MQTT_PORT, Dispatcher, Outcome, PendingConfirm,
};
pub use error::CoreError;
pub use gateway::{
    AlarmAction, AlertDraft, BlacklistDraft, BuzzerAction, CommandAck, DeviceCommand, Draft,
    Gateway, ImportSummary, LedAction, RECENT_ALERTS, Record, RecordKey, SignatureDraft,
    SignatureUpload, ViewPage,
};
pub use page::Page;
pub use render::{DisplayBody, DisplayField, DisplayModel, DisplayRow, SummaryModel};
pub use view::{Screen, ViewKind, ViewState, ViewStateStore};

pub use lokiwatch_api::websocket::ConnectionState;

pub use model::{
    Alert, AlertKind, BlacklistEntry, Device, IpCount, MqttStatus, Signature, Stats, Summary,
    SystemStatus,
};
