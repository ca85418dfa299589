// ── Domain model ──
//
// Canonical types the dashboard works with. Built from `lokiwatch_api`
// wire types in `convert`; immutable once built.

pub mod alert;
pub mod blacklist;
pub mod device;
pub mod signature;
pub mod summary;

pub use alert::{Alert, AlertKind};
pub use blacklist::BlacklistEntry;
pub use device::{Device, MqttStatus};
pub use signature::Signature;
pub use summary::{IpCount, Stats, Summary, SystemStatus};
