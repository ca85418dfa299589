// lokiwatch-api: Async Rust client for the Loki IDS dashboard API (REST + alert push stream)

pub mod client;
pub mod error;
pub mod models;
pub mod transport;
pub mod websocket;

mod alerts;
mod blacklist;
mod iot;
mod signatures;
mod system;

pub use client::LokiClient;
pub use error::Error;
pub use signatures::is_yaml_file_name;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ConnectionState, PushEvent, PushKind, PushListener, ReconnectConfig};
