//! lanwake - Wake-on-LAN device registry
//!
//! This library provides the core of the lanwake service:
//! - A durable registry of named devices (case-insensitive unique names)
//! - Magic packet construction and UDP broadcast dispatch
//! - An HTTP API and configuration shared with the `lanwake` CLI
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        HTTP API (axum)  │  CLI (clap)     │
//! └────────────┬────────────────────┬────────┘
//!              │ resolve name       │ mac + broadcast
//! ┌────────────▼──────────┐ ┌───────▼────────────────┐
//! │    DeviceRegistry     │ │    WakeDispatcher      │
//! │  DeviceRepo (SQLite)  │ │  MagicPacket → UDP :9  │
//! └───────────────────────┘ └────────────────────────┘
//! ```
//!
//! Wake-on-LAN has no confirmation channel. A successful [`WakeResult`]
//! means the packet was handed to the local network stack, not that the
//! target powered on.

pub mod api;
pub mod config;
pub mod db;
pub mod device;
pub mod error;
pub mod mac;
pub mod registry;
pub mod wake;

pub use config::Config;
pub use db::{DbConn, DbPool, DeviceRepo};
pub use device::{Device, DeviceUpdate};
pub use error::{Error, Result};
pub use mac::{is_valid_mac, parse_mac, validate_mac};
pub use registry::{Bootstrap, DeviceRegistry};
pub use wake::{MagicPacket, Transport, UdpTransport, WakeDispatcher, WakeResult};
