//! Wake-on-LAN dispatch
//!
//! Builds magic packets and hands them to a [`Transport`]. Outcomes are
//! always returned as [`WakeResult`] values, never as errors.
//!
//! Wake-on-LAN is fire-and-forget: a successful result means the local
//! network stack accepted the datagram, not that the target powered on.

pub mod packet;
pub mod transport;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use packet::{MAGIC_PACKET_LEN, MagicPacket};
pub use transport::{Transport, UdpTransport};

use crate::device::Device;
use crate::mac::parse_mac;

/// Broadcast address used when a device has none configured
pub const DEFAULT_BROADCAST: IpAddr = IpAddr::V4(Ipv4Addr::BROADCAST);

/// Conventional Wake-on-LAN port (discard)
pub const DEFAULT_PORT: u16 = 9;

/// Display name used when waking a bare MAC
pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Outcome of one wake attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeResult {
    pub success: bool,
    pub device: String,
    pub mac: String,
    pub message: String,
}

#[derive(Debug, Error)]
enum SendError {
    #[error("invalid MAC address format")]
    InvalidMac,

    #[error("invalid broadcast address: {0}")]
    InvalidBroadcast(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Sends magic packets and reports per-target outcomes
#[derive(Clone)]
pub struct WakeDispatcher {
    transport: Arc<dyn Transport>,
    default_broadcast: IpAddr,
    port: u16,
}

impl std::fmt::Debug for WakeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeDispatcher")
            .field("default_broadcast", &self.default_broadcast)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Default for WakeDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(UdpTransport))
    }
}

impl WakeDispatcher {
    /// Create a dispatcher over a transport
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_broadcast: DEFAULT_BROADCAST,
            port: DEFAULT_PORT,
        }
    }

    /// Set the broadcast address used for devices without one
    #[must_use]
    pub const fn with_default_broadcast(mut self, addr: IpAddr) -> Self {
        self.default_broadcast = addr;
        self
    }

    /// Set the destination UDP port
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Wake a bare MAC address
    pub async fn wake(&self, mac: &str, broadcast: Option<&str>) -> WakeResult {
        match self.send(mac, broadcast).await {
            Ok(()) => WakeResult {
                success: true,
                device: UNKNOWN_DEVICE.to_string(),
                mac: mac.to_string(),
                message: format!("Magic packet sent to {mac}"),
            },
            Err(e) => WakeResult {
                success: false,
                device: UNKNOWN_DEVICE.to_string(),
                mac: mac.to_string(),
                message: format!("Failed to wake {mac}: {e}"),
            },
        }
    }

    /// Wake a registered device
    pub async fn wake_device(&self, device: &Device) -> WakeResult {
        let result = self.send(&device.mac, device.broadcast.as_deref()).await;

        let (success, message) = match result {
            Ok(()) => (true, format!("Magic packet sent to {}", device.name)),
            Err(e) => (false, format!("Failed to wake {}: {e}", device.name)),
        };

        WakeResult {
            success,
            device: device.name.clone(),
            mac: device.mac.clone(),
            message,
        }
    }

    /// Wake several devices concurrently
    ///
    /// Results are in input order. One failed send does not affect the others.
    pub async fn wake_multiple(&self, devices: &[Device]) -> Vec<WakeResult> {
        join_all(devices.iter().map(|device| self.wake_device(device))).await
    }

    async fn send(&self, mac: &str, broadcast: Option<&str>) -> Result<(), SendError> {
        let octets = parse_mac(mac).map_err(|_| SendError::InvalidMac)?;
        let target = SocketAddr::new(self.resolve_broadcast(broadcast)?, self.port);
        let packet = MagicPacket::new(octets);

        match self.transport.send_to(packet.as_ref(), target).await {
            Ok(()) => {
                tracing::debug!(mac = %mac, %target, "magic packet sent");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(mac = %mac, %target, error = %e, "magic packet send failed");
                Err(e.into())
            }
        }
    }

    fn resolve_broadcast(&self, broadcast: Option<&str>) -> Result<IpAddr, SendError> {
        match broadcast.map(str::trim).filter(|b| !b.is_empty()) {
            Some(addr) => addr
                .parse()
                .map_err(|_| SendError::InvalidBroadcast(addr.to_string())),
            None => Ok(self.default_broadcast),
        }
    }
}
