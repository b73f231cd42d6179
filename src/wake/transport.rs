//! Datagram transport for magic packets

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Sends one datagram to a destination
///
/// `Ok` means the local network stack accepted the datagram. There is no
/// delivery confirmation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `target`
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> std::io::Result<()>;
}

/// UDP transport with broadcast enabled
///
/// Binds a fresh ephemeral socket per send so concurrent wakes share nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdpTransport;

#[async_trait]
impl Transport for UdpTransport {
    async fn send_to(&self, payload: &[u8], target: SocketAddr) -> std::io::Result<()> {
        let bind_addr = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.set_broadcast(true)?;

        let sent = socket.send_to(payload, target).await?;
        if sent != payload.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short send: {sent} of {} bytes", payload.len()),
            ));
        }

        Ok(())
    }
}
