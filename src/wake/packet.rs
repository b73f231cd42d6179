//! Magic packet construction
//!
//! Magic packet format:
//! - 6 bytes of 0xFF
//! - Target MAC repeated 16 times (96 bytes)
//! - Total: 102 bytes

/// Length of a magic packet in bytes
pub const MAGIC_PACKET_LEN: usize = 102;

/// Wake-on-LAN magic packet for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicPacket([u8; MAGIC_PACKET_LEN]);

impl MagicPacket {
    /// Build the magic packet for a MAC address
    #[must_use]
    pub fn new(mac: [u8; 6]) -> Self {
        let mut packet = [0u8; MAGIC_PACKET_LEN];

        packet[..6].fill(0xFF);
        for chunk in packet[6..].chunks_exact_mut(6) {
            chunk.copy_from_slice(&mac);
        }

        Self(packet)
    }

    /// Raw payload bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MAGIC_PACKET_LEN] {
        &self.0
    }
}

impl AsRef<[u8]> for MagicPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
