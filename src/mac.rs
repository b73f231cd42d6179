//! MAC address validation and parsing
//!
//! Accepted forms are `XX:XX:XX:XX:XX:XX` and `XX-XX-XX-XX-XX-XX` with
//! case-insensitive hex digits. Mixing separators is rejected.

use regex::Regex;
use std::sync::LazyLock;

use crate::{Error, Result};

/// Six hex octets joined by one consistent separator
static MAC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}|[0-9A-Fa-f]{2}(?:-[0-9A-Fa-f]{2}){5})$")
        .expect("valid regex")
});

/// Check whether a string is a well-formed MAC address
#[must_use]
pub fn is_valid_mac(mac: &str) -> bool {
    MAC_REGEX.is_match(mac)
}

/// Validate a MAC address, returning it unchanged on success
///
/// # Errors
///
/// Returns `Error::InvalidMac` if the format is not accepted
pub fn validate_mac(mac: &str) -> Result<&str> {
    if is_valid_mac(mac) {
        Ok(mac)
    } else {
        Err(Error::InvalidMac(mac.to_string()))
    }
}

/// Parse a MAC address into its six octets
///
/// # Errors
///
/// Returns `Error::InvalidMac` if the format is not accepted
pub fn parse_mac(mac: &str) -> Result<[u8; 6]> {
    validate_mac(mac)?;

    let mut octets = [0u8; 6];
    for (octet, part) in octets.iter_mut().zip(mac.split([':', '-'])) {
        *octet =
            u8::from_str_radix(part, 16).map_err(|_| Error::InvalidMac(mac.to_string()))?;
    }

    Ok(octets)
}
