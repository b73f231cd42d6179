//! Device records and partial updates

use serde::{Deserialize, Deserializer, Serialize};

/// A named endpoint that can be woken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Display name, unique across the registry ignoring case
    pub name: String,
    /// Hardware address (`XX:XX:XX:XX:XX:XX` or `XX-XX-XX-XX-XX-XX`)
    pub mac: String,
    /// Informational only; never used for waking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Target broadcast address; the dispatcher default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast: Option<String>,
}

impl Device {
    /// Create a device with only the required fields
    #[must_use]
    pub fn new(name: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mac: mac.into(),
            ip: None,
            broadcast: None,
        }
    }

    /// Set the informational IP address
    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Set the broadcast address used when waking
    #[must_use]
    pub fn with_broadcast(mut self, broadcast: impl Into<String>) -> Self {
        self.broadcast = Some(broadcast.into());
        self
    }

    /// The record inserted into an empty store when there is nothing to migrate
    #[must_use]
    pub fn example() -> Self {
        Self::new("example-device", "00:11:22:33:44:55")
            .with_ip("192.168.1.100")
            .with_broadcast("192.168.1.255")
    }
}

/// Partial update of a device
///
/// Each field distinguishes "not supplied" (`None`) from "supplied". For the
/// optional fields, `Some(None)` (JSON `null`) and `Some(Some(""))` both clear
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default, deserialize_with = "supplied")]
    pub ip: Option<Option<String>>,
    #[serde(default, deserialize_with = "supplied")]
    pub broadcast: Option<Option<String>>,
}

impl DeviceUpdate {
    /// Whether no field was supplied
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.mac.is_none() && self.ip.is_none() && self.broadcast.is_none()
    }

    /// Apply the supplied fields to a device, leaving the rest untouched
    pub fn apply_to(&self, device: &mut Device) {
        if let Some(name) = &self.name {
            device.name.clone_from(name);
        }
        if let Some(mac) = &self.mac {
            device.mac.clone_from(mac);
        }
        if let Some(ip) = &self.ip {
            device.ip = non_empty(ip.as_deref());
        }
        if let Some(broadcast) = &self.broadcast {
            device.broadcast = non_empty(broadcast.as_deref());
        }
    }
}

/// Storage key for a device name
///
/// Names that differ only in letter case, in any script, share a key.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToString::to_string)
}

/// Deserialize a present field (including `null`) as `Some(_)`
///
/// Combined with `#[serde(default)]`, an absent field stays `None`.
fn supplied<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_json_shape() {
        let device = Device::new("nas", "00:11:22:33:44:55");
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "nas", "mac": "00:11:22:33:44:55"})
        );

        let full = Device::example();
        let json = serde_json::to_value(&full).unwrap();
        assert_eq!(json["ip"], "192.168.1.100");
        assert_eq!(json["broadcast"], "192.168.1.255");
    }

    #[test]
    fn test_update_distinguishes_absent_from_null() {
        let update: DeviceUpdate = serde_json::from_str(r#"{"ip": null}"#).unwrap();
        assert_eq!(update.ip, Some(None));
        assert_eq!(update.broadcast, None);

        let update: DeviceUpdate = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_apply_only_supplied_fields() {
        let mut device = Device::example();
        let update: DeviceUpdate =
            serde_json::from_str(r#"{"mac": "AA:BB:CC:DD:EE:FF", "ip": ""}"#).unwrap();

        update.apply_to(&mut device);

        assert_eq!(device.name, "example-device");
        assert_eq!(device.mac, "AA:BB:CC:DD:EE:FF");
        assert_eq!(device.ip, None);
        assert_eq!(device.broadcast.as_deref(), Some("192.168.1.255"));
    }

    #[test]
    fn test_name_key_folds_non_ascii() {
        assert_eq!(name_key("ÉCRAN"), name_key("écran"));
        assert_eq!(name_key("Büro-PC"), "büro-pc");
        assert_ne!(name_key("nas"), name_key("nas2"));
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut device = Device::example();
        DeviceUpdate::default().apply_to(&mut device);
        assert_eq!(device, Device::example());
    }
}
