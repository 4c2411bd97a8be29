//! Platform-specific functionality
//!
//! Network type detection lives here. Linux inspects sysfs; other platforms
//! report [`NetworkType::Unknown`] when asked.

#[cfg(target_os = "linux")]
pub mod linux;

use serde::Serialize;
use std::fmt;

/// Kind of the active network link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Wifi,
    Mobile,
    Wimax,
    Other,
    Unknown,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Wifi => "WIFI",
            NetworkType::Mobile => "MOBILE",
            NetworkType::Wimax => "WIMAX",
            NetworkType::Other => "OTHER",
            NetworkType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The link currently carrying traffic, with a human readable label
/// such as `WIFI/wlan0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveNetwork {
    pub kind: NetworkType,
    pub label: String,
}

/// Source of the current network type.
pub trait NetworkInfoProvider: Send + Sync {
    /// `None` when no network is up.
    fn active_network(&self) -> Option<ActiveNetwork>;
}

/// Reads the network state from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNetworkInfo;

impl NetworkInfoProvider for SystemNetworkInfo {
    #[cfg(target_os = "linux")]
    fn active_network(&self) -> Option<ActiveNetwork> {
        linux::network::detect(std::path::Path::new(linux::network::SYSFS_NET))
    }

    #[cfg(not(target_os = "linux"))]
    fn active_network(&self) -> Option<ActiveNetwork> {
        Some(ActiveNetwork {
            kind: NetworkType::Unknown,
            label: NetworkType::Unknown.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_type_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&NetworkType::Wimax).unwrap(),
            "\"WIMAX\""
        );
        assert_eq!(NetworkType::Mobile.to_string(), "MOBILE");
    }
}
