//! Network link classification from sysfs.
//!
//! Each directory under `/sys/class/net` is an interface. An interface is
//! considered up when its `operstate` is `up`, or `unknown` with a carrier
//! (point-to-point links such as `ppp0` report that).

use std::fs;
use std::path::Path;

use crate::platform::{ActiveNetwork, NetworkType};

pub const SYSFS_NET: &str = "/sys/class/net";

const MOBILE_PREFIXES: &[&str] = &["wwan", "rmnet", "ccmni", "ppp"];
const WIMAX_PREFIXES: &[&str] = &["wmx", "wimax"];
const VIRTUAL_PREFIXES: &[&str] = &["lo", "veth", "docker", "br-", "virbr", "vnet"];

/// Classify the best active link under `root`.
///
/// Wi-Fi wins over mobile, mobile over WiMAX, WiMAX over anything else.
pub fn detect(root: &Path) -> Option<ActiveNetwork> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read {:?}: {}", root, e);
            return None;
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();

    names
        .iter()
        .filter(|name| !VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p)))
        .filter(|name| is_up(&root.join(name)))
        .map(|name| (classify(&root.join(name), name), name))
        .min_by_key(|(kind, _)| rank(*kind))
        .map(|(kind, name)| ActiveNetwork {
            kind,
            label: format!("{}/{}", kind, name),
        })
}

fn is_up(iface: &Path) -> bool {
    match read_trimmed(&iface.join("operstate")).as_deref() {
        Some("up") => true,
        Some("unknown") => read_trimmed(&iface.join("carrier")).as_deref() == Some("1"),
        _ => false,
    }
}

fn classify(iface: &Path, name: &str) -> NetworkType {
    if iface.join("wireless").exists() || iface.join("phy80211").exists() {
        NetworkType::Wifi
    } else if MOBILE_PREFIXES.iter().any(|p| name.starts_with(p)) {
        NetworkType::Mobile
    } else if WIMAX_PREFIXES.iter().any(|p| name.starts_with(p)) {
        NetworkType::Wimax
    } else {
        NetworkType::Other
    }
}

fn rank(kind: NetworkType) -> u8 {
    match kind {
        NetworkType::Wifi => 0,
        NetworkType::Mobile => 1,
        NetworkType::Wimax => 2,
        NetworkType::Other => 3,
        NetworkType::Unknown => 4,
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
