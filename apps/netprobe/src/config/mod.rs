//! User configuration for the probes.
//!
//! The config file is JSONC (JSON with comments). Every field has a default,
//! so a missing or partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NetprobeError, Result};

const CONFIG_FILENAME: &str = "config.jsonc";

/// Placeholder substituted with the byte count in `download_url_template`.
pub const BYTES_PLACEHOLDER: &str = "{bytes}";

/// Probe targets and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetprobeConfig {
    /// Host name resolved by the host resolution probe.
    pub dns_host: String,
    /// `host:port` connected to by the TCP connection probe.
    pub tcp_target: String,
    /// Page fetched by the real web probe.
    pub web_url: String,
    /// URL used by the download probes, `{bytes}` is replaced by the size.
    pub download_url_template: String,
    pub dns_timeout_ms: u64,
    pub tcp_timeout_ms: u64,
    pub web_timeout_ms: u64,
    pub download_timeout_ms: u64,
    /// Multiplier applied to every timeout when the active network is mobile.
    pub mobile_timeout_factor: u32,
}

impl Default for NetprobeConfig {
    fn default() -> Self {
        Self {
            dns_host: "www.google.com".to_string(),
            tcp_target: "www.google.com:80".to_string(),
            web_url: "http://www.google.com/".to_string(),
            download_url_template: format!(
                "https://speed.cloudflare.com/__down?bytes={}",
                BYTES_PLACEHOLDER
            ),
            dns_timeout_ms: 5_000,
            tcp_timeout_ms: 5_000,
            web_timeout_ms: 10_000,
            download_timeout_ms: 30_000,
            mobile_timeout_factor: 2,
        }
    }
}

impl NetprobeConfig {
    /// Load the config from `path`, or from the default location when `None`.
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!("Config file does not exist: {:?}", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSONC content.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let stripped = json_comments::StripComments::new(content.as_bytes());
        serde_json::from_reader(stripped).map_err(NetprobeError::Json)
    }

    /// Check the values the probes cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.dns_host.trim().is_empty() {
            return Err(NetprobeError::config("dnsHost must not be empty"));
        }
        match self.tcp_target.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(NetprobeError::config(format!(
                    "tcpTarget must be host:port, got '{}'",
                    self.tcp_target
                )))
            }
        }
        if !self.download_url_template.contains(BYTES_PLACEHOLDER) {
            return Err(NetprobeError::config(format!(
                "downloadUrlTemplate must contain {}",
                BYTES_PLACEHOLDER
            )));
        }
        if self.mobile_timeout_factor == 0 {
            return Err(NetprobeError::config("mobileTimeoutFactor must be at least 1"));
        }
        Ok(())
    }

    /// Download URL for a given payload size.
    pub fn download_url(&self, bytes: u64) -> String {
        self.download_url_template
            .replace(BYTES_PLACEHOLDER, &bytes.to_string())
    }
}

/// Default config file location (`<config_dir>/config.jsonc`).
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "netprobe", "netprobe")
}
