//! Network probes.
//!
//! A probe is a single network-condition check. Probes are registered in an
//! explicit ordered list ([`ProbeRegistry`]); declaration order is execution
//! order.
//!
//! # Lifecycle
//!
//! For every run the controller calls, in order:
//! - [`Probe::prepare_test`] on every probe (controller task)
//! - [`Probe::perform_test`] on every probe that was active at launch
//!   (background task), until one fails or a stop is requested
//! - [`Probe::cleanup_tests`] on every probe, reached or not (controller task)

pub mod download;
pub mod host_resolution;
pub mod http;
pub mod real_web;
pub mod state;
pub mod tcp_connection;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::RunView;
use crate::config::NetprobeConfig;
use crate::platform::NetworkType;

pub use download::{DownloadProbe, DownloadSize};
pub use host_resolution::HostResolutionProbe;
pub use real_web::RealWebProbe;
pub use state::ProbeState;
pub use tcp_connection::TcpConnectionProbe;

/// Stable identity of a probe kind.
///
/// Only used as a persistence key and for display, never for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProbeId(&'static str);

impl ProbeId {
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Key of this probe's active flag in the settings table.
    pub fn active_setting_key(&self) -> String {
        format!("probe.{}.active", self.0)
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Static description of a probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeInfo {
    pub id: ProbeId,
    pub name: &'static str,
    pub description: &'static str,
}

/// Result of one `perform_test` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub passed: bool,
    pub duration_ms: u64,
    pub detail: String,
    pub finished_at: DateTime<Utc>,
}

impl ProbeReport {
    pub fn passed(elapsed: Duration, detail: impl Into<String>) -> Self {
        Self::new(true, elapsed, detail)
    }

    pub fn failed(elapsed: Duration, detail: impl Into<String>) -> Self {
        Self::new(false, elapsed, detail)
    }

    fn new(passed: bool, elapsed: Duration, detail: impl Into<String>) -> Self {
        Self {
            passed,
            duration_ms: elapsed.as_millis() as u64,
            detail: detail.into(),
            finished_at: Utc::now(),
        }
    }
}

/// Ambient facts about the run, captured at launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunContext {
    pub network: Option<NetworkType>,
    pub mobile_timeout_factor: u32,
}

impl RunContext {
    /// Timeout for this run: `base_ms`, widened on mobile links.
    pub fn timeout(&self, base_ms: u64) -> Duration {
        let factor = match self.network {
            Some(NetworkType::Mobile) => self.mobile_timeout_factor.max(1),
            _ => 1,
        };
        Duration::from_millis(base_ms.saturating_mul(factor as u64))
    }
}

/// A single network-condition check.
///
/// All methods take `&self`: per-run state lives behind the probe's own
/// interior mutability, and the active flag is atomic.
#[async_trait]
pub trait Probe: Send + Sync {
    fn info(&self) -> ProbeInfo;

    fn is_active(&self) -> bool;

    fn set_active(&self, active: bool);

    /// Register this probe with the view.
    fn setup_views(&self, view: &dyn RunView) {
        view.add_probe_row(&self.info(), self.is_active());
    }

    /// Reset per-run state before a run. Called on every probe, active or not.
    fn prepare_test(&self, ctx: &RunContext);

    /// Run the check. `false` ends the whole run.
    async fn perform_test(&self) -> bool;

    /// Release per-run resources. Called on every probe after every run.
    fn cleanup_tests(&self);

    /// The application is being paused.
    fn on_pause(&self) {}

    /// Latest result, if the probe ran since its last `prepare_test`.
    fn report(&self) -> Option<ProbeReport>;
}

/// Ordered list of probes.
#[derive(Clone)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self { probes }
    }

    /// The standard probe set, in execution order.
    pub fn standard(config: &NetprobeConfig) -> Self {
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(HostResolutionProbe::new(config)),
            Arc::new(TcpConnectionProbe::new(config)),
            Arc::new(RealWebProbe::new(config)),
            Arc::new(DownloadProbe::new(DownloadSize::Kb10, config)),
            Arc::new(DownloadProbe::new(DownloadSize::Kb100, config)),
            Arc::new(DownloadProbe::new(DownloadSize::Mb1, config)),
        ];
        Self::new(probes)
    }

    pub fn all(&self) -> &[Arc<dyn Probe>] {
        &self.probes
    }

    /// Find a probe by its id string.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Probe>> {
        self.probes.iter().find(|p| p.info().id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order() {
        let registry = ProbeRegistry::standard(&NetprobeConfig::default());
        let ids: Vec<&str> = registry.all().iter().map(|p| p.info().id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "host-resolution",
                "tcp-connection",
                "real-web",
                "download-10kb",
                "download-100kb",
                "download-1mb",
            ]
        );
    }

    #[test]
    fn test_standard_defaults_skip_large_download() {
        let registry = ProbeRegistry::standard(&NetprobeConfig::default());
        let inactive: Vec<&str> = registry
            .all()
            .iter()
            .filter(|p| !p.is_active())
            .map(|p| p.info().id.as_str())
            .collect();
        assert_eq!(inactive, vec!["download-1mb"]);
    }

    #[test]
    fn test_get_by_id() {
        let registry = ProbeRegistry::standard(&NetprobeConfig::default());
        assert!(registry.get("real-web").is_some());
        assert!(registry.get("ping").is_none());
    }

    #[test]
    fn test_active_setting_key() {
        assert_eq!(
            ProbeId::new("download-10kb").active_setting_key(),
            "probe.download-10kb.active"
        );
    }

    #[test]
    fn test_run_context_widens_timeout_on_mobile() {
        let ctx = RunContext {
            network: Some(NetworkType::Mobile),
            mobile_timeout_factor: 3,
        };
        assert_eq!(ctx.timeout(1_000), Duration::from_secs(3));

        let ctx = RunContext {
            network: Some(NetworkType::Wifi),
            mobile_timeout_factor: 3,
        };
        assert_eq!(ctx.timeout(1_000), Duration::from_secs(1));
    }
}
