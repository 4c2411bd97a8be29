//! Host resolution probe.
//!
//! Resolves the configured host name through the system resolver.

use std::net::SocketAddr;
use std::time::Instant;

use async_trait::async_trait;

use crate::config::NetprobeConfig;

use super::{Probe, ProbeId, ProbeInfo, ProbeReport, ProbeState, RunContext};

pub const ID: ProbeId = ProbeId::new("host-resolution");

pub struct HostResolutionProbe {
    host: String,
    base_timeout_ms: u64,
    state: ProbeState,
}

impl HostResolutionProbe {
    pub fn new(config: &NetprobeConfig) -> Self {
        Self::with_host(&config.dns_host, config.dns_timeout_ms)
    }

    pub fn with_host(host: &str, timeout_ms: u64) -> Self {
        Self {
            host: host.to_string(),
            base_timeout_ms: timeout_ms,
            state: ProbeState::new(true),
        }
    }

    async fn resolve(&self) -> ProbeReport {
        let timeout = self.state.timeout();
        let started = Instant::now();

        let lookup = tokio::net::lookup_host((self.host.as_str(), 0));
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(addrs)) => {
                let addrs: Vec<SocketAddr> = addrs.collect();
                match addrs.first() {
                    Some(first) => ProbeReport::passed(
                        started.elapsed(),
                        format!(
                            "{} resolved to {} ({} address{})",
                            self.host,
                            first.ip(),
                            addrs.len(),
                            if addrs.len() == 1 { "" } else { "es" }
                        ),
                    ),
                    None => ProbeReport::failed(
                        started.elapsed(),
                        format!("{} has no address", self.host),
                    ),
                }
            }
            Ok(Err(e)) => ProbeReport::failed(
                started.elapsed(),
                format!("cannot resolve {}: {}", self.host, e),
            ),
            Err(_) => ProbeReport::failed(
                started.elapsed(),
                format!("resolving {} timed out after {:?}", self.host, timeout),
            ),
        }
    }
}

#[async_trait]
impl Probe for HostResolutionProbe {
    fn info(&self) -> ProbeInfo {
        ProbeInfo {
            id: ID,
            name: "Host resolution",
            description: "Resolve a host name through the system resolver",
        }
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn set_active(&self, active: bool) {
        self.state.set_active(active);
    }

    fn prepare_test(&self, ctx: &RunContext) {
        self.state.prepare(ctx.timeout(self.base_timeout_ms));
    }

    async fn perform_test(&self) -> bool {
        let report = self.resolve().await;
        tracing::debug!(probe = %ID, passed = report.passed, "{}", report.detail);
        self.state.record(report)
    }

    fn cleanup_tests(&self) {}

    fn report(&self) -> Option<ProbeReport> {
        self.state.report()
    }
}
