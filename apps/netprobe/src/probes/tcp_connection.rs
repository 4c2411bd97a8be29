//! TCP connection probe.
//!
//! Opens a TCP connection to the configured `host:port` and closes it again.

use std::time::Instant;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::config::NetprobeConfig;

use super::{Probe, ProbeId, ProbeInfo, ProbeReport, ProbeState, RunContext};

pub const ID: ProbeId = ProbeId::new("tcp-connection");

pub struct TcpConnectionProbe {
    target: String,
    base_timeout_ms: u64,
    state: ProbeState,
}

impl TcpConnectionProbe {
    pub fn new(config: &NetprobeConfig) -> Self {
        Self::with_target(&config.tcp_target, config.tcp_timeout_ms)
    }

    pub fn with_target(target: &str, timeout_ms: u64) -> Self {
        Self {
            target: target.to_string(),
            base_timeout_ms: timeout_ms,
            state: ProbeState::new(true),
        }
    }

    async fn connect(&self) -> ProbeReport {
        let timeout = self.state.timeout();
        let started = Instant::now();

        match tokio::time::timeout(timeout, TcpStream::connect(self.target.as_str())).await {
            Ok(Ok(stream)) => {
                let peer = stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| self.target.clone());
                ProbeReport::passed(started.elapsed(), format!("connected to {}", peer))
            }
            Ok(Err(e)) => ProbeReport::failed(
                started.elapsed(),
                format!("cannot connect to {}: {}", self.target, e),
            ),
            Err(_) => ProbeReport::failed(
                started.elapsed(),
                format!("connecting to {} timed out after {:?}", self.target, timeout),
            ),
        }
    }
}

#[async_trait]
impl Probe for TcpConnectionProbe {
    fn info(&self) -> ProbeInfo {
        ProbeInfo {
            id: ID,
            name: "TCP connection",
            description: "Open a TCP connection to a well-known server",
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
        let report = self.connect().await;
        tracing::debug!(probe = %ID, passed = report.passed, "{}", report.detail);
        self.state.record(report)
    }

    fn cleanup_tests(&self) {}

    fn report(&self) -> Option<ProbeReport> {
        self.state.report()
    }
}
