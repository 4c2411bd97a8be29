//! Real web probe.
//!
//! Fetches a real web page over HTTP and expects a successful, non-empty
//! response.

use std::time::Instant;

use async_trait::async_trait;

use crate::config::NetprobeConfig;

use super::http::HttpClientSlot;
use super::{Probe, ProbeId, ProbeInfo, ProbeReport, ProbeState, RunContext};

pub const ID: ProbeId = ProbeId::new("real-web");

pub struct RealWebProbe {
    url: String,
    base_timeout_ms: u64,
    state: ProbeState,
    http: HttpClientSlot,
}

impl RealWebProbe {
    pub fn new(config: &NetprobeConfig) -> Self {
        Self::with_url(&config.web_url, config.web_timeout_ms)
    }

    pub fn with_url(url: &str, timeout_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            base_timeout_ms: timeout_ms,
            state: ProbeState::new(true),
            http: HttpClientSlot::default(),
        }
    }

    async fn fetch(&self) -> ProbeReport {
        let started = Instant::now();
        let Some(client) = self.http.client() else {
            return ProbeReport::failed(started.elapsed(), "HTTP client unavailable");
        };

        let response = match client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                return ProbeReport::failed(
                    started.elapsed(),
                    format!("cannot fetch {}: {}", self.url, e),
                )
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeReport::failed(
                started.elapsed(),
                format!("{} answered HTTP {}", self.url, status.as_u16()),
            );
        }

        match response.bytes().await {
            Ok(body) if body.is_empty() => ProbeReport::failed(
                started.elapsed(),
                format!("{} returned an empty page", self.url),
            ),
            Ok(body) => ProbeReport::passed(
                started.elapsed(),
                format!("HTTP {}, {} bytes", status.as_u16(), body.len()),
            ),
            Err(e) => ProbeReport::failed(
                started.elapsed(),
                format!("reading {} failed: {}", self.url, e),
            ),
        }
    }
}

#[async_trait]
impl Probe for RealWebProbe {
    fn info(&self) -> ProbeInfo {
        ProbeInfo {
            id: ID,
            name: "Real web",
            description: "Fetch a real web page over HTTP",
        }
    }

    fn is_active(&self) -> bool {
        self.state.is_active()
    }

    fn set_active(&self, active: bool) {
        self.state.set_active(active);
    }

    fn prepare_test(&self, ctx: &RunContext) {
        let timeout = ctx.timeout(self.base_timeout_ms);
        self.state.prepare(timeout);
        self.http.prepare(timeout);
    }

    async fn perform_test(&self) -> bool {
        let report = self.fetch().await;
        tracing::debug!(probe = %ID, passed = report.passed, "{}", report.detail);
        self.state.record(report)
    }

    fn cleanup_tests(&self) {
        self.http.release();
    }

    fn on_pause(&self) {
        self.http.release();
    }

    fn report(&self) -> Option<ProbeReport> {
        self.state.report()
    }
}
