//! Staged download probes.
//!
//! Three instances of the same probe download 10 kB, 100 kB and 1 MB and
//! report the achieved throughput. A short read fails the probe.

use std::time::Instant;

use async_trait::async_trait;

use crate::config::NetprobeConfig;

use super::http::HttpClientSlot;
use super::{Probe, ProbeId, ProbeInfo, ProbeReport, ProbeState, RunContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadSize {
    Kb10,
    Kb100,
    Mb1,
}

impl DownloadSize {
    pub fn bytes(&self) -> u64 {
        match self {
            DownloadSize::Kb10 => 10 * 1024,
            DownloadSize::Kb100 => 100 * 1024,
            DownloadSize::Mb1 => 1024 * 1024,
        }
    }

    pub fn id(&self) -> ProbeId {
        match self {
            DownloadSize::Kb10 => ProbeId::new("download-10kb"),
            DownloadSize::Kb100 => ProbeId::new("download-100kb"),
            DownloadSize::Mb1 => ProbeId::new("download-1mb"),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DownloadSize::Kb10 => "Download 10 kB",
            DownloadSize::Kb100 => "Download 100 kB",
            DownloadSize::Mb1 => "Download 1 MB",
        }
    }

    /// The 1 MB download is opt-in, it is expensive on metered links.
    fn default_active(&self) -> bool {
        !matches!(self, DownloadSize::Mb1)
    }
}

pub struct DownloadProbe {
    size: DownloadSize,
    url: String,
    base_timeout_ms: u64,
    state: ProbeState,
    http: HttpClientSlot,
}

impl DownloadProbe {
    pub fn new(size: DownloadSize, config: &NetprobeConfig) -> Self {
        Self::with_url(size, &config.download_url(size.bytes()), config.download_timeout_ms)
    }

    pub fn with_url(size: DownloadSize, url: &str, timeout_ms: u64) -> Self {
        Self {
            size,
            url: url.to_string(),
            base_timeout_ms: timeout_ms,
            state: ProbeState::new(size.default_active()),
            http: HttpClientSlot::default(),
        }
    }

    async fn download(&self) -> ProbeReport {
        let started = Instant::now();
        let expected = self.size.bytes();
        let Some(client) = self.http.client() else {
            return ProbeReport::failed(started.elapsed(), "HTTP client unavailable");
        };

        let mut response = match client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                return ProbeReport::failed(
                    started.elapsed(),
                    format!("cannot fetch {}: {}", self.url, e),
                )
            }
        };

        if !response.status().is_success() {
            return ProbeReport::failed(
                started.elapsed(),
                format!("{} answered HTTP {}", self.url, response.status().as_u16()),
            );
        }

        let mut received: u64 = 0;
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => received += chunk.len() as u64,
                Ok(None) => break,
                Err(e) => {
                    return ProbeReport::failed(
                        started.elapsed(),
                        format!("download interrupted after {} bytes: {}", received, e),
                    )
                }
            }
        }

        let elapsed = started.elapsed();
        if received < expected {
            return ProbeReport::failed(
                elapsed,
                format!("received {} of {} bytes", received, expected),
            );
        }

        ProbeReport::passed(
            elapsed,
            format!(
                "{} bytes at {:.1} kB/s",
                received,
                throughput_kbps(received, elapsed.as_secs_f64())
            ),
        )
    }
}

fn throughput_kbps(bytes: u64, secs: f64) -> f64 {
    if secs <= f64::EPSILON {
        return 0.0;
    }
    bytes as f64 / 1024.0 / secs
}

#[async_trait]
impl Probe for DownloadProbe {
    fn info(&self) -> ProbeInfo {
        ProbeInfo {
            id: self.size.id(),
            name: self.size.name(),
            description: "Download a payload of fixed size and measure throughput",
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
        let report = self.download().await;
        tracing::debug!(probe = %self.size.id(), passed = report.passed, "{}", report.detail);
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
