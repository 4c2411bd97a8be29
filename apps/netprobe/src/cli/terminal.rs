//! Terminal implementation of [`RunView`].

use std::io::Write;
use std::sync::Mutex;

use crate::app::RunView;
use crate::platform::ActiveNetwork;
use crate::probes::{ProbeInfo, ProbeReport};
use crate::services::runner::RunOutcome;

/// Prints probe rows, results and the start/stop label as plain lines.
pub struct TerminalView {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalView {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// With `--json` the event stream owns stdout.
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    pub(crate) fn print(&self, text: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{}", text).and_then(|_| out.flush()) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

pub(crate) fn checkbox(active: bool) -> &'static str {
    if active {
        "[x]"
    } else {
        "[ ]"
    }
}

impl RunView for TerminalView {
    fn add_probe_row(&self, probe: &ProbeInfo, active: bool) {
        self.print(&format!(
            "{} {:<16} {}",
            checkbox(active),
            probe.id.as_str(),
            probe.name
        ));
    }

    fn set_probe_active(&self, probe: &ProbeInfo, active: bool) {
        self.print(&format!("{} {}", checkbox(active), probe.id));
    }

    fn set_running_label(&self, running: bool) {
        self.print(if running { "> Stop tests" } else { "> Start tests" });
    }

    fn show_network_type(&self, network: Option<&ActiveNetwork>) {
        let label = network.map(|n| n.label.as_str()).unwrap_or("unknown");
        self.print(&format!("Network type: {}", label));
    }

    fn show_probe_started(&self, probe: &ProbeInfo) {
        self.print(&format!("... {}", probe.name));
    }

    fn show_probe_result(&self, probe: &ProbeInfo, passed: bool, report: Option<&ProbeReport>) {
        let status = if passed { "PASS" } else { "FAIL" };
        match report {
            Some(report) => self.print(&format!(
                "{} {} ({} ms): {}",
                status, probe.name, report.duration_ms, report.detail
            )),
            None => self.print(&format!("{} {}", status, probe.name)),
        }
    }

    fn show_run_finished(&self, outcome: &RunOutcome) {
        self.print(&format!("Run {}", outcome));
    }
}
