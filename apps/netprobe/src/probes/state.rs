//! State shared by every probe implementation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::ProbeReport;

/// Active flag, per-run timeout and latest report of one probe.
///
/// The active flag is written by the controller task and read when the run
/// snapshot is taken. The report is written by the background task and read
/// by the view once the probe finished.
#[derive(Debug)]
pub struct ProbeState {
    active: AtomicBool,
    timeout_ms: AtomicU64,
    report: Mutex<Option<ProbeReport>>,
}

impl ProbeState {
    pub fn new(default_active: bool) -> Self {
        Self {
            active: AtomicBool::new(default_active),
            timeout_ms: AtomicU64::new(0),
            report: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    /// Forget the previous result and set the timeout for the coming run.
    pub fn prepare(&self, timeout: Duration) {
        self.timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Release);
        *self.lock_report() = None;
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Acquire))
    }

    /// Store `report` and return its verdict.
    pub fn record(&self, report: ProbeReport) -> bool {
        let passed = report.passed;
        *self.lock_report() = Some(report);
        passed
    }

    pub fn report(&self) -> Option<ProbeReport> {
        self.lock_report().clone()
    }

    // The guarded value is a plain report, a poisoned lock is still usable.
    fn lock_report(&self) -> MutexGuard<'_, Option<ProbeReport>> {
        self.report.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_clears_previous_report() {
        let state = ProbeState::new(true);
        state.record(ProbeReport::passed(Duration::from_millis(5), "ok"));
        assert!(state.report().is_some());

        state.prepare(Duration::from_secs(2));
        assert!(state.report().is_none());
        assert_eq!(state.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_record_returns_verdict() {
        let state = ProbeState::new(true);
        assert!(!state.record(ProbeReport::failed(Duration::ZERO, "refused")));
        assert_eq!(state.report().unwrap().detail, "refused");
    }

    #[test]
    fn test_toggle_active() {
        let state = ProbeState::new(false);
        assert!(!state.is_active());
        state.set_active(true);
        assert!(state.is_active());
    }
}
