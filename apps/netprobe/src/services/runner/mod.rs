//! Sequential probe runner with cooperative cancellation.
//!
//! # Architecture
//!
//! - **Session**: one [`RunSession`] per launch, holding the stop flag and
//!   the activation snapshot. There is no process-wide running/stop state.
//! - **Executor**: the single background task of a run. It performs probes
//!   in registry order and reports over a [`RunMessage`] channel.
//! - **Runner**: owns the current session and the channel. Launching while
//!   a session is in flight is rejected.
//!
//! Cancellation is cooperative: the stop flag is checked before each probe,
//! never inside one, so a long `perform_test` always runs to its own end.

pub mod executor;
pub mod session;
pub mod types;

pub use session::{RunSession, RunSnapshot};
pub use types::{AbortReason, RunMessage, RunOutcome};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{NetprobeError, Result};
use crate::probes::{ProbeRegistry, RunContext};

pub struct Runner {
    current: Option<RunSession>,
    worker: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<RunMessage>,
    rx: mpsc::UnboundedReceiver<RunMessage>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            current: None,
            worker: None,
            tx,
            rx,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&RunSession> {
        self.current.as_ref()
    }

    /// Prepare every probe, snapshot the active flags and start the run task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn launch(&mut self, registry: &ProbeRegistry, ctx: &RunContext) -> Result<RunSession> {
        if self.current.is_some() {
            return Err(NetprobeError::AlreadyRunning);
        }

        let mut active = Vec::with_capacity(registry.len());
        for probe in registry.all() {
            probe.prepare_test(ctx);
            active.push(probe.is_active());
        }

        let session = RunSession::new(RunSnapshot::new(active));
        tracing::info!(
            "Starting run {} with {} of {} probes active",
            session.id(),
            session.snapshot().active_count(),
            registry.len()
        );

        self.worker = Some(executor::spawn(
            registry.all().to_vec(),
            session.clone(),
            self.tx.clone(),
        ));
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Set the stop flag of the current run. Returns `false` when idle.
    pub fn request_stop(&self) -> bool {
        match &self.current {
            Some(session) => {
                tracing::info!("Stop requested for run {}", session.id());
                session.request_stop();
                true
            }
            None => false,
        }
    }

    pub fn is_want_stop(&self) -> bool {
        self.current
            .as_ref()
            .map(|s| s.is_stop_requested())
            .unwrap_or(false)
    }

    /// Next message from a run task.
    ///
    /// Pends forever while idle: the runner keeps its own sender alive.
    pub async fn recv(&mut self) -> Option<RunMessage> {
        self.rx.recv().await
    }

    /// Close the session `session_id` and clean up every probe.
    ///
    /// Returns `false`, touching nothing, when `session_id` is not the
    /// current session.
    pub fn finish(&mut self, registry: &ProbeRegistry, session_id: Uuid) -> bool {
        let session = match self.current.take() {
            Some(session) if session.id() == session_id => session,
            other => {
                self.current = other;
                tracing::debug!("Ignoring completion of stale run {}", session_id);
                return false;
            }
        };

        let elapsed = chrono::Utc::now() - session.started_at();
        tracing::info!(
            "Run {} finished after {} ms, cleaning up",
            session_id,
            elapsed.num_milliseconds()
        );
        self.worker = None;
        for probe in registry.all() {
            probe.cleanup_tests();
        }
        true
    }

    /// Abort a run that never reported `Finished` and clean up every probe.
    ///
    /// No-op while idle.
    pub fn shutdown(&mut self, registry: &ProbeRegistry) {
        let Some(session) = self.current.take() else {
            return;
        };

        tracing::warn!("Run {} still in flight at shutdown, aborting", session.id());
        session.request_stop();
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
        for probe in registry.all() {
            probe.cleanup_tests();
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::testing::{Behavior, CallLog, MockProbe};
    use crate::probes::{Probe, ProbeId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    async fn wait_finished(runner: &mut Runner) -> (Uuid, RunOutcome) {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), runner.recv())
                .await
                .expect("run did not finish")
                .unwrap();
            if let RunMessage::Finished {
                session_id,
                outcome,
            } = message
            {
                return (session_id, outcome);
            }
        }
    }

    #[tokio::test]
    async fn test_launch_prepares_all_and_cleans_all() {
        let log = CallLog::default();
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(MockProbe::new("a", true, Behavior::Pass, &log)),
            Arc::new(MockProbe::new("b", false, Behavior::Pass, &log)),
            Arc::new(MockProbe::new("c", true, Behavior::Fail, &log)),
            Arc::new(MockProbe::new("d", true, Behavior::Pass, &log)),
        ];
        let registry = ProbeRegistry::new(probes);
        let mut runner = Runner::new();

        let session = runner.launch(&registry, &RunContext::default()).unwrap();
        assert!(runner.is_running());
        assert_eq!(log.calls("prepare"), vec!["a", "b", "c", "d"]);

        let (id, outcome) = wait_finished(&mut runner).await;
        assert_eq!(id, session.id());
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                probe: ProbeId::new("c"),
                fault: None
            }
        );

        assert!(runner.finish(&registry, id));
        assert!(!runner.is_running());
        assert_eq!(log.calls("perform"), vec!["a", "c"]);
        assert_eq!(log.calls("cleanup"), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_second_launch_is_rejected() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let registry = ProbeRegistry::new(vec![Arc::new(MockProbe::new(
            "slow",
            true,
            Behavior::WaitFor(gate.clone()),
            &log,
        ))]);
        let mut runner = Runner::new();

        runner.launch(&registry, &RunContext::default()).unwrap();
        let second = runner.launch(&registry, &RunContext::default());
        assert!(matches!(second, Err(NetprobeError::AlreadyRunning)));

        gate.notify_one();
        let (id, outcome) = wait_finished(&mut runner).await;
        assert!(outcome.is_completed());
        assert!(runner.finish(&registry, id));

        assert!(runner.launch(&registry, &RunContext::default()).is_ok());
        gate.notify_one();
    }

    #[tokio::test]
    async fn test_stale_finish_is_ignored() {
        let log = CallLog::default();
        let registry =
            ProbeRegistry::new(vec![Arc::new(MockProbe::new("a", true, Behavior::Pass, &log))]);
        let mut runner = Runner::new();

        assert!(!runner.finish(&registry, Uuid::new_v4()));
        assert!(log.calls("cleanup").is_empty());
    }

    #[tokio::test]
    async fn test_stop_before_first_step_still_cleans_up_all() {
        let log = CallLog::default();
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(MockProbe::new("a", true, Behavior::Pass, &log)),
            Arc::new(MockProbe::new("b", false, Behavior::Pass, &log)),
            Arc::new(MockProbe::new("c", true, Behavior::Pass, &log)),
        ];
        let registry = ProbeRegistry::new(probes);
        let mut runner = Runner::new();

        runner.launch(&registry, &RunContext::default()).unwrap();
        assert!(runner.request_stop());

        let (id, outcome) = wait_finished(&mut runner).await;
        assert_eq!(
            outcome,
            RunOutcome::Aborted {
                reason: AbortReason::StopRequested
            }
        );
        assert!(runner.finish(&registry, id));

        assert!(log.calls("perform").is_empty());
        assert_eq!(log.calls("prepare"), vec!["a", "b", "c"]);
        assert_eq!(log.calls("cleanup"), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_shutdown_cleans_up_unfinished_run() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let probes: Vec<Arc<dyn Probe>> = vec![
            Arc::new(MockProbe::new("a", true, Behavior::WaitFor(gate), &log)),
            Arc::new(MockProbe::new("b", true, Behavior::Pass, &log)),
        ];
        let registry = ProbeRegistry::new(probes);
        let mut runner = Runner::new();

        runner.shutdown(&registry);
        assert!(log.calls("cleanup").is_empty());

        runner.launch(&registry, &RunContext::default()).unwrap();
        runner.shutdown(&registry);

        assert!(!runner.is_running());
        assert_eq!(log.calls("cleanup"), vec!["a", "b"]);
        runner.shutdown(&registry);
        assert_eq!(log.calls("cleanup"), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_stop_flag_is_per_session() {
        let log = CallLog::default();
        let gate = Arc::new(Notify::new());
        let registry = ProbeRegistry::new(vec![Arc::new(MockProbe::new(
            "slow",
            true,
            Behavior::WaitFor(gate.clone()),
            &log,
        ))]);
        let mut runner = Runner::new();

        assert!(!runner.request_stop());
        runner.launch(&registry, &RunContext::default()).unwrap();
        assert!(!runner.is_want_stop());
        assert!(runner.request_stop());
        assert!(runner.is_want_stop());

        gate.notify_one();
        let (id, outcome) = wait_finished(&mut runner).await;
        assert_eq!(
            outcome,
            RunOutcome::Aborted {
                reason: AbortReason::StopRequested
            }
        );
        runner.finish(&registry, id);
        assert!(!runner.is_want_stop());

        runner.launch(&registry, &RunContext::default()).unwrap();
        assert!(!runner.is_want_stop());
        gate.notify_one();
    }
}
