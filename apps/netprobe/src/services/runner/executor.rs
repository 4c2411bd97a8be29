//! The run task: performs probes one after the other.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::probes::Probe;

use super::session::RunSession;
use super::types::{AbortReason, RunMessage, RunOutcome};

/// Spawn the single background task of a run.
pub(crate) fn spawn(
    probes: Vec<Arc<dyn Probe>>,
    session: RunSession,
    tx: UnboundedSender<RunMessage>,
) -> JoinHandle<()> {
    let span = crate::operation_span!("probe_run", session = %session.id());

    tokio::spawn(
        async move {
            let guard = CompletionGuard::new(session.id(), tx.clone());
            let outcome = execute(&probes, &session, &tx).await;
            guard.complete(outcome);
        }
        .instrument(span),
    )
}

/// Perform every probe active in the session snapshot, in order.
///
/// Stops at the first failing probe, or before the next probe once a stop
/// was requested. A panicking probe counts as a failing one.
pub(crate) async fn execute(
    probes: &[Arc<dyn Probe>],
    session: &RunSession,
    tx: &UnboundedSender<RunMessage>,
) -> RunOutcome {
    let session_id = session.id();
    let stopped = RunOutcome::Aborted {
        reason: AbortReason::StopRequested,
    };

    for (index, probe) in probes.iter().enumerate() {
        if session.is_stop_requested() {
            tracing::info!("Stop requested, abandoning remaining probes");
            return stopped;
        }

        if !session.snapshot().is_active(index) {
            send(tx, RunMessage::ProbeSkipped { session_id, index });
            continue;
        }

        let id = probe.info().id;
        tracing::debug!("Launch probe {}", id);
        send(tx, RunMessage::ProbeStarted { session_id, index });

        let result = AssertUnwindSafe(probe.perform_test()).catch_unwind().await;
        let passed = match &result {
            Ok(passed) => *passed,
            Err(_) => false,
        };
        send(
            tx,
            RunMessage::ProbeFinished {
                session_id,
                index,
                passed,
            },
        );

        match result {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Probe {} failed, ending run", id);
                return RunOutcome::Failed {
                    probe: id,
                    fault: None,
                };
            }
            Err(panic) => {
                let fault = panic_message(panic.as_ref());
                tracing::error!("Probe {} panicked: {}", id, fault);
                return RunOutcome::Failed {
                    probe: id,
                    fault: Some(fault),
                };
            }
        }
    }

    if session.is_stop_requested() {
        return stopped;
    }
    RunOutcome::Completed
}

fn send(tx: &UnboundedSender<RunMessage>, message: RunMessage) {
    if tx.send(message).is_err() {
        tracing::trace!("Controller gone, run message dropped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Sends `Finished` when dropped, whatever way the run task ends.
struct CompletionGuard {
    session_id: Uuid,
    tx: UnboundedSender<RunMessage>,
    outcome: Option<RunOutcome>,
}

impl CompletionGuard {
    fn new(session_id: Uuid, tx: UnboundedSender<RunMessage>) -> Self {
        Self {
            session_id,
            tx,
            outcome: None,
        }
    }

    fn complete(mut self, outcome: RunOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(RunOutcome::Aborted {
            reason: AbortReason::WorkerLost,
        });
        tracing::debug!("Run {} finished: {}", self.session_id, outcome);
        send(
            &self.tx,
            RunMessage::Finished {
                session_id: self.session_id,
                outcome,
            },
        );
    }
}
