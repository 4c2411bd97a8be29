//! Messages and outcomes exchanged between the run task and the controller.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::probes::ProbeId;

/// Why a run stopped before reaching the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The stop flag was observed between probes.
    StopRequested,
    /// The run task went away without reporting an outcome.
    WorkerLost,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every active probe passed.
    Completed,
    Aborted { reason: AbortReason },
    /// `probe` reported a failure. `fault` holds the panic message when the
    /// probe crashed instead of returning.
    Failed {
        probe: ProbeId,
        fault: Option<String>,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => write!(f, "all probes passed"),
            RunOutcome::Aborted {
                reason: AbortReason::StopRequested,
            } => write!(f, "stopped"),
            RunOutcome::Aborted {
                reason: AbortReason::WorkerLost,
            } => write!(f, "run task lost"),
            RunOutcome::Failed { probe, fault: None } => write!(f, "{} failed", probe),
            RunOutcome::Failed {
                probe,
                fault: Some(fault),
            } => write!(f, "{} crashed: {}", probe, fault),
        }
    }
}

/// Progress sent from the run task to the controller.
///
/// `index` is the probe's position in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMessage {
    ProbeStarted { session_id: Uuid, index: usize },
    ProbeSkipped { session_id: Uuid, index: usize },
    ProbeFinished {
        session_id: Uuid,
        index: usize,
        passed: bool,
    },
    /// Always the last message of a session, sent on every exit path.
    Finished {
        session_id: Uuid,
        outcome: RunOutcome,
    },
}

impl RunMessage {
    pub fn session_id(&self) -> Uuid {
        match self {
            RunMessage::ProbeStarted { session_id, .. }
            | RunMessage::ProbeSkipped { session_id, .. }
            | RunMessage::ProbeFinished { session_id, .. }
            | RunMessage::Finished { session_id, .. } => *session_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(RunOutcome::Completed.to_string(), "all probes passed");
        assert_eq!(
            RunOutcome::Failed {
                probe: ProbeId::new("real-web"),
                fault: None
            }
            .to_string(),
            "real-web failed"
        );
        assert_eq!(
            RunOutcome::Aborted {
                reason: AbortReason::StopRequested
            }
            .to_string(),
            "stopped"
        );
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let json = serde_json::to_value(RunOutcome::Failed {
            probe: ProbeId::new("tcp-connection"),
            fault: Some("boom".to_string()),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "failed", "probe": "tcp-connection", "fault": "boom"})
        );
    }
}
