//! Application event types for the event bus system.
//!
//! Events are emitted by the controller as runs progress and as the
//! persisted probe selection changes.

use serde::Serialize;
use uuid::Uuid;

use crate::platform::ActiveNetwork;
use crate::probes::{ProbeId, ProbeReport};
use crate::services::runner::RunOutcome;

/// Application events that flow through the event bus.
///
/// Events are categorized by their source domain:
/// - Run events: progress of a probe run
/// - Active state events: probe selection changes and persistence
/// - Network events: the active link changed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum AppEvent {
    // =========================================================================
    // Run Events
    // =========================================================================
    /// A run was launched
    RunStarted {
        session_id: Uuid,
        active_probes: Vec<ProbeId>,
    },

    /// A probe is about to be performed
    ProbeStarted {
        session_id: Uuid,
        probe_id: ProbeId,
    },

    /// A probe was inactive at launch and was skipped
    ProbeSkipped {
        session_id: Uuid,
        probe_id: ProbeId,
    },

    /// A probe returned
    ProbeFinished {
        session_id: Uuid,
        probe_id: ProbeId,
        passed: bool,
        report: Option<ProbeReport>,
    },

    /// The user asked the current run to stop
    StopRequested { session_id: Uuid },

    /// A run ended and every probe was cleaned up
    RunFinished {
        session_id: Uuid,
        outcome: RunOutcome,
    },

    // =========================================================================
    // Active State Events
    // =========================================================================
    /// A probe was switched on or off
    ProbeToggled { probe_id: ProbeId, active: bool },

    /// Stored active flags were applied on resume
    ActiveStateLoaded { applied: usize },

    /// Active flags were written on pause
    ActiveStateSaved { saved: usize },

    // =========================================================================
    // Network Events
    // =========================================================================
    /// The active network was refreshed
    NetworkTypeChanged { network: Option<ActiveNetwork> },
}

impl AppEvent {
    /// Get the run session associated with this event, if any.
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            AppEvent::RunStarted { session_id, .. }
            | AppEvent::ProbeStarted { session_id, .. }
            | AppEvent::ProbeSkipped { session_id, .. }
            | AppEvent::ProbeFinished { session_id, .. }
            | AppEvent::StopRequested { session_id }
            | AppEvent::RunFinished { session_id, .. } => Some(*session_id),

            AppEvent::ProbeToggled { .. }
            | AppEvent::ActiveStateLoaded { .. }
            | AppEvent::ActiveStateSaved { .. }
            | AppEvent::NetworkTypeChanged { .. } => None,
        }
    }

    /// Get a short description of the event for logging.
    pub fn description(&self) -> String {
        match self {
            AppEvent::RunStarted {
                session_id,
                active_probes,
            } => format!(
                "Run {} started with {} active probes",
                session_id,
                active_probes.len()
            ),
            AppEvent::ProbeStarted { probe_id, .. } => format!("Probe {} started", probe_id),
            AppEvent::ProbeSkipped { probe_id, .. } => format!("Probe {} skipped", probe_id),
            AppEvent::ProbeFinished {
                probe_id, passed, ..
            } => format!(
                "Probe {} {}",
                probe_id,
                if *passed { "passed" } else { "failed" }
            ),
            AppEvent::StopRequested { session_id } => {
                format!("Stop requested for run {}", session_id)
            }
            AppEvent::RunFinished {
                session_id,
                outcome,
            } => format!("Run {} finished: {}", session_id, outcome),
            AppEvent::ProbeToggled { probe_id, active } => format!(
                "Probe {} {}",
                probe_id,
                if *active { "enabled" } else { "disabled" }
            ),
            AppEvent::ActiveStateLoaded { applied } => {
                format!("Active state loaded for {} probes", applied)
            }
            AppEvent::ActiveStateSaved { saved } => {
                format!("Active state saved for {} probes", saved)
            }
            AppEvent::NetworkTypeChanged { network } => match network {
                Some(network) => format!("Network is {}", network.label),
                None => "No active network".to_string(),
            },
        }
    }
}
