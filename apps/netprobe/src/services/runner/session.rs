//! Run session: the per-launch stop flag and activation snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Active flags of every probe, captured at launch, in registry order.
///
/// Never mutated after capture. Toggling a probe during a run only affects
/// the next run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    active: Vec<bool>,
}

impl RunSnapshot {
    pub fn new(active: Vec<bool>) -> Self {
        Self { active }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }
}

/// One launch of the runner.
///
/// Cloning shares the stop flag: the controller keeps one handle, the run
/// task the other.
#[derive(Debug, Clone)]
pub struct RunSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    stop: CancellationToken,
    snapshot: Arc<RunSnapshot>,
}

impl RunSession {
    /// A fresh session, its stop flag unset.
    pub fn new(snapshot: RunSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            stop: CancellationToken::new(),
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn snapshot(&self) -> &RunSnapshot {
        &self.snapshot
    }

    /// Ask the run task to stop before its next probe. Never reset.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }
}
