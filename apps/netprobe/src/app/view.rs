//! The UI collaborator contract.

use crate::platform::ActiveNetwork;
use crate::probes::{ProbeInfo, ProbeReport};
use crate::services::runner::RunOutcome;

/// What the controller needs from a user interface.
///
/// Every method is called from the controller task, never from the run task.
pub trait RunView: Send + Sync {
    /// A probe registers its row. Called once per probe from `setup_views`.
    fn add_probe_row(&self, probe: &ProbeInfo, active: bool);

    /// A probe was switched on or off.
    fn set_probe_active(&self, _probe: &ProbeInfo, _active: bool) {}

    /// Switch the start/stop control between its running and idle labels.
    fn set_running_label(&self, running: bool);

    fn show_network_type(&self, network: Option<&ActiveNetwork>);

    fn show_probe_started(&self, _probe: &ProbeInfo) {}

    fn show_probe_result(&self, probe: &ProbeInfo, passed: bool, report: Option<&ProbeReport>);

    fn show_run_finished(&self, _outcome: &RunOutcome) {}
}
