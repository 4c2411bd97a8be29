//! The screen controller.
//!
//! Runs on a single task (the "UI thread"). The run task talks back to it
//! only through [`RunMessage`]s, which the owner pumps with
//! [`Controller::next_message`] and [`Controller::handle_message`].
//!
//! Start/stop control: Idle -> Running on start (ignored while Running),
//! Running -> Idle when the run task reports `Finished`.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::NetprobeConfig;
use crate::error::{NetprobeError, Result};
use crate::events::{AppEvent, EventBus};
use crate::platform::{ActiveNetwork, NetworkInfoProvider, NetworkType};
use crate::probes::{Probe, ProbeRegistry, RunContext};
use crate::services::active_state::ActiveStateStore;
use crate::services::runner::{RunMessage, RunOutcome, Runner};

use super::RunView;

pub struct Controller {
    registry: ProbeRegistry,
    runner: Runner,
    store: ActiveStateStore,
    view: Arc<dyn RunView>,
    network_info: Box<dyn NetworkInfoProvider>,
    events: Arc<EventBus>,
    network: Option<ActiveNetwork>,
    mobile_timeout_factor: u32,
}

impl Controller {
    pub fn new(
        registry: ProbeRegistry,
        store: ActiveStateStore,
        view: Arc<dyn RunView>,
        network_info: Box<dyn NetworkInfoProvider>,
        events: Arc<EventBus>,
        config: &NetprobeConfig,
    ) -> Self {
        Self {
            registry,
            runner: Runner::new(),
            store,
            view,
            network_info,
            events,
            network: None,
            mobile_timeout_factor: config.mobile_timeout_factor,
        }
    }

    pub fn probes(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Show the network type and register every probe with the view.
    pub fn setup_views(&mut self) {
        self.update_network_type();
        for probe in self.registry.all() {
            probe.setup_views(self.view.as_ref());
        }
    }

    /// Re-read the active network and show it.
    pub fn update_network_type(&mut self) {
        self.network = self.network_info.active_network();
        self.view.show_network_type(self.network.as_ref());
        self.events.emit(AppEvent::NetworkTypeChanged {
            network: self.network.clone(),
        });
    }

    /// Network type seen at the last refresh, `None` when no network was up.
    pub fn get_network_type(&self) -> Option<NetworkType> {
        self.network.as_ref().map(|n| n.kind)
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    pub fn is_want_stop(&self) -> bool {
        self.runner.is_want_stop()
    }

    /// Start a run. Fails with `AlreadyRunning` while one is in flight.
    pub fn launch(&mut self) -> Result<Uuid> {
        if self.runner.is_running() {
            return Err(NetprobeError::AlreadyRunning);
        }

        // The network may have changed since the view was set up
        self.update_network_type();
        let ctx = RunContext {
            network: self.get_network_type(),
            mobile_timeout_factor: self.mobile_timeout_factor,
        };

        let session = self.runner.launch(&self.registry, &ctx)?;
        self.view.set_running_label(true);

        let active_probes = self
            .registry
            .all()
            .iter()
            .enumerate()
            .filter(|(i, _)| session.snapshot().is_active(*i))
            .map(|(_, p)| p.info().id)
            .collect();
        self.events.emit(AppEvent::RunStarted {
            session_id: session.id(),
            active_probes,
        });

        Ok(session.id())
    }

    /// The start/stop control was pressed.
    pub fn start_stop_pressed(&mut self) -> Result<()> {
        if self.runner.is_running() {
            self.request_stop();
            Ok(())
        } else {
            self.launch().map(|_| ())
        }
    }

    /// Ask the current run to stop before its next probe.
    pub fn request_stop(&self) {
        if self.runner.request_stop() {
            if let Some(session) = self.runner.current() {
                self.events.emit(AppEvent::StopRequested {
                    session_id: session.id(),
                });
            }
        }
    }

    /// Switch a probe on or off. Takes effect from the next run.
    pub fn set_probe_active(&self, id: &str, active: bool) -> Result<()> {
        let probe = self
            .registry
            .get(id)
            .ok_or_else(|| NetprobeError::not_found("Probe", id))?;

        probe.set_active(active);
        let info = probe.info();
        self.view.set_probe_active(&info, active);
        self.events.emit(AppEvent::ProbeToggled {
            probe_id: info.id,
            active,
        });
        Ok(())
    }

    /// Apply the stored probe selection without touching the view.
    pub fn load_active_state(&self) -> Result<usize> {
        let applied = self.store.load(&self.registry)?;
        self.events.emit(AppEvent::ActiveStateLoaded { applied });
        Ok(applied)
    }

    /// Apply the stored probe selection. Rows whose flag changed are
    /// refreshed in the view.
    pub fn on_resume(&self) -> Result<usize> {
        let before: Vec<bool> = self.registry.all().iter().map(|p| p.is_active()).collect();
        let applied = self.load_active_state()?;
        for (probe, was_active) in self.registry.all().iter().zip(before) {
            if probe.is_active() != was_active {
                self.view.set_probe_active(&probe.info(), probe.is_active());
            }
        }
        Ok(applied)
    }

    /// Stop any run, pause every probe and store the probe selection.
    pub fn on_pause(&self) -> Result<usize> {
        self.request_stop();
        for probe in self.registry.all() {
            probe.on_pause();
        }
        let saved = self.store.save(&self.registry)?;
        self.events.emit(AppEvent::ActiveStateSaved { saved });
        Ok(saved)
    }

    /// Next message from the run task. Pends while idle.
    pub async fn next_message(&mut self) -> Option<RunMessage> {
        self.runner.recv().await
    }

    /// Apply one run message to the view. Returns the outcome once the run
    /// has finished and every probe was cleaned up.
    pub fn handle_message(&mut self, message: RunMessage) -> Option<RunOutcome> {
        let current = self.runner.current().map(|s| s.id());
        if current != Some(message.session_id()) {
            tracing::debug!("Dropping message of stale run {}", message.session_id());
            return None;
        }

        match message {
            RunMessage::ProbeStarted { session_id, index } => {
                let probe = self.probe_at(index)?;
                self.view.show_probe_started(&probe.info());
                self.events.emit(AppEvent::ProbeStarted {
                    session_id,
                    probe_id: probe.info().id,
                });
                None
            }
            RunMessage::ProbeSkipped { session_id, index } => {
                let probe = self.probe_at(index)?;
                self.events.emit(AppEvent::ProbeSkipped {
                    session_id,
                    probe_id: probe.info().id,
                });
                None
            }
            RunMessage::ProbeFinished {
                session_id,
                index,
                passed,
            } => {
                let probe = self.probe_at(index)?;
                let info = probe.info();
                let report = probe.report();
                self.view.show_probe_result(&info, passed, report.as_ref());
                self.events.emit(AppEvent::ProbeFinished {
                    session_id,
                    probe_id: info.id,
                    passed,
                    report,
                });
                None
            }
            RunMessage::Finished {
                session_id,
                outcome,
            } => {
                if !self.runner.finish(&self.registry, session_id) {
                    return None;
                }
                self.view.set_running_label(false);
                self.view.show_run_finished(&outcome);
                self.events.emit(AppEvent::RunFinished {
                    session_id,
                    outcome: outcome.clone(),
                });
                Some(outcome)
            }
        }
    }

    /// Pump messages until the current run has finished.
    ///
    /// Returns `None` right away when idle.
    pub async fn run_until_idle(&mut self) -> Option<RunOutcome> {
        while self.runner.is_running() {
            let message = self.next_message().await?;
            if let Some(outcome) = self.handle_message(message) {
                return Some(outcome);
            }
        }
        None
    }

    fn probe_at(&self, index: usize) -> Option<Arc<dyn Probe>> {
        self.registry.all().get(index).cloned()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.runner.shutdown(&self.registry);
    }
}
