// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tracing::{error, info, warn};

use crate::engine as en;
use crate::spec;
use en::backend::InferenceBackend;
use en::catalog::ScenarioCatalog;
use en::config::Topics;
use en::error::DispatchError;
use en::machine::MachineStateController;
use spec::{Health, MachineState, Stability, StatusReport, Tension};

/// Status fields for a message that only reports machine condition.
pub fn state_report(machine_state: MachineState, health: Health) -> StatusReport {
    StatusReport {
        machine_state,
        tension: Tension::NotApplicable,
        stability: Stability::NotApplicable,
        health,
        scenario: None,
        approach: None,
        available_scenarios: None,
    }
}

/// Routes inbound messages by topic and decides what, if anything, to publish.
///
/// Topics are matched in the order machine-on, machine-off, command; the
/// first match wins. Every call yields at most one report.
///
/// # Examples
///
/// ```rust
/// # use motordiag::engine::*;
/// let mut dispatcher = CommandDispatcher::new(ScenarioCatalog::standard(), Topics::default());
///
/// let report = dispatcher
///     .handle(
///         "unity/motor/command",
///         br#"{"command": "RUN_SCENARIO", "scenario": "adjustment_loose"}"#,
///     )?
///     .unwrap();
/// assert_eq!(report.health, Health::RequiresTightening);
///
/// // already on: nothing to publish
/// assert!(dispatcher.handle("unity/motor/machine_on", b"")?.is_none());
/// # Ok::<(), DispatchError>(())
/// ```
pub struct CommandDispatcher<B = ScenarioCatalog> {
    machine: MachineStateController,
    backend: B,
    topics: Topics,
}

impl<B: InferenceBackend> CommandDispatcher<B> {
    pub fn new(backend: B, topics: Topics) -> Self {
        CommandDispatcher {
            machine: MachineStateController::new(),
            backend,
            topics,
        }
    }

    pub fn machine(&self) -> &MachineStateController {
        &self.machine
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    /// The report announcing the current machine state, sent after connecting.
    pub fn announcement(&self) -> StatusReport {
        match self.machine.state() {
            MachineState::On => state_report(MachineState::On, Health::Ready),
            MachineState::Off => state_report(MachineState::Off, Health::Stopped),
        }
    }

    pub fn handle(
        &mut self,
        topic: &str,
        payload: &[u8],
    ) -> Result<Option<StatusReport>, DispatchError> {
        if topic == self.topics.machine_on {
            if self.machine.apply_power_on().is_changed() {
                info!("machine state received: ON");
                return Ok(Some(state_report(MachineState::On, Health::Ready)));
            }
            return Ok(None);
        }

        if topic == self.topics.machine_off {
            if self.machine.apply_power_off().is_changed() {
                info!("machine state received: OFF");
                return Ok(Some(state_report(MachineState::Off, Health::Stopped)));
            }
            return Ok(None);
        }

        if topic == self.topics.command {
            return self.handle_command(payload);
        }

        warn!("message from unknown topic: {}", topic);
        Ok(None)
    }

    fn handle_command(&mut self, payload: &[u8]) -> Result<Option<StatusReport>, DispatchError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| DispatchError::MalformedCommand(e.to_string()))?;
        let command = serde_json::from_str::<spec::InboundCommand>(text)
            .map_err(|e| DispatchError::MalformedCommand(e.to_string()))?;

        if !self.machine.is_on() {
            warn!("cannot run scenario, machine is OFF");
            return Ok(Some(state_report(
                MachineState::Off,
                Health::MachineMustBeOn,
            )));
        }

        if !command.command.eq_ignore_ascii_case(spec::RUN_SCENARIO) {
            warn!("unknown command: {}", command.command);
            return Ok(None);
        }

        let scenario = command.scenario.unwrap_or_default();
        match self.backend.infer(&scenario) {
            Ok(record) => {
                info!(
                    backend = self.backend.name(),
                    "processing scenario: {} ({})",
                    record.identifier(),
                    record.description()
                );
                Ok(Some(record.to_report()))
            }
            Err(unknown) => {
                error!(
                    available = ?unknown.available,
                    "unknown scenario: {}",
                    unknown.normalized()
                );
                Ok(Some(StatusReport {
                    scenario: Some(unknown.normalized()),
                    available_scenarios: Some(unknown.available),
                    ..state_report(MachineState::On, Health::UnknownScenario)
                }))
            }
        }
    }
}
