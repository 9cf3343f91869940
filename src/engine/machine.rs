// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::spec::MachineState;

/// Outcome of applying a power event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Changed,
    Unchanged,
}

impl Transition {
    pub fn is_changed(self) -> bool {
        self == Transition::Changed
    }
}

/// Owns the power state of the monitored machine.
///
/// The machine starts `ON`. Power events are idempotent: repeating the
/// current state is reported as [`Transition::Unchanged`].
///
/// # Examples
///
/// ```rust
/// # use motordiag::engine::*;
/// let mut machine = MachineStateController::new();
///
/// assert_eq!(machine.apply_power_off(), Transition::Changed);
/// assert_eq!(machine.apply_power_off(), Transition::Unchanged);
/// assert!(!machine.is_on());
/// ```
#[derive(Debug)]
pub struct MachineStateController {
    state: MachineState,
}

impl MachineStateController {
    pub fn new() -> Self {
        MachineStateController {
            state: MachineState::On,
        }
    }

    pub fn apply_power_on(&mut self) -> Transition {
        self.apply(MachineState::On)
    }

    pub fn apply_power_off(&mut self) -> Transition {
        self.apply(MachineState::Off)
    }

    pub fn is_on(&self) -> bool {
        self.state == MachineState::On
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    fn apply(&mut self, target: MachineState) -> Transition {
        if self.state == target {
            return Transition::Unchanged;
        }
        self.state = target;
        Transition::Changed
    }
}

impl Default for MachineStateController {
    fn default() -> Self {
        Self::new()
    }
}
