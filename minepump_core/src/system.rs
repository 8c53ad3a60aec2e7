//! MinePump - the simulation context exposed to drivers.
//!
//! One `MinePump` owns everything a run mutates: the plant, the monitor
//! bank and the step counter. A step runs to completion before the next
//! begins:
//!
//! ```text
//! stimuli ──► monitors.before_time_shift ──► time shift ──► monitors.evaluate
//!             (pre-shift snapshot)            (drain, then
//!                                              process environment)
//! ```

use crate::capability::CapabilityStack;
use crate::controller::{Plant, PumpController, Snapshot};
use crate::monitors::{MonitorBank, Violation, ViolationLog};
use minepump_env::{CapabilitySet, Stimuli};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a single step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// 1-based step number
    pub step: u64,

    /// Plant state after the step
    pub snapshot: Snapshot,

    /// Violations recorded on this step
    pub violations: Vec<Violation>,
}

/// A configured mine pump plant under observation.
#[derive(Debug)]
pub struct MinePump {
    capabilities: CapabilitySet,
    stack: CapabilityStack,
    plant: Plant,
    monitors: MonitorBank,
    step: u64,
}

impl MinePump {
    /// Configures a product with the default initial plant.
    pub fn configure(capabilities: CapabilitySet) -> Self {
        Self::with_plant(capabilities, Plant::default())
    }

    /// Configures a product starting from an explicit plant state.
    pub fn with_plant(capabilities: CapabilitySet, plant: Plant) -> Self {
        debug!(%capabilities, "Configuring mine pump");
        Self {
            capabilities,
            stack: CapabilityStack::new(&capabilities),
            plant,
            monitors: MonitorBank::new(),
            step: 0,
        }
    }

    /// Runs one step: stimuli, time shift, monitor evaluation.
    ///
    /// Start/stop requests whose command capability is absent are ignored;
    /// drivers are expected to validate stimuli beforehand.
    pub fn run_step(&mut self, stimuli: &Stimuli) -> StepOutcome {
        self.step += 1;
        self.apply_stimuli(stimuli);

        self.monitors.before_time_shift(&self.plant);
        PumpController::new(&mut self.plant, &self.stack).time_shift();
        let violations = self.monitors.evaluate(self.step, &self.plant);

        let snapshot = self.plant.snapshot();
        debug!(step = self.step, ?snapshot, "Step complete");

        StepOutcome {
            step: self.step,
            snapshot,
            violations,
        }
    }

    /// Runs a step with no stimuli.
    pub fn drain_step(&mut self) -> StepOutcome {
        self.run_step(&Stimuli::none())
    }

    fn apply_stimuli(&mut self, stimuli: &Stimuli) {
        if stimuli.raise_water {
            self.plant.environment.raise_water();
        }
        if stimuli.toggle_methane {
            self.plant.environment.toggle_methane();
        }

        let mut controller = PumpController::new(&mut self.plant, &self.stack);
        if stimuli.start {
            if self.capabilities.start_command {
                controller.start_system();
            } else {
                debug!("Ignoring start: start_command not enabled");
            }
        } else if stimuli.stop {
            if self.capabilities.stop_command {
                controller.stop_system();
            } else {
                debug!("Ignoring stop: stop_command not enabled");
            }
        }
    }

    /// Direct access to the controller operations for this plant.
    pub fn controller(&mut self) -> PumpController<'_> {
        PumpController::new(&mut self.plant, &self.stack)
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    pub fn snapshot(&self) -> Snapshot {
        self.plant.snapshot()
    }

    /// Total violations recorded so far.
    pub fn violation_count(&self) -> u64 {
        self.monitors.violation_count()
    }

    pub fn violations(&self) -> &ViolationLog {
        self.monitors.log()
    }

    /// Number of steps run so far.
    pub fn step_count(&self) -> u64 {
        self.step
    }
}
