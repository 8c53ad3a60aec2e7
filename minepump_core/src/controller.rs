//! Pump Controller - pump and system state plus the operations on them.
//!
//! The controller is a short-lived view over the plant state and the run's
//! capability stack. Composed operations (`activate_pump`,
//! `process_environment`) are resolved through the stack; the rest act on
//! the state directly.

use crate::capability::{ActivateNext, CapabilityStack, ProcessNext};
use crate::environment::{Environment, WaterLevel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pump and system flags.
///
/// Invariant: the pump never runs while the system is inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpState {
    pub(crate) running: bool,
    pub(crate) system_active: bool,
}

impl PumpState {
    /// Creates a pump state. A pump cannot run on an inactive system, so
    /// `running` is ignored when `system_active` is false.
    pub fn new(running: bool, system_active: bool) -> Self {
        Self {
            running: running && system_active,
            system_active,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_system_active(&self) -> bool {
        self.system_active
    }
}

impl Default for PumpState {
    fn default() -> Self {
        // A freshly powered plant is active with the pump off
        Self::new(false, true)
    }
}

/// The complete mutable state of one simulated plant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plant {
    pub environment: Environment,
    pub pump: PumpState,
}

impl Plant {
    /// Creates a plant from explicit parts.
    pub fn new(environment: Environment, pump: PumpState) -> Self {
        Self { environment, pump }
    }

    /// Captures the externally reportable state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            water_level: self.environment.water_level(),
            methane_critical: self.environment.is_methane_critical(),
            pump_running: self.pump.running,
            system_active: self.pump.system_active,
        }
    }
}

/// Externally reportable view of the plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub water_level: WaterLevel,
    pub methane_critical: bool,
    pub pump_running: bool,
    pub system_active: bool,
}

/// Operations on a plant, resolved through a capability stack.
pub struct PumpController<'a> {
    plant: &'a mut Plant,
    stack: &'a CapabilityStack,
}

impl<'a> PumpController<'a> {
    /// Creates a controller over `plant` using the layers in `stack`.
    pub fn new(plant: &'a mut Plant, stack: &'a CapabilityStack) -> Self {
        Self { plant, stack }
    }

    /// Runs the activate-pump chain.
    pub fn activate_pump(&mut self) {
        let stack = self.stack;
        ActivateNext::new(stack.activate_layers()).proceed(self);
    }

    /// Turns the pump off unconditionally.
    pub fn deactivate_pump(&mut self) {
        if self.plant.pump.running {
            debug!("Pump deactivated");
        }
        self.plant.pump.running = false;
    }

    /// Marks the system active. The pump is left as it is.
    pub fn start_system(&mut self) {
        debug!("System started");
        self.plant.pump.system_active = true;
    }

    /// Stops the system, turning a running pump off first.
    pub fn stop_system(&mut self) {
        if self.plant.pump.running {
            self.deactivate_pump();
        }
        debug!("System stopped");
        self.plant.pump.system_active = false;
    }

    /// Runs the process-environment chain.
    pub fn process_environment(&mut self) {
        let stack = self.stack;
        ProcessNext::new(stack.process_layers()).proceed(self);
    }

    /// Advances time by one unit: a running pump drains one level, then an
    /// active system reacts to its environment.
    pub fn time_shift(&mut self) {
        if self.plant.pump.running {
            self.plant.environment.lower_water();
        }
        if self.plant.pump.system_active {
            self.process_environment();
        }
    }

    pub fn is_pump_running(&self) -> bool {
        self.plant.pump.running
    }

    pub fn is_system_active(&self) -> bool {
        self.plant.pump.system_active
    }

    /// The methane alarm mirrors the environment; it has no state of its own.
    pub fn is_methane_alarm(&self) -> bool {
        self.plant.environment.is_methane_critical()
    }

    /// Water has reached the high sensor.
    pub fn is_high_water_level(&self) -> bool {
        !self.plant.environment.is_high_sensor_dry()
    }

    /// Water has fallen below the low sensor.
    pub fn is_low_water_level(&self) -> bool {
        self.plant.environment.is_low_sensor_dry()
    }

    pub fn environment(&self) -> &Environment {
        &self.plant.environment
    }

    /// Base of the activate-pump chain.
    pub(crate) fn set_pump_running(&mut self) {
        if !self.plant.pump.running {
            debug!("Pump activated");
        }
        self.plant.pump.running = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minepump_env::CapabilitySet;

    fn plant(level: u8, methane: bool, running: bool, active: bool) -> Plant {
        Plant::new(
            Environment::new(WaterLevel::new(level), methane),
            PumpState::new(running, active),
        )
    }

    #[test]
    fn test_default_plant() {
        let plant = Plant::default();
        let snap = plant.snapshot();
        assert_eq!(snap.water_level, WaterLevel::NORMAL);
        assert!(!snap.methane_critical);
        assert!(!snap.pump_running);
        assert!(snap.system_active);
    }

    #[test]
    fn test_pump_state_invariant() {
        let state = PumpState::new(true, false);
        assert!(!state.is_running());
        assert!(!state.is_system_active());
    }

    #[test]
    fn test_stop_forces_pump_off() {
        let stack = CapabilityStack::new(&CapabilitySet::none());
        let mut plant = plant(1, false, true, true);
        let mut ctrl = PumpController::new(&mut plant, &stack);

        ctrl.stop_system();
        assert!(!ctrl.is_pump_running());
        assert!(!ctrl.is_system_active());
    }

    #[test]
    fn test_start_leaves_pump_alone() {
        let stack = CapabilityStack::new(&CapabilitySet::none());
        let mut plant = plant(2, false, false, false);
        let mut ctrl = PumpController::new(&mut plant, &stack);

        ctrl.start_system();
        assert!(ctrl.is_system_active());
        assert!(!ctrl.is_pump_running());
    }

    #[test]
    fn test_time_shift_drains_only_when_running() {
        let stack = CapabilityStack::new(&CapabilitySet::none());

        let mut idle = plant(2, false, false, true);
        PumpController::new(&mut idle, &stack).time_shift();
        assert_eq!(idle.environment.water_level(), WaterLevel::HIGH);

        let mut pumping = plant(2, false, true, true);
        PumpController::new(&mut pumping, &stack).time_shift();
        assert_eq!(pumping.environment.water_level(), WaterLevel::NORMAL);
    }

    #[test]
    fn test_inactive_system_skips_processing() {
        let caps: CapabilitySet = "high_water_sensor".parse().unwrap();
        let stack = CapabilityStack::new(&caps);
        let mut plant = plant(2, false, false, false);

        PumpController::new(&mut plant, &stack).time_shift();
        assert!(!plant.pump.is_running());
    }

    #[test]
    fn test_methane_alarm_mirrors_environment() {
        let stack = CapabilityStack::new(&CapabilitySet::none());
        let mut plant = plant(1, true, false, true);
        let ctrl = PumpController::new(&mut plant, &stack);
        assert!(ctrl.is_methane_alarm());
    }
}
