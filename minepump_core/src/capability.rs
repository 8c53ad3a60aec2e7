//! Capability Composition Layer
//!
//! Two operations are composed from layers: *process environment* and
//! *activate pump*. Each is a chain of optional layers ending in a fixed
//! base action. A layer either acts itself, which ends the call, or hands
//! the call to the next layer inward through its [`ProcessNext`] /
//! [`ActivateNext`] continuation.
//!
//! ```text
//! process environment:  methane_alarm → low_water_sensor → high_water_sensor → (no-op)
//! activate pump:        methane_query → (pump on)
//! ```
//!
//! Layers never see which other layers exist. An outer layer can only reach
//! the next one in, never the base directly, so any subset of capabilities
//! can be enabled without the base knowing about it. Order is observable:
//! the outermost enabled layer gets the first chance to intercept.

use crate::controller::PumpController;
use minepump_env::{Capability, CapabilitySet};
use tracing::debug;

// =============================================================================
// LAYER TRAITS
// =============================================================================

/// A layer of the process-environment chain.
pub trait ProcessLayer: std::fmt::Debug + Send + Sync {
    /// Capability this layer implements.
    fn capability(&self) -> Capability;

    /// Handles the call or forwards it via `next`.
    fn process(&self, pump: &mut PumpController<'_>, next: ProcessNext<'_>);
}

/// A layer of the activate-pump chain.
pub trait ActivateLayer: std::fmt::Debug + Send + Sync {
    /// Capability this layer implements.
    fn capability(&self) -> Capability;

    /// Handles the call or forwards it via `next`.
    fn activate(&self, pump: &mut PumpController<'_>, next: ActivateNext<'_>);
}

/// Continuation over the remaining process-environment layers.
pub struct ProcessNext<'n> {
    layers: &'n [Box<dyn ProcessLayer>],
}

impl<'n> ProcessNext<'n> {
    pub fn new(layers: &'n [Box<dyn ProcessLayer>]) -> Self {
        Self { layers }
    }

    /// Calls the next layer inward, or the base action when none is left.
    pub fn proceed(self, pump: &mut PumpController<'_>) {
        // The base action is a no-op
        if let Some((layer, rest)) = self.layers.split_first() {
            layer.process(pump, ProcessNext::new(rest));
        }
    }
}

/// Continuation over the remaining activate-pump layers.
pub struct ActivateNext<'n> {
    layers: &'n [Box<dyn ActivateLayer>],
}

impl<'n> ActivateNext<'n> {
    pub fn new(layers: &'n [Box<dyn ActivateLayer>]) -> Self {
        Self { layers }
    }

    /// Calls the next layer inward, or turns the pump on when none is left.
    pub fn proceed(self, pump: &mut PumpController<'_>) {
        match self.layers.split_first() {
            Some((layer, rest)) => layer.activate(pump, ActivateNext::new(rest)),
            None => pump.set_pump_running(),
        }
    }
}

// =============================================================================
// LAYERS
// =============================================================================

/// Starts an idle pump once water reaches the high sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighWaterSensorLayer;

impl ProcessLayer for HighWaterSensorLayer {
    fn capability(&self) -> Capability {
        Capability::HighWaterSensor
    }

    fn process(&self, pump: &mut PumpController<'_>, next: ProcessNext<'_>) {
        if !pump.is_pump_running() && pump.is_high_water_level() {
            debug!("High water detected, requesting pump activation");
            pump.activate_pump();
        } else {
            next.proceed(pump);
        }
    }
}

/// Stops a running pump once the low sensor runs dry.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowWaterSensorLayer;

impl ProcessLayer for LowWaterSensorLayer {
    fn capability(&self) -> Capability {
        Capability::LowWaterSensor
    }

    fn process(&self, pump: &mut PumpController<'_>, next: ProcessNext<'_>) {
        if pump.is_pump_running() && pump.is_low_water_level() {
            debug!("Low water detected, stopping pump");
            pump.deactivate_pump();
        } else {
            next.proceed(pump);
        }
    }
}

/// Stops a running pump while the methane alarm is raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethaneAlarmLayer;

impl ProcessLayer for MethaneAlarmLayer {
    fn capability(&self) -> Capability {
        Capability::MethaneAlarm
    }

    fn process(&self, pump: &mut PumpController<'_>, next: ProcessNext<'_>) {
        if pump.is_pump_running() && pump.is_methane_alarm() {
            debug!("Methane alarm, stopping pump");
            pump.deactivate_pump();
        } else {
            next.proceed(pump);
        }
    }
}

/// Refuses pump activation while the methane alarm is raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethaneQueryLayer;

impl ActivateLayer for MethaneQueryLayer {
    fn capability(&self) -> Capability {
        Capability::MethaneQuery
    }

    fn activate(&self, pump: &mut PumpController<'_>, next: ActivateNext<'_>) {
        if pump.is_methane_alarm() {
            debug!("Methane critical, activation suppressed");
        } else {
            next.proceed(pump);
        }
    }
}

// =============================================================================
// CAPABILITY STACK
// =============================================================================

/// The resolved layer chains for one product.
///
/// Built once per run and shared read-only by every controller view.
#[derive(Debug, Default)]
pub struct CapabilityStack {
    /// Outermost first
    process: Vec<Box<dyn ProcessLayer>>,

    /// Outermost first
    activate: Vec<Box<dyn ActivateLayer>>,
}

impl CapabilityStack {
    /// Resolves the chains for `capabilities` in their fixed order.
    pub fn new(capabilities: &CapabilitySet) -> Self {
        let mut process: Vec<Box<dyn ProcessLayer>> = Vec::new();
        if capabilities.methane_alarm {
            process.push(Box::new(MethaneAlarmLayer));
        }
        if capabilities.low_water_sensor {
            process.push(Box::new(LowWaterSensorLayer));
        }
        if capabilities.high_water_sensor {
            process.push(Box::new(HighWaterSensorLayer));
        }

        let mut activate: Vec<Box<dyn ActivateLayer>> = Vec::new();
        if capabilities.methane_query {
            activate.push(Box::new(MethaneQueryLayer));
        }

        Self::from_layers(process, activate)
    }

    /// Builds a stack from explicit chains, outermost layer first.
    pub fn from_layers(
        process: Vec<Box<dyn ProcessLayer>>,
        activate: Vec<Box<dyn ActivateLayer>>,
    ) -> Self {
        Self { process, activate }
    }

    pub fn process_layers(&self) -> &[Box<dyn ProcessLayer>] {
        &self.process
    }

    pub fn activate_layers(&self) -> &[Box<dyn ActivateLayer>] {
        &self.activate
    }

    /// Capabilities present in the chains, outermost first.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.process
            .iter()
            .map(|layer| layer.capability())
            .chain(self.activate.iter().map(|layer| layer.capability()))
            .collect()
    }
}
