//! Mine Pump Core - Composable Pump Controller with Runtime Safety Monitors
//!
//! This library models a mine drainage pump controller built from a fixed
//! base plus independently selectable capabilities:
//! 1. **Environment**: discretized water level and a methane-critical flag
//! 2. **Composition**: layered capabilities that intercept or forward the
//!    composed *process environment* and *activate pump* operations
//! 3. **Monitors**: five safety automata that observe every step and record
//!    violations without influencing the plant

pub mod environment;
pub mod capability;
pub mod controller;
pub mod monitors;
pub mod system;

// Re-export key types for convenience
pub use environment::{Environment, WaterLevel};
pub use capability::{ActivateLayer, CapabilityStack, ProcessLayer};
pub use controller::{Plant, PumpController, PumpState, Snapshot};
pub use monitors::{MonitorBank, MonitorId, SafetyMonitor, Violation, ViolationLog};
pub use system::{MinePump, StepOutcome};
pub use minepump_env::{Capability, CapabilitySet, Stimuli};
