//! Mine Pump Deterministic Simulation Harness
//!
//! This crate is the driver around `minepump_core`: it picks products,
//! issues stimuli, advances time and reads back what the monitor bank saw.
//!
//! # Core Principle: Every Choice Is a Decision
//!
//! Nothing in a run is left to ambient randomness:
//! - **Products**: which capabilities are enabled comes from the decision source
//! - **Stimuli**: water, methane and commands per step come from the same source
//! - **Replay**: a seed fully determines a run
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ScenarioRunner                        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ SimWorld                                               │  │
//! │  │   DecisionSource ──► Stimuli ──► MinePump::run_step    │  │
//! │  │                                   │                    │  │
//! │  │                                   ▼                    │  │
//! │  │                         MonitorBank (5 automata)       │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │         │                                   │                │
//! │   ScenarioResult                       SimExport (JSON)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use minepump_sim::{SimWorld, SimConfig};
//!
//! let config = SimConfig {
//!     seed: 42,
//!     steps: 20,
//!     ..Default::default()
//! };
//!
//! let mut world = SimWorld::new(config);
//! let summary = world.run()?;
//! println!("{} violations", summary.violations);
//! ```

mod context;
mod error;
mod world;
mod runner;
mod exporter;
pub mod scenarios;

pub use context::{ScriptedDecisions, SimDecisions};
pub use error::SimError;
pub use world::{
    choose_capabilities, choose_stimuli, is_fully_guarded, RunSummary, SimConfig, SimWorld, CLEANUP_STEPS,
};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use exporter::{render_snapshot, RunExport, SimExport, StepRecord};
