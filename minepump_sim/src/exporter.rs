//! JSON exporter for step-by-step inspection.
//!
//! Exports every step of every run in a scenario, plus a one-line textual
//! rendering of plant state for logs.

use crate::error::SimError;
use minepump_core::{MonitorId, Snapshot, StepOutcome};
use minepump_env::{CapabilitySet, Stimuli};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Renders a snapshot as `Env(Water:1,Meth:OK),Pump(System:On,Pump:Off)`.
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let on_off = |flag: bool| if flag { "On" } else { "Off" };
    format!(
        "Env(Water:{},Meth:{}),Pump(System:{},Pump:{})",
        snapshot.water_level,
        if snapshot.methane_critical { "CRIT" } else { "OK" },
        on_off(snapshot.system_active),
        on_off(snapshot.pump_running),
    )
}

/// A single step of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number
    pub step: u64,

    /// Stimuli applied before the time shift
    pub stimuli: Stimuli,

    /// Post-step plant state
    pub snapshot: Snapshot,

    /// Monitors that fired on this step
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub violations: Vec<MonitorId>,
}

impl StepRecord {
    pub fn new(stimuli: &Stimuli, outcome: &StepOutcome) -> Self {
        Self {
            step: outcome.step,
            stimuli: *stimuli,
            snapshot: outcome.snapshot,
            violations: outcome.violations.iter().map(|v| v.monitor).collect(),
        }
    }
}

/// All steps of one product's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunExport {
    pub capabilities: CapabilitySet,
    pub steps: Vec<StepRecord>,
    pub violations: u64,
}

/// Complete scenario export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// One entry per product run
    pub runs: Vec<RunExport>,

    /// Final result
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            runs: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Starts recording a new run.
    pub fn begin_run(&mut self, capabilities: CapabilitySet) {
        self.runs.push(RunExport {
            capabilities,
            steps: Vec::new(),
            violations: 0,
        });
    }

    /// Adds a step to the current run.
    ///
    /// Steps recorded before any `begin_run` open an unnamed base run.
    pub fn add_step(&mut self, record: StepRecord) {
        if self.runs.is_empty() {
            self.begin_run(CapabilitySet::none());
        }
        if let Some(run) = self.runs.last_mut() {
            run.violations += record.violations.len() as u64;
            run.steps.push(record);
        }
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Total steps across all runs.
    pub fn step_count(&self) -> usize {
        self.runs.iter().map(|run| run.steps.len()).sum()
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
