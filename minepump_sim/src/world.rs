//! SimWorld - the driver loop around one configured mine pump.

use crate::context::SimDecisions;
use crate::error::SimError;

use minepump_core::{MinePump, MonitorId, Plant, Snapshot, StepOutcome};
use minepump_env::{Capability, CapabilitySet, DecisionSource, Stimuli};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Drain-only steps that close every run.
pub const CLEANUP_STEPS: u64 = 4;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Number of stimulus steps
    pub steps: u64,

    /// Drain-only steps after the stimulus steps
    pub drain_steps: u64,

    /// Fixed product; `None` lets the decision source pick one
    pub capabilities: Option<CapabilitySet>,

    /// Probability of each stimulus decision answering `true`
    pub stimulus_probability: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 1,
            drain_steps: CLEANUP_STEPS,
            capabilities: None,
            stimulus_probability: 0.5,
        }
    }
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub capabilities: CapabilitySet,

    /// Steps executed, drain steps included
    pub steps: u64,

    pub final_snapshot: Snapshot,

    /// Total violations
    pub violations: u64,

    /// Violations per monitor, in evaluation order
    pub by_monitor: Vec<(MonitorId, u64)>,
}

impl RunSummary {
    pub fn count_for(&self, monitor: MonitorId) -> u64 {
        self.by_monitor
            .iter()
            .find(|(id, _)| *id == monitor)
            .map_or(0, |(_, count)| *count)
    }

    pub fn is_clean(&self) -> bool {
        self.violations == 0
    }
}

/// A product carrying every sensor and interlock and no way to stop the
/// system. Such a product is expected to finish every run clean.
pub fn is_fully_guarded(capabilities: &CapabilitySet) -> bool {
    capabilities.high_water_sensor
        && capabilities.low_water_sensor
        && capabilities.methane_query
        && capabilities.methane_alarm
        && !capabilities.stop_command
}

/// Picks a product, one decision per capability in [`Capability::ALL`] order.
pub fn choose_capabilities<D: DecisionSource>(decisions: &mut D) -> CapabilitySet {
    let mut capabilities = CapabilitySet::none();
    for cap in Capability::ALL {
        capabilities.set(cap, decisions.choose());
    }
    capabilities
}

/// Draws the stimuli for one step.
///
/// Order: raise water, toggle methane, then the start decision. The stop
/// decision is drawn only when the start decision came back false. A
/// decision for a command the product lacks is spent and issues nothing,
/// so start and stop are never both requested.
pub fn choose_stimuli<D: DecisionSource>(decisions: &mut D, capabilities: &CapabilitySet) -> Stimuli {
    let raise_water = decisions.choose();
    let toggle_methane = decisions.choose();
    let wants_start = decisions.choose();
    let wants_stop = !wants_start && decisions.choose();
    let start = wants_start && capabilities.start_command;
    let stop = wants_stop && capabilities.stop_command;

    Stimuli {
        raise_water,
        toggle_methane,
        start,
        stop,
    }
}

/// The SimWorld - a mine pump plus the decision source driving it.
pub struct SimWorld<D: DecisionSource = SimDecisions> {
    /// Configuration
    pub config: SimConfig,

    /// Source of every nondeterministic choice
    decisions: D,

    /// The plant under test
    system: MinePump,

    /// Stimulus steps executed so far
    tick_count: u64,
}

impl SimWorld<SimDecisions> {
    /// Creates a SimWorld with a seeded decision source.
    pub fn new(config: SimConfig) -> Self {
        let decisions = SimDecisions::with_probability(config.seed, config.stimulus_probability);
        Self::with_decisions(config, decisions)
    }
}

impl<D: DecisionSource> SimWorld<D> {
    /// Creates a SimWorld with the default initial plant.
    pub fn with_decisions(config: SimConfig, decisions: D) -> Self {
        Self::with_plant(config, decisions, Plant::default())
    }

    /// Creates a SimWorld starting from an explicit plant state.
    pub fn with_plant(config: SimConfig, mut decisions: D, plant: Plant) -> Self {
        let capabilities = match config.capabilities {
            Some(capabilities) => capabilities,
            None => choose_capabilities(&mut decisions),
        };
        debug!(seed = decisions.seed(), %capabilities, "SimWorld configured");

        Self {
            config,
            decisions,
            system: MinePump::with_plant(capabilities, plant),
            tick_count: 0,
        }
    }

    /// Draws the next step's stimuli from the decision source.
    pub fn next_stimuli(&mut self) -> Stimuli {
        let capabilities = *self.system.capabilities();
        choose_stimuli(&mut self.decisions, &capabilities)
    }

    /// Runs one stimulus step with freshly drawn stimuli.
    pub fn tick(&mut self) -> Result<(Stimuli, StepOutcome), SimError> {
        let stimuli = self.next_stimuli();
        let outcome = self.step(&stimuli)?;
        self.tick_count += 1;
        Ok((stimuli, outcome))
    }

    /// Validates `stimuli` against the product, then runs one step.
    pub fn step(&mut self, stimuli: &Stimuli) -> Result<StepOutcome, SimError> {
        stimuli.validate(self.system.capabilities())?;
        Ok(self.system.run_step(stimuli))
    }

    /// Runs one drain-only step.
    pub fn drain_step(&mut self) -> StepOutcome {
        self.system.drain_step()
    }

    /// Runs the configured stimulus steps, then the drain-only steps,
    /// reporting each step to `observe`.
    pub fn run_observed<F>(&mut self, mut observe: F) -> Result<RunSummary, SimError>
    where
        F: FnMut(&Stimuli, &StepOutcome),
    {
        for _ in 0..self.config.steps {
            let (stimuli, outcome) = self.tick()?;
            observe(&stimuli, &outcome);
        }
        self.finish(observe)
    }

    /// Runs `script` as the stimulus steps instead of drawing them, then
    /// the configured drain-only steps.
    pub fn run_script_observed<F>(&mut self, script: &[Stimuli], mut observe: F) -> Result<RunSummary, SimError>
    where
        F: FnMut(&Stimuli, &StepOutcome),
    {
        for stimuli in script {
            let outcome = self.step(stimuli)?;
            self.tick_count += 1;
            observe(stimuli, &outcome);
        }
        self.finish(observe)
    }

    fn finish<F>(&mut self, mut observe: F) -> Result<RunSummary, SimError>
    where
        F: FnMut(&Stimuli, &StepOutcome),
    {
        let idle = Stimuli::none();
        for _ in 0..self.config.drain_steps {
            let outcome = self.drain_step();
            observe(&idle, &outcome);
        }

        let summary = self.summary();
        info!(
            capabilities = %summary.capabilities,
            steps = summary.steps,
            violations = summary.violations,
            "Run complete"
        );
        Ok(summary)
    }

    /// Runs to completion without observing individual steps.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.run_observed(|_, _| {})
    }

    /// Summarizes the run so far.
    pub fn summary(&self) -> RunSummary {
        let log = self.system.violations();
        RunSummary {
            capabilities: *self.system.capabilities(),
            steps: self.system.step_count(),
            final_snapshot: self.system.snapshot(),
            violations: log.count(),
            by_monitor: MonitorId::ALL
                .iter()
                .map(|id| (*id, log.count_for(*id)))
                .collect(),
        }
    }

    pub fn system(&self) -> &MinePump {
        &self.system
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        self.system.capabilities()
    }

    /// Returns the number of stimulus steps executed.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn violation_count(&self) -> u64 {
        self.system.violation_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScriptedDecisions;
    use minepump_core::WaterLevel;

    #[test]
    fn test_sim_world_creation() {
        let config = SimConfig {
            capabilities: Some(CapabilitySet::all()),
            ..Default::default()
        };

        let world = SimWorld::new(config);
        assert_eq!(world.capabilities(), &CapabilitySet::all());
        assert_eq!(world.tick_count(), 0);
        assert_eq!(world.violation_count(), 0);
    }

    #[test]
    fn test_default_config_is_one_step_then_cleanup() {
        let config = SimConfig::default();
        assert_eq!(config.steps, 1);
        assert_eq!(config.drain_steps, CLEANUP_STEPS);
        assert_eq!(CLEANUP_STEPS, 4);
    }

    #[test]
    fn test_capabilities_chosen_in_order() {
        let mut script = ScriptedDecisions::new([true, false, false, true, false, true]);
        let caps = choose_capabilities(&mut script);

        assert!(caps.high_water_sensor);
        assert!(!caps.low_water_sensor);
        assert!(!caps.methane_query);
        assert!(caps.methane_alarm);
        assert!(!caps.stop_command);
        assert!(caps.start_command);
    }

    #[test]
    fn test_stop_command_chosen_before_start_command() {
        let mut script = ScriptedDecisions::new([false, false, false, false, true, false]);
        let caps = choose_capabilities(&mut script);

        assert!(caps.stop_command);
        assert!(!caps.start_command);
        assert_eq!(script.remaining(), 0);
    }

    #[test]
    fn test_start_decision_spent_without_start_command() {
        // Start decision comes back true on a stop-only product: nothing is
        // issued and the stop decision is never drawn
        let caps = CapabilitySet::none().with(Capability::StopCommand);
        let mut script = ScriptedDecisions::new([false, false, true, true]);
        let stimuli = choose_stimuli(&mut script, &caps);

        assert_eq!(stimuli, Stimuli::none());
        assert_eq!(script.remaining(), 1);
    }

    #[test]
    fn test_stimuli_draw_command_decisions_without_commands() {
        let mut script = ScriptedDecisions::new([true, true, false, true, true]);
        let stimuli = choose_stimuli(&mut script, &CapabilitySet::none());

        assert!(stimuli.raise_water && stimuli.toggle_methane);
        assert!(!stimuli.start && !stimuli.stop);
        // Start and stop decisions were both spent
        assert_eq!(script.remaining(), 1);
    }

    #[test]
    fn test_stimuli_start_excludes_stop() {
        let caps = CapabilitySet::all();

        let mut start = ScriptedDecisions::new([false, false, true, true]);
        let stimuli = choose_stimuli(&mut start, &caps);
        assert!(stimuli.start && !stimuli.stop);
        // Stop decision never drawn
        assert_eq!(start.remaining(), 1);

        let mut stop = ScriptedDecisions::new([false, false, false, true]);
        let stimuli = choose_stimuli(&mut stop, &caps);
        assert!(!stimuli.start && stimuli.stop);
        assert!(stimuli.validate(&caps).is_ok());
    }

    #[test]
    fn test_step_rejects_invalid_stimuli() {
        let config = SimConfig {
            capabilities: Some(CapabilitySet::none()),
            ..Default::default()
        };
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::default());

        let result = world.step(&Stimuli { start: true, ..Stimuli::none() });
        assert!(matches!(result, Err(SimError::Boundary(_))));
        assert_eq!(world.system().step_count(), 0);
    }

    #[test]
    fn test_run_counts_drain_steps() {
        let config = SimConfig {
            steps: 3,
            drain_steps: 5,
            capabilities: Some(CapabilitySet::none()),
            ..Default::default()
        };
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::default());

        let mut observed = 0;
        let summary = world.run_observed(|_, _| observed += 1).unwrap();
        assert_eq!(observed, 8);
        assert_eq!(summary.steps, 8);
        assert_eq!(world.tick_count(), 3);
        // Nothing ever happened to the default plant
        assert_eq!(summary.final_snapshot.water_level, WaterLevel::NORMAL);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_run_script_then_cleanup() {
        let config = SimConfig {
            capabilities: Some("high_water_sensor".parse().unwrap()),
            ..Default::default()
        };
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::default());
        let raise = Stimuli { raise_water: true, ..Stimuli::none() };

        let mut seen = Vec::new();
        let summary = world
            .run_script_observed(&[raise], |stimuli, outcome| seen.push((*stimuli, outcome.snapshot.pump_running)))
            .unwrap();

        assert_eq!(summary.steps, 1 + CLEANUP_STEPS);
        assert_eq!(world.tick_count(), 1);
        assert_eq!(seen[0], (raise, true));
        assert!(seen[1..].iter().all(|(stimuli, _)| stimuli.is_empty()));
    }

    #[test]
    fn test_run_script_rejects_gated_command() {
        let config = SimConfig {
            capabilities: Some(CapabilitySet::none()),
            ..Default::default()
        };
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::default());
        let stop = Stimuli { stop: true, ..Stimuli::none() };

        let result = world.run_script_observed(&[stop], |_, _| {});
        assert!(matches!(result, Err(SimError::Boundary(_))));
    }

    #[test]
    fn test_sim_world_determinism() {
        let config = SimConfig {
            seed: 7,
            steps: 20,
            ..Default::default()
        };

        let a = SimWorld::new(config.clone()).run().unwrap();
        let b = SimWorld::new(config).run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fully_guarded() {
        let guarded: CapabilitySet = "high_water_sensor,low_water_sensor,methane_query,methane_alarm,start_command"
            .parse()
            .unwrap();
        assert!(is_fully_guarded(&guarded));
        assert!(!is_fully_guarded(&guarded.with(Capability::StopCommand)));
        assert!(!is_fully_guarded(&CapabilitySet::none()));
    }

    #[test]
    fn test_summary_by_monitor() {
        let config = SimConfig {
            steps: 1,
            drain_steps: 0,
            capabilities: Some(CapabilitySet::none()),
            ..Default::default()
        };
        // Raise water to high: base-only product never pumps, monitor 3 fires
        let mut world = SimWorld::with_decisions(config, ScriptedDecisions::new([true, false]));
        let summary = world.run().unwrap();

        assert_eq!(summary.violations, 1);
        assert_eq!(summary.count_for(MonitorId::HighWaterIdle), 1);
        assert_eq!(summary.count_for(MonitorId::DryRunning), 0);
    }
}
