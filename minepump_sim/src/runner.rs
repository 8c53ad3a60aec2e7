//! Scenario runner - executes mine pump simulation scenarios.

use crate::context::ScriptedDecisions;
use crate::error::SimError;
use crate::exporter::{render_snapshot, SimExport, StepRecord};
use crate::scenarios::ScenarioId;
use crate::world::{is_fully_guarded, RunSummary, SimConfig, SimWorld, CLEANUP_STEPS};

use minepump_core::{Environment, MonitorId, Plant, PumpState, StepOutcome, WaterLevel};
use minepump_env::{CapabilitySet, DecisionSource, Stimuli};
use tracing::{debug, error, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total steps executed across all runs
    pub total_steps: u64,

    /// Total violations recorded across all runs
    pub violations: u64,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during the scenario
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Product runs executed
    pub runs: u64,

    /// Runs whose product is fully guarded
    pub guarded_runs: u64,

    /// Violations recorded by fully guarded runs
    pub guarded_violations: u64,

    /// Violations per monitor, indexed by monitor number - 1
    pub by_monitor: [u64; 5],

    /// Steps on which the pump went from off to on
    pub pump_starts: u64,
}

impl ScenarioMetrics {
    fn absorb(&mut self, summary: &RunSummary) {
        self.runs += 1;
        if is_fully_guarded(&summary.capabilities) {
            self.guarded_runs += 1;
            self.guarded_violations += summary.violations;
        }
        for (id, count) in &summary.by_monitor {
            self.by_monitor[id.number() - 1] += count;
        }
    }

    pub fn count_for(&self, monitor: MonitorId) -> u64 {
        self.by_monitor[monitor.number() - 1]
    }
}

/// Runs mine pump scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Stimulus steps per randomized run
    steps: u64,

    /// Drain-only steps per randomized run
    drain_steps: u64,

    /// Product override for `random_product` and `methane_sequence`
    capabilities: Option<CapabilitySet>,

    /// Probability of each stimulus decision
    stimulus_probability: f64,

    /// Log the rendered plant after every step
    trace: bool,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        let defaults = SimConfig::default();
        Self {
            seed,
            steps: defaults.steps,
            drain_steps: defaults.drain_steps,
            capabilities: None,
            stimulus_probability: defaults.stimulus_probability,
            trace: false,
        }
    }

    /// Sets the number of stimulus steps.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the number of drain-only steps.
    pub fn with_drain_steps(mut self, drain_steps: u64) -> Self {
        self.drain_steps = drain_steps;
        self
    }

    /// Fixes the product used by `random_product` and `methane_sequence`.
    pub fn with_capabilities(mut self, capabilities: Option<CapabilitySet>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the stimulus probability.
    pub fn with_stimulus_probability(mut self, probability: f64) -> Self {
        self.stimulus_probability = probability;
        self
    }

    /// Logs every step's rendered state.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, None)
    }

    /// Runs a scenario, recording every step into `export`.
    pub fn run_with_export(&self, scenario: ScenarioId, export: &mut SimExport) -> ScenarioResult {
        let result = self.execute(scenario, Some(&mut *export));
        export.finalize(result.passed, result.failure_reason.clone());
        result
    }

    fn execute(&self, scenario: ScenarioId, export: Option<&mut SimExport>) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let outcome = match scenario {
            ScenarioId::HighWaterStart => self.run_high_water_start(export),
            ScenarioId::MethaneLockout => self.run_methane_lockout(export),
            ScenarioId::DryRunning => self.run_dry_running(export),
            ScenarioId::MethaneSequence => self.run_methane_sequence(export),
            ScenarioId::RandomProduct => self.run_random_product(export),
            ScenarioId::ProductLine => self.run_product_line(export),
        };

        match outcome {
            Ok(result) => result,
            Err(e) => {
                error!("Scenario {} aborted: {}", scenario.name(), e);
                ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_steps: 0,
                    violations: 0,
                    failure_reason: Some(e.to_string()),
                    metrics: ScenarioMetrics::default(),
                }
            }
        }
    }

    /// MP-A: HighWaterStart.
    ///
    /// Idle pump at high water, no methane, high-water sensor only.
    /// **Assertion**: one step later the pump runs and no monitor fired.
    fn run_high_water_start(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-A: HighWaterStart - high-water sensor starts the pump");

        let capabilities: CapabilitySet = "high_water_sensor".parse()?;
        let plant = Self::plant(WaterLevel::HIGH, false, false);
        let (summary, metrics) = self.run_single_step(capabilities, plant, export)?;

        let failure = if !summary.final_snapshot.pump_running {
            Some("pump did not start at high water".to_string())
        } else if !summary.is_clean() {
            Some(format!("{} unexpected violation(s)", summary.violations))
        } else {
            None
        };

        Ok(self.single_result(ScenarioId::HighWaterStart, &summary, metrics, failure))
    }

    /// MP-B: MethaneLockout.
    ///
    /// Idle pump at high water under critical methane, with the methane
    /// alarm, methane query and high-water sensor. The query gate refuses
    /// the activation the high-water layer asks for.
    /// **Assertion**: pump stays off and no monitor fired.
    fn run_methane_lockout(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-B: MethaneLockout - methane interlocks hold the pump");

        let capabilities: CapabilitySet = "methane_alarm,methane_query,high_water_sensor".parse()?;
        let plant = Self::plant(WaterLevel::HIGH, true, false);
        let (summary, metrics) = self.run_single_step(capabilities, plant, export)?;

        let failure = if summary.final_snapshot.pump_running {
            Some("pump started under critical methane".to_string())
        } else if !summary.is_clean() {
            Some(format!("{} unexpected violation(s)", summary.violations))
        } else {
            None
        };

        Ok(self.single_result(ScenarioId::MethaneLockout, &summary, metrics, failure))
    }

    /// MP-C: DryRunning.
    ///
    /// Base product with the pump forced on at an empty sump, one drain step.
    /// **Assertion**: monitor 4 fires exactly once and nothing else does.
    fn run_dry_running(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-C: DryRunning - base product pumps an empty sump");

        let plant = Self::plant(WaterLevel::LOW, false, true);
        let (summary, metrics) = self.run_single_step(CapabilitySet::none(), plant, export)?;

        let dry = summary.count_for(MonitorId::DryRunning);
        let failure = if dry != 1 || summary.violations != 1 {
            Some(format!(
                "expected exactly one dry-running violation, got {} ({} total)",
                dry, summary.violations
            ))
        } else {
            None
        };

        Ok(self.single_result(ScenarioId::DryRunning, &summary, metrics, failure))
    }

    /// MP-F: MethaneSequence.
    ///
    /// From the default plant: three idle steps, a water rise, a methane
    /// toggle, then the cleanup tail. Uses the fixed product when one is
    /// set, otherwise the fully guarded product without commands.
    /// **Assertion**: monitors 1 and 2 never fire.
    fn run_methane_sequence(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-F: MethaneSequence - water rise then methane");

        let capabilities = match self.capabilities {
            Some(capabilities) => capabilities,
            None => "high_water_sensor,low_water_sensor,methane_query,methane_alarm".parse()?,
        };
        info!("  Product: {}", capabilities);

        let config = SimConfig {
            seed: self.seed,
            steps: 0,
            drain_steps: CLEANUP_STEPS,
            capabilities: Some(capabilities),
            stimulus_probability: 0.0,
        };
        let world = SimWorld::with_decisions(config, ScriptedDecisions::default());
        let mut metrics = ScenarioMetrics::default();
        let summary = self.drive(world, Some(Self::methane_sequence().as_slice()), export, &mut metrics)?;

        let methane = summary.count_for(MonitorId::MethanePumping)
            + summary.count_for(MonitorId::SustainedMethanePumping);
        let failure = if methane > 0 {
            Some(format!("pump ran under critical methane {} time(s)", methane))
        } else {
            None
        };

        Ok(self.single_result(ScenarioId::MethaneSequence, &summary, metrics, failure))
    }

    /// MP-D: RandomProduct.
    ///
    /// Product (unless fixed) and stimuli drawn from the seed.
    /// **Assertion**: a fully guarded product stays clean; monitor 5 never fires.
    fn run_random_product(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-D: RandomProduct - seeded product and stimuli");

        let config = self.config(self.seed, self.capabilities);
        let world = SimWorld::new(config);
        info!("  Product: {}", world.capabilities());

        let mut metrics = ScenarioMetrics::default();
        let summary = self.drive(world, None, export, &mut metrics)?;

        let failure = Self::guard_failure(&metrics);
        Ok(self.randomized_result(ScenarioId::RandomProduct, summary.steps, metrics, failure))
    }

    /// MP-E: ProductLine.
    ///
    /// Every one of the 64 products, each driven by its own seeded source.
    /// **Assertion**: all fully guarded products stay clean; monitor 5 never fires.
    fn run_product_line(&self, export: Option<&mut SimExport>) -> Result<ScenarioResult, SimError> {
        info!("MP-E: ProductLine - all {} products", CapabilitySet::PRODUCT_COUNT);

        let mut metrics = ScenarioMetrics::default();
        let mut total_steps = 0;
        let mut export = export;

        for capabilities in CapabilitySet::products() {
            let product_seed = self
                .seed
                .wrapping_mul(0x9e3779b97f4a7c15)
                .wrapping_add(capabilities.index() as u64);
            let world = SimWorld::new(self.config(product_seed, Some(capabilities)));
            let summary = self.drive(world, None, export.as_deref_mut(), &mut metrics)?;
            total_steps += summary.steps;

            if summary.is_clean() {
                debug!("  {:<70} clean", capabilities.to_string());
            } else {
                debug!("  {:<70} {} violation(s)", capabilities.to_string(), summary.violations);
            }
        }

        info!(
            "  {} runs, {} guarded, {} violations ({} in guarded products)",
            metrics.runs,
            metrics.guarded_runs,
            metrics.by_monitor.iter().sum::<u64>(),
            metrics.guarded_violations
        );

        let failure = Self::guard_failure(&metrics);
        Ok(self.randomized_result(ScenarioId::ProductLine, total_steps, metrics, failure))
    }

    // ═══════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════

    fn plant(level: WaterLevel, methane: bool, running: bool) -> Plant {
        Plant::new(Environment::new(level, methane), PumpState::new(running, true))
    }

    fn config(&self, seed: u64, capabilities: Option<CapabilitySet>) -> SimConfig {
        SimConfig {
            seed,
            steps: self.steps,
            drain_steps: self.drain_steps,
            capabilities,
            stimulus_probability: self.stimulus_probability,
        }
    }

    /// One step with no stimuli from a forced plant state.
    fn run_single_step(
        &self,
        capabilities: CapabilitySet,
        plant: Plant,
        export: Option<&mut SimExport>,
    ) -> Result<(RunSummary, ScenarioMetrics), SimError> {
        let config = SimConfig {
            seed: self.seed,
            steps: 1,
            drain_steps: 0,
            capabilities: Some(capabilities),
            stimulus_probability: 0.0,
        };
        let world = SimWorld::with_plant(config, ScriptedDecisions::default(), plant);
        let mut metrics = ScenarioMetrics::default();
        let summary = self.drive(world, None, export, &mut metrics)?;
        Ok((summary, metrics))
    }

    /// Stimulus steps of the methane sequence.
    fn methane_sequence() -> Vec<Stimuli> {
        let raise = Stimuli { raise_water: true, ..Stimuli::none() };
        let toggle = Stimuli { toggle_methane: true, ..Stimuli::none() };
        vec![Stimuli::none(), Stimuli::none(), Stimuli::none(), raise, toggle]
    }

    /// Runs `world` to completion, feeding export, trace and metrics.
    ///
    /// Stimuli come from `script` when given, otherwise from the world's
    /// decision source.
    fn drive<D: DecisionSource>(
        &self,
        mut world: SimWorld<D>,
        script: Option<&[Stimuli]>,
        mut export: Option<&mut SimExport>,
        metrics: &mut ScenarioMetrics,
    ) -> Result<RunSummary, SimError> {
        if let Some(export) = export.as_deref_mut() {
            export.begin_run(*world.capabilities());
        }

        let mut was_running = world.system().snapshot().pump_running;
        let mut pump_starts = 0;
        let trace = self.trace;

        let observe = |stimuli: &Stimuli, outcome: &StepOutcome| {
            if outcome.snapshot.pump_running && !was_running {
                pump_starts += 1;
            }
            was_running = outcome.snapshot.pump_running;

            if trace {
                info!("  step {:>3}: {}", outcome.step, render_snapshot(&outcome.snapshot));
            }
            if let Some(export) = export.as_deref_mut() {
                export.add_step(StepRecord::new(stimuli, outcome));
            }
        };
        let summary = match script {
            Some(script) => world.run_script_observed(script, observe)?,
            None => world.run_observed(observe)?,
        };

        metrics.pump_starts += pump_starts;
        metrics.absorb(&summary);
        Ok(summary)
    }

    fn guard_failure(metrics: &ScenarioMetrics) -> Option<String> {
        if metrics.guarded_violations > 0 {
            Some(format!(
                "{} violation(s) in fully guarded products",
                metrics.guarded_violations
            ))
        } else if metrics.count_for(MonitorId::UnexpectedStart) > 0 {
            Some(format!(
                "pump started below high water {} time(s)",
                metrics.count_for(MonitorId::UnexpectedStart)
            ))
        } else {
            None
        }
    }

    fn single_result(
        &self,
        scenario: ScenarioId,
        summary: &RunSummary,
        metrics: ScenarioMetrics,
        failure: Option<String>,
    ) -> ScenarioResult {
        if let Some(reason) = &failure {
            warn!("  {} failed: {}", scenario.name(), reason);
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure.is_none(),
            total_steps: summary.steps,
            violations: summary.violations,
            failure_reason: failure,
            metrics,
        }
    }

    fn randomized_result(
        &self,
        scenario: ScenarioId,
        total_steps: u64,
        metrics: ScenarioMetrics,
        failure: Option<String>,
    ) -> ScenarioResult {
        if let Some(reason) = &failure {
            warn!("  {} failed: {}", scenario.name(), reason);
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure.is_none(),
            total_steps,
            violations: metrics.by_monitor.iter().sum(),
            failure_reason: failure,
            metrics,
        }
    }
}
