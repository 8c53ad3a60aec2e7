//! Safety Monitor Bank
//!
//! Five independent observers, each checking one safety property once per
//! step after time has advanced. Monitors only read the plant; their side
//! effects are limited to their own memory and the shared violation log.
//!
//! | # | property                                                        | memory                       |
//! |---|-----------------------------------------------------------------|------------------------------|
//! | 1 | never pump while methane is critical                             | none                         |
//! | 2 | never pump under critical methane on two consecutive steps       | previous step's condition    |
//! | 3 | pump runs at high water unless methane is critical               | none                         |
//! | 4 | pump never runs on an empty sump                                 | none                         |
//! | 5 | pump only starts during a step if water is high                  | pump state before time shift |

use crate::controller::{Plant, Snapshot};
use crate::environment::WaterLevel;
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// MONITOR IDENTITY
// =============================================================================

/// Identifies one of the five safety properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorId {
    MethanePumping,
    SustainedMethanePumping,
    HighWaterIdle,
    DryRunning,
    UnexpectedStart,
}

impl MonitorId {
    /// All monitors in evaluation order.
    pub const ALL: [MonitorId; 5] = [
        MonitorId::MethanePumping,
        MonitorId::SustainedMethanePumping,
        MonitorId::HighWaterIdle,
        MonitorId::DryRunning,
        MonitorId::UnexpectedStart,
    ];

    /// 1-based monitor number.
    pub fn number(&self) -> usize {
        self.index() + 1
    }

    fn index(&self) -> usize {
        match self {
            MonitorId::MethanePumping => 0,
            MonitorId::SustainedMethanePumping => 1,
            MonitorId::HighWaterIdle => 2,
            MonitorId::DryRunning => 3,
            MonitorId::UnexpectedStart => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MonitorId::MethanePumping => "methane_pumping",
            MonitorId::SustainedMethanePumping => "sustained_methane_pumping",
            MonitorId::HighWaterIdle => "high_water_idle",
            MonitorId::DryRunning => "dry_running",
            MonitorId::UnexpectedStart => "unexpected_start",
        }
    }

    /// Returns the property this monitor guards.
    pub fn description(&self) -> &'static str {
        match self {
            MonitorId::MethanePumping => "pump must not run while methane is critical",
            MonitorId::SustainedMethanePumping => {
                "pump must not run under critical methane on two consecutive steps"
            }
            MonitorId::HighWaterIdle => "pump must run at high water unless methane is critical",
            MonitorId::DryRunning => "pump must not run at zero water",
            MonitorId::UnexpectedStart => "pump may only start during a step when water is high",
        }
    }
}

impl std::fmt::Display for MonitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "M{} {}", self.number(), self.name())
    }
}

// =============================================================================
// MONITOR TRAIT + MONITORS
// =============================================================================

/// A safety-property automaton evaluated once per step.
pub trait SafetyMonitor: std::fmt::Debug + Send + Sync {
    fn id(&self) -> MonitorId;

    /// Observes the plant right before time advances.
    ///
    /// Stimuli for the step have already been applied.
    fn before_time_shift(&mut self, _plant: &Plant) {}

    /// Checks the post-step plant. Returns true on violation.
    fn check(&mut self, plant: &Plant) -> bool;
}

/// Monitor 1.
#[derive(Debug, Default)]
pub struct MethanePumpingMonitor;

impl SafetyMonitor for MethanePumpingMonitor {
    fn id(&self) -> MonitorId {
        MonitorId::MethanePumping
    }

    fn check(&mut self, plant: &Plant) -> bool {
        plant.environment.is_methane_critical() && plant.pump.is_running()
    }
}

/// Monitor 2. Remembers whether the previous step pumped under methane.
#[derive(Debug, Default)]
pub struct SustainedMethanePumpingMonitor {
    previous: bool,
}

impl SafetyMonitor for SustainedMethanePumpingMonitor {
    fn id(&self) -> MonitorId {
        MonitorId::SustainedMethanePumping
    }

    fn check(&mut self, plant: &Plant) -> bool {
        let current = plant.environment.is_methane_critical() && plant.pump.is_running();
        let violated = current && self.previous;
        self.previous = current;
        violated
    }
}

/// Monitor 3.
#[derive(Debug, Default)]
pub struct HighWaterIdleMonitor;

impl SafetyMonitor for HighWaterIdleMonitor {
    fn id(&self) -> MonitorId {
        MonitorId::HighWaterIdle
    }

    fn check(&mut self, plant: &Plant) -> bool {
        !plant.environment.is_methane_critical()
            && plant.environment.water_level() == WaterLevel::HIGH
            && !plant.pump.is_running()
    }
}

/// Monitor 4.
#[derive(Debug, Default)]
pub struct DryRunningMonitor;

impl SafetyMonitor for DryRunningMonitor {
    fn id(&self) -> MonitorId {
        MonitorId::DryRunning
    }

    fn check(&mut self, plant: &Plant) -> bool {
        plant.environment.water_level() == WaterLevel::LOW && plant.pump.is_running()
    }
}

/// Monitor 5. Snapshots the pump right before time advances.
#[derive(Debug, Default)]
pub struct UnexpectedStartMonitor {
    was_running: bool,
}

impl SafetyMonitor for UnexpectedStartMonitor {
    fn id(&self) -> MonitorId {
        MonitorId::UnexpectedStart
    }

    fn before_time_shift(&mut self, plant: &Plant) {
        self.was_running = plant.pump.is_running();
    }

    fn check(&mut self, plant: &Plant) -> bool {
        plant.environment.water_level() != WaterLevel::HIGH
            && plant.pump.is_running()
            && !self.was_running
    }
}

// =============================================================================
// VIOLATION LOG
// =============================================================================

/// A recorded breach of one monitor's property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Step on which the breach was observed (1-based)
    pub step: u64,
    pub monitor: MonitorId,
    /// Post-step plant state
    pub snapshot: Snapshot,
}

/// Run-scoped violation counter with a per-monitor breakdown.
///
/// Never reset during a run. Holds counts only; the violations themselves
/// are handed out per step in [`MonitorBank::evaluate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationLog {
    total: u64,
    per_monitor: [u64; 5],
    last: Option<Violation>,
}

impl ViolationLog {
    pub fn record(&mut self, violation: Violation) {
        self.total += 1;
        self.per_monitor[violation.monitor.index()] += 1;
        self.last = Some(violation);
    }

    /// Total violations across all monitors.
    pub fn count(&self) -> u64 {
        self.total
    }

    pub fn count_for(&self, monitor: MonitorId) -> u64 {
        self.per_monitor[monitor.index()]
    }

    /// Most recently recorded violation.
    pub fn last(&self) -> Option<&Violation> {
        self.last.as_ref()
    }

    pub fn is_clean(&self) -> bool {
        self.total == 0
    }
}

// =============================================================================
// MONITOR BANK
// =============================================================================

/// The five monitors plus the shared log.
#[derive(Debug)]
pub struct MonitorBank {
    monitors: Vec<Box<dyn SafetyMonitor>>,
    log: ViolationLog,
}

impl MonitorBank {
    /// Creates the standard bank with fresh monitor memory.
    pub fn new() -> Self {
        Self {
            monitors: vec![
                Box::new(MethanePumpingMonitor),
                Box::new(SustainedMethanePumpingMonitor::default()),
                Box::new(HighWaterIdleMonitor),
                Box::new(DryRunningMonitor),
                Box::new(UnexpectedStartMonitor::default()),
            ],
            log: ViolationLog::default(),
        }
    }

    /// Lets every monitor observe the pre-time-shift plant.
    pub fn before_time_shift(&mut self, plant: &Plant) {
        for monitor in &mut self.monitors {
            monitor.before_time_shift(plant);
        }
    }

    /// Evaluates every monitor in order and returns this step's violations.
    pub fn evaluate(&mut self, step: u64, plant: &Plant) -> Vec<Violation> {
        let snapshot = plant.snapshot();
        let mut found = Vec::new();

        for monitor in &mut self.monitors {
            if monitor.check(plant) {
                let id = monitor.id();
                warn!(
                    step,
                    monitor = id.number(),
                    "Safety violation: {} ({:?})",
                    id.description(),
                    snapshot
                );
                let violation = Violation {
                    step,
                    monitor: id,
                    snapshot,
                };
                self.log.record(violation);
                found.push(violation);
            }
        }

        found
    }

    pub fn log(&self) -> &ViolationLog {
        &self.log
    }

    pub fn violation_count(&self) -> u64 {
        self.log.count()
    }
}

impl Default for MonitorBank {
    fn default() -> Self {
        Self::new()
    }
}
