//! Named simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// MP-A: high-water sensor alone starts an idle pump at high water
    HighWaterStart,

    /// MP-B: methane interlocks keep the pump off at high water
    MethaneLockout,

    /// MP-C: base product keeps pumping an empty sump
    DryRunning,

    /// MP-F: scripted high water then methane, followed by the cleanup tail
    MethaneSequence,

    // ═══════════════════════════════════════════════════
    // RANDOMIZED SCENARIOS - seeded stimuli
    // ═══════════════════════════════════════════════════

    /// MP-D: one product and its stimuli chosen by the seed
    RandomProduct,

    /// MP-E: all 64 products under seeded stimuli
    ProductLine,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::HighWaterStart,
            ScenarioId::MethaneLockout,
            ScenarioId::DryRunning,
            ScenarioId::MethaneSequence,
            ScenarioId::RandomProduct,
            ScenarioId::ProductLine,
        ]
    }

    /// Returns the scenarios that do not depend on the seed.
    pub fn fixed() -> Vec<ScenarioId> {
        vec![
            ScenarioId::HighWaterStart,
            ScenarioId::MethaneLockout,
            ScenarioId::DryRunning,
            ScenarioId::MethaneSequence,
        ]
    }

    /// Returns the seeded scenarios only.
    pub fn randomized() -> Vec<ScenarioId> {
        vec![ScenarioId::RandomProduct, ScenarioId::ProductLine]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::HighWaterStart => "high_water_start",
            ScenarioId::MethaneLockout => "methane_lockout",
            ScenarioId::DryRunning => "dry_running",
            ScenarioId::MethaneSequence => "methane_sequence",
            ScenarioId::RandomProduct => "random_product",
            ScenarioId::ProductLine => "product_line",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::HighWaterStart => "High water, idle pump, high-water sensor only: pump must start cleanly",
            ScenarioId::MethaneLockout => "High water under critical methane with alarm + query: pump must stay off",
            ScenarioId::DryRunning => "Base product pumping an empty sump: exactly one dry-running violation",
            ScenarioId::MethaneSequence => "Idle, water rise, methane, cleanup: pump never runs under methane",
            ScenarioId::RandomProduct => "Seeded product and stimuli; guarded products must stay clean",
            ScenarioId::ProductLine => "Every product under seeded stimuli; guarded products must stay clean",
        }
    }

    /// Returns true if this scenario draws on the seed.
    pub fn is_randomized(&self) -> bool {
        matches!(self, ScenarioId::RandomProduct | ScenarioId::ProductLine)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high_water_start" | "highwaterstart" | "mp-a" | "a" => Ok(ScenarioId::HighWaterStart),
            "methane_lockout" | "methanelockout" | "mp-b" | "b" => Ok(ScenarioId::MethaneLockout),
            "dry_running" | "dryrunning" | "mp-c" | "c" => Ok(ScenarioId::DryRunning),
            "methane_sequence" | "methanesequence" | "mp-f" => Ok(ScenarioId::MethaneSequence),
            "random_product" | "randomproduct" | "mp-d" => Ok(ScenarioId::RandomProduct),
            "product_line" | "productline" | "mp-e" => Ok(ScenarioId::ProductLine),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
        assert_eq!("MP-C".parse::<ScenarioId>(), Ok(ScenarioId::DryRunning));
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_scenario_groups() {
        assert_eq!(ScenarioId::fixed().len() + ScenarioId::randomized().len(), ScenarioId::all().len());
        assert!(ScenarioId::randomized().iter().all(|s| s.is_randomized()));
        assert!(!ScenarioId::fixed().iter().any(|s| s.is_randomized()));
    }
}
