//! Common types shared by the mine pump core and its driver.

use crate::error::EnvError;
use serde::{Deserialize, Serialize};

/// An optional behavior unit that may intercept a composed operation.
///
/// The base behavior is always present and has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Activates the pump when the high-water sensor is wet
    HighWaterSensor,

    /// Deactivates the pump when the low-water sensor is dry
    LowWaterSensor,

    /// Suppresses pump activation while methane is critical
    MethaneQuery,

    /// Deactivates a running pump while methane is critical
    MethaneAlarm,

    /// Lets the operator start the system
    StartCommand,

    /// Lets the operator stop the system
    StopCommand,
}

impl Capability {
    /// All capabilities, in selection order.
    pub const ALL: [Capability; 6] = [
        Capability::HighWaterSensor,
        Capability::LowWaterSensor,
        Capability::MethaneQuery,
        Capability::MethaneAlarm,
        Capability::StopCommand,
        Capability::StartCommand,
    ];

    /// Returns the capability name.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::HighWaterSensor => "high_water_sensor",
            Capability::LowWaterSensor => "low_water_sensor",
            Capability::MethaneQuery => "methane_query",
            Capability::MethaneAlarm => "methane_alarm",
            Capability::StartCommand => "start_command",
            Capability::StopCommand => "stop_command",
        }
    }

    fn bit(&self) -> u8 {
        match self {
            Capability::HighWaterSensor => 1 << 0,
            Capability::LowWaterSensor => 1 << 1,
            Capability::MethaneQuery => 1 << 2,
            Capability::MethaneAlarm => 1 << 3,
            Capability::StartCommand => 1 << 4,
            Capability::StopCommand => 1 << 5,
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Capability {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "high_water_sensor" | "highwatersensor" | "high_water" => Ok(Capability::HighWaterSensor),
            "low_water_sensor" | "lowwatersensor" | "low_water" => Ok(Capability::LowWaterSensor),
            "methane_query" | "methanequery" => Ok(Capability::MethaneQuery),
            "methane_alarm" | "methanealarm" => Ok(Capability::MethaneAlarm),
            "start_command" | "startcommand" | "start" => Ok(Capability::StartCommand),
            "stop_command" | "stopcommand" | "stop" => Ok(Capability::StopCommand),
            _ => Err(EnvError::unknown(s)),
        }
    }
}

/// The set of optional capabilities enabled for a run.
///
/// Selected once at configuration time and immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub high_water_sensor: bool,
    pub low_water_sensor: bool,
    pub methane_query: bool,
    pub methane_alarm: bool,
    pub start_command: bool,
    pub stop_command: bool,
}

impl CapabilitySet {
    /// Number of distinct products (every subset of [`Capability::ALL`]).
    pub const PRODUCT_COUNT: u8 = 64;

    /// Base only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every optional capability enabled.
    pub fn all() -> Self {
        Self::from_index(Self::PRODUCT_COUNT - 1)
    }

    /// Returns a copy with `cap` enabled.
    pub fn with(mut self, cap: Capability) -> Self {
        self.set(cap, true);
        self
    }

    /// Enables or disables a capability.
    pub fn set(&mut self, cap: Capability, enabled: bool) {
        let flag = match cap {
            Capability::HighWaterSensor => &mut self.high_water_sensor,
            Capability::LowWaterSensor => &mut self.low_water_sensor,
            Capability::MethaneQuery => &mut self.methane_query,
            Capability::MethaneAlarm => &mut self.methane_alarm,
            Capability::StartCommand => &mut self.start_command,
            Capability::StopCommand => &mut self.stop_command,
        };
        *flag = enabled;
    }

    /// Returns true if `cap` is enabled.
    pub fn contains(&self, cap: Capability) -> bool {
        match cap {
            Capability::HighWaterSensor => self.high_water_sensor,
            Capability::LowWaterSensor => self.low_water_sensor,
            Capability::MethaneQuery => self.methane_query,
            Capability::MethaneAlarm => self.methane_alarm,
            Capability::StartCommand => self.start_command,
            Capability::StopCommand => self.stop_command,
        }
    }

    /// Iterates over enabled capabilities in selection order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }

    /// Returns true if no optional capability is enabled.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Builds the product with the given index (bits above 5 are ignored).
    pub fn from_index(index: u8) -> Self {
        let mut set = Self::none();
        for cap in Capability::ALL {
            set.set(cap, index & cap.bit() != 0);
        }
        set
    }

    /// Returns the product index in `0..64`.
    pub fn index(&self) -> u8 {
        self.iter().fold(0, |acc, cap| acc | cap.bit())
    }

    /// Iterates over all 64 products.
    pub fn products() -> impl Iterator<Item = CapabilitySet> {
        (0..Self::PRODUCT_COUNT).map(Self::from_index)
    }
}

impl std::fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let names: Vec<&str> = self.iter().map(|cap| cap.name()).collect();
        write!(f, "{}", names.join(","))
    }
}

impl std::str::FromStr for CapabilitySet {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "base" => return Ok(Self::none()),
            "all" => return Ok(Self::all()),
            _ => {}
        }
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(Self::none(), |set, part| -> Result<Self, EnvError> {
                Ok(set.with(part.parse()?))
            })
    }
}

/// Stimuli requested by the driver for a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stimuli {
    /// Raise the water level by one
    pub raise_water: bool,

    /// Flip the methane-critical flag
    pub toggle_methane: bool,

    /// Issue the start command (requires `start_command`)
    pub start: bool,

    /// Issue the stop command (requires `stop_command`)
    pub stop: bool,
}

impl Stimuli {
    /// A drain-only step: no stimulus at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns true if nothing is requested.
    pub fn is_empty(&self) -> bool {
        *self == Self::none()
    }

    /// Checks the stimuli against the run's capabilities.
    ///
    /// Water and methane perturbations are always allowed; start and stop
    /// are exclusive and gated by their command capabilities.
    pub fn validate(&self, capabilities: &CapabilitySet) -> Result<(), EnvError> {
        if self.start && self.stop {
            return Err(EnvError::ConflictingStimuli);
        }
        if self.start && !capabilities.start_command {
            return Err(EnvError::disabled("start", Capability::StartCommand));
        }
        if self.stop && !capabilities.stop_command {
            return Err(EnvError::disabled("stop", Capability::StopCommand));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_roundtrip_names() {
        for cap in Capability::ALL {
            assert_eq!(cap.name().parse::<Capability>().unwrap(), cap);
        }
        assert_eq!("methaneAlarm".parse::<Capability>().unwrap(), Capability::MethaneAlarm);
        assert!("turbo".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_set_parse() {
        let set: CapabilitySet = "high_water_sensor, methane_alarm".parse().unwrap();
        assert!(set.high_water_sensor);
        assert!(set.methane_alarm);
        assert!(!set.low_water_sensor);

        assert_eq!("none".parse::<CapabilitySet>().unwrap(), CapabilitySet::none());
        assert_eq!("all".parse::<CapabilitySet>().unwrap(), CapabilitySet::all());
        assert_eq!(
            "high_water_sensor,bogus".parse::<CapabilitySet>(),
            Err(EnvError::UnknownCapability("bogus".to_string()))
        );
    }

    #[test]
    fn test_selection_order_puts_stop_before_start() {
        let order: Vec<&str> = Capability::ALL.iter().map(|cap| cap.name()).collect();
        assert_eq!(
            order,
            vec![
                "high_water_sensor",
                "low_water_sensor",
                "methane_query",
                "methane_alarm",
                "stop_command",
                "start_command",
            ]
        );
        assert_eq!(
            CapabilitySet::all().to_string(),
            "high_water_sensor,low_water_sensor,methane_query,methane_alarm,stop_command,start_command"
        );
    }

    #[test]
    fn test_capability_set_display() {
        assert_eq!(CapabilitySet::none().to_string(), "none");
        let set = CapabilitySet::none()
            .with(Capability::StopCommand)
            .with(Capability::HighWaterSensor);
        assert_eq!(set.to_string(), "high_water_sensor,stop_command");
    }

    #[test]
    fn test_product_indices_are_distinct() {
        let products: std::collections::HashSet<CapabilitySet> = CapabilitySet::products().collect();
        assert_eq!(products.len(), 64);

        for index in 0..CapabilitySet::PRODUCT_COUNT {
            assert_eq!(CapabilitySet::from_index(index).index(), index);
        }
        assert!(CapabilitySet::from_index(0).is_empty());
        assert_eq!(CapabilitySet::from_index(63), CapabilitySet::all());
    }

    #[test]
    fn test_stimuli_validation() {
        let caps = CapabilitySet::none().with(Capability::StartCommand);

        let ok = Stimuli { raise_water: true, toggle_methane: true, start: true, stop: false };
        assert!(ok.validate(&caps).is_ok());

        let both = Stimuli { start: true, stop: true, ..Stimuli::none() };
        assert_eq!(both.validate(&CapabilitySet::all()), Err(EnvError::ConflictingStimuli));

        let stop = Stimuli { stop: true, ..Stimuli::none() };
        assert_eq!(
            stop.validate(&caps),
            Err(EnvError::disabled("stop", Capability::StopCommand))
        );

        // Perturbations are never gated
        let perturb = Stimuli { raise_water: true, toggle_methane: true, ..Stimuli::none() };
        assert!(perturb.validate(&CapabilitySet::none()).is_ok());
    }

    #[test]
    fn test_capability_set_serde() {
        let set = CapabilitySet::none().with(Capability::MethaneQuery);
        let json = serde_json::to_string(&set).unwrap();
        let back: CapabilitySet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
    }
}
