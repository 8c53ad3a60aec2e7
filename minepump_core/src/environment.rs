//! Environment Model - physical state of the mine shaft.
//!
//! Holds the discretized sump water level and the methane-critical flag.
//! Every operation is total: water arithmetic saturates at both ends.

use serde::{Deserialize, Serialize};

// =============================================================================
// WATER LEVEL
// =============================================================================

/// Discretized water level, always within `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct WaterLevel(u8);

impl WaterLevel {
    /// Both sensors dry.
    pub const LOW: WaterLevel = WaterLevel(0);
    /// Low sensor wet, high sensor dry.
    pub const NORMAL: WaterLevel = WaterLevel(1);
    /// Both sensors wet.
    pub const HIGH: WaterLevel = WaterLevel(2);

    /// Creates a level, clamping out-of-range values to the nearest bound.
    pub fn new(raw: u8) -> Self {
        WaterLevel(raw.min(Self::HIGH.0))
    }

    /// Returns the raw level.
    pub fn get(self) -> u8 {
        self.0
    }

    /// One level higher, saturating at `HIGH`.
    pub fn raised(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    /// One level lower, saturating at `LOW`.
    pub fn lowered(self) -> Self {
        WaterLevel(self.0.saturating_sub(1))
    }
}

impl Default for WaterLevel {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<u8> for WaterLevel {
    fn from(raw: u8) -> Self {
        Self::new(raw)
    }
}

impl From<WaterLevel> for u8 {
    fn from(level: WaterLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for WaterLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Physical state observed by the sensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    water_level: WaterLevel,
    methane_critical: bool,
}

impl Environment {
    /// Creates an environment with the given state.
    pub fn new(water_level: WaterLevel, methane_critical: bool) -> Self {
        Self {
            water_level,
            methane_critical,
        }
    }

    /// Water rises by one level (no-op at the top).
    pub fn raise_water(&mut self) {
        self.water_level = self.water_level.raised();
    }

    /// Water drains by one level (no-op at the bottom).
    pub fn lower_water(&mut self) {
        self.water_level = self.water_level.lowered();
    }

    /// Flips the methane-critical flag.
    pub fn toggle_methane(&mut self) {
        self.methane_critical = !self.methane_critical;
    }

    pub fn water_level(&self) -> WaterLevel {
        self.water_level
    }

    pub fn is_methane_critical(&self) -> bool {
        self.methane_critical
    }

    /// True unless the water has reached the high sensor.
    pub fn is_high_sensor_dry(&self) -> bool {
        self.water_level < WaterLevel::HIGH
    }

    /// True only when the sump is empty.
    pub fn is_low_sensor_dry(&self) -> bool {
        self.water_level == WaterLevel::LOW
    }
}
