//! Environmental vocabulary shared by scenario parameters, model definitions and data points.

use serde::{Deserialize, Serialize};

/// A generic struct to define a minimum and maximum range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceRange<T> {
    pub min: T,
    pub max: T,
}

impl ToleranceRange<f64> {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` when `value` lies inside the inclusive range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps `value` into the range. A non-finite value collapses to the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.min;
        }
        value.max(self.min).min(self.max)
    }
}

/// Hard physical bounds on culture temperature, in °C.
pub const TEMPERATURE_BOUNDS: ToleranceRange<f64> = ToleranceRange::new(15.0, 40.0);

/// Hard physical bounds on culture pH.
pub const PH_BOUNDS: ToleranceRange<f64> = ToleranceRange::new(6.0, 9.5);

/// How the photobioreactor is illuminated over a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightRegime {
    /// Artificial lighting that stays on around the clock.
    Continuous,
    /// A 12 h light / 12 h dark day, with daylight between 06:00 and 18:00.
    Cyclic,
}

impl LightRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            LightRegime::Continuous => "continuous",
            LightRegime::Cyclic => "cyclic",
        }
    }
}

/// The environmental stress imposed on a scenario for its whole duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressCondition {
    Normal,
    HighTemperature,
    #[serde(rename = "low_ph")]
    LowPh,
}

impl StressCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StressCondition::Normal => "normal",
            StressCondition::HighTemperature => "high_temperature",
            StressCondition::LowPh => "low_ph",
        }
    }
}
