//! The dataset generation request submitted to the orchestrator.

use serde::{Deserialize, Serialize};

/// How much stochastic variation the generated scenarios carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariabilityLevel {
    Low,
    Medium,
    High,
    Extreme,
}

impl VariabilityLevel {
    pub fn noise_level(&self) -> f64 {
        match self {
            VariabilityLevel::Low => 0.02,
            VariabilityLevel::Medium => 0.05,
            VariabilityLevel::High => 0.10,
            VariabilityLevel::Extreme => 0.18,
        }
    }
}

/// The measurement quality the synthetic data should imitate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Research,
    Industrial,
    Pilot,
}

impl DataQuality {
    pub fn noise_level(&self) -> f64 {
        match self {
            DataQuality::Research => 0.02,
            DataQuality::Industrial => 0.05,
            DataQuality::Pilot => 0.08,
        }
    }
}

/// A request for a complete dataset.
///
/// Exactly one of `hours_per_scenario` and `total_days` must be given. When both
/// `variability_level` and `data_quality` are present, the variability level wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRequest {
    pub scenarios: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_per_scenario: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variability_level: Option<VariabilityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_step_hours: Option<f64>,
}

impl DatasetRequest {
    pub fn new(scenarios: u32, hours_per_scenario: u32) -> Self {
        Self {
            scenarios,
            hours_per_scenario: Some(hours_per_scenario),
            total_days: None,
            variability_level: None,
            data_quality: None,
            seed: None,
            time_step_hours: None,
        }
    }

    pub fn noise_level(&self) -> f64 {
        match (self.variability_level, self.data_quality) {
            (Some(level), _) => level.noise_level(),
            (None, Some(quality)) => quality.noise_level(),
            (None, None) => VariabilityLevel::Medium.noise_level(),
        }
    }
}

/// Bounds applied when validating a [`DatasetRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLimits {
    pub max_scenarios: u32,
    pub max_hours_per_scenario: u32,
    pub max_total_days: u32,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_scenarios: 100,
            max_hours_per_scenario: 2160,
            max_total_days: 90,
        }
    }
}
