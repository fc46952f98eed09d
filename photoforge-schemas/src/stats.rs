//! Summary statistics reported with every generated dataset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min/max/mean of every numeric column plus categorical counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub records: usize,
    pub columns: BTreeMap<String, ColumnSummary>,
    pub growth_phases: BTreeMap<String, usize>,
    pub stress_counts: BTreeMap<String, usize>,
}

/// A scenario that did not produce data, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioFailure {
    pub scenario_id: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationStats {
    pub model: String,
    pub seed: u64,
    pub scenarios_requested: u32,
    pub scenarios_completed: u32,
    pub failed_scenarios: Vec<ScenarioFailure>,
    pub hours_per_scenario: u32,
    pub time_step_hours: f64,
    pub noise_level: f64,
    pub total_records: usize,
    pub training_records: usize,
    pub validation_records: usize,
    pub test_records: usize,
    pub elapsed_ms: u64,
    pub summary: DatasetSummary,
}
