//! The record emitted by the simulator for every scenario and time step.

use crate::environment::{LightRegime, StressCondition};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Qualitative label derived from the current growth rate. It is recomputed every
/// step and never drives the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPhase {
    Lag,
    Exponential,
    Linear,
    Stationary,
    Decline,
}

impl GrowthPhase {
    pub const ALL: [GrowthPhase; 5] = [
        GrowthPhase::Lag,
        GrowthPhase::Exponential,
        GrowthPhase::Linear,
        GrowthPhase::Stationary,
        GrowthPhase::Decline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthPhase::Lag => "lag",
            GrowthPhase::Exponential => "exponential",
            GrowthPhase::Linear => "linear",
            GrowthPhase::Stationary => "stationary",
            GrowthPhase::Decline => "decline",
        }
    }
}

/// One immutable snapshot of a simulated culture.
///
/// Field names are serialized as the CSV column headers of the exported datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(rename = "Scenario_ID")]
    pub scenario_id: u32,
    #[serde(rename = "Time_h")]
    pub time_h: f64,
    #[serde(rename = "Timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Light_Regime")]
    pub light_regime: LightRegime,
    #[serde(rename = "Stress_Condition")]
    pub stress_condition: StressCondition,

    #[serde(rename = "Temperature_C")]
    pub temperature: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
    #[serde(rename = "Light_Intensity_umol_m2_s")]
    pub light_intensity: f64,
    #[serde(rename = "Biomass_g_L")]
    pub biomass: f64,
    #[serde(rename = "Cell_Concentration_cells_mL")]
    pub cell_concentration: f64,
    #[serde(rename = "Nutrients_g_L")]
    pub nutrients: f64,
    #[serde(rename = "Dissolved_Oxygen_mg_L")]
    pub dissolved_oxygen: f64,
    #[serde(rename = "CO2_Fraction")]
    pub co2_fraction: f64,

    #[serde(rename = "Light_Factor")]
    pub light_factor: f64,
    #[serde(rename = "Temperature_Factor")]
    pub temperature_factor: f64,
    #[serde(rename = "pH_Factor")]
    pub ph_factor: f64,
    #[serde(rename = "Nutrient_Factor")]
    pub nutrient_factor: f64,
    #[serde(rename = "Density_Factor")]
    pub density_factor: f64,
    #[serde(rename = "Specific_Growth_Rate_h")]
    pub growth_rate: f64,

    #[serde(rename = "Productivity_g_L_day")]
    pub productivity: f64,
    #[serde(rename = "Cumulative_Productivity_g_L")]
    pub cumulative_productivity: f64,
    #[serde(rename = "Average_Productivity_g_L_day")]
    pub average_productivity: f64,
    #[serde(rename = "Optical_Density_680")]
    pub optical_density: f64,
    #[serde(rename = "Light_Use_Efficiency")]
    pub light_use_efficiency: f64,

    #[serde(rename = "Chlorophyll_pct")]
    pub chlorophyll_pct: f64,
    #[serde(rename = "Protein_pct")]
    pub protein_pct: f64,
    #[serde(rename = "Lipid_pct")]
    pub lipid_pct: f64,
    #[serde(rename = "Carbohydrate_pct")]
    pub carbohydrate_pct: f64,

    #[serde(rename = "Growth_Phase")]
    pub growth_phase: GrowthPhase,
    #[serde(rename = "Thermal_Stress")]
    pub thermal_stress: bool,
    #[serde(rename = "pH_Stress")]
    pub ph_stress: bool,
    #[serde(rename = "Nutrient_Stress")]
    pub nutrient_stress: bool,
    #[serde(rename = "Light_Stress")]
    pub light_stress: bool,
}

impl DataPoint {
    /// Numeric columns paired with their CSV header, in column order.
    pub fn numeric_fields(&self) -> [(&'static str, f64); 24] {
        [
            ("Time_h", self.time_h),
            ("Temperature_C", self.temperature),
            ("pH", self.ph),
            ("Light_Intensity_umol_m2_s", self.light_intensity),
            ("Biomass_g_L", self.biomass),
            ("Cell_Concentration_cells_mL", self.cell_concentration),
            ("Nutrients_g_L", self.nutrients),
            ("Dissolved_Oxygen_mg_L", self.dissolved_oxygen),
            ("CO2_Fraction", self.co2_fraction),
            ("Light_Factor", self.light_factor),
            ("Temperature_Factor", self.temperature_factor),
            ("pH_Factor", self.ph_factor),
            ("Nutrient_Factor", self.nutrient_factor),
            ("Density_Factor", self.density_factor),
            ("Specific_Growth_Rate_h", self.growth_rate),
            ("Productivity_g_L_day", self.productivity),
            ("Cumulative_Productivity_g_L", self.cumulative_productivity),
            ("Average_Productivity_g_L_day", self.average_productivity),
            ("Optical_Density_680", self.optical_density),
            ("Light_Use_Efficiency", self.light_use_efficiency),
            ("Chlorophyll_pct", self.chlorophyll_pct),
            ("Protein_pct", self.protein_pct),
            ("Lipid_pct", self.lipid_pct),
            ("Carbohydrate_pct", self.carbohydrate_pct),
        ]
    }

    /// `true` when every numeric column holds a finite value.
    pub fn is_finite(&self) -> bool {
        self.numeric_fields().iter().all(|(_, v)| v.is_finite())
    }

    /// The stress flags paired with their CSV header.
    pub fn stress_flags(&self) -> [(&'static str, bool); 4] {
        [
            ("Thermal_Stress", self.thermal_stress),
            ("pH_Stress", self.ph_stress),
            ("Nutrient_Stress", self.nutrient_stress),
            ("Light_Stress", self.light_stress),
        ]
    }
}
