//! Defines the configurable kinetic model: the ranges scenario parameters are drawn
//! from and every constant the per-step update uses.
//!
//! Several parameterizations of the same Chlorella model are in use. Rather than one
//! type per revision, a [`ModelDefinition`] bundles the sampling ranges with the
//! kinetic constants, and named presets select between them.

use crate::environment::ToleranceRange;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Ranges every sampled [`crate::scenario::ScenarioParameters`] field is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRanges {
    pub base_temperature: ToleranceRange<f64>,
    pub base_ph: ToleranceRange<f64>,
    pub max_par: ToleranceRange<f64>,
    pub initial_biomass: ToleranceRange<f64>,
    pub nutrient_level: ToleranceRange<f64>,
    pub mu_max: ToleranceRange<f64>,
    pub ks_light: ToleranceRange<f64>,
    pub ks_nutrient: ToleranceRange<f64>,
    pub ki_biomass: ToleranceRange<f64>,
    pub optimal_temperature: ToleranceRange<f64>,
    pub optimal_ph: ToleranceRange<f64>,
    /// Probability that a scenario uses the cyclic light regime.
    pub cyclic_light_probability: f64,
    pub stress_weights: StressWeights,
}

/// Relative weights of the stress conditions when sampling scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressWeights {
    pub normal: f64,
    pub high_temperature: f64,
    pub low_ph: f64,
}

impl Default for StressWeights {
    fn default() -> Self {
        Self {
            normal: 0.6,
            high_temperature: 0.2,
            low_ph: 0.2,
        }
    }
}

impl ParameterRanges {
    /// Narrow ranges around well-behaved laboratory conditions.
    pub fn conservative() -> Self {
        Self {
            base_temperature: ToleranceRange::new(22.0, 30.0),
            base_ph: ToleranceRange::new(7.0, 8.5),
            max_par: ToleranceRange::new(100.0, 400.0),
            initial_biomass: ToleranceRange::new(0.05, 0.3),
            nutrient_level: ToleranceRange::new(0.5, 2.0),
            mu_max: ToleranceRange::new(0.02, 0.05),
            ks_light: ToleranceRange::new(60.0, 150.0),
            ks_nutrient: ToleranceRange::new(0.05, 0.2),
            ki_biomass: ToleranceRange::new(2.0, 5.0),
            optimal_temperature: ToleranceRange::new(24.0, 30.0),
            optimal_ph: ToleranceRange::new(7.0, 8.0),
            cyclic_light_probability: 0.5,
            stress_weights: StressWeights::default(),
        }
    }

    /// Wide ranges covering the strain variability reported in the literature.
    pub fn research_grade() -> Self {
        Self {
            base_temperature: ToleranceRange::new(20.0, 34.0),
            base_ph: ToleranceRange::new(6.5, 9.0),
            max_par: ToleranceRange::new(80.0, 800.0),
            initial_biomass: ToleranceRange::new(0.02, 0.5),
            nutrient_level: ToleranceRange::new(0.2, 3.0),
            mu_max: ToleranceRange::new(0.015, 0.09),
            ks_light: ToleranceRange::new(30.0, 200.0),
            ks_nutrient: ToleranceRange::new(0.03, 0.3),
            ki_biomass: ToleranceRange::new(1.5, 8.0),
            optimal_temperature: ToleranceRange::new(20.0, 35.0),
            optimal_ph: ToleranceRange::new(6.5, 9.0),
            cyclic_light_probability: 0.5,
            stress_weights: StressWeights::default(),
        }
    }
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self::research_grade()
    }
}

/// How growth is limited as the culture approaches its carrying capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityInhibition {
    /// `Ki / (Ki + X)`
    Hyperbolic,
    /// `exp(-X / Ki)`
    Exponential,
}

/// How biomass is advanced over one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    /// `X * (1 + μΔt)`
    Discrete,
    /// `X * exp(μΔt)`
    Exponential,
}

/// Every constant of the per-step kinetic update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticSettings {
    // Light
    pub photoinhibition_threshold: f64,
    pub photoinhibition_scale: f64,
    /// PAR at or below which the culture is considered to be in the dark.
    pub dark_threshold: f64,
    /// Maintenance growth rate in darkness (1/h), scaled by the temperature factor.
    pub dark_respiration_rate: f64,

    // Temperature and pH response
    pub temperature_width: f64,
    pub ph_width: f64,
    pub viable_temperature: ToleranceRange<f64>,
    pub viable_ph: ToleranceRange<f64>,
    /// Factor applied when temperature or pH leaves the viable range.
    pub cutoff_factor: f64,

    // Nutrients and density
    pub nutrient_exponent: f64,
    pub density_inhibition: DensityInhibition,
    pub integration: IntegrationScheme,
    /// g nutrient consumed per g biomass per hour at saturation.
    pub nutrient_consumption_rate: f64,
    pub nutrient_floor: f64,
    pub min_viable_biomass: f64,

    // Dissolved gases
    pub initial_dissolved_oxygen: f64,
    pub oxygen_saturation: f64,
    pub oxygen_bounds: ToleranceRange<f64>,
    pub oxygen_production_rate: f64,
    pub oxygen_respiration_rate: f64,
    pub reaeration_rate: f64,
    pub ks_oxygen: f64,
    pub co2_supply_fraction: f64,
    pub co2_bounds: ToleranceRange<f64>,
    pub co2_uptake_rate: f64,
    pub co2_release_rate: f64,
    pub co2_replenish_rate: f64,
    pub ks_co2: f64,

    // Environmental drivers
    pub circadian_temperature_amplitude: f64,
    /// °C of temperature jitter per unit of scenario noise.
    pub temperature_jitter_scale: f64,
    pub thermal_drift_rate: f64,
    pub thermal_drift_cap: f64,
    pub acid_drift_rate: f64,
    pub acid_drift_cap: f64,
    pub ph_sinusoid_amplitude: f64,
    pub ph_sinusoid_period_hours: f64,
    /// pH units gained per g/L of biomass accumulated since inoculation.
    pub alkalinization_coefficient: f64,
    /// pH units of jitter per unit of scenario noise.
    pub ph_jitter_scale: f64,

    // Measurements
    /// Cells/mL per g/L of dry biomass.
    pub cells_per_gram: f64,
    pub cell_count_variance: f64,
    pub od_per_gram: f64,

    // Classification
    pub lag_hours: f64,
    pub thermal_tolerance: f64,
    pub ph_tolerance: f64,
    pub nutrient_stress_threshold: f64,
    pub low_light_threshold: f64,

    pub start_timestamp: NaiveDateTime,
}

impl Default for KineticSettings {
    fn default() -> Self {
        Self {
            photoinhibition_threshold: 600.0,
            photoinhibition_scale: 400.0,
            dark_threshold: 1.0,
            dark_respiration_rate: 0.001,

            temperature_width: 5.0,
            ph_width: 1.0,
            viable_temperature: ToleranceRange::new(16.0, 38.0),
            viable_ph: ToleranceRange::new(6.2, 9.4),
            cutoff_factor: 0.01,

            nutrient_exponent: 1.0,
            density_inhibition: DensityInhibition::Hyperbolic,
            integration: IntegrationScheme::Discrete,
            nutrient_consumption_rate: 0.02,
            nutrient_floor: 0.001,
            min_viable_biomass: 0.001,

            initial_dissolved_oxygen: 8.0,
            oxygen_saturation: 8.0,
            oxygen_bounds: ToleranceRange::new(2.0, 20.0),
            oxygen_production_rate: 1.5,
            oxygen_respiration_rate: 0.3,
            reaeration_rate: 0.2,
            ks_oxygen: 0.5,
            co2_supply_fraction: 0.02,
            co2_bounds: ToleranceRange::new(0.0004, 0.10),
            co2_uptake_rate: 0.004,
            co2_release_rate: 0.0008,
            co2_replenish_rate: 0.3,
            ks_co2: 0.002,

            circadian_temperature_amplitude: 1.5,
            temperature_jitter_scale: 10.0,
            thermal_drift_rate: 0.05,
            thermal_drift_cap: 8.0,
            acid_drift_rate: 0.01,
            acid_drift_cap: 1.5,
            ph_sinusoid_amplitude: 0.1,
            ph_sinusoid_period_hours: 48.0,
            alkalinization_coefficient: 0.15,
            ph_jitter_scale: 2.0,

            cells_per_gram: 5.0e7,
            cell_count_variance: 0.05,
            od_per_gram: 3.2,

            lag_hours: 12.0,
            thermal_tolerance: 5.0,
            ph_tolerance: 1.0,
            nutrient_stress_threshold: 0.05,
            low_light_threshold: 30.0,

            start_timestamp: DateTime::from_timestamp(1_704_067_200, 0)
                .map(|dt| dt.naive_utc())
                .unwrap_or_default(),
        }
    }
}

/// A named, self-contained parameterization of the culture model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ranges: ParameterRanges,
    #[serde(default)]
    pub kinetics: KineticSettings,
}

impl ModelDefinition {
    pub const CONSERVATIVE: &'static str = "conservative";
    pub const RESEARCH_GRADE: &'static str = "research_grade";

    pub fn conservative() -> Self {
        Self {
            name: Self::CONSERVATIVE.to_string(),
            description: "Narrow laboratory ranges, hyperbolic density inhibition, discrete growth"
                .to_string(),
            ranges: ParameterRanges::conservative(),
            kinetics: KineticSettings {
                photoinhibition_threshold: 500.0,
                ..KineticSettings::default()
            },
        }
    }

    pub fn research_grade() -> Self {
        Self {
            name: Self::RESEARCH_GRADE.to_string(),
            description: "Wide strain ranges, sharpened nutrient limitation, exponential growth"
                .to_string(),
            ranges: ParameterRanges::research_grade(),
            kinetics: KineticSettings {
                nutrient_exponent: 1.5,
                density_inhibition: DensityInhibition::Exponential,
                integration: IntegrationScheme::Exponential,
                ..KineticSettings::default()
            },
        }
    }

    /// All presets that ship with the crate.
    pub fn builtin() -> Vec<Self> {
        vec![Self::conservative(), Self::research_grade()]
    }
}
