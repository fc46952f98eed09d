//! Per-scenario parameters. A `ScenarioParameters` value is sampled once and stays
//! immutable for the whole simulated culture.

use crate::environment::{LightRegime, StressCondition, PH_BOUNDS, TEMPERATURE_BOUNDS};
use serde::{Deserialize, Serialize};

/// Smallest inoculum the simulator accepts, in g/L.
pub const MIN_INITIAL_BIOMASS: f64 = 1e-4;

/// Upper bound on the relative noise applied to any stochastic term.
pub const MAX_NOISE_LEVEL: f64 = 0.2;

/// The complete set of inputs describing one simulated cultivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParameters {
    /// Set-point temperature of the reactor (°C).
    pub base_temperature: f64,
    /// Set-point pH of the medium.
    pub base_ph: f64,
    /// Peak photosynthetically active radiation (μmol photons/m²/s).
    pub max_par: f64,
    /// Inoculum density (g/L).
    pub initial_biomass: f64,
    /// Initial concentration of the limiting nutrient (g/L).
    pub nutrient_level: f64,
    pub light_regime: LightRegime,
    pub stress_condition: StressCondition,
    /// Maximum specific growth rate μmax (1/h).
    pub mu_max: f64,
    /// Light half-saturation constant (μmol photons/m²/s).
    pub ks_light: f64,
    /// Nutrient half-saturation constant (g/L).
    pub ks_nutrient: f64,
    /// Carrying capacity Ki (g/L).
    pub ki_biomass: f64,
    pub optimal_temperature: f64,
    pub optimal_ph: f64,
    /// Relative amplitude of the random terms, in `[0, MAX_NOISE_LEVEL]`.
    pub noise_level: f64,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            base_temperature: 26.0,
            base_ph: 7.5,
            max_par: 250.0,
            initial_biomass: 0.1,
            nutrient_level: 1.0,
            light_regime: LightRegime::Continuous,
            stress_condition: StressCondition::Normal,
            mu_max: 0.04,
            ks_light: 100.0,
            ks_nutrient: 0.1,
            ki_biomass: 4.0,
            optimal_temperature: 27.0,
            optimal_ph: 7.5,
            noise_level: 0.05,
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

impl ScenarioParameters {
    /// Returns a copy with every field forced into a range the simulator can work with.
    ///
    /// Malformed values are never rejected: non-finite fields fall back to the defaults,
    /// everything else is clamped.
    pub fn normalized(&self) -> Self {
        let defaults = Self::default();

        let ki_biomass = finite_or(self.ki_biomass, defaults.ki_biomass).max(0.01);
        let initial_biomass = finite_or(self.initial_biomass, defaults.initial_biomass)
            .max(MIN_INITIAL_BIOMASS)
            .min(ki_biomass);

        Self {
            base_temperature: TEMPERATURE_BOUNDS
                .clamp(finite_or(self.base_temperature, defaults.base_temperature)),
            base_ph: PH_BOUNDS.clamp(finite_or(self.base_ph, defaults.base_ph)),
            max_par: finite_or(self.max_par, defaults.max_par).clamp(0.0, 3000.0),
            initial_biomass,
            nutrient_level: finite_or(self.nutrient_level, defaults.nutrient_level).max(0.0),
            light_regime: self.light_regime,
            stress_condition: self.stress_condition,
            mu_max: finite_or(self.mu_max, defaults.mu_max).clamp(1e-4, 1.0),
            ks_light: finite_or(self.ks_light, defaults.ks_light).max(1e-3),
            ks_nutrient: finite_or(self.ks_nutrient, defaults.ks_nutrient).max(1e-4),
            ki_biomass,
            optimal_temperature: TEMPERATURE_BOUNDS
                .clamp(finite_or(self.optimal_temperature, defaults.optimal_temperature)),
            optimal_ph: PH_BOUNDS.clamp(finite_or(self.optimal_ph, defaults.optimal_ph)),
            noise_level: finite_or(self.noise_level, defaults.noise_level)
                .clamp(0.0, MAX_NOISE_LEVEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_clamps_malformed_values() {
        let params = ScenarioParameters {
            base_temperature: 80.0,
            base_ph: f64::NAN,
            initial_biomass: 12.0,
            ki_biomass: 3.0,
            mu_max: -1.0,
            noise_level: 5.0,
            ..Default::default()
        }
        .normalized();

        assert_eq!(params.base_temperature, 40.0);
        assert_eq!(params.base_ph, ScenarioParameters::default().base_ph);
        assert_eq!(params.initial_biomass, 3.0);
        assert_eq!(params.mu_max, 1e-4);
        assert_eq!(params.noise_level, MAX_NOISE_LEVEL);
    }

    #[test]
    fn normalized_is_idempotent_on_valid_input() {
        let params = ScenarioParameters::default();
        assert_eq!(params.normalized(), params);
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let params: ScenarioParameters =
            serde_yaml::from_str("base_temperature: 28.0\nlight_regime: cyclic\n").unwrap();
        assert_eq!(params.base_temperature, 28.0);
        assert_eq!(params.light_regime, LightRegime::Cyclic);
        assert_eq!(params.mu_max, ScenarioParameters::default().mu_max);
    }
}
