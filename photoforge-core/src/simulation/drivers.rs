//! Environmental drivers: light, temperature, pH, nutrients and dissolved gases.

use super::symmetric_jitter;
use photoforge_schemas::{
    environment::{LightRegime, StressCondition, PH_BOUNDS, TEMPERATURE_BOUNDS},
    model::KineticSettings,
    scenario::ScenarioParameters,
};
use rand::Rng;
use std::f64::consts::PI;

pub const DAWN_HOUR: f64 = 6.0;
pub const DUSK_HOUR: f64 = 18.0;

pub fn hour_of_day(hours: f64) -> f64 {
    hours.rem_euclid(24.0)
}

/// `true` when the light regime provides light at this time.
pub fn is_daylight(regime: LightRegime, hours: f64) -> bool {
    match regime {
        LightRegime::Continuous => true,
        LightRegime::Cyclic => {
            let hod = hour_of_day(hours);
            hod > DAWN_HOUR && hod < DUSK_HOUR
        }
    }
}

/// Photosynthetically active radiation reaching the culture (μmol photons/m²/s).
///
/// Cyclic light is exactly zero outside daylight hours.
pub fn light_intensity<R: Rng + ?Sized>(hours: f64, params: &ScenarioParameters, rng: &mut R) -> f64 {
    match params.light_regime {
        LightRegime::Continuous => {
            let level = 0.9 + symmetric_jitter(rng, params.noise_level * 0.5);
            (params.max_par * level).max(0.0)
        }
        LightRegime::Cyclic => {
            if !is_daylight(params.light_regime, hours) {
                return 0.0;
            }
            let angle = (hour_of_day(hours) - DAWN_HOUR) * PI / 12.0;
            let jitter = 1.0 + symmetric_jitter(rng, params.noise_level);
            (params.max_par * angle.sin() * jitter).max(0.0)
        }
    }
}

/// Culture temperature (°C), clamped to the physical bounds.
pub fn temperature<R: Rng + ?Sized>(
    hours: f64,
    params: &ScenarioParameters,
    kinetics: &KineticSettings,
    rng: &mut R,
) -> f64 {
    let drift = match params.stress_condition {
        StressCondition::HighTemperature => (kinetics.thermal_drift_rate * hours).min(kinetics.thermal_drift_cap),
        _ => 0.0,
    };
    // Peaks at noon.
    let circadian =
        kinetics.circadian_temperature_amplitude * (2.0 * PI * (hour_of_day(hours) - DAWN_HOUR) / 24.0).sin();
    let jitter = symmetric_jitter(rng, params.noise_level * kinetics.temperature_jitter_scale);

    TEMPERATURE_BOUNDS.clamp(params.base_temperature + drift + circadian + jitter)
}

/// Medium pH, clamped to the physical bounds.
///
/// `biomass_gain` is the biomass accumulated since inoculation; photosynthetic
/// carbon uptake alkalinizes the medium in proportion to it.
pub fn ph<R: Rng + ?Sized>(
    hours: f64,
    biomass_gain: f64,
    params: &ScenarioParameters,
    kinetics: &KineticSettings,
    rng: &mut R,
) -> f64 {
    let drift = match params.stress_condition {
        StressCondition::LowPh => -(kinetics.acid_drift_rate * hours).min(kinetics.acid_drift_cap),
        _ => 0.0,
    };
    let period = kinetics.ph_sinusoid_period_hours.max(1.0);
    let slow = kinetics.ph_sinusoid_amplitude * (2.0 * PI * hours / period).sin();
    let alkalinization = kinetics.alkalinization_coefficient * biomass_gain.max(0.0);
    let jitter = symmetric_jitter(rng, params.noise_level * kinetics.ph_jitter_scale);

    PH_BOUNDS.clamp(params.base_ph + drift + slow + alkalinization + jitter)
}

/// Michaelis-Menten uptake over one step. The pool never drops below the residual floor.
pub fn deplete_nutrients(
    nutrients: f64,
    biomass: f64,
    params: &ScenarioParameters,
    kinetics: &KineticSettings,
    time_step_hours: f64,
) -> f64 {
    let available = nutrients.max(0.0);
    let saturation = available / (available + params.ks_nutrient.max(f64::EPSILON));
    let uptake = biomass.max(0.0) * saturation * kinetics.nutrient_consumption_rate * time_step_hours;
    (available - uptake).max(kinetics.nutrient_floor)
}

/// Dissolved oxygen (mg/L) and CO2 fraction after one step.
///
/// Photosynthesis only runs when `light_factor > 0`; respiration runs always;
/// sparging pulls both gases back toward their supply levels.
pub fn exchange_gases(
    dissolved_oxygen: f64,
    co2_fraction: f64,
    biomass: f64,
    light_factor: f64,
    kinetics: &KineticSettings,
    time_step_hours: f64,
) -> (f64, f64) {
    let biomass = biomass.max(0.0);
    let photosynthesis = light_factor.clamp(0.0, 1.0);

    let o2_production = kinetics.oxygen_production_rate * biomass * photosynthesis;
    let o2_respiration = kinetics.oxygen_respiration_rate * biomass;
    let reaeration = kinetics.reaeration_rate * (kinetics.oxygen_saturation - dissolved_oxygen);
    let oxygen = dissolved_oxygen + (o2_production - o2_respiration + reaeration) * time_step_hours;

    let co2_uptake = kinetics.co2_uptake_rate * biomass * photosynthesis;
    let co2_release = kinetics.co2_release_rate * biomass;
    let replenish = kinetics.co2_replenish_rate * (kinetics.co2_supply_fraction - co2_fraction);
    let co2 = co2_fraction + (co2_release - co2_uptake + replenish) * time_step_hours;

    (kinetics.oxygen_bounds.clamp(oxygen), kinetics.co2_bounds.clamp(co2))
}
