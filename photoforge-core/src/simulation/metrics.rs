//! Quantities derived from the culture state at each step: productivity,
//! measurements, biochemical composition, stress flags and growth phase.

use super::{kinetics::GrowthFactors, symmetric_jitter};
use photoforge_schemas::{data_point::GrowthPhase, model::KineticSettings, scenario::ScenarioParameters};
use rand::Rng;

/// Protein plus lipid never exceed this share of dry weight.
const MAX_PROTEIN_AND_LIPID_PCT: f64 = 95.0;

/// Instantaneous productivity in g/L/day from the biomass change over one step.
pub fn productivity(previous_biomass: f64, biomass: f64, time_step_hours: f64) -> f64 {
    (biomass - previous_biomass).max(0.0) / time_step_hours * 24.0
}

/// Mean productivity in g/L/day since inoculation.
pub fn average_productivity(cumulative_productivity: f64, elapsed_hours: f64) -> f64 {
    if elapsed_hours > 0.0 {
        cumulative_productivity / (elapsed_hours / 24.0)
    } else {
        0.0
    }
}

pub fn cell_concentration<R: Rng + ?Sized>(biomass: f64, kinetics: &KineticSettings, rng: &mut R) -> f64 {
    let variance = 1.0 + symmetric_jitter(rng, kinetics.cell_count_variance);
    (biomass * kinetics.cells_per_gram * variance).max(0.0)
}

pub fn optical_density<R: Rng + ?Sized>(biomass: f64, noise_level: f64, kinetics: &KineticSettings, rng: &mut R) -> f64 {
    (biomass * kinetics.od_per_gram * (1.0 + symmetric_jitter(rng, noise_level))).max(0.0)
}

/// Growth rate per 1000 μmol photons/m²/s. Zero in darkness.
pub fn light_use_efficiency(growth_rate: f64, light_intensity: f64, kinetics: &KineticSettings) -> f64 {
    if light_intensity <= kinetics.dark_threshold.max(f64::EPSILON) {
        return 0.0;
    }
    growth_rate / light_intensity * 1000.0
}

/// Macromolecular composition as % of dry weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composition {
    pub chlorophyll: f64,
    pub protein: f64,
    pub lipid: f64,
    pub carbohydrate: f64,
}

/// Nitrogen limitation shifts carbon from protein into lipid; temperature and pH
/// stress push the same way. Carbohydrate takes whatever remains.
pub fn composition<R: Rng + ?Sized>(factors: &GrowthFactors, noise_level: f64, rng: &mut R) -> Composition {
    let nutrient = factors.nutrient;
    let temperature_stress = 1.0 - factors.temperature;
    let ph_stress = 1.0 - factors.ph;

    let chlorophyll = 2.5 * (0.6 + 0.4 * nutrient) * (1.0 + 0.3 * (1.0 - factors.light));
    let chlorophyll = (chlorophyll * (1.0 + symmetric_jitter(rng, noise_level))).clamp(0.5, 6.0);

    let protein = 30.0 + 25.0 * nutrient - 8.0 * temperature_stress - 4.0 * ph_stress;
    let mut protein = (protein * (1.0 + symmetric_jitter(rng, noise_level))).clamp(15.0, 65.0);

    let lipid = 10.0 + 25.0 * (1.0 - nutrient) + 6.0 * temperature_stress + 4.0 * ph_stress;
    let mut lipid = (lipid * (1.0 + symmetric_jitter(rng, noise_level))).clamp(5.0, 50.0);

    let total = protein + lipid;
    if total > MAX_PROTEIN_AND_LIPID_PCT {
        let scale = MAX_PROTEIN_AND_LIPID_PCT / total;
        protein *= scale;
        lipid *= scale;
    }

    Composition {
        chlorophyll,
        protein,
        lipid,
        carbohydrate: 100.0 - protein - lipid,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StressFlags {
    pub thermal: bool,
    pub ph: bool,
    pub nutrient: bool,
    pub light: bool,
}

impl StressFlags {
    pub fn evaluate(
        temperature: f64,
        ph: f64,
        nutrients: f64,
        light_intensity: f64,
        params: &ScenarioParameters,
        kinetics: &KineticSettings,
    ) -> Self {
        let lit = light_intensity > kinetics.dark_threshold;
        Self {
            thermal: (temperature - params.optimal_temperature).abs() > kinetics.thermal_tolerance,
            ph: (ph - params.optimal_ph).abs() > kinetics.ph_tolerance,
            nutrient: nutrients < kinetics.nutrient_stress_threshold,
            light: light_intensity > kinetics.photoinhibition_threshold
                || (lit && light_intensity < kinetics.low_light_threshold),
        }
    }

    pub fn any(&self) -> bool {
        self.thermal || self.ph || self.nutrient || self.light
    }
}

/// Labels the step from μ relative to μmax.
pub fn classify_phase(
    growth_rate: f64,
    mu_max: f64,
    elapsed_hours: f64,
    stressed: bool,
    kinetics: &KineticSettings,
) -> GrowthPhase {
    let relative = growth_rate / mu_max.max(f64::EPSILON);
    if relative >= 0.5 {
        GrowthPhase::Exponential
    } else if relative >= 0.2 {
        GrowthPhase::Linear
    } else if elapsed_hours < kinetics.lag_hours {
        GrowthPhase::Lag
    } else if relative >= 0.02 || !stressed {
        GrowthPhase::Stationary
    } else {
        GrowthPhase::Decline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn factors(nutrient: f64, temperature: f64) -> GrowthFactors {
        GrowthFactors {
            light: 0.8,
            temperature,
            ph: 1.0,
            nutrient,
            density: 1.0,
            oxygen: 1.0,
            co2: 1.0,
        }
    }

    #[test]
    fn composition_sums_to_one_hundred() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for i in 0..=20 {
            let f = factors(i as f64 / 20.0, 1.0 - i as f64 / 40.0);
            let c = composition(&f, 0.2, &mut rng);
            assert!(c.protein + c.lipid <= 95.0 + 1e-9);
            assert!(c.carbohydrate >= 5.0 - 1e-9);
            assert!((c.protein + c.lipid + c.carbohydrate - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn nutrient_limitation_raises_lipid() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let replete = composition(&factors(1.0, 1.0), 0.0, &mut rng);
        let starved = composition(&factors(0.05, 1.0), 0.0, &mut rng);
        assert!(starved.lipid > replete.lipid);
        assert!(starved.protein < replete.protein);
    }

    #[test]
    fn phases_follow_relative_rate() {
        let k = KineticSettings::default();
        assert_eq!(classify_phase(0.03, 0.04, 30.0, false, &k), GrowthPhase::Exponential);
        assert_eq!(classify_phase(0.01, 0.04, 30.0, false, &k), GrowthPhase::Linear);
        assert_eq!(classify_phase(0.001, 0.04, 2.0, true, &k), GrowthPhase::Lag);
        assert_eq!(classify_phase(0.0001, 0.04, 30.0, false, &k), GrowthPhase::Stationary);
        assert_eq!(classify_phase(0.0001, 0.04, 30.0, true, &k), GrowthPhase::Decline);
    }

    #[test]
    fn productivity_ignores_losses_and_scales_to_days() {
        assert_eq!(productivity(1.0, 0.9, 1.0), 0.0);
        assert!((productivity(1.0, 1.01, 1.0) - 0.24).abs() < 1e-9);
        assert_eq!(average_productivity(0.5, 0.0), 0.0);
        assert!((average_productivity(0.5, 48.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn efficiency_is_zero_in_darkness() {
        let k = KineticSettings::default();
        assert_eq!(light_use_efficiency(0.001, 0.0, &k), 0.0);
        assert!((light_use_efficiency(0.02, 200.0, &k) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn light_stress_flags_low_light_and_photoinhibition() {
        let k = KineticSettings::default();
        let params = ScenarioParameters::default();
        let night = StressFlags::evaluate(27.0, 7.5, 1.0, 0.0, &params, &k);
        assert!(!night.any());
        let dusk = StressFlags::evaluate(27.0, 7.5, 1.0, 10.0, &params, &k);
        assert!(dusk.light);
        let glare = StressFlags::evaluate(27.0, 7.5, 1.0, 900.0, &params, &k);
        assert!(glare.light);
    }
}
