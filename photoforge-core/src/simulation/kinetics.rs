//! Multiplicative limitation factors and the specific growth rate.
//!
//! Every factor lies in `[0, 1]`. The specific growth rate is
//! `μ = μmax · Π factors` plus bounded zero-mean noise, except in darkness where a
//! small maintenance rate scaled by temperature alone replaces photosynthetic growth.

use super::symmetric_jitter;
use photoforge_schemas::{
    environment::ToleranceRange,
    model::{DensityInhibition, KineticSettings},
    scenario::ScenarioParameters,
};
use rand::Rng;

/// Dark maintenance growth never exceeds this fraction of μmax.
const DARK_RATE_CEILING: f64 = 0.1;

/// Saturating light response with a photoinhibition penalty. Returns 0 in darkness.
pub fn light_factor(par: f64, ks_light: f64, kinetics: &KineticSettings) -> f64 {
    if par <= kinetics.dark_threshold {
        return 0.0;
    }
    let mut factor = par / (par + ks_light.max(f64::EPSILON));
    if par > kinetics.photoinhibition_threshold {
        let excess = par - kinetics.photoinhibition_threshold;
        factor /= 1.0 + excess / kinetics.photoinhibition_scale.max(f64::EPSILON);
    }
    factor.clamp(0.0, 1.0)
}

/// Gaussian response around `optimum`, dropping to `cutoff` outside the viable range.
fn gaussian_response(value: f64, optimum: f64, width: f64, viable: &ToleranceRange<f64>, cutoff: f64) -> f64 {
    if !viable.contains(value) {
        return cutoff;
    }
    let z = (value - optimum) / width.max(f64::EPSILON);
    (-0.5 * z * z).exp().max(cutoff).min(1.0)
}

pub fn temperature_factor(temperature: f64, optimum: f64, kinetics: &KineticSettings) -> f64 {
    gaussian_response(
        temperature,
        optimum,
        kinetics.temperature_width,
        &kinetics.viable_temperature,
        kinetics.cutoff_factor,
    )
}

pub fn ph_factor(ph: f64, optimum: f64, kinetics: &KineticSettings) -> f64 {
    gaussian_response(ph, optimum, kinetics.ph_width, &kinetics.viable_ph, kinetics.cutoff_factor)
}

/// Monod term raised to `exponent` (≥ 1) for sharper limitation.
pub fn nutrient_factor(nutrients: f64, ks_nutrient: f64, exponent: f64) -> f64 {
    let nutrients = nutrients.max(0.0);
    let monod = nutrients / (nutrients + ks_nutrient.max(f64::EPSILON));
    monod.powf(exponent.max(1.0)).clamp(0.0, 1.0)
}

pub fn density_factor(biomass: f64, ki_biomass: f64, form: DensityInhibition) -> f64 {
    let ki = ki_biomass.max(f64::EPSILON);
    let biomass = biomass.max(0.0);
    match form {
        DensityInhibition::Hyperbolic => ki / (ki + biomass),
        DensityInhibition::Exponential => (-biomass / ki).exp(),
    }
}

/// Saturating response to a dissolved gas.
pub fn gas_factor(level: f64, half_saturation: f64) -> f64 {
    let level = level.max(0.0);
    level / (level + half_saturation.max(f64::EPSILON))
}

/// The limitation factors evaluated for one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthFactors {
    pub light: f64,
    pub temperature: f64,
    pub ph: f64,
    pub nutrient: f64,
    pub density: f64,
    pub oxygen: f64,
    pub co2: f64,
}

/// Culture conditions the factors are evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Conditions {
    pub light_intensity: f64,
    pub temperature: f64,
    pub ph: f64,
    pub nutrients: f64,
    pub biomass: f64,
    pub dissolved_oxygen: f64,
    pub co2_fraction: f64,
}

impl GrowthFactors {
    pub fn evaluate(conditions: &Conditions, params: &ScenarioParameters, kinetics: &KineticSettings) -> Self {
        Self {
            light: light_factor(conditions.light_intensity, params.ks_light, kinetics),
            temperature: temperature_factor(conditions.temperature, params.optimal_temperature, kinetics),
            ph: ph_factor(conditions.ph, params.optimal_ph, kinetics),
            nutrient: nutrient_factor(conditions.nutrients, params.ks_nutrient, kinetics.nutrient_exponent),
            density: density_factor(conditions.biomass, params.ki_biomass, kinetics.density_inhibition),
            oxygen: gas_factor(conditions.dissolved_oxygen, kinetics.ks_oxygen),
            co2: gas_factor(conditions.co2_fraction, kinetics.ks_co2),
        }
    }

    pub fn combined(&self) -> f64 {
        self.light * self.temperature * self.ph * self.nutrient * self.density * self.oxygen * self.co2
    }

    pub fn is_dark(&self) -> bool {
        self.light <= 0.0
    }
}

/// Computes the specific growth rate μ (1/h) for one step.
///
/// The result is always within `[0, μmax · (1 + noise)]`. In darkness no noise is
/// applied and the rate stays below `DARK_RATE_CEILING · μmax`.
pub fn specific_growth_rate<R: Rng + ?Sized>(
    factors: &GrowthFactors,
    params: &ScenarioParameters,
    kinetics: &KineticSettings,
    rng: &mut R,
) -> f64 {
    if factors.is_dark() {
        return (kinetics.dark_respiration_rate * factors.temperature)
            .min(params.mu_max * DARK_RATE_CEILING)
            .max(0.0);
    }

    let deterministic = params.mu_max * factors.combined();
    let noise = symmetric_jitter(rng, params.noise_level * params.mu_max);
    (deterministic + noise).clamp(0.0, params.mu_max * (1.0 + params.noise_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn kinetics() -> KineticSettings {
        KineticSettings::default()
    }

    #[test]
    fn light_factor_saturates_and_inhibits() {
        let k = kinetics();
        assert_eq!(light_factor(0.0, 100.0, &k), 0.0);
        let half = light_factor(100.0, 100.0, &k);
        assert!((half - 0.5).abs() < 1e-12);
        let at_threshold = light_factor(k.photoinhibition_threshold, 100.0, &k);
        let inhibited = light_factor(k.photoinhibition_threshold + 400.0, 100.0, &k);
        assert!(inhibited < at_threshold);
    }

    #[test]
    fn temperature_factor_peaks_at_optimum_and_cuts_off() {
        let k = kinetics();
        assert!((temperature_factor(27.0, 27.0, &k) - 1.0).abs() < 1e-12);
        assert!(temperature_factor(32.0, 27.0, &k) < 1.0);
        assert_eq!(temperature_factor(39.5, 27.0, &k), k.cutoff_factor);
        assert_eq!(ph_factor(6.1, 7.5, &k), k.cutoff_factor);
    }

    #[test]
    fn nutrient_exponent_sharpens_limitation() {
        let linear = nutrient_factor(0.1, 0.1, 1.0);
        let sharp = nutrient_factor(0.1, 0.1, 2.0);
        assert!((linear - 0.5).abs() < 1e-12);
        assert!((sharp - 0.25).abs() < 1e-12);
        assert_eq!(nutrient_factor(-1.0, 0.1, 1.0), 0.0);
    }

    #[test]
    fn density_forms_decrease_with_biomass() {
        for form in [DensityInhibition::Hyperbolic, DensityInhibition::Exponential] {
            let low = density_factor(0.1, 4.0, form);
            let high = density_factor(3.9, 4.0, form);
            assert!(low > high);
            assert!(high > 0.0 && low <= 1.0);
        }
    }

    #[test]
    fn dark_rate_uses_temperature_only() {
        let k = kinetics();
        let params = ScenarioParameters::default();
        let factors = GrowthFactors {
            light: 0.0,
            temperature: 0.5,
            ph: 1.0,
            nutrient: 1.0,
            density: 1.0,
            oxygen: 1.0,
            co2: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mu = specific_growth_rate(&factors, &params, &k, &mut rng);
        assert!((mu - k.dark_respiration_rate * 0.5).abs() < 1e-15);
        assert!(mu <= params.mu_max * DARK_RATE_CEILING);
    }

    #[test]
    fn growth_rate_stays_within_noise_envelope() {
        let k = kinetics();
        let params = ScenarioParameters {
            noise_level: 0.2,
            ..Default::default()
        };
        let factors = GrowthFactors {
            light: 1.0,
            temperature: 1.0,
            ph: 1.0,
            nutrient: 1.0,
            density: 1.0,
            oxygen: 1.0,
            co2: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let mu = specific_growth_rate(&factors, &params, &k, &mut rng);
            assert!(mu >= 0.0);
            assert!(mu <= params.mu_max * 1.2 + 1e-12);
        }
    }
}
