//! Draws `ScenarioParameters` from the ranges of a model definition.

use photoforge_schemas::{
    environment::{LightRegime, StressCondition, ToleranceRange},
    model::ParameterRanges,
    scenario::ScenarioParameters,
};
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

pub struct ParameterSampler<'a> {
    ranges: &'a ParameterRanges,
}

impl<'a> ParameterSampler<'a> {
    pub fn new(ranges: &'a ParameterRanges) -> Self {
        Self { ranges }
    }

    /// Samples one scenario. The result is always normalized.
    pub fn sample<R: Rng + ?Sized>(&self, noise_level: f64, rng: &mut R) -> ScenarioParameters {
        let r = self.ranges;

        let ki_biomass = uniform(rng, &r.ki_biomass);
        // Inocula never start above half the carrying capacity.
        let initial_biomass = uniform(rng, &r.initial_biomass).min(ki_biomass * 0.5);

        let cyclic_probability = if r.cyclic_light_probability.is_finite() {
            r.cyclic_light_probability.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let light_regime = if rng.gen_bool(cyclic_probability) {
            LightRegime::Cyclic
        } else {
            LightRegime::Continuous
        };

        let weights = [
            r.stress_weights.normal.max(0.0),
            r.stress_weights.high_temperature.max(0.0),
            r.stress_weights.low_ph.max(0.0),
        ];
        let stress_condition = match WeightedIndex::new(weights).map(|dist| dist.sample(rng)) {
            Ok(1) => StressCondition::HighTemperature,
            Ok(2) => StressCondition::LowPh,
            _ => StressCondition::Normal,
        };

        ScenarioParameters {
            base_temperature: uniform(rng, &r.base_temperature),
            base_ph: uniform(rng, &r.base_ph),
            max_par: uniform(rng, &r.max_par),
            initial_biomass,
            nutrient_level: uniform(rng, &r.nutrient_level),
            light_regime,
            stress_condition,
            mu_max: uniform(rng, &r.mu_max),
            ks_light: uniform(rng, &r.ks_light),
            ks_nutrient: uniform(rng, &r.ks_nutrient),
            ki_biomass,
            optimal_temperature: uniform(rng, &r.optimal_temperature),
            optimal_ph: uniform(rng, &r.optimal_ph),
            noise_level,
        }
        .normalized()
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, range: &ToleranceRange<f64>) -> f64 {
    if range.min.is_finite() && range.max.is_finite() && range.min < range.max {
        rng.gen_range(range.min..range.max)
    } else {
        range.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoforge_schemas::model::ModelDefinition;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn samples_stay_inside_ranges() {
        for model in ModelDefinition::builtin() {
            let sampler = ParameterSampler::new(&model.ranges);
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            for _ in 0..500 {
                let p = sampler.sample(0.05, &mut rng);
                assert!(model.ranges.base_temperature.contains(p.base_temperature));
                assert!(model.ranges.optimal_temperature.contains(p.optimal_temperature));
                assert!(model.ranges.optimal_ph.contains(p.optimal_ph));
                assert!(model.ranges.mu_max.contains(p.mu_max));
                assert!(p.initial_biomass <= p.ki_biomass * 0.5);
                assert_eq!(p.noise_level, 0.05);
            }
        }
    }

    #[test]
    fn zero_weights_fall_back_to_normal() {
        let mut ranges = ParameterRanges::conservative();
        ranges.stress_weights.normal = 0.0;
        ranges.stress_weights.high_temperature = 0.0;
        ranges.stress_weights.low_ph = 0.0;
        ranges.cyclic_light_probability = 1.0;
        let sampler = ParameterSampler::new(&ranges);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = sampler.sample(0.02, &mut rng);
        assert_eq!(p.stress_condition, StressCondition::Normal);
        assert_eq!(p.light_regime, LightRegime::Cyclic);
    }

    #[test]
    fn degenerate_range_returns_its_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(uniform(&mut rng, &ToleranceRange::new(3.0, 3.0)), 3.0);
    }
}
