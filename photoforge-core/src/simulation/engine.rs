use super::{
    drivers,
    kinetics::{self, Conditions, GrowthFactors},
    metrics::{self, StressFlags},
    state::CultureState,
};
use crate::{error::PhotoforgeError, logger::TimeSeriesLogger};
use chrono::Duration;
use photoforge_schemas::{
    data_point::DataPoint,
    model::{IntegrationScheme, KineticSettings},
    scenario::ScenarioParameters,
};
use rand::Rng;
use std::sync::Mutex;
use tracing::debug;

/// Everything a single step needs besides the culture state and the random source.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub scenario_id: u32,
    pub params: &'a ScenarioParameters,
    pub kinetics: &'a KineticSettings,
    pub time_step_hours: f64,
}

pub struct ScenarioSimulator {
    pub(super) model_name: String,
    pub(super) kinetics: KineticSettings,
    pub(super) logger: Option<Mutex<TimeSeriesLogger>>,
}

impl ScenarioSimulator {
    /// Runs one scenario and returns exactly `ceil(duration_hours / time_step_hours)`
    /// time-ordered data points.
    ///
    /// The output is a pure function of the arguments and the random stream; the
    /// same seed replays the same scenario. Parameters are normalized rather than
    /// rejected, so the only errors are a zero duration, a non-positive time step,
    /// and time-series logging failures.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        scenario_id: u32,
        params: &ScenarioParameters,
        duration_hours: u32,
        time_step_hours: f64,
        rng: &mut R,
    ) -> Result<Vec<DataPoint>, PhotoforgeError> {
        if duration_hours == 0 {
            return Err(PhotoforgeError::InvalidDuration);
        }
        if !(time_step_hours.is_finite() && time_step_hours > 0.0) {
            return Err(PhotoforgeError::InvalidTimeStep(time_step_hours));
        }

        let params = params.normalized();
        let steps = step_count(duration_hours, time_step_hours);
        debug!(
            scenario_id,
            steps,
            model = %self.model_name,
            regime = params.light_regime.as_str(),
            stress = params.stress_condition.as_str(),
            "simulating scenario"
        );

        let ctx = StepContext {
            scenario_id,
            params: &params,
            kinetics: &self.kinetics,
            time_step_hours,
        };

        let mut state = CultureState::initial(&params, &self.kinetics);
        let mut points = Vec::with_capacity(steps);
        for _ in 0..steps {
            let (next, point) = step(state, &ctx, rng);
            points.push(point);
            state = next;
        }

        if let Some(logger) = &self.logger {
            let mut logger = logger
                .lock()
                .map_err(|_| PhotoforgeError::ConfigError("time-series logger lock poisoned".to_string()))?;
            logger.log_points(&points)?;
        }

        Ok(points)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn kinetics(&self) -> &KineticSettings {
        &self.kinetics
    }
}

/// Number of records a scenario produces. Ratios that are integral up to rounding
/// error are not bumped to the next step.
pub fn step_count(duration_hours: u32, time_step_hours: f64) -> usize {
    let raw = f64::from(duration_hours) / time_step_hours;
    let nearest = raw.round();
    if (raw - nearest).abs() < 1e-9 {
        nearest as usize
    } else {
        raw.ceil() as usize
    }
}

/// Advances the culture by one time step.
///
/// The returned data point describes the culture at the start of the step (so the
/// first record carries the inoculum) together with the rates acting over it; the
/// returned state is the culture one step later.
pub fn step<R: Rng + ?Sized>(state: CultureState, ctx: &StepContext<'_>, rng: &mut R) -> (CultureState, DataPoint) {
    let params = ctx.params;
    let kinetics = ctx.kinetics;
    let dt = ctx.time_step_hours;
    let hours = state.elapsed_hours;

    let light_intensity = drivers::light_intensity(hours, params, rng);
    let temperature = drivers::temperature(hours, params, kinetics, rng);
    let ph = drivers::ph(hours, state.biomass - params.initial_biomass, params, kinetics, rng);
    let nutrients = state.nutrients;
    let dissolved_oxygen = state.dissolved_oxygen;
    let co2_fraction = state.co2_fraction;

    let factors = GrowthFactors::evaluate(
        &Conditions {
            light_intensity,
            temperature,
            ph,
            nutrients,
            biomass: state.biomass,
            dissolved_oxygen,
            co2_fraction,
        },
        params,
        kinetics,
    );
    let growth_rate = kinetics::specific_growth_rate(&factors, params, kinetics, rng);

    let gained = (state.biomass - state.previous_biomass).max(0.0);
    let productivity = metrics::productivity(state.previous_biomass, state.biomass, dt);
    let cumulative_productivity = state.cumulative_productivity + gained;
    let average_productivity = metrics::average_productivity(cumulative_productivity, hours);

    let cell_concentration = metrics::cell_concentration(state.biomass, kinetics, rng);
    let optical_density = metrics::optical_density(state.biomass, params.noise_level, kinetics, rng);
    let light_use_efficiency = metrics::light_use_efficiency(growth_rate, light_intensity, kinetics);
    let composition = metrics::composition(&factors, params.noise_level, rng);
    let stress = StressFlags::evaluate(temperature, ph, nutrients, light_intensity, params, kinetics);
    let growth_phase = metrics::classify_phase(growth_rate, params.mu_max, hours, stress.any(), kinetics);

    let timestamp = kinetics
        .start_timestamp
        .checked_add_signed(Duration::milliseconds((hours * 3_600_000.0).round() as i64))
        .unwrap_or(kinetics.start_timestamp);

    let point = DataPoint {
        scenario_id: ctx.scenario_id,
        time_h: hours,
        timestamp,
        light_regime: params.light_regime,
        stress_condition: params.stress_condition,
        temperature,
        ph,
        light_intensity,
        biomass: state.biomass,
        cell_concentration,
        nutrients,
        dissolved_oxygen,
        co2_fraction,
        light_factor: factors.light,
        temperature_factor: factors.temperature,
        ph_factor: factors.ph,
        nutrient_factor: factors.nutrient,
        density_factor: factors.density,
        growth_rate,
        productivity,
        cumulative_productivity,
        average_productivity,
        optical_density,
        light_use_efficiency,
        chlorophyll_pct: composition.chlorophyll,
        protein_pct: composition.protein,
        lipid_pct: composition.lipid,
        carbohydrate_pct: composition.carbohydrate,
        growth_phase,
        thermal_stress: stress.thermal,
        ph_stress: stress.ph,
        nutrient_stress: stress.nutrient,
        light_stress: stress.light,
    };

    // Uptake and gas exchange act over the step and only show up in the next record.
    let (next_oxygen, next_co2) = drivers::exchange_gases(
        dissolved_oxygen,
        co2_fraction,
        state.biomass,
        factors.light,
        kinetics,
        dt,
    );
    let next = CultureState {
        elapsed_hours: hours + dt,
        biomass: integrate_biomass(state.biomass, growth_rate, dt, params, kinetics),
        cell_concentration,
        ph,
        temperature,
        nutrients: drivers::deplete_nutrients(nutrients, state.biomass, params, kinetics, dt),
        dissolved_oxygen: next_oxygen,
        co2_fraction: next_co2,
        cumulative_productivity,
        previous_biomass: state.biomass,
    };

    (next, point)
}

/// Advances biomass by `μΔt` and keeps it within `[minimum viable, Ki]`.
pub fn integrate_biomass(
    biomass: f64,
    growth_rate: f64,
    time_step_hours: f64,
    params: &ScenarioParameters,
    kinetics: &KineticSettings,
) -> f64 {
    let grown = match kinetics.integration {
        IntegrationScheme::Discrete => biomass * (1.0 + growth_rate * time_step_hours),
        IntegrationScheme::Exponential => biomass * (growth_rate * time_step_hours).exp(),
    };
    let floor = kinetics.min_viable_biomass.min(params.ki_biomass);
    grown.min(params.ki_biomass).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::builder::SimulatorBuilder;
    use photoforge_schemas::{
        environment::{LightRegime, StressCondition},
        model::ModelDefinition,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn simulator() -> ScenarioSimulator {
        SimulatorBuilder::new()
            .with_model(&ModelDefinition::conservative())
            .build()
            .unwrap()
    }

    fn reference_params() -> ScenarioParameters {
        ScenarioParameters {
            base_temperature: 28.0,
            base_ph: 8.0,
            max_par: 150.0,
            initial_biomass: 0.05,
            mu_max: 0.025,
            light_regime: LightRegime::Cyclic,
            stress_condition: StressCondition::Normal,
            ..Default::default()
        }
    }

    #[test]
    fn step_count_rounds_up_partial_steps() {
        assert_eq!(step_count(24, 1.0), 24);
        assert_eq!(step_count(24, 0.1), 240);
        assert_eq!(step_count(10, 3.0), 4);
        assert_eq!(step_count(1, 0.25), 4);
    }

    #[test]
    fn rejects_zero_duration_and_bad_time_steps() {
        let sim = simulator();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let params = reference_params();
        assert!(matches!(
            sim.simulate(1, &params, 0, 1.0, &mut rng),
            Err(PhotoforgeError::InvalidDuration)
        ));
        assert!(matches!(
            sim.simulate(1, &params, 24, 0.0, &mut rng),
            Err(PhotoforgeError::InvalidTimeStep(_))
        ));
        assert!(matches!(
            sim.simulate(1, &params, 24, f64::NAN, &mut rng),
            Err(PhotoforgeError::InvalidTimeStep(_))
        ));
    }

    #[test]
    fn reference_day_matches_expected_shape() {
        let sim = simulator();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let points = sim.simulate(1, &reference_params(), 24, 1.0, &mut rng).unwrap();

        assert_eq!(points.len(), 24);
        assert_eq!(points[0].biomass, 0.05);
        for (hour, point) in points.iter().enumerate() {
            assert_eq!(point.time_h, hour as f64);
            assert_eq!(point.scenario_id, 1);
            if hour <= 5 || hour >= 19 {
                assert_eq!(point.light_intensity, 0.0, "hour {hour}");
            }
        }
        assert!(points[12].light_intensity > 0.0);
    }

    #[test]
    fn same_seed_replays_identically() {
        let sim = simulator();
        let params = reference_params();
        let a = sim.simulate(3, &params, 72, 1.0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = sim.simulate(3, &params, 72, 1.0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn biomass_is_capped_at_carrying_capacity() {
        let params = ScenarioParameters {
            initial_biomass: 1.9,
            ki_biomass: 2.0,
            mu_max: 0.5,
            ..Default::default()
        };
        let kinetics = KineticSettings::default();
        assert_eq!(integrate_biomass(1.9, 0.5, 1.0, &params, &kinetics), 2.0);
        assert_eq!(integrate_biomass(0.0, 0.0, 1.0, &params, &kinetics), kinetics.min_viable_biomass);
    }

    #[test]
    fn first_record_is_the_inoculated_medium() {
        let params = ScenarioParameters {
            nutrient_level: 1.0,
            initial_biomass: 2.0,
            ..Default::default()
        };
        let sim = simulator();
        let kinetics = sim.kinetics().clone();
        for dt in [1.0, 24.0] {
            let mut rng = ChaCha8Rng::seed_from_u64(6);
            let points = sim.simulate(1, &params, 72, dt, &mut rng).unwrap();
            assert_eq!(points[0].biomass, 2.0);
            assert_eq!(points[0].nutrients, params.nutrient_level);
            assert_eq!(points[0].dissolved_oxygen, kinetics.initial_dissolved_oxygen);
            assert_eq!(points[0].co2_fraction, kinetics.co2_supply_fraction);
            assert!(!points[0].nutrient_stress);
            // Uptake over the first step shows up in the second record.
            assert!(points[1].nutrients < points[0].nutrients);
        }
    }

    #[test]
    fn records_and_state_advance_together() {
        let params = reference_params().normalized();
        let kinetics = KineticSettings::default();
        let ctx = StepContext {
            scenario_id: 1,
            params: &params,
            kinetics: &kinetics,
            time_step_hours: 1.0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let state = CultureState::initial(&params, &kinetics);
        let (next, first) = step(state.clone(), &ctx, &mut rng);
        let (_, second) = step(next.clone(), &ctx, &mut rng);

        assert_eq!(first.nutrients, state.nutrients);
        assert_eq!(first.dissolved_oxygen, state.dissolved_oxygen);
        assert_eq!(second.biomass, next.biomass);
        assert_eq!(second.nutrients, next.nutrients);
        assert_eq!(second.dissolved_oxygen, next.dissolved_oxygen);
        assert_eq!(second.co2_fraction, next.co2_fraction);
    }

    #[test]
    fn timeseries_log_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.csv");
        let sim = SimulatorBuilder::new()
            .with_model(&ModelDefinition::conservative())
            .with_timeseries_logging_to_file(&path.to_string_lossy())
            .build()
            .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let first = sim.simulate(1, &reference_params(), 5, 1.0, &mut rng).unwrap();
        let second = sim.simulate(2, &reference_params(), 5, 1.0, &mut rng).unwrap();

        let logged = crate::analysis::read_data_points(&path).unwrap();
        assert_eq!(logged.len(), 10);
        assert_eq!(logged[..5], first[..]);
        assert_eq!(logged[5..], second[..]);
    }

    #[test]
    fn timestamps_follow_elapsed_hours() {
        let sim = simulator();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let points = sim.simulate(1, &reference_params(), 3, 0.5, &mut rng).unwrap();
        assert_eq!(points.len(), 6);
        let start = sim.kinetics().start_timestamp;
        assert_eq!(points[3].timestamp, start + Duration::minutes(90));
    }
}
