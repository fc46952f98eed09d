//! The dataset orchestrator: validates a request, simulates every scenario on a
//! worker pool, then shuffles and partitions the records.

use crate::{
    analysis,
    error::PhotoforgeError,
    sampling::ParameterSampler,
    simulation::{builder::SimulatorBuilder, engine::ScenarioSimulator},
};
use photoforge_schemas::{
    data_point::DataPoint,
    model::ModelDefinition,
    request::{DatasetRequest, RequestLimits},
    stats::{GenerationStats, ScenarioFailure},
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

const MIN_TIME_STEP_HOURS: f64 = 1.0 / 60.0;
const MAX_TIME_STEP_HOURS: f64 = 24.0;
const DEFAULT_TIME_STEP_HOURS: f64 = 1.0;

/// A request after validation, with every optional field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRequest {
    pub scenarios: u32,
    pub hours_per_scenario: u32,
    pub time_step_hours: f64,
    pub noise_level: f64,
    pub seed: u64,
}

/// Checks a request against `limits`. Nothing is simulated for a rejected request.
pub fn validate_request(request: &DatasetRequest, limits: &RequestLimits) -> Result<ResolvedRequest, PhotoforgeError> {
    if request.scenarios < 1 || request.scenarios > limits.max_scenarios {
        return Err(PhotoforgeError::InvalidRequest(format!(
            "scenarios must be between 1 and {}, got {}",
            limits.max_scenarios, request.scenarios
        )));
    }

    let hours_per_scenario = match (request.hours_per_scenario, request.total_days) {
        (Some(_), Some(_)) => {
            return Err(PhotoforgeError::InvalidRequest(
                "specify either hoursPerScenario or totalDays, not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(PhotoforgeError::InvalidRequest(
                "one of hoursPerScenario or totalDays is required".to_string(),
            ))
        }
        (Some(hours), None) => {
            if hours < 1 || hours > limits.max_hours_per_scenario {
                return Err(PhotoforgeError::InvalidRequest(format!(
                    "hoursPerScenario must be between 1 and {}, got {}",
                    limits.max_hours_per_scenario, hours
                )));
            }
            hours
        }
        (None, Some(days)) => {
            if days < 1 || days > limits.max_total_days {
                return Err(PhotoforgeError::InvalidRequest(format!(
                    "totalDays must be between 1 and {}, got {}",
                    limits.max_total_days, days
                )));
            }
            days.checked_mul(24).ok_or_else(|| {
                PhotoforgeError::InvalidRequest(format!("totalDays {} overflows the hour count", days))
            })?
        }
    };

    let time_step_hours = request.time_step_hours.unwrap_or(DEFAULT_TIME_STEP_HOURS);
    if !(MIN_TIME_STEP_HOURS..=MAX_TIME_STEP_HOURS).contains(&time_step_hours) {
        return Err(PhotoforgeError::InvalidRequest(format!(
            "timeStepHours must be between {:.4} and {}, got {}",
            MIN_TIME_STEP_HOURS, MAX_TIME_STEP_HOURS, time_step_hours
        )));
    }

    Ok(ResolvedRequest {
        scenarios: request.scenarios,
        hours_per_scenario,
        time_step_hours,
        noise_level: request.noise_level(),
        seed: request.seed.unwrap_or_else(rand::random),
    })
}

/// The 70/15/15 partition of a shuffled dataset, as indices into
/// [`GeneratedDataset::complete`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSplits {
    pub training: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split sizes for `total` records: floor division for training and validation,
/// the remainder goes to test.
pub fn split_sizes(total: usize) -> (usize, usize, usize) {
    let training = total * 70 / 100;
    let validation = total * 15 / 100;
    (training, validation, total - training - validation)
}

/// Partitions an already-shuffled record order.
pub fn split_indices(mut order: Vec<usize>) -> DatasetSplits {
    let (training, validation, _) = split_sizes(order.len());
    let test = order.split_off(training + validation);
    let validation_indices = order.split_off(training);
    DatasetSplits {
        training: order,
        validation: validation_indices,
        test,
    }
}

/// Everything produced by one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedDataset {
    /// All records, ordered by scenario then time.
    pub complete: Vec<DataPoint>,
    pub splits: DatasetSplits,
    pub stats: GenerationStats,
    pub request: ResolvedRequest,
}

impl GeneratedDataset {
    pub fn rows<'a>(&'a self, indices: &'a [usize]) -> impl Iterator<Item = &'a DataPoint> + 'a {
        indices.iter().filter_map(move |&i| self.complete.get(i))
    }

    pub fn training(&self) -> impl Iterator<Item = &DataPoint> {
        self.rows(&self.splits.training)
    }

    pub fn validation(&self) -> impl Iterator<Item = &DataPoint> {
        self.rows(&self.splits.validation)
    }

    pub fn test(&self) -> impl Iterator<Item = &DataPoint> {
        self.rows(&self.splits.test)
    }
}

pub struct DatasetOrchestrator {
    model: ModelDefinition,
    limits: RequestLimits,
    timeout: Option<Duration>,
    worker_threads: Option<usize>,
    timeseries_log: Option<PathBuf>,
}

impl DatasetOrchestrator {
    pub fn new(model: ModelDefinition) -> Self {
        Self {
            model,
            limits: RequestLimits::default(),
            timeout: None,
            worker_threads: None,
            timeseries_log: None,
        }
    }

    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Aborts the whole run once it has taken longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Runs scenarios on a dedicated pool of `threads` workers instead of the global pool.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads.max(1));
        self
    }

    /// Also streams every simulated record, failed scenarios included, to a CSV log
    /// as each scenario finishes. Row order across scenarios follows completion order.
    pub fn with_timeseries_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.timeseries_log = Some(path.into());
        self
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }

    pub fn generate(&self, request: &DatasetRequest) -> Result<GeneratedDataset, PhotoforgeError> {
        let resolved = validate_request(request, &self.limits)?;
        let mut builder = SimulatorBuilder::new().with_model(&self.model);
        if let Some(path) = &self.timeseries_log {
            builder = builder.with_timeseries_logging_to_file(&path.to_string_lossy());
        }
        let simulator = builder.build()?;
        let started = Instant::now();

        info!(
            scenarios = resolved.scenarios,
            hours = resolved.hours_per_scenario,
            time_step = resolved.time_step_hours,
            noise = resolved.noise_level,
            seed = resolved.seed,
            model = %self.model.name,
            "generating dataset"
        );

        // Per-scenario seeds come from the master stream so results do not depend on
        // which worker runs which scenario.
        let mut master = ChaCha8Rng::seed_from_u64(resolved.seed);
        let seeds: Vec<(u32, u64)> = (1..=resolved.scenarios).map(|id| (id, master.gen())).collect();

        let run_all = || -> Vec<(u32, Result<Vec<DataPoint>, PhotoforgeError>)> {
            seeds
                .par_iter()
                .map(|&(scenario_id, seed)| {
                    let outcome = self.run_scenario(&simulator, scenario_id, seed, &resolved, started);
                    (scenario_id, outcome)
                })
                .collect()
        };

        let outcomes = match self.worker_threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| PhotoforgeError::ConfigError(format!("failed to build worker pool: {}", e)))?
                .install(run_all),
            None => run_all(),
        };

        if let Some(limit) = self.timeout {
            let timed_out = outcomes
                .iter()
                .any(|(_, outcome)| matches!(outcome, Err(PhotoforgeError::Timeout(_))));
            if timed_out || started.elapsed() > limit {
                warn!(elapsed_ms = started.elapsed().as_millis() as u64, "dataset generation timed out");
                return Err(PhotoforgeError::Timeout(limit.as_secs()));
            }
        }

        let mut complete = Vec::new();
        let mut failed_scenarios = Vec::new();
        for (scenario_id, outcome) in outcomes {
            match outcome {
                Ok(points) => complete.extend(points),
                Err(e) => {
                    warn!(scenario_id, error = %e, "scenario failed");
                    failed_scenarios.push(ScenarioFailure {
                        scenario_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if failed_scenarios.len() == resolved.scenarios as usize {
            return Err(PhotoforgeError::AllScenariosFailed(resolved.scenarios));
        }

        let mut order: Vec<usize> = (0..complete.len()).collect();
        order.shuffle(&mut master);
        let splits = split_indices(order);

        let stats = GenerationStats {
            model: self.model.name.clone(),
            seed: resolved.seed,
            scenarios_requested: resolved.scenarios,
            scenarios_completed: resolved.scenarios - failed_scenarios.len() as u32,
            failed_scenarios,
            hours_per_scenario: resolved.hours_per_scenario,
            time_step_hours: resolved.time_step_hours,
            noise_level: resolved.noise_level,
            total_records: complete.len(),
            training_records: splits.training.len(),
            validation_records: splits.validation.len(),
            test_records: splits.test.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            summary: analysis::summarize(&complete),
        };

        info!(
            records = stats.total_records,
            completed = stats.scenarios_completed,
            failed = stats.failed_scenarios.len(),
            elapsed_ms = stats.elapsed_ms,
            "dataset generated"
        );

        Ok(GeneratedDataset {
            complete,
            splits,
            stats,
            request: resolved,
        })
    }

    fn run_scenario(
        &self,
        simulator: &ScenarioSimulator,
        scenario_id: u32,
        seed: u64,
        resolved: &ResolvedRequest,
        started: Instant,
    ) -> Result<Vec<DataPoint>, PhotoforgeError> {
        if let Some(limit) = self.timeout {
            if started.elapsed() > limit {
                return Err(PhotoforgeError::Timeout(limit.as_secs()));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let params = ParameterSampler::new(&self.model.ranges).sample(resolved.noise_level, &mut rng);
        debug!(scenario_id, ?params, "sampled scenario parameters");

        let points = simulator.simulate(
            scenario_id,
            &params,
            resolved.hours_per_scenario,
            resolved.time_step_hours,
            &mut rng,
        )?;

        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(PhotoforgeError::ScenarioFailed {
                scenario_id,
                reason: format!("non-finite value at hour {}", bad.time_h),
            });
        }
        Ok(points)
    }
}
