use crate::{error::PhotoforgeError, logger::TimeSeriesLogger, simulation::engine::ScenarioSimulator};
use photoforge_schemas::model::{KineticSettings, ModelDefinition};
use std::sync::Mutex;

/// A fluent builder for constructing a `ScenarioSimulator`.
///
/// The builder selects the kinetic constants (from a named model definition or
/// directly), and optionally attaches a CSV time-series log that receives every
/// simulated data point.
#[derive(Default)]
pub struct SimulatorBuilder {
    model_name: Option<String>,
    kinetics: Option<KineticSettings>,
    log_path: Option<String>,
}

impl SimulatorBuilder {
    /// Creates a new, empty `SimulatorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the kinetic constants of a `ModelDefinition`.
    pub fn with_model(mut self, model: &ModelDefinition) -> Self {
        self.model_name = Some(model.name.clone());
        self.kinetics = Some(model.kinetics.clone());
        self
    }

    /// Overrides the kinetic constants directly.
    pub fn with_kinetics(mut self, kinetics: KineticSettings) -> Self {
        self.kinetics = Some(kinetics);
        self
    }

    /// Configures the simulator to write time-series data to the specified CSV file.
    pub fn with_timeseries_logging_to_file(mut self, path: &str) -> Self {
        self.log_path = Some(path.to_string());
        self
    }

    /// Consumes the builder and returns a fully configured `ScenarioSimulator`.
    ///
    /// # Errors
    ///
    /// Returns a `PhotoforgeError` if the kinetic constants cannot describe a valid
    /// response curve, or if the time-series log file cannot be created.
    pub fn build(self) -> Result<ScenarioSimulator, PhotoforgeError> {
        let kinetics = self.kinetics.unwrap_or_default();
        validate_kinetics(&kinetics)?;

        let logger = match self.log_path {
            Some(path) => Some(Mutex::new(TimeSeriesLogger::new(&path)?)),
            None => None,
        };

        Ok(ScenarioSimulator {
            model_name: self.model_name.unwrap_or_else(|| "custom".to_string()),
            kinetics,
            logger,
        })
    }
}

fn validate_kinetics(kinetics: &KineticSettings) -> Result<(), PhotoforgeError> {
    let positive = [
        ("temperature_width", kinetics.temperature_width),
        ("ph_width", kinetics.ph_width),
        ("photoinhibition_scale", kinetics.photoinhibition_scale),
        ("cells_per_gram", kinetics.cells_per_gram),
        ("od_per_gram", kinetics.od_per_gram),
        ("ph_sinusoid_period_hours", kinetics.ph_sinusoid_period_hours),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(PhotoforgeError::ConfigError(format!(
                "kinetic setting '{}' must be positive, got {}",
                name, value
            )));
        }
    }

    if !(kinetics.nutrient_exponent.is_finite() && kinetics.nutrient_exponent >= 1.0) {
        return Err(PhotoforgeError::ConfigError(format!(
            "nutrient_exponent must be at least 1, got {}",
            kinetics.nutrient_exponent
        )));
    }
    if !(0.0..=1.0).contains(&kinetics.cutoff_factor) {
        return Err(PhotoforgeError::ConfigError(format!(
            "cutoff_factor must lie in [0, 1], got {}",
            kinetics.cutoff_factor
        )));
    }
    if !(kinetics.nutrient_floor > 0.0 && kinetics.min_viable_biomass > 0.0) {
        return Err(PhotoforgeError::ConfigError(
            "nutrient_floor and min_viable_biomass must be positive".to_string(),
        ));
    }
    for (name, range) in [
        ("viable_temperature", &kinetics.viable_temperature),
        ("viable_ph", &kinetics.viable_ph),
        ("oxygen_bounds", &kinetics.oxygen_bounds),
        ("co2_bounds", &kinetics.co2_bounds),
    ] {
        if !(range.min < range.max) {
            return Err(PhotoforgeError::ConfigError(format!(
                "range '{}' must have min < max, got [{}, {}]",
                name, range.min, range.max
            )));
        }
    }
    Ok(())
}
