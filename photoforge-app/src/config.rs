use anyhow::{Context, Result};
use photoforge_core::{dataset::DatasetOrchestrator, library::ModelLibrary};
use photoforge_schemas::{file_formats::RequestFile, request::{DatasetRequest, RequestLimits}};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use tracing::info;

/// Settings for a generation run, read from a YAML file. Every field has a default
/// so a partial file (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name of the model definition to simulate with.
    pub model: String,
    /// Directory of extra model definition files, loaded on top of the presets.
    pub model_dir: Option<PathBuf>,
    /// Parent directory of the timestamped run directories.
    pub output_dir: PathBuf,
    /// Used when the request itself carries no seed.
    pub seed: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub worker_threads: Option<usize>,
    /// Used when the request itself carries no time step.
    pub time_step_hours: Option<f64>,
    pub limits: RequestLimits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "research_grade".to_string(),
            model_dir: None,
            output_dir: PathBuf::from("./data/runs"),
            seed: None,
            timeout_secs: Some(300),
            worker_threads: None,
            time_step_hours: None,
            limits: RequestLimits::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from '{}'", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {}", path.display()))
    }

    /// Loads the configured file, or the defaults when none is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The built-in presets, extended by `model_dir` when one is configured.
    pub fn model_library(&self) -> Result<ModelLibrary> {
        match &self.model_dir {
            Some(dir) => ModelLibrary::load_dir(dir)
                .with_context(|| format!("Failed to load model definitions from {}", dir.display())),
            None => Ok(ModelLibrary::builtin()),
        }
    }

    pub fn orchestrator(&self) -> Result<DatasetOrchestrator> {
        let library = self.model_library()?;
        let model = library.get(&self.model)?.clone();

        let mut orchestrator = DatasetOrchestrator::new(model).with_limits(self.limits.clone());
        if let Some(secs) = self.timeout_secs {
            orchestrator = orchestrator.with_timeout(Duration::from_secs(secs));
        }
        if let Some(threads) = self.worker_threads {
            orchestrator = orchestrator.with_worker_threads(threads);
        }
        Ok(orchestrator)
    }

    /// Fills the request's unset seed and time step from the configuration.
    pub fn apply_defaults(&self, mut request: DatasetRequest) -> DatasetRequest {
        if request.seed.is_none() {
            request.seed = self.seed;
        }
        if request.time_step_hours.is_none() {
            request.time_step_hours = self.time_step_hours;
        }
        request
    }
}

/// Reads a request file (`schema_version` plus a `request` block).
pub fn load_request(path: &Path) -> Result<DatasetRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path.display()))?;
    let file: RequestFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from {}", path.display()))?;
    Ok(file.request)
}
