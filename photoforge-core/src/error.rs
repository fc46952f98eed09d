use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoforgeError {
    #[error("Scenario duration must be at least one hour")]
    InvalidDuration,

    #[error("Time step must be a positive number of hours, got {0}")]
    InvalidTimeStep(f64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model definition '{0}' not found")]
    ModelNotFound(String),

    #[error("Scenario {scenario_id} failed: {reason}")]
    ScenarioFailed { scenario_id: u32, reason: String },

    #[error("All {0} scenarios failed; no data was generated")]
    AllScenariosFailed(u32),

    #[error("Dataset generation exceeded the {0} s time limit")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to parse YAML from '{0}': {1}")]
    YamlParsing(String, #[source] serde_yaml::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}

impl PhotoforgeError {
    /// Errors caused by the caller's input rather than by the generator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PhotoforgeError::InvalidDuration
                | PhotoforgeError::InvalidTimeStep(_)
                | PhotoforgeError::InvalidRequest(_)
                | PhotoforgeError::ModelNotFound(_)
        )
    }
}
