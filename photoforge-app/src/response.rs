use photoforge_core::error::PhotoforgeError;
use photoforge_schemas::stats::GenerationStats;
use serde::Serialize;

/// The JSON document returned for a generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<GenerationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub status_code: u16,
}

impl DatasetResponse {
    pub fn success(stats: GenerationStats, output_dir: String) -> Self {
        Self {
            success: true,
            stats: Some(stats),
            output_dir: Some(output_dir),
            error: None,
            status_code: 200,
        }
    }

    /// 400 when the request itself was at fault, 500 for everything else.
    pub fn failure(err: &anyhow::Error) -> Self {
        let client_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<PhotoforgeError>())
            .map_or(false, PhotoforgeError::is_client_error);

        Self {
            success: false,
            stats: None,
            output_dir: None,
            error: Some(format!("{:#}", err)),
            status_code: if client_error { 400 } else { 500 },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn invalid_request_maps_to_400() {
        let err: anyhow::Result<()> = Err::<(), _>(PhotoforgeError::InvalidRequest("scenarios must be between 1 and 100".into()))
            .context("Dataset generation failed");
        let response = DatasetResponse::failure(&err.unwrap_err());
        assert_eq!(response.status_code, 400);
        assert!(!response.success);
        assert!(response.error.as_deref().unwrap().contains("scenarios must be between"));
    }

    #[test]
    fn other_failures_map_to_500() {
        let response = DatasetResponse::failure(&anyhow::Error::new(PhotoforgeError::AllScenariosFailed(3)));
        assert_eq!(response.status_code, 500);
        let response = DatasetResponse::failure(&anyhow::anyhow!("disk full"));
        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn success_serializes_camel_case_without_error() {
        let response = DatasetResponse::success(GenerationStats::default(), "./data/runs/x".into());
        let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["outputDir"], "./data/runs/x");
        assert!(json.get("error").is_none());
        assert!(json.get("statusCode").is_none());
        assert!(json["stats"].get("totalRecords").is_some());
    }
}
