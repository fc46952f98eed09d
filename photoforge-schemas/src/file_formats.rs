use crate::{model::ModelDefinition, request::DatasetRequest};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ModelFile {
    pub schema_version: String,
    pub models: Vec<ModelDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct RequestFile {
    pub schema_version: String,
    pub request: DatasetRequest,
}
