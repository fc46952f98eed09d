use crate::error::PhotoforgeError;
use photoforge_schemas::{file_formats::ModelFile, model::ModelDefinition};
use std::{collections::BTreeMap, fs, path::Path};
use tracing::{debug, info};

/// The model definitions available to a run: the built-in presets plus any
/// definitions loaded from YAML files. Loaded definitions replace presets with the
/// same name.
#[derive(Debug, Clone)]
pub struct ModelLibrary {
    models: BTreeMap<String, ModelDefinition>,
}

impl Default for ModelLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelLibrary {
    pub fn builtin() -> Self {
        Self {
            models: ModelDefinition::builtin()
                .into_iter()
                .map(|m| (m.name.clone(), m))
                .collect(),
        }
    }

    /// Loads every `.yaml`/`.yml` file in `dir` on top of the built-in presets.
    pub fn load_dir(dir: &Path) -> Result<Self, PhotoforgeError> {
        let mut library = Self::builtin();
        info!("Loading model definitions from '{}'", dir.display());

        let entries = fs::read_dir(dir).map_err(|e| PhotoforgeError::FileIO(dir.display().to_string(), e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PhotoforgeError::FileIO(dir.display().to_string(), e))?;
            let path = entry.path();
            if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            for model in load_model_file(&path)? {
                debug!(model = %model.name, file = %path.display(), "registered model definition");
                library.insert(model);
            }
        }
        Ok(library)
    }

    pub fn insert(&mut self, model: ModelDefinition) {
        self.models.insert(model.name.clone(), model);
    }

    pub fn get(&self, name: &str) -> Result<&ModelDefinition, PhotoforgeError> {
        self.models
            .get(name)
            .ok_or_else(|| PhotoforgeError::ModelNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }
}

/// Parses a single YAML model file.
pub fn load_model_file(path: &Path) -> Result<Vec<ModelDefinition>, PhotoforgeError> {
    let label = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| PhotoforgeError::FileIO(label.clone(), e))?;
    let file: ModelFile = serde_yaml::from_str(&content).map_err(|e| PhotoforgeError::YamlParsing(label, e))?;
    Ok(file.models)
}
