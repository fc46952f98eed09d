//! Writes a generated dataset to disk. Called only after all simulation work has
//! finished; each file is flushed and closed before the next one is opened.

use crate::{dataset::GeneratedDataset, error::PhotoforgeError, logger};
use chrono::{DateTime, Utc};
use photoforge_schemas::{data_point::DataPoint, request::DatasetRequest, stats::GenerationStats};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const COMPLETE_DATASET_FILE: &str = "complete_dataset.csv";
pub const TRAINING_DATA_FILE: &str = "training_data.csv";
pub const VALIDATION_DATA_FILE: &str = "validation_data.csv";
pub const TEST_DATA_FILE: &str = "test_data.csv";
pub const METADATA_FILE: &str = "metadata.json";

/// Generation parameters and statistics stored next to the CSV files.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata<'a> {
    pub generated_at: DateTime<Utc>,
    pub generator_version: &'static str,
    pub request: &'a DatasetRequest,
    pub stats: &'a GenerationStats,
    pub files: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFiles {
    pub complete: PathBuf,
    pub training: PathBuf,
    pub validation: PathBuf,
    pub test: PathBuf,
    pub metadata: PathBuf,
}

/// Writes the four dataset files and `metadata.json` into `output_dir`.
///
/// On failure every file already written is removed again, along with
/// `output_dir` itself when this call created it.
pub fn export_dataset(
    output_dir: &Path,
    dataset: &GeneratedDataset,
    request: &DatasetRequest,
) -> Result<ExportedFiles, PhotoforgeError> {
    let created = !output_dir.exists();
    fs::create_dir_all(output_dir).map_err(|e| PhotoforgeError::FileIO(output_dir.display().to_string(), e))?;

    let files = ExportedFiles {
        complete: output_dir.join(COMPLETE_DATASET_FILE),
        training: output_dir.join(TRAINING_DATA_FILE),
        validation: output_dir.join(VALIDATION_DATA_FILE),
        test: output_dir.join(TEST_DATA_FILE),
        metadata: output_dir.join(METADATA_FILE),
    };

    match write_files(&files, dataset, request) {
        Ok(()) => Ok(files),
        Err(e) => {
            warn!(dir = %output_dir.display(), error = %e, "export failed, discarding partial output");
            discard(output_dir, &files, created);
            Err(e)
        }
    }
}

fn write_files(files: &ExportedFiles, dataset: &GeneratedDataset, request: &DatasetRequest) -> Result<(), PhotoforgeError> {
    write_csv(&files.complete, dataset.complete.iter())?;
    write_csv(&files.training, dataset.training())?;
    write_csv(&files.validation, dataset.validation())?;
    write_csv(&files.test, dataset.test())?;

    let metadata = DatasetMetadata {
        generated_at: Utc::now(),
        generator_version: env!("CARGO_PKG_VERSION"),
        request,
        stats: &dataset.stats,
        files: vec![
            COMPLETE_DATASET_FILE,
            TRAINING_DATA_FILE,
            VALIDATION_DATA_FILE,
            TEST_DATA_FILE,
        ],
    };
    write_json(&files.metadata, &metadata)
}

fn write_csv<'a>(path: &Path, points: impl IntoIterator<Item = &'a DataPoint>) -> Result<(), PhotoforgeError> {
    let rows = logger::write_data_points(&path.to_string_lossy(), points)?;
    info!(path = %path.display(), rows, "wrote dataset file");
    Ok(())
}

fn discard(output_dir: &Path, files: &ExportedFiles, created: bool) {
    if created {
        let _ = fs::remove_dir_all(output_dir);
        return;
    }
    for path in [&files.complete, &files.training, &files.validation, &files.test, &files.metadata] {
        if path.is_file() {
            let _ = fs::remove_file(path);
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PhotoforgeError> {
    let label = path.display().to_string();
    let file = fs::File::create(path).map_err(|e| PhotoforgeError::FileIO(label.clone(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| PhotoforgeError::FileIO(label, e))
}
