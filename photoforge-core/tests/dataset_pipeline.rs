use photoforge_core::{
    analysis::{self, CellValue},
    dataset::{split_sizes, DatasetOrchestrator},
    error::PhotoforgeError,
    export::{self, COMPLETE_DATASET_FILE, METADATA_FILE, TEST_DATA_FILE, TRAINING_DATA_FILE, VALIDATION_DATA_FILE},
    logger::{self, COLUMNS},
};
use photoforge_schemas::{
    data_point::DataPoint,
    environment::ToleranceRange,
    model::ModelDefinition,
    request::{DatasetRequest, RequestLimits, VariabilityLevel},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{fs, time::Duration};

fn request(scenarios: u32, hours: u32, seed: u64) -> DatasetRequest {
    DatasetRequest {
        seed: Some(seed),
        variability_level: Some(VariabilityLevel::Medium),
        ..DatasetRequest::new(scenarios, hours)
    }
}

#[test]
fn generates_and_splits_every_record() {
    let orchestrator = DatasetOrchestrator::new(ModelDefinition::research_grade());
    let dataset = orchestrator.generate(&request(5, 48, 11)).unwrap();

    let total = 5 * 48;
    assert_eq!(dataset.complete.len(), total);
    let (train, valid, test) = split_sizes(total);
    assert_eq!(dataset.splits.training.len(), train);
    assert_eq!(dataset.splits.validation.len(), valid);
    assert_eq!(dataset.splits.test.len(), test);
    assert_eq!(dataset.stats.total_records, total);
    assert_eq!(dataset.stats.scenarios_completed, 5);
    assert!(dataset.stats.failed_scenarios.is_empty());

    // Complete dataset stays ordered by scenario then time.
    for window in dataset.complete.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        assert!(a.scenario_id < b.scenario_id || (a.scenario_id == b.scenario_id && a.time_h < b.time_h));
    }
    assert_eq!(dataset.stats.summary.records, total);
    assert!(dataset.stats.summary.columns.contains_key("Biomass_g_L"));
}

#[test]
fn seed_determines_output_regardless_of_worker_count() {
    let model = ModelDefinition::conservative();
    let single = DatasetOrchestrator::new(model.clone())
        .with_worker_threads(1)
        .generate(&request(6, 24, 99))
        .unwrap();
    let parallel = DatasetOrchestrator::new(model)
        .with_worker_threads(4)
        .generate(&request(6, 24, 99))
        .unwrap();

    assert_eq!(single.complete, parallel.complete);
    assert_eq!(single.splits, parallel.splits);
}

#[test]
fn invalid_requests_are_rejected_before_simulation() {
    let orchestrator = DatasetOrchestrator::new(ModelDefinition::conservative()).with_limits(RequestLimits {
        max_scenarios: 3,
        ..RequestLimits::default()
    });
    let err = orchestrator.generate(&request(4, 24, 1)).unwrap_err();
    assert!(matches!(err, PhotoforgeError::InvalidRequest(_)));
    assert!(err.is_client_error());
}

#[test]
fn exhausted_time_budget_aborts_the_run() {
    let orchestrator = DatasetOrchestrator::new(ModelDefinition::conservative()).with_timeout(Duration::ZERO);
    let err = orchestrator.generate(&request(2, 24, 1)).unwrap_err();
    assert!(matches!(err, PhotoforgeError::Timeout(_)));
    assert!(!err.is_client_error());
}

#[test]
fn exported_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(3, 30, 5);
    let dataset = DatasetOrchestrator::new(ModelDefinition::research_grade())
        .generate(&req)
        .unwrap();
    let files = export::export_dataset(dir.path(), &dataset, &req).unwrap();

    let complete = analysis::read_data_points(&files.complete).unwrap();
    assert_eq!(complete, dataset.complete);
    let training = analysis::read_data_points(&files.training).unwrap();
    assert_eq!(training, dataset.training().cloned().collect::<Vec<_>>());
    assert_eq!(analysis::read_data_points(&files.validation).unwrap().len(), dataset.splits.validation.len());
    assert_eq!(analysis::read_data_points(&files.test).unwrap().len(), dataset.splits.test.len());

    for name in [COMPLETE_DATASET_FILE, TRAINING_DATA_FILE, VALIDATION_DATA_FILE, TEST_DATA_FILE] {
        let table = analysis::preview_rows(&dir.path().join(name), 1).unwrap();
        assert_eq!(table.headers, COLUMNS);
    }

    let metadata: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap()).unwrap();
    assert_eq!(metadata["stats"]["totalRecords"], 90);
    assert_eq!(metadata["request"]["scenarios"], 3);
    assert_eq!(metadata["stats"]["seed"], 5);
}

#[test]
fn tolerant_reader_keeps_categorical_columns_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = DatasetOrchestrator::new(ModelDefinition::conservative())
        .generate(&request(1, 12, 3))
        .unwrap();
    let path = dir.path().join("rows.csv");
    logger::write_data_points(&path.to_string_lossy(), &dataset.complete).unwrap();

    let table = analysis::read_table(&path).unwrap();
    assert_eq!(table.rows.len(), 12);
    let regime = table.column_index("Light_Regime").unwrap();
    assert!(matches!(table.rows[0][regime], CellValue::Text(_)));
    let biomass = table.numeric_column("Biomass_g_L");
    assert_eq!(biomass.len(), 12);
    assert_eq!(biomass[0], dataset.complete[0].biomass);

    let preview = analysis::preview_rows(&path, 5).unwrap();
    assert_eq!(preview.rows.len(), 5);
    assert_eq!(preview.rows, table.rows[..5].to_vec());

    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let sample = analysis::sample_rows(&path, 4, &mut rng).unwrap();
    assert_eq!(sample.rows.len(), 4);
    for row in &sample.rows {
        assert!(table.rows.contains(row));
    }
    let everything = analysis::sample_rows(&path, 100, &mut rng).unwrap();
    assert_eq!(everything.rows.len(), 12);
}

#[test]
fn empty_split_still_gets_a_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let nothing: Vec<DataPoint> = Vec::new();
    assert_eq!(logger::write_data_points(&path.to_string_lossy(), &nothing).unwrap(), 0);
    let table = analysis::read_table(&path).unwrap();
    assert_eq!(table.headers, COLUMNS);
    assert!(table.rows.is_empty());
    assert!(analysis::read_data_points(&path).unwrap().is_empty());
}

/// Cell counts overflow to infinity once biomass passes ~1.8 g/L.
fn overflowing_model(initial_biomass: ToleranceRange<f64>) -> ModelDefinition {
    let mut model = ModelDefinition::conservative();
    model.name = "overflowing".to_string();
    model.kinetics.cells_per_gram = 1e308;
    model.ranges.initial_biomass = initial_biomass;
    model.ranges.ki_biomass = ToleranceRange::new(9.0, 10.0);
    model
}

#[test]
fn failing_scenarios_are_isolated() {
    let orchestrator = DatasetOrchestrator::new(overflowing_model(ToleranceRange::new(0.01, 4.0)));
    let dataset = orchestrator.generate(&request(24, 6, 17)).unwrap();
    let stats = &dataset.stats;

    assert!(!stats.failed_scenarios.is_empty());
    assert!(stats.scenarios_completed > 0);
    assert_eq!(stats.scenarios_completed as usize + stats.failed_scenarios.len(), 24);
    assert_eq!(dataset.complete.len(), stats.scenarios_completed as usize * 6);
    assert!(dataset.complete.iter().all(|p| p.is_finite()));
    for failure in &stats.failed_scenarios {
        assert!(failure.reason.contains("non-finite"), "{}", failure.reason);
        assert!(dataset.complete.iter().all(|p| p.scenario_id != failure.scenario_id));
    }
}

#[test]
fn every_scenario_failing_is_an_error() {
    let orchestrator = DatasetOrchestrator::new(overflowing_model(ToleranceRange::new(2.5, 4.0)));
    let err = orchestrator.generate(&request(4, 6, 17)).unwrap_err();
    assert!(matches!(err, PhotoforgeError::AllScenariosFailed(4)));
    assert!(!err.is_client_error());
}

#[test]
fn timeseries_log_receives_every_simulated_record() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("timeseries.csv");
    let dataset = DatasetOrchestrator::new(ModelDefinition::conservative())
        .with_timeseries_log(&log)
        .generate(&request(2, 5, 8))
        .unwrap();

    let mut logged = analysis::read_data_points(&log).unwrap();
    logged.sort_by(|a, b| a.scenario_id.cmp(&b.scenario_id).then(a.time_h.total_cmp(&b.time_h)));
    assert_eq!(logged, dataset.complete);
}
