use crate::config::AppConfig;
use crate::plotting;
use anyhow::{Context, Result};
use photoforge_core::{dataset::GeneratedDataset, export};
use photoforge_schemas::{request::DatasetRequest, stats::GenerationStats};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything a finished generation run left on disk.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub output_dir: PathBuf,
    pub plots: Vec<PathBuf>,
    pub stats: GenerationStats,
}

/// Validates and runs `request`, then writes the dataset into a fresh run directory.
/// Nothing is written when the request is rejected or every scenario fails.
pub fn run_generation(config: &AppConfig, request: DatasetRequest, plot: bool) -> Result<GenerationOutput> {
    info!("--- [Workflow] Starting Dataset Generation ---");
    let request = config.apply_defaults(request);
    let orchestrator = config.orchestrator()?;

    let dataset = orchestrator
        .generate(&request)
        .context("Dataset generation failed")?;

    let output_dir = run_directory(&config.output_dir, &orchestrator.model().name, dataset.stats.seed);
    info!("--- [Workflow] Writing Dataset to '{}' ---", output_dir.display());

    // Record the resolved seed so the run can be reproduced from metadata.json.
    let recorded = DatasetRequest {
        seed: Some(dataset.stats.seed),
        time_step_hours: Some(dataset.request.time_step_hours),
        ..request
    };
    let files = export::export_dataset(&output_dir, &dataset, &recorded)
        .with_context(|| format!("Failed to export dataset to {}", output_dir.display()))?;

    let plots = if plot {
        plots_or_warn(&output_dir, &files.complete)
    } else {
        Vec::new()
    };

    print_summary_report(&dataset, &output_dir);

    Ok(GenerationOutput {
        output_dir,
        plots,
        stats: dataset.stats,
    })
}

/// The dataset is already on disk by now, so a chart failure only costs the charts.
fn plots_or_warn(output_dir: &Path, dataset_path: &Path) -> Vec<PathBuf> {
    plotting::generate_all_plots(output_dir, dataset_path).unwrap_or_else(|e| {
        warn!("[Plotting] Skipping charts: {:#}", e);
        Vec::new()
    })
}

fn run_directory(base: &Path, model: &str, seed: u64) -> PathBuf {
    base.join(format!(
        "{}_{}_seed{}",
        model,
        chrono::Utc::now().format("%Y%m%d_%H%M%S"),
        seed
    ))
}

fn print_summary_report(dataset: &GeneratedDataset, output_dir: &Path) {
    let stats = &dataset.stats;

    eprintln!("\n--- [Dataset Summary Report] ---");
    eprintln!("========================================");
    eprintln!("Model: {} (seed {})", stats.model, stats.seed);
    eprintln!(
        "Scenarios: {} completed / {} requested, {} h each at {} h steps",
        stats.scenarios_completed, stats.scenarios_requested, stats.hours_per_scenario, stats.time_step_hours
    );
    for failure in &stats.failed_scenarios {
        eprintln!("  - Scenario {} failed: {}", failure.scenario_id, failure.reason);
    }
    eprintln!("Noise Level: {:.2}", stats.noise_level);
    eprintln!("Elapsed: {} ms", stats.elapsed_ms);
    eprintln!("----------------------------------------");

    eprintln!("\nRecords:");
    eprintln!("  - Complete:   {:>8}", stats.total_records);
    eprintln!("  - Training:   {:>8}", stats.training_records);
    eprintln!("  - Validation: {:>8}", stats.validation_records);
    eprintln!("  - Test:       {:>8}", stats.test_records);

    eprintln!("\nKey Columns (min / mean / max):");
    for name in ["Biomass_g_L", "Specific_Growth_Rate_h", "Productivity_g_L_day", "Nutrients_g_L"] {
        if let Some(column) = stats.summary.columns.get(name) {
            eprintln!(
                "  - {:<24} {:>10.4} / {:>10.4} / {:>10.4}",
                name, column.min, column.mean, column.max
            );
        }
    }

    eprintln!("\nGrowth Phases:");
    for (phase, count) in &stats.summary.growth_phases {
        eprintln!("  - {:<12} {:>8}", phase, count);
    }

    eprintln!("\nStress Flags:");
    for (flag, count) in &stats.summary.stress_counts {
        eprintln!("  - {:<16} {:>8}", flag, count);
    }

    eprintln!("\nResults are in '{}'", output_dir.display());
    eprintln!("========================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoforge_core::export::{COMPLETE_DATASET_FILE, METADATA_FILE};
    use std::fs;

    fn config_in(dir: &Path) -> AppConfig {
        AppConfig {
            model: "conservative".to_string(),
            output_dir: dir.to_path_buf(),
            worker_threads: Some(2),
            ..AppConfig::default()
        }
    }

    #[test]
    fn writes_a_complete_run_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let request = DatasetRequest {
            seed: Some(21),
            ..DatasetRequest::new(3, 24)
        };

        let output = run_generation(&config, request, false).unwrap();
        assert!(output.output_dir.starts_with(dir.path()));
        assert!(output.output_dir.join(COMPLETE_DATASET_FILE).is_file());
        assert!(output.plots.is_empty());
        assert_eq!(output.stats.total_records, 72);
        assert_eq!(output.stats.seed, 21);

        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output.output_dir.join(METADATA_FILE)).unwrap()).unwrap();
        assert_eq!(metadata["request"]["seed"], 21);
        assert_eq!(metadata["request"]["timeStepHours"], 1.0);
    }

    #[test]
    fn chart_failure_keeps_the_exported_run() {
        let dir = tempfile::tempdir().unwrap();
        let plots = plots_or_warn(dir.path(), &dir.path().join(COMPLETE_DATASET_FILE));
        assert!(plots.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejected_request_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = run_generation(&config, DatasetRequest::new(0, 24), false).unwrap_err();
        assert!(format!("{:#}", err).contains("scenarios"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
