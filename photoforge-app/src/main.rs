//! `photoforge` generates synthetic Chlorella vulgaris cultivation datasets and
//! inspects the CSV files it produced.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use photoforge_core::analysis::{self, Table};
use photoforge_schemas::request::{DataQuality, DatasetRequest, VariabilityLevel};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod config;
mod plotting;
mod response;
mod workflow;

use config::AppConfig;
use response::DatasetResponse;

#[derive(Parser, Debug)]
#[command(name = "photoforge", version)]
#[command(about = "Synthetic Chlorella vulgaris photobioreactor datasets")]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate scenarios and write the training/validation/test files
    Generate(GenerateArgs),
    /// Print the first rows (or a random sample) of a dataset file as CSV
    Preview {
        file: PathBuf,
        #[arg(long, default_value = "10")]
        rows: usize,
        /// Sample rows uniformly instead of taking the first ones
        #[arg(long)]
        sample: bool,
    },
    /// Print min/max/mean, growth phases and stress counts of a dataset file
    Stats { file: PathBuf },
    /// List the available model definitions
    Models {
        /// Print the full definition of one model as YAML
        #[arg(long)]
        show: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// Request file; the flags below override its values
    #[arg(long)]
    request: Option<PathBuf>,

    #[arg(long)]
    scenarios: Option<u32>,

    #[arg(long, conflicts_with = "days")]
    hours: Option<u32>,

    #[arg(long)]
    days: Option<u32>,

    #[arg(long, value_enum)]
    variability: Option<VariabilityArg>,

    #[arg(long, value_enum)]
    quality: Option<QualityArg>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    time_step: Option<f64>,

    /// Model definition name (overrides the configuration)
    #[arg(long)]
    model: Option<String>,

    /// Parent directory for the run directory (overrides the configuration)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also draw growth-curve charts
    #[arg(long)]
    plot: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum VariabilityArg {
    Low,
    Medium,
    High,
    Extreme,
}

impl From<VariabilityArg> for VariabilityLevel {
    fn from(arg: VariabilityArg) -> Self {
        match arg {
            VariabilityArg::Low => VariabilityLevel::Low,
            VariabilityArg::Medium => VariabilityLevel::Medium,
            VariabilityArg::High => VariabilityLevel::High,
            VariabilityArg::Extreme => VariabilityLevel::Extreme,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum QualityArg {
    Research,
    Industrial,
    Pilot,
}

impl From<QualityArg> for DataQuality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Research => DataQuality::Research,
            QualityArg::Industrial => DataQuality::Industrial,
            QualityArg::Pilot => DataQuality::Pilot,
        }
    }
}

impl GenerateArgs {
    /// The request file (if any) with the command-line flags applied on top.
    fn to_request(&self) -> Result<DatasetRequest> {
        let mut request = match &self.request {
            Some(path) => config::load_request(path)?,
            None => DatasetRequest {
                hours_per_scenario: None,
                ..DatasetRequest::new(10, 0)
            },
        };

        if let Some(scenarios) = self.scenarios {
            request.scenarios = scenarios;
        }
        if let Some(hours) = self.hours {
            request.hours_per_scenario = Some(hours);
            request.total_days = None;
        }
        if let Some(days) = self.days {
            request.total_days = Some(days);
            request.hours_per_scenario = None;
        }
        if let Some(level) = self.variability {
            request.variability_level = Some(level.into());
        }
        if let Some(quality) = self.quality {
            request.data_quality = Some(quality.into());
        }
        if self.seed.is_some() {
            request.seed = self.seed;
        }
        if self.time_step.is_some() {
            request.time_step_hours = self.time_step;
        }
        Ok(request)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the response JSON and CSV output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(ref args) => generate(cli.config.as_deref(), args),
        Command::Preview { ref file, rows, sample } => report(preview(file, rows, sample)),
        Command::Stats { ref file } => report(stats(file)),
        Command::Models { ref show } => report(models(cli.config.as_deref(), show.as_deref())),
    }
}

fn report(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn generate(config_path: Option<&Path>, args: &GenerateArgs) -> ExitCode {
    let outcome = AppConfig::load_or_default(config_path).and_then(|mut config| {
        if let Some(model) = &args.model {
            config.model = model.clone();
        }
        if let Some(output) = &args.output {
            config.output_dir = output.clone();
        }
        let request = args.to_request()?;
        workflow::run_generation(&config, request, args.plot)
    });

    let response = match outcome {
        Ok(output) => DatasetResponse::success(output.stats, output.output_dir.display().to_string()),
        Err(e) => {
            error!("{:#}", e);
            DatasetResponse::failure(&e)
        }
    };

    match response.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize response: {}", e),
    }

    match response.status_code {
        200 => ExitCode::SUCCESS,
        400 => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn preview(file: &Path, rows: usize, sample: bool) -> Result<()> {
    let table = if sample {
        analysis::sample_rows(file, rows, &mut rand::thread_rng())?
    } else {
        analysis::preview_rows(file, rows)?
    };
    write_table(&table, std::io::stdout().lock())
}

fn write_table<W: std::io::Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| match cell {
            analysis::CellValue::Number(value) => value.to_string(),
            analysis::CellValue::Text(text) => text.clone(),
        }))?;
    }
    writer.flush().context("Failed to write preview")?;
    Ok(())
}

fn stats(file: &Path) -> Result<()> {
    let points = analysis::read_data_points(file)?;
    let summary = analysis::summarize(&points);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn models(config_path: Option<&Path>, show: Option<&str>) -> Result<()> {
    let config = AppConfig::load_or_default(config_path)?;
    let library = config.model_library()?;

    match show {
        Some(name) => print!("{}", serde_yaml::to_string(library.get(name)?)?),
        None => {
            for model in library.models() {
                let marker = if model.name == config.model { "*" } else { " " };
                println!("{} {:<20} {}", marker, model.name, model.description);
            }
        }
    }
    Ok(())
}
