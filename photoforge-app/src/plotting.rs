//! Growth-curve and culture-condition charts drawn from an exported dataset.

use anyhow::{Context, Result};
use photoforge_core::analysis::{self, Table};
use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const GROWTH_CURVES_FILE: &str = "growth_curves.png";
pub const CULTURE_CONDITIONS_FILE: &str = "culture_conditions.png";

/// More lines than this make the legend unreadable.
const MAX_PLOTTED_SCENARIOS: usize = 12;

/// Time series of one scenario, as read back from the dataset file.
#[derive(Clone, Debug, Default)]
struct ScenarioSeries {
    time_h: Vec<f64>,
    biomass: Vec<f64>,
    temperature: Vec<f64>,
    ph: Vec<f64>,
}

/// Draws every chart for a run into `output_dir` and returns the written paths.
pub fn generate_all_plots(output_dir: &Path, dataset_path: &Path) -> Result<Vec<PathBuf>> {
    info!("[Plotting] Generating graphs from '{}'", dataset_path.display());

    let table = analysis::read_table(dataset_path)
        .with_context(|| format!("Failed to read dataset for plotting: {}", dataset_path.display()))?;
    let series = group_by_scenario(&table);

    if series.is_empty() {
        warn!("[Plotting] No data to plot.");
        return Ok(Vec::new());
    }

    let growth = output_dir.join(GROWTH_CURVES_FILE);
    plot_growth_curves(&growth, &series)?;
    let conditions = output_dir.join(CULTURE_CONDITIONS_FILE);
    plot_culture_conditions(&conditions, &series)?;

    info!("[Plotting] Graphs have been saved to '{}'.", output_dir.display());
    Ok(vec![growth, conditions])
}

/// Splits the table into per-scenario series, keeping the first scenarios only.
fn group_by_scenario(table: &Table) -> BTreeMap<u32, ScenarioSeries> {
    let column = |name: &str| table.column_index(name);
    let (Some(id), Some(time), Some(biomass), Some(temperature), Some(ph)) = (
        column("Scenario_ID"),
        column("Time_h"),
        column("Biomass_g_L"),
        column("Temperature_C"),
        column("pH"),
    ) else {
        return BTreeMap::new();
    };

    let mut grouped: BTreeMap<u32, ScenarioSeries> = BTreeMap::new();
    for row in &table.rows {
        let value = |index: usize| row.get(index).and_then(|cell| cell.as_f64());
        let (Some(scenario), Some(t), Some(x), Some(temp), Some(p)) =
            (value(id), value(time), value(biomass), value(temperature), value(ph))
        else {
            continue;
        };
        let scenario = scenario as u32;
        if !grouped.contains_key(&scenario) && grouped.len() >= MAX_PLOTTED_SCENARIOS {
            continue;
        }
        let entry = grouped.entry(scenario).or_default();
        entry.time_h.push(t);
        entry.biomass.push(x);
        entry.temperature.push(temp);
        entry.ph.push(p);
    }
    grouped
}

fn max_of<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.copied().fold(0.0, f64::max)
}

/// One biomass line per scenario.
fn plot_growth_curves(path: &Path, series: &BTreeMap<u32, ScenarioSeries>) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_time = max_of(series.values().flat_map(|s| s.time_h.iter())).max(1.0);
    let max_biomass = max_of(series.values().flat_map(|s| s.biomass.iter())).max(1e-3);

    let mut chart = ChartBuilder::on(&root)
        .caption("Biomass Growth Over Time", ("sans-serif", 50).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..max_time, 0f64..max_biomass * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (hours)")
        .y_desc("Biomass (g/L)")
        .draw()?;

    for (i, (scenario_id, s)) in series.iter().enumerate() {
        let color = Palette99::pick(i);
        chart
            .draw_series(LineSeries::new(
                s.time_h.iter().copied().zip(s.biomass.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(format!("Scenario {}", scenario_id))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

/// Temperature and pH of every plotted scenario, stacked in two panels.
fn plot_culture_conditions(path: &Path, series: &BTreeMap<u32, ScenarioSeries>) -> Result<()> {
    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(384);

    let max_time = max_of(series.values().flat_map(|s| s.time_h.iter())).max(1.0);

    let mut temperature_chart = ChartBuilder::on(&upper)
        .caption("Temperature", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..max_time, 15f64..40f64)?;
    temperature_chart
        .configure_mesh()
        .x_desc("Time (hours)")
        .y_desc("Temperature (°C)")
        .draw()?;

    let mut ph_chart = ChartBuilder::on(&lower)
        .caption("pH", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..max_time, 6f64..9.5f64)?;
    ph_chart.configure_mesh().x_desc("Time (hours)").y_desc("pH").draw()?;

    for (i, s) in series.values().enumerate() {
        let color = Palette99::pick(i);
        temperature_chart.draw_series(LineSeries::new(
            s.time_h.iter().copied().zip(s.temperature.iter().copied()),
            color.stroke_width(1),
        ))?;
        ph_chart.draw_series(LineSeries::new(
            s.time_h.iter().copied().zip(s.ph.iter().copied()),
            color.stroke_width(1),
        ))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoforge_core::analysis::CellValue;

    fn row(scenario: f64, time: f64) -> Vec<CellValue> {
        vec![
            CellValue::Number(scenario),
            CellValue::Number(time),
            CellValue::Text("cyclic".into()),
            CellValue::Number(0.1 + time / 100.0),
            CellValue::Number(26.0),
            CellValue::Number(7.5),
        ]
    }

    #[test]
    fn groups_rows_by_scenario_and_caps_the_count() {
        let headers = ["Scenario_ID", "Time_h", "Light_Regime", "Biomass_g_L", "Temperature_C", "pH"];
        let mut rows = Vec::new();
        for scenario in 1..=20 {
            for hour in 0..3 {
                rows.push(row(f64::from(scenario), f64::from(hour)));
            }
        }
        let table = Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        };

        let series = group_by_scenario(&table);
        assert_eq!(series.len(), MAX_PLOTTED_SCENARIOS);
        assert_eq!(series[&1].time_h, vec![0.0, 1.0, 2.0]);
        assert!((series[&1].biomass[2] - 0.12).abs() < 1e-12);
    }

    #[test]
    fn missing_columns_yield_nothing() {
        let table = Table {
            headers: vec!["Time_h".into()],
            rows: vec![vec![CellValue::Number(0.0)]],
        };
        assert!(group_by_scenario(&table).is_empty());
    }
}
