//! Reading datasets back and summarizing them.

use crate::error::PhotoforgeError;
use photoforge_schemas::{
    data_point::{DataPoint, GrowthPhase},
    stats::{ColumnSummary, DatasetSummary},
};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::Path;

/// A single CSV cell, numeric when it parses as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(value) => CellValue::Number(value),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) => Some(*value),
            CellValue::Text(_) => None,
        }
    }
}

/// An untyped view of a CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn numeric_column(&self, name: &str) -> Vec<f64> {
        match self.column_index(name) {
            Some(index) => self
                .rows
                .iter()
                .filter_map(|row| row.get(index).and_then(CellValue::as_f64))
                .collect(),
            None => Vec::new(),
        }
    }
}

fn path_label(path: &Path) -> String {
    path.display().to_string()
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>, PhotoforgeError> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PhotoforgeError::CsvError(path_label(path), e))
}

fn headers_of(reader: &mut csv::Reader<std::fs::File>, path: &Path) -> Result<Vec<String>, PhotoforgeError> {
    Ok(reader
        .headers()
        .map_err(|e| PhotoforgeError::CsvError(path_label(path), e))?
        .iter()
        .map(str::to_string)
        .collect())
}

/// Reads a dataset file back into typed records.
pub fn read_data_points(path: &Path) -> Result<Vec<DataPoint>, PhotoforgeError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| PhotoforgeError::CsvError(path_label(path), e))?;
    let mut points = Vec::new();
    for result in reader.deserialize() {
        let point: DataPoint = result.map_err(|e| PhotoforgeError::CsvError(path_label(path), e))?;
        points.push(point);
    }
    Ok(points)
}

/// Reads any CSV file, keeping non-numeric cells as text.
pub fn read_table(path: &Path) -> Result<Table, PhotoforgeError> {
    read_rows(path, None)
}

/// Reads at most `limit` rows from the start of the file without loading the rest.
pub fn preview_rows(path: &Path, limit: usize) -> Result<Table, PhotoforgeError> {
    read_rows(path, Some(limit))
}

fn read_rows(path: &Path, limit: Option<usize>) -> Result<Table, PhotoforgeError> {
    let mut reader = open_reader(path)?;
    let headers = headers_of(&mut reader, path)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        if limit.map_or(false, |limit| rows.len() >= limit) {
            break;
        }
        let record = result.map_err(|e| PhotoforgeError::CsvError(path_label(path), e))?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }
    Ok(Table { headers, rows })
}

/// Draws a uniform random sample of `limit` rows in a single pass over the file
/// (reservoir sampling); memory use is bounded by `limit`.
pub fn sample_rows<R: Rng + ?Sized>(path: &Path, limit: usize, rng: &mut R) -> Result<Table, PhotoforgeError> {
    let mut reader = open_reader(path)?;
    let headers = headers_of(&mut reader, path)?;
    let mut reservoir: Vec<Vec<CellValue>> = Vec::with_capacity(limit);
    if limit == 0 {
        return Ok(Table { headers, rows: reservoir });
    }

    for (seen, result) in reader.records().enumerate() {
        let record = result.map_err(|e| PhotoforgeError::CsvError(path_label(path), e))?;
        if reservoir.len() < limit {
            reservoir.push(record.iter().map(CellValue::parse).collect());
        } else {
            let slot = rng.gen_range(0..=seen);
            if slot < limit {
                reservoir[slot] = record.iter().map(CellValue::parse).collect();
            }
        }
    }
    Ok(Table {
        headers,
        rows: reservoir,
    })
}

/// Min/max/mean of every numeric column, growth-phase distribution and stress counts.
pub fn summarize(points: &[DataPoint]) -> DatasetSummary {
    let mut summary = DatasetSummary {
        records: points.len(),
        ..DatasetSummary::default()
    };

    let mut accumulators: BTreeMap<&'static str, (f64, f64, f64)> = BTreeMap::new();
    let mut phases: BTreeMap<GrowthPhase, usize> = BTreeMap::new();
    let mut stress: BTreeMap<&'static str, usize> = BTreeMap::new();

    for point in points {
        for (name, value) in point.numeric_fields() {
            let entry = accumulators.entry(name).or_insert((f64::INFINITY, f64::NEG_INFINITY, 0.0));
            entry.0 = entry.0.min(value);
            entry.1 = entry.1.max(value);
            entry.2 += value;
        }
        *phases.entry(point.growth_phase).or_insert(0) += 1;
        for (name, flagged) in point.stress_flags() {
            let count = stress.entry(name).or_insert(0);
            if flagged {
                *count += 1;
            }
        }
    }

    let n = points.len().max(1) as f64;
    summary.columns = accumulators
        .into_iter()
        .map(|(name, (min, max, sum))| (name.to_string(), ColumnSummary { min, max, mean: sum / n }))
        .collect();
    summary.growth_phases = GrowthPhase::ALL
        .iter()
        .map(|phase| (phase.as_str().to_string(), phases.get(phase).copied().unwrap_or(0)))
        .collect();
    summary.stress_counts = stress.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    summary
}
