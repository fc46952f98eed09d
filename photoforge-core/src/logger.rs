use crate::error::PhotoforgeError;
use csv::Writer;
use photoforge_schemas::data_point::DataPoint;
use std::fs;

/// Column headers of every dataset file, in serialization order.
pub const COLUMNS: [&str; 33] = [
    "Scenario_ID",
    "Time_h",
    "Timestamp",
    "Light_Regime",
    "Stress_Condition",
    "Temperature_C",
    "pH",
    "Light_Intensity_umol_m2_s",
    "Biomass_g_L",
    "Cell_Concentration_cells_mL",
    "Nutrients_g_L",
    "Dissolved_Oxygen_mg_L",
    "CO2_Fraction",
    "Light_Factor",
    "Temperature_Factor",
    "pH_Factor",
    "Nutrient_Factor",
    "Density_Factor",
    "Specific_Growth_Rate_h",
    "Productivity_g_L_day",
    "Cumulative_Productivity_g_L",
    "Average_Productivity_g_L_day",
    "Optical_Density_680",
    "Light_Use_Efficiency",
    "Chlorophyll_pct",
    "Protein_pct",
    "Lipid_pct",
    "Carbohydrate_pct",
    "Growth_Phase",
    "Thermal_Stress",
    "pH_Stress",
    "Nutrient_Stress",
    "Light_Stress",
];

/// Streams `DataPoint` records into a CSV file, one row per record.
pub struct TimeSeriesLogger {
    writer: Writer<fs::File>,
    path: String,
    rows: usize,
}

impl TimeSeriesLogger {
    pub fn new(path: &str) -> Result<Self, PhotoforgeError> {
        let writer = Writer::from_path(path).map_err(|e| PhotoforgeError::CsvError(path.to_string(), e))?;
        Ok(Self {
            writer,
            path: path.to_string(),
            rows: 0,
        })
    }

    pub fn log_point(&mut self, point: &DataPoint) -> Result<(), PhotoforgeError> {
        self.writer
            .serialize(point)
            .map_err(|e| PhotoforgeError::CsvError(self.path.clone(), e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn log_points<'a>(&mut self, points: impl IntoIterator<Item = &'a DataPoint>) -> Result<(), PhotoforgeError> {
        for point in points {
            self.log_point(point)?;
        }
        self.writer
            .flush()
            .map_err(|e| PhotoforgeError::FileIO(self.path.clone(), e))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes the file. A logger that never saw a record still writes the header
    /// row so every dataset file carries the same columns.
    pub fn finish(mut self) -> Result<(), PhotoforgeError> {
        if self.rows == 0 {
            self.writer
                .write_record(COLUMNS)
                .map_err(|e| PhotoforgeError::CsvError(self.path.clone(), e))?;
        }
        self.writer
            .flush()
            .map_err(|e| PhotoforgeError::FileIO(self.path, e))
    }
}

/// Writes `points` to a fresh CSV file at `path`.
pub fn write_data_points<'a>(
    path: &str,
    points: impl IntoIterator<Item = &'a DataPoint>,
) -> Result<usize, PhotoforgeError> {
    let mut logger = TimeSeriesLogger::new(path)?;
    logger.log_points(points)?;
    let rows = logger.rows();
    logger.finish()?;
    Ok(rows)
}
