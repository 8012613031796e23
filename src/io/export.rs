//! Export a selected series to CSV or JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::EntitySeries;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct SeriesCsvRow<'a> {
    entity: &'a str,
    category: &'a str,
    date: String,
    forecast: f64,
    lower: f64,
    upper: f64,
}

/// Write one entity's rows to a CSV file.
pub fn write_series_csv(path: &Path, series: &EntitySeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}'", path.display()), e))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in &series.rows {
        writer
            .serialize(SeriesCsvRow {
                entity: &row.entity,
                category: row.category.display_name(),
                date: row.date.format("%Y-%m-%d").to_string(),
                forecast: row.forecast_value,
                lower: row.lower_bound,
                upper: row.upper_bound,
            })
            .map_err(|e| AppError::Export(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV '{}'", path.display()), e))?;

    info!(path = %path.display(), rows = series.len(), "wrote series CSV");
    Ok(())
}

/// Write one entity's series to a pretty-printed JSON file.
pub fn write_series_json(path: &Path, series: &EntitySeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export JSON '{}'", path.display()), e))?;
    serde_json::to_writer_pretty(file, series)
        .map_err(|e| AppError::Export(format!("Failed to write series JSON: {e}")))?;

    info!(path = %path.display(), rows = series.len(), "wrote series JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::{Category, ForecastRow};
    use crate::io::ingest::load_forecast_csv;
    use crate::query::select_series;

    fn series() -> EntitySeries {
        let row = |m: u32, v: f64| ForecastRow {
            entity: "Villa A - Expense".to_string(),
            date: NaiveDate::from_ymd_opt(2025, m, 1).unwrap(),
            forecast_value: v,
            lower_bound: v * 0.7,
            upper_bound: v * 1.3,
            category: Category::Expense,
        };
        EntitySeries {
            entity: "Villa A - Expense".to_string(),
            category: Category::Expense,
            rows: vec![row(1, 100.0), row(2, 200.0)],
        }
    }

    #[test]
    fn csv_export_reads_back_as_the_same_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let original = series();
        write_series_csv(&path, &original).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("entity,category,date,forecast,lower,upper\n"));

        // The export header uses names the ingest layer understands.
        let table = load_forecast_csv(&path).unwrap();
        let reread = select_series(&table, "Villa A - Expense").unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn json_export_has_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_series_json(&path, &series()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["entity"], "Villa A - Expense");
        assert_eq!(value["category"], "Expense");
        assert_eq!(value["rows"].as_array().unwrap().len(), 2);
        assert_eq!(value["rows"][0]["date"], "2025-01-01");
    }
}
