//! CSV export of finalized history.
//!
//! One summary row per finalized day. Rows are appended, so repeated exports
//! to the same file accumulate; the header is written only for a new file.

use crate::{HistoryRecord, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    date: String,
    meal_count: usize,
    total_calories: f64,
}

impl From<&HistoryRecord> for CsvRow {
    fn from(record: &HistoryRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            date: record.date.format("%Y-%m-%d").to_string(),
            meal_count: record.meals.len(),
            total_calories: record.total_calories,
        }
    }
}

/// Append history summary rows to `csv_path` and sync it to disk.
///
/// Returns the number of rows written.
pub fn export_history_csv(records: &[HistoryRecord], csv_path: &Path) -> Result<usize> {
    if records.is_empty() {
        tracing::info!("No history records to export");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} history records to {:?}", records.len(), csv_path);
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn record(d: u32, total: f64) -> HistoryRecord {
        HistoryRecord {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, d).unwrap(),
            meals: vec![],
            total_calories: total,
        }
    }

    #[test]
    fn test_export_creates_file_with_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("history.csv");

        let count = export_history_csv(&[record(1, 1800.5), record(2, 2000.0)], &csv_path).unwrap();
        assert_eq!(count, 2);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("id,date,meal_count,total_calories"));
        assert!(content.contains("2024-06-01"));
        assert!(content.contains("1800.5"));
    }

    #[test]
    fn test_export_appends_without_second_header() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        export_history_csv(&[record(1, 1800.0)], &csv_path).unwrap();
        export_history_csv(&[record(2, 1900.0)], &csv_path).unwrap();

        let reader = csv::Reader::from_path(&csv_path).unwrap();
        assert_eq!(reader.into_records().count(), 2);
    }

    #[test]
    fn test_export_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");
        assert_eq!(export_history_csv(&[], &csv_path).unwrap(), 0);
        assert!(!csv_path.exists());
    }
}
