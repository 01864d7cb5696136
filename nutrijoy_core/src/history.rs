//! Finalized-day history loading and per-day reports.

use crate::aggregator::{remaining, BudgetStatus};
use crate::{Error, HistoryRecord, Result};
use chrono::{NaiveDate, TimeDelta};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load every history record, oldest first.
///
/// Corrupt lines are logged and skipped. A record id seen twice is kept once.
pub fn load_history(path: &Path) -> Result<Vec<HistoryRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HistoryRecord>(&line) {
            Ok(record) => {
                if seen_ids.insert(record.id) {
                    records.push(record);
                } else {
                    tracing::warn!("Duplicate history record {} at line {}", record.id, line_num + 1);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to parse history record at line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Loaded {} history records", records.len());
    Ok(records)
}

/// First date inside a `days`-long window ending at `today`.
///
/// Negative windows and windows reaching past the representable calendar are
/// validation errors.
pub fn window_start(today: NaiveDate, days: i64) -> Result<NaiveDate> {
    if days < 0 {
        return Err(Error::Validation(format!(
            "history window must not be negative, got {} days",
            days
        )));
    }
    TimeDelta::try_days(days)
        .and_then(|span| today.checked_sub_signed(span))
        .ok_or_else(|| Error::Validation(format!("history window of {} days is too large", days)))
}

/// Records dated within the last `days` days of `today`, newest first
pub fn load_recent_history(path: &Path, today: NaiveDate, days: i64) -> Result<Vec<HistoryRecord>> {
    let cutoff = window_start(today, days)?;
    let mut records: Vec<_> = load_history(path)?
        .into_iter()
        .filter(|r| r.date >= cutoff)
        .collect();

    records.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::info!(
        "Loaded {} history records from last {} days",
        records.len(),
        days
    );
    Ok(records)
}

/// A finalized day measured against a calorie target
#[derive(Clone, Debug, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub meal_count: usize,
    pub total_calories: f64,
    pub remaining: f64,
    pub status: BudgetStatus,
}

impl DayReport {
    pub fn new(record: &HistoryRecord, tdee: i64) -> Self {
        let remaining = remaining(tdee, record.total_calories);
        Self {
            date: record.date,
            meal_count: record.meals.len(),
            total_calories: record.total_calories,
            remaining,
            status: BudgetStatus::of(remaining),
        }
    }
}
