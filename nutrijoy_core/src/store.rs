//! Day-bucket persistence seam.
//!
//! A [`DayStore`] owns the "today" bucket of logged entries and the
//! append-only history of finalized days. Mutations take `&mut self`, so a
//! single store is never mutated concurrently within a process.

use crate::aggregator::{total_consumed, NewEntry};
use crate::{DailyEntry, Error, HistoryRecord, Result};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Storage for the today bucket and the finalized history
pub trait DayStore {
    /// Entries logged since the last finalize, in logging order
    fn today(&self) -> Result<Vec<DailyEntry>>;

    /// Validate and append an entry, returning the stored entry
    fn add_entry(&mut self, entry: NewEntry) -> Result<DailyEntry>;

    /// Remove one entry by id. Fails with [`Error::NotFound`] if absent.
    fn remove_entry(&mut self, id: Uuid) -> Result<DailyEntry>;

    /// Move the whole bucket into a new history record dated `date`.
    ///
    /// Either both the record is written and the bucket is cleared, or neither
    /// happens. An empty bucket produces a zero-meal record.
    fn finalize_day(&mut self, date: NaiveDate) -> Result<HistoryRecord>;

    /// Finalized days, oldest first
    fn history(&self) -> Result<Vec<HistoryRecord>>;
}

/// Build the stored form of a validated request
pub(crate) fn materialize(entry: NewEntry) -> Result<DailyEntry> {
    let source = entry.validate()?;
    Ok(DailyEntry {
        id: Uuid::new_v4(),
        source,
        quantity: entry.quantity,
        calories: entry.calories,
        logged_at: Utc::now(),
    })
}

/// Snapshot a bucket into a history record
pub(crate) fn snapshot(date: NaiveDate, meals: Vec<DailyEntry>) -> HistoryRecord {
    HistoryRecord {
        id: Uuid::new_v4(),
        date,
        total_calories: total_consumed(&meals),
        meals,
    }
}

pub(crate) fn not_found(id: Uuid) -> Error {
    Error::NotFound(format!("no entry with id {} in today's log", id))
}

/// In-memory store, used by tests and embedding callers
#[derive(Debug, Default)]
pub struct MemoryDayStore {
    today: Vec<DailyEntry>,
    history: Vec<HistoryRecord>,
}

impl MemoryDayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DayStore for MemoryDayStore {
    fn today(&self) -> Result<Vec<DailyEntry>> {
        Ok(self.today.clone())
    }

    fn add_entry(&mut self, entry: NewEntry) -> Result<DailyEntry> {
        let stored = materialize(entry)?;
        self.today.push(stored.clone());
        Ok(stored)
    }

    fn remove_entry(&mut self, id: Uuid) -> Result<DailyEntry> {
        let pos = self
            .today
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(self.today.remove(pos))
    }

    fn finalize_day(&mut self, date: NaiveDate) -> Result<HistoryRecord> {
        let record = snapshot(date, std::mem::take(&mut self.today));
        self.history.push(record.clone());
        tracing::info!(
            "Finalized {} with {} meals ({} kcal)",
            date,
            record.meals.len(),
            record.total_calories
        );
        Ok(record)
    }

    fn history(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.history.clone())
    }
}
