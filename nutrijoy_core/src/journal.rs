//! File-backed day store.
//!
//! Layout inside the store directory:
//! - `today.wal`: JSON Lines, one [`DailyEntry`] per line
//! - `history.jsonl`: JSON Lines, one [`HistoryRecord`] per finalized day
//! - `today.lock`: lock file serializing every access to the bucket
//!
//! Every mutation holds an exclusive lock on `today.lock`, so concurrent
//! processes (two terminals, a cron job) cannot interleave an add with a
//! finalize. Finalize fsyncs the history append before the bucket is archived
//! by renaming `today.wal` to `today-<date>.wal.processed`. If the archive step
//! fails, the history file is truncated back to its previous length so the day
//! is either fully finalized or not at all.
//!
//! The archive is a per-date backup. Finalizing the same date twice replaces
//! that date's archive; `history.jsonl` stays the record of truth.

use crate::aggregator::NewEntry;
use crate::store::{materialize, not_found, snapshot, DayStore};
use crate::{DailyEntry, Error, HistoryRecord, Result};
use chrono::NaiveDate;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

const TODAY_FILE: &str = "today.wal";
const HISTORY_FILE: &str = "history.jsonl";
const LOCK_FILE: &str = "today.lock";

/// Held lock on the bucket; released on drop
struct BucketLock {
    file: File,
}

impl Drop for BucketLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release bucket lock: {}", e);
        }
    }
}

/// JSONL-based day store with file locking
#[derive(Clone, Debug)]
pub struct JournalDayStore {
    dir: PathBuf,
}

impl JournalDayStore {
    /// Create a store rooted at `dir`. Nothing is touched until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn today_path(&self) -> PathBuf {
        self.dir.join(TODAY_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// Where the bucket goes once `date` is finalized
    pub fn archived_today_path(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("today-{}.wal.processed", date.format("%Y-%m-%d")))
    }

    fn lock(&self, exclusive: bool) -> Result<BucketLock> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(BucketLock { file })
    }
}

/// Append one JSON line and sync it to disk
fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    {
        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(value)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }

    file.sync_all()?;
    Ok(())
}

/// Current length of `path`, 0 if it does not exist yet
fn file_len(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Drop anything appended past `len` and sync
fn truncate_to(path: &Path, len: u64) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}

/// Replace the bucket file with `entries` via temp file + rename
fn rewrite_entries(path: &Path, entries: &[DailyEntry]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "journal path missing parent")
    })?;
    let temp = NamedTempFile::new_in(parent)?;

    {
        let mut writer = BufWriter::new(temp.as_file());
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Read all entries from a bucket file.
///
/// A missing file is an empty bucket. Lines that fail to parse are logged and
/// skipped.
pub fn read_entries(path: &Path) -> Result<Vec<DailyEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<DailyEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

impl DayStore for JournalDayStore {
    fn today(&self) -> Result<Vec<DailyEntry>> {
        let _lock = self.lock(false)?;
        read_entries(&self.today_path())
    }

    fn add_entry(&mut self, entry: NewEntry) -> Result<DailyEntry> {
        let stored = materialize(entry)?;
        let _lock = self.lock(true)?;
        append_line(&self.today_path(), &stored)?;
        tracing::debug!("Logged entry {} ({} kcal)", stored.id, stored.calories);
        Ok(stored)
    }

    fn remove_entry(&mut self, id: Uuid) -> Result<DailyEntry> {
        let _lock = self.lock(true)?;
        let path = self.today_path();
        let mut entries = read_entries(&path)?;

        let pos = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = entries.remove(pos);

        rewrite_entries(&path, &entries)?;
        tracing::debug!("Removed entry {}", id);
        Ok(removed)
    }

    fn finalize_day(&mut self, date: NaiveDate) -> Result<HistoryRecord> {
        let _lock = self.lock(true)?;
        let today_path = self.today_path();
        let record = snapshot(date, read_entries(&today_path)?);

        let history_path = self.history_path();
        let committed_len = file_len(&history_path)?;

        if let Err(e) = append_line(&history_path, &record) {
            truncate_to(&history_path, committed_len)?;
            return Err(e);
        }

        if today_path.exists() {
            if let Err(e) = std::fs::rename(&today_path, self.archived_today_path(date)) {
                tracing::warn!("Archiving bucket failed, rolling back history: {}", e);
                truncate_to(&history_path, committed_len)?;
                return Err(e.into());
            }
        }

        tracing::info!(
            "Finalized {} with {} meals ({} kcal)",
            date,
            record.meals.len(),
            record.total_calories
        );
        Ok(record)
    }

    fn history(&self) -> Result<Vec<HistoryRecord>> {
        let _lock = self.lock(false)?;
        crate::history::load_history(&self.history_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_add_and_read_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());

        let added = store.add_entry(NewEntry::custom("toast", 2.0, 160.0)).unwrap();

        // A second handle sees the same bucket
        let other = JournalDayStore::new(temp_dir.path());
        assert_eq!(other.today().unwrap(), vec![added]);
    }

    #[test]
    fn test_empty_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JournalDayStore::new(temp_dir.path().join("fresh"));
        assert!(store.today().unwrap().is_empty());
        assert!(store.history().unwrap().is_empty());
    }

    #[test]
    fn test_remove_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());

        let keep = store.add_entry(NewEntry::custom("rice", 1.0, 150.0)).unwrap();
        let gone = store.add_entry(NewEntry::custom("cake", 1.0, 400.0)).unwrap();

        store.remove_entry(gone.id).unwrap();
        assert_eq!(store.today().unwrap(), vec![keep]);

        assert!(matches!(
            store.remove_entry(gone.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_finalize_archives_bucket() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());

        store.add_entry(NewEntry::custom("salmon", 150.0, 312.0)).unwrap();
        store.add_entry(NewEntry::custom("rice", 1.0, 150.0)).unwrap();

        let record = store.finalize_day(date()).unwrap();
        assert_eq!(record.meals.len(), 2);
        assert_eq!(record.total_calories, 462.0);

        assert!(store.today().unwrap().is_empty());
        assert!(!store.today_path().exists());
        assert!(store.archived_today_path(date()).exists());

        let history = store.history().unwrap();
        assert_eq!(history, vec![record]);
    }

    #[test]
    fn test_failed_archive_leaves_history_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());
        store.finalize_day(date().pred_opt().unwrap()).unwrap();
        let before = std::fs::read_to_string(store.history_path()).unwrap();

        store.add_entry(NewEntry::custom("toast", 1.0, 80.0)).unwrap();

        // A non-empty directory in the way makes the rename fail
        let blocker = store.archived_today_path(date());
        std::fs::create_dir_all(blocker.join("occupied")).unwrap();

        assert!(store.finalize_day(date()).is_err());
        assert_eq!(std::fs::read_to_string(store.history_path()).unwrap(), before);
        assert_eq!(store.today().unwrap().len(), 1);

        // Retrying once the path is clear records the meal exactly once
        std::fs::remove_dir_all(&blocker).unwrap();
        store.finalize_day(date()).unwrap();

        let history = store.history().unwrap();
        assert_eq!(history.len(), 2);
        let total: f64 = history.iter().map(|r| r.total_calories).sum();
        assert_eq!(total, 80.0);
    }

    #[test]
    fn test_archives_are_kept_per_date() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());
        let next = date().succ_opt().unwrap();

        store.add_entry(NewEntry::custom("soup", 1.0, 230.0)).unwrap();
        store.finalize_day(date()).unwrap();
        store.add_entry(NewEntry::custom("salad", 1.0, 90.0)).unwrap();
        store.finalize_day(next).unwrap();

        let first = read_entries(&store.archived_today_path(date())).unwrap();
        let second = read_entries(&store.archived_today_path(next)).unwrap();
        assert_eq!(first[0].calories, 230.0);
        assert_eq!(second[0].calories, 90.0);
    }

    #[test]
    fn test_finalize_empty_day_writes_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());

        let record = store.finalize_day(date()).unwrap();
        assert!(record.meals.is_empty());
        assert_eq!(store.history().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupted_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JournalDayStore::new(temp_dir.path());
        store.add_entry(NewEntry::custom("toast", 1.0, 80.0)).unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(store.today_path())
            .unwrap();
        writeln!(file, "{{ not json").unwrap();

        store.add_entry(NewEntry::custom("tea", 1.0, 2.0)).unwrap();
        assert_eq!(store.today().unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_adds_are_all_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let dir = dir.clone();
                std::thread::spawn(move || {
                    let mut store = JournalDayStore::new(dir);
                    for _ in 0..5 {
                        store
                            .add_entry(NewEntry::custom(format!("meal {}", i), 1.0, 10.0))
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let store = JournalDayStore::new(dir);
        assert_eq!(store.today().unwrap().len(), 20);
    }
}
