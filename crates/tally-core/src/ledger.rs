//! Attendance ledger — an ordered sequence of records persisted as a
//! pretty-printed JSON array, rewritten in full on every append.

use crate::record::AttendanceRecord;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle to the on-disk ledger file.
///
/// The file, when present and well-formed, is always a complete snapshot
/// of the full sequence. A missing or malformed file reads as empty.
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full sequence. Never fails: a missing file, an unreadable
    /// file, or malformed content all yield an empty sequence (the latter
    /// two with a warning).
    pub fn load(&self) -> Vec<AttendanceRecord> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ledger unreadable; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ledger malformed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Append one record: load, push, rewrite the whole file.
    ///
    /// On failure the file is left as it was and the record is NOT
    /// considered logged; the caller decides whether to retry.
    pub fn append(&self, record: AttendanceRecord) -> Result<(), LedgerError> {
        let mut records = self.load();
        records.push(record);
        self.write(&records)?;
        tracing::info!(path = %self.path.display(), total = records.len(), "ledger appended");
        Ok(())
    }

    fn write(&self, records: &[AttendanceRecord]) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| LedgerError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, json).map_err(|source| LedgerError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Dump the current sequence to another path, read-only with respect
    /// to the ledger itself. Returns the number of records exported.
    pub fn export(&self, dest: &Path) -> Result<usize, LedgerError> {
        let records = self.load();
        let json = serde_json::to_vec_pretty(&records)?;
        fs::write(dest, json).map_err(|source| LedgerError::Write {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok(records.len())
    }
}

/// Roll-up counts over a loaded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: usize,
    pub people: usize,
    pub today: usize,
}

/// Count total records, distinct names, and records dated `today`.
pub fn summarize(records: &[AttendanceRecord], today: NaiveDate) -> LedgerSummary {
    let prefix = today.format("%Y-%m-%d").to_string();
    let mut names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    LedgerSummary {
        total: records.len(),
        people: names.len(),
        today: records.iter().filter(|r| r.time.starts_with(&prefix)).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CheckKind;

    fn record(name: &str, kind: CheckKind, time: &str) -> AttendanceRecord {
        AttendanceRecord {
            name: name.to_string(),
            kind,
            time: time.to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("attendance.json"));
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.json");
        std::fs::write(&path, b"{not json at all").unwrap();
        let ledger = Ledger::new(&path);
        assert!(ledger.load().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("attendance.json"));

        let first = record("Alice", CheckKind::CheckIn, "2024-01-01 09:00:00");
        let second = record("Bob", CheckKind::CheckIn, "2024-01-01 09:05:00");
        let third = record("Alice", CheckKind::CheckOut, "2024-01-01 17:00:00");

        ledger.append(first.clone()).unwrap();
        ledger.append(second.clone()).unwrap();
        ledger.append(third.clone()).unwrap();

        assert_eq!(ledger.load(), vec![first, second, third]);
    }

    #[test]
    fn test_append_to_empty_ledger_writes_single_element_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.json");
        let ledger = Ledger::new(&path);

        ledger
            .append(record("Bob", CheckKind::CheckIn, "2024-01-01 09:00:00"))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"Name": "Bob", "Type": "Check-In", "Time": "2024-01-01 09:00:00"}
            ])
        );
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("attendance.json"));
        ledger
            .append(record("Alice", CheckKind::CheckIn, "2024-01-01 09:00:00"))
            .unwrap();
        assert_eq!(ledger.load(), ledger.load());
    }

    #[test]
    fn test_append_surfaces_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // The ledger path is an existing directory, so the rewrite must fail.
        let ledger = Ledger::new(dir.path());
        let result = ledger.append(record("Bob", CheckKind::CheckIn, "2024-01-01 09:00:00"));
        assert!(matches!(result, Err(LedgerError::Write { .. })));
    }

    #[test]
    fn test_export_copies_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path().join("attendance.json"));
        let rec = record("Alice", CheckKind::CheckIn, "2024-01-01 09:00:00");
        ledger.append(rec.clone()).unwrap();

        let dest = dir.path().join("export.json");
        let count = ledger.export(&dest).unwrap();
        assert_eq!(count, 1);

        let exported: Vec<AttendanceRecord> =
            serde_json::from_slice(&std::fs::read(&dest).unwrap()).unwrap();
        assert_eq!(exported, vec![rec]);
    }

    #[test]
    fn test_summarize_counts() {
        let records = vec![
            record("Alice", CheckKind::CheckIn, "2024-01-02 09:00:00"),
            record("Bob", CheckKind::CheckIn, "2024-01-02 09:05:00"),
            record("Alice", CheckKind::CheckOut, "2024-01-01 17:00:00"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let summary = summarize(&records, today);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.people, 2);
        assert_eq!(summary.today, 2);
    }

    #[test]
    fn test_summarize_empty() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let summary = summarize(&[], today);
        assert_eq!(
            summary,
            LedgerSummary {
                total: 0,
                people: 0,
                today: 0
            }
        );
    }
}
