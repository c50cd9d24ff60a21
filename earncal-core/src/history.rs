//! History backfiller — write-once, per-report-date snapshot files.
//!
//! Derives dated files from a single bulk fetch. A date that already has a
//! file is never rewritten, so re-running after partial success only fills
//! gaps. This path is independent of the live cache and its archive.

use crate::filter::EarningsRow;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to create history dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write history file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize history rows: {0}")]
    Serialize(String),
}

/// Outcome counters for one backfill pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackfillSummary {
    /// Dated files newly written this pass.
    pub created: usize,
    /// In-window dates skipped because a file already exists.
    pub skipped_existing: usize,
    /// Report-date groups outside the trailing window.
    pub skipped_out_of_range: usize,
    /// Report dates that failed to parse as `YYYY-MM-DD` (deduplicated).
    pub invalid_dates: Vec<String>,
}

/// Write-once store of per-report-date row files.
pub struct HistoryStore {
    history_dir: PathBuf,
    backfill_days: i64,
}

impl HistoryStore {
    pub fn new(history_dir: impl Into<PathBuf>, backfill_days: i64) -> Self {
        Self {
            history_dir: history_dir.into(),
            backfill_days,
        }
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Path of the dated file for `date`.
    pub fn file_path(&self, date: NaiveDate) -> PathBuf {
        self.history_dir.join(format!("earnings_{date}.json"))
    }

    /// Group rows by report date, in date order. Unparseable dates come back
    /// separately so the caller can surface them.
    fn group_by_date(
        rows: &[EarningsRow],
    ) -> (BTreeMap<NaiveDate, Vec<&EarningsRow>>, Vec<String>) {
        let mut grouped: BTreeMap<NaiveDate, Vec<&EarningsRow>> = BTreeMap::new();
        let mut invalid = Vec::new();
        for row in rows {
            match NaiveDate::parse_from_str(&row.report_date, "%Y-%m-%d") {
                Ok(date) => grouped.entry(date).or_default().push(row),
                Err(_) => {
                    if !invalid.contains(&row.report_date) {
                        invalid.push(row.report_date.clone());
                    }
                }
            }
        }
        (grouped, invalid)
    }

    /// Write one dated file per report date within the inclusive window
    /// `[today - backfill_days, today]`, skipping dates that already have a
    /// file. Idempotent: a second pass over the same input writes nothing.
    pub fn backfill(
        &self,
        rows: &[EarningsRow],
        today: NaiveDate,
    ) -> Result<BackfillSummary, HistoryError> {
        fs::create_dir_all(&self.history_dir).map_err(|e| HistoryError::CreateDir {
            path: self.history_dir.clone(),
            source: e,
        })?;

        let cutoff = today - Duration::days(self.backfill_days);
        let (grouped, invalid_dates) = Self::group_by_date(rows);
        let mut summary = BackfillSummary {
            invalid_dates,
            ..Default::default()
        };

        for (date, group) in &grouped {
            if *date > today || *date < cutoff {
                summary.skipped_out_of_range += 1;
                continue;
            }
            let path = self.file_path(*date);
            if path.exists() {
                summary.skipped_existing += 1;
                continue;
            }
            let json = serde_json::to_string(group)
                .map_err(|e| HistoryError::Serialize(e.to_string()))?;
            fs::write(&path, json).map_err(|e| HistoryError::WriteFile { path, source: e })?;
            summary.created += 1;
        }

        Ok(summary)
    }

    /// Number of dated files currently on disk.
    pub fn file_count(&self) -> usize {
        fs::read_dir(&self.history_dir)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }
}
