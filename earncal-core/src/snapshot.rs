//! Snapshot store — the live cache file and its append-only archive.
//!
//! Write protocol:
//! 1. If a live snapshot exists, copy it into the archive under a compact
//!    UTC timestamp name. Any failure here aborts the run; the live file is
//!    never replaced without a backup.
//! 2. Replace the live file atomically (write to .tmp, rename into place),
//!    then write the metadata sidecar best-effort.
//!
//! A prior snapshot that no longer parses as a row array is archived as raw
//! text. Archival tolerates corruption but never skips.

use crate::config::Horizon;
use crate::filter::EarningsRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to archive previous snapshot: {0}")]
    Archive(String),

    #[error("failed to write live snapshot: {0}")]
    Write(String),
}

/// What the archiver read from the live cache file.
///
/// Both variants keep the exact prior text; the archive writes those bytes
/// back out unmodified, so round-tripping is byte-faithful either way.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorSnapshot {
    /// The previous cache parsed as a row array.
    Parsed { rows: Vec<EarningsRow>, text: String },
    /// The previous cache was unparseable; only the bytes are preserved.
    Raw { text: String },
}

impl PriorSnapshot {
    pub fn as_text(&self) -> &str {
        match self {
            Self::Parsed { text, .. } | Self::Raw { text } => text,
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        match self {
            Self::Parsed { rows, .. } => Some(rows.len()),
            Self::Raw { .. } => None,
        }
    }
}

/// Metadata sidecar written next to the live cache after each replace.
///
/// Advisory only: readers treat a missing or stale sidecar as "no metadata",
/// and a failed sidecar write never fails the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub row_count: usize,
    pub horizon: Horizon,
    pub written_at: DateTime<Utc>,
    pub data_hash: String,
}

/// Live-cache state for the `status` command.
#[derive(Debug, Clone)]
pub struct SnapshotStatus {
    pub cache_path: PathBuf,
    pub exists: bool,
    /// Row count of the live file, when it parses.
    pub row_count: Option<usize>,
    pub meta: Option<SnapshotMeta>,
    pub archive_count: usize,
}

pub struct SnapshotStore {
    cache_path: PathBuf,
    archive_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(cache_path: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    fn meta_path(&self) -> PathBuf {
        self.cache_path.with_extension("meta.json")
    }

    /// Read the current live snapshot, if any.
    pub fn read_prior(&self) -> Result<Option<PriorSnapshot>, StoreError> {
        if !self.cache_path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.cache_path).map_err(|e| {
            StoreError::Archive(format!("read {}: {e}", self.cache_path.display()))
        })?;
        Ok(Some(match serde_json::from_str::<Vec<EarningsRow>>(&text) {
            Ok(rows) => PriorSnapshot::Parsed { rows, text },
            Err(_) => PriorSnapshot::Raw { text },
        }))
    }

    /// Archive the prior snapshot under a compact UTC timestamp name.
    ///
    /// Returns the archive path written, or `None` when no prior snapshot
    /// exists. Names sort chronologically and are unique at call granularity.
    pub fn archive_prior(&self, now: DateTime<Utc>) -> Result<Option<PathBuf>, StoreError> {
        let Some(prior) = self.read_prior()? else {
            return Ok(None);
        };
        fs::create_dir_all(&self.archive_dir).map_err(|e| {
            StoreError::Archive(format!("create {}: {e}", self.archive_dir.display()))
        })?;
        let name = format!("earnings_cache_{}.json", now.format("%Y%m%dT%H%M%SZ"));
        let path = self.archive_dir.join(name);
        fs::write(&path, prior.as_text())
            .map_err(|e| StoreError::Archive(format!("write {}: {e}", path.display())))?;
        Ok(Some(path))
    }

    /// Archive the prior snapshot (when present), then atomically replace the
    /// live cache with `rows`. The replace never proceeds past a failed
    /// archive step.
    ///
    /// Returns the archive path, if a prior snapshot was archived.
    pub fn replace(
        &self,
        rows: &[EarningsRow],
        horizon: Horizon,
        now: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, StoreError> {
        let archived = self.archive_prior(now)?;

        let json = serde_json::to_string(rows).map_err(|e| StoreError::Write(e.to_string()))?;

        if let Some(parent) = self.cache_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Write(format!("create {}: {e}", parent.display())))?;
            }
        }

        // Whole-file write to a sibling, then rename: a reader never sees a
        // partially written array.
        let tmp = self.cache_path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .map_err(|e| StoreError::Write(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.cache_path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Write(format!("atomic rename failed: {e}"))
        })?;

        let meta = SnapshotMeta {
            row_count: rows.len(),
            horizon,
            written_at: now,
            data_hash: blake3::hash(json.as_bytes()).to_hex().to_string(),
        };
        if let Ok(meta_json) = serde_json::to_string_pretty(&meta) {
            let _ = fs::write(self.meta_path(), meta_json);
        }

        Ok(archived)
    }

    /// Best-effort read of the metadata sidecar.
    pub fn meta(&self) -> Option<SnapshotMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Inspect the live cache and archive for reporting.
    pub fn status(&self) -> SnapshotStatus {
        let prior = self.read_prior().ok().flatten();
        let archive_count = fs::read_dir(&self.archive_dir)
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0);
        SnapshotStatus {
            cache_path: self.cache_path.clone(),
            exists: self.cache_path.exists(),
            row_count: prior.as_ref().and_then(PriorSnapshot::row_count),
            meta: self.meta(),
            archive_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_rows(n: usize) -> Vec<EarningsRow> {
        (0..n)
            .map(|i| EarningsRow {
                symbol: format!("SYM{i}"),
                name: format!("Company {i}"),
                report_date: "2025-01-10".into(),
                fiscal_date_ending: "2024-12-31".into(),
                estimate: Some("1.5".into()),
                currency: "USD".into(),
            })
            .collect()
    }

    fn store(tmp: &TempDir) -> SnapshotStore {
        SnapshotStore::new(
            tmp.path().join("earnings_cache.json"),
            tmp.path().join("earnings_archive"),
        )
    }

    fn run_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 45).unwrap()
    }

    #[test]
    fn first_replace_writes_live_without_archiving() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);

        let archived = s.replace(&sample_rows(2), Horizon::ThreeMonth, run_time()).unwrap();
        assert!(archived.is_none());
        assert!(!tmp.path().join("earnings_archive").exists());

        let live: Vec<EarningsRow> =
            serde_json::from_str(&std::fs::read_to_string(s.cache_path()).unwrap()).unwrap();
        assert_eq!(live, sample_rows(2));
    }

    #[test]
    fn replace_archives_prior_bytes_then_overwrites() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.replace(&sample_rows(2), Horizon::ThreeMonth, run_time()).unwrap();
        let prior_bytes = std::fs::read(s.cache_path()).unwrap();

        let later = Utc.with_ymd_and_hms(2025, 6, 16, 9, 0, 0).unwrap();
        let archived = s
            .replace(&sample_rows(3), Horizon::ThreeMonth, later)
            .unwrap()
            .expect("prior snapshot should be archived");

        assert_eq!(std::fs::read(&archived).unwrap(), prior_bytes);
        let live: Vec<EarningsRow> =
            serde_json::from_str(&std::fs::read_to_string(s.cache_path()).unwrap()).unwrap();
        assert_eq!(live.len(), 3);

        let archive_files: Vec<_> = std::fs::read_dir(tmp.path().join("earnings_archive"))
            .unwrap()
            .collect();
        assert_eq!(archive_files.len(), 1);
    }

    #[test]
    fn archive_names_are_compact_utc_timestamps() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.replace(&sample_rows(1), Horizon::ThreeMonth, run_time()).unwrap();
        let archived = s
            .replace(&sample_rows(1), Horizon::ThreeMonth, run_time())
            .unwrap()
            .unwrap();
        assert_eq!(
            archived.file_name().unwrap().to_str().unwrap(),
            "earnings_cache_20250615T123045Z.json"
        );
    }

    #[test]
    fn unparseable_prior_is_archived_verbatim() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.cache_path(), "not json at all").unwrap();

        match s.read_prior().unwrap().unwrap() {
            PriorSnapshot::Raw { text } => assert_eq!(text, "not json at all"),
            other => panic!("expected Raw, got {other:?}"),
        }

        let archived = s
            .replace(&sample_rows(1), Horizon::ThreeMonth, run_time())
            .unwrap()
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(archived).unwrap(),
            "not json at all"
        );
    }

    #[test]
    fn archive_failure_leaves_live_untouched() {
        let tmp = TempDir::new().unwrap();
        let cache_path = tmp.path().join("earnings_cache.json");
        // Prior snapshot exists, but the archive "dir" is a regular file, so
        // the archive step must fail.
        std::fs::write(&cache_path, "[]").unwrap();
        let blocker = tmp.path().join("archive_blocker");
        std::fs::write(&blocker, "").unwrap();
        let s = SnapshotStore::new(&cache_path, &blocker);

        let err = s
            .replace(&sample_rows(1), Horizon::ThreeMonth, run_time())
            .unwrap_err();
        assert!(matches!(err, StoreError::Archive(_)));
        assert_eq!(std::fs::read_to_string(&cache_path).unwrap(), "[]");
    }

    #[test]
    fn no_tmp_file_survives_a_replace() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.replace(&sample_rows(1), Horizon::ThreeMonth, run_time()).unwrap();
        assert!(!tmp.path().join("earnings_cache.json.tmp").exists());
    }

    #[test]
    fn meta_sidecar_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.replace(&sample_rows(4), Horizon::SixMonth, run_time()).unwrap();

        let meta = s.meta().unwrap();
        assert_eq!(meta.row_count, 4);
        assert_eq!(meta.horizon, Horizon::SixMonth);
        assert_eq!(meta.written_at, run_time());
        assert_eq!(meta.data_hash.len(), 64);
    }

    #[test]
    fn status_reports_live_and_archive_state() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);

        let empty = s.status();
        assert!(!empty.exists);
        assert_eq!(empty.row_count, None);
        assert_eq!(empty.archive_count, 0);

        s.replace(&sample_rows(2), Horizon::ThreeMonth, run_time()).unwrap();
        s.replace(&sample_rows(5), Horizon::ThreeMonth, run_time()).unwrap();

        let status = s.status();
        assert!(status.exists);
        assert_eq!(status.row_count, Some(5));
        assert_eq!(status.archive_count, 1);
        assert_eq!(status.meta.unwrap().row_count, 5);
    }
}
