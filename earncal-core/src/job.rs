//! Job orchestration — the run-to-completion entry points.
//!
//! Both runs share the same front half: load universe → fetch once →
//! filter → sanity gate. Only then does anything touch disk, so a failure at
//! any earlier stage leaves previously persisted state byte-identical and
//! the front-end keeps serving the last known-good data.

use crate::config::JobConfig;
use crate::filter::{filter_to_universe, EarningsRow};
use crate::gate::{GateError, SanityGate};
use crate::history::{BackfillSummary, HistoryError, HistoryStore};
use crate::provider::{parse_calendar, CalendarSource, FetchError};
use crate::snapshot::{SnapshotStore, StoreError};
use crate::universe::{Universe, UniverseError};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Any fatal error for a run; each variant names the stage that failed.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("universe load failed: {0}")]
    Universe(#[from] UniverseError),

    #[error("calendar fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("sanity gate rejected the dataset: {0}")]
    Gate(#[from] GateError),

    #[error("snapshot store failed: {0}")]
    Store(#[from] StoreError),

    #[error("history backfill failed: {0}")]
    History(#[from] HistoryError),
}

/// Outcome of a successful refresh run.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub universe_size: usize,
    pub raw_rows: usize,
    pub filtered_rows: usize,
    pub cache_path: PathBuf,
    /// Where the superseded snapshot went, when one existed.
    pub archived_to: Option<PathBuf>,
}

/// Outcome of a successful backfill run.
#[derive(Debug, Clone)]
pub struct BackfillReport {
    pub universe_size: usize,
    pub raw_rows: usize,
    pub filtered_rows: usize,
    pub summary: BackfillSummary,
}

/// Shared front half of both runs: universe → fetch → filter → gate.
fn fetch_filtered(
    config: &JobConfig,
    source: &dyn CalendarSource,
) -> Result<(Universe, usize, Vec<EarningsRow>), JobError> {
    let universe = Universe::from_file(&config.universe_path)?;
    let body = source.fetch_raw(config.horizon)?;
    let raw = parse_calendar(&body, config.min_raw_rows)?;
    let filtered = filter_to_universe(&universe, &raw);

    let gate = SanityGate {
        min_raw_rows: config.min_raw_rows,
        min_filtered_rows: config.min_filtered_rows,
    };
    gate.check(raw.len(), filtered.len())?;

    Ok((universe, raw.len(), filtered))
}

/// Fetch the calendar once and rebuild the live cache, archiving the prior
/// snapshot first.
pub fn run_refresh(
    config: &JobConfig,
    source: &dyn CalendarSource,
) -> Result<RefreshReport, JobError> {
    let (universe, raw_rows, filtered) = fetch_filtered(config, source)?;

    let store = SnapshotStore::new(&config.cache_path, &config.archive_dir);
    let archived_to = store.replace(&filtered, config.horizon, Utc::now())?;

    Ok(RefreshReport {
        universe_size: universe.len(),
        raw_rows,
        filtered_rows: filtered.len(),
        cache_path: config.cache_path.clone(),
        archived_to,
    })
}

/// Fetch the calendar once and fill gaps in the per-date history files for
/// the trailing window ending at `today`.
///
/// The same sanity gate applies as for a refresh: history files are
/// write-once, so a degraded dataset must never seed them.
pub fn run_backfill(
    config: &JobConfig,
    source: &dyn CalendarSource,
    today: NaiveDate,
) -> Result<BackfillReport, JobError> {
    let (universe, raw_rows, filtered) = fetch_filtered(config, source)?;

    let history = HistoryStore::new(&config.history_dir, config.backfill_days);
    let summary = history.backfill(&filtered, today)?;

    Ok(BackfillReport {
        universe_size: universe.len(),
        raw_rows,
        filtered_rows: filtered.len(),
        summary,
    })
}
