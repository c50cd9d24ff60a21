//! earncal core — earnings-calendar cache builder.
//!
//! The batch job behind the earnings-calendar front-end:
//! - Universe loading (ticker watchlist CSV)
//! - One-shot bulk calendar fetch with strict response classification
//! - Universe filtering and field normalization
//! - Sanity gate guarding the persisted stores against degraded datasets
//! - Archive-then-replace snapshot store (live cache + append-only archive)
//! - Write-once per-date history backfill

pub mod config;
pub mod filter;
pub mod gate;
pub mod history;
pub mod job;
pub mod provider;
pub mod snapshot;
pub mod universe;

pub use config::{ConfigError, Horizon, JobConfig};
pub use filter::{filter_to_universe, EarningsRow};
pub use gate::{GateError, SanityGate};
pub use history::{BackfillSummary, HistoryError, HistoryStore};
pub use job::{run_backfill, run_refresh, BackfillReport, JobError, RefreshReport};
pub use provider::{
    parse_calendar, AlphaVantageSource, CalendarSource, FetchError, RawCalendarRow,
};
pub use snapshot::{
    PriorSnapshot, SnapshotMeta, SnapshotStatus, SnapshotStore, StoreError,
};
pub use universe::{Universe, UniverseError};
