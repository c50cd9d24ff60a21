//! Watchlist universe — the fixed set of ticker symbols the job cares about.
//!
//! Loaded fresh each run from a small CSV: either a header row with a
//! `ticker` column, or an implicit first-column-is-ticker layout. Symbols are
//! trimmed, uppercased, deduplicated, and iterated in sorted order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cells that are layout artifacts, never tickers.
const PLACEHOLDERS: [&str; 2] = ["TICKER", "..."];

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("universe file not found: {0}")]
    NotFound(PathBuf),

    #[error("universe file is empty")]
    Empty,

    #[error("no tickers found in universe file")]
    NoTickers,

    #[error("failed to read universe CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A non-empty, sorted, deduplicated set of uppercase ticker symbols.
#[derive(Debug, Clone)]
pub struct Universe {
    tickers: BTreeSet<String>,
}

impl Universe {
    /// Load a universe from a CSV file.
    ///
    /// The file must exist and yield at least one valid ticker; both are
    /// checked here, before any network call is attempted.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        if !path.exists() {
            return Err(UniverseError::NotFound(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }
        Self::from_records(rows)
    }

    /// Parse a universe from CSV text.
    pub fn from_csv(content: &str) -> Result<Self, UniverseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?);
        }
        Self::from_records(rows)
    }

    fn from_records(rows: Vec<csv::StringRecord>) -> Result<Self, UniverseError> {
        if rows.is_empty() {
            return Err(UniverseError::Empty);
        }

        // Header detection: a row 0 cell spelling "ticker" (any case) names
        // the ticker column; otherwise column 0 of every row is the ticker.
        let header: Vec<String> = rows[0]
            .iter()
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        let (ticker_idx, start) = match header.iter().position(|c| c == "ticker") {
            Some(idx) => (idx, 1),
            None => (0, 0),
        };

        let mut tickers = BTreeSet::new();
        for row in &rows[start..] {
            let Some(cell) = row.get(ticker_idx) else {
                continue;
            };
            let t = cell.trim().to_ascii_uppercase();
            if t.is_empty() || PLACEHOLDERS.contains(&t.as_str()) {
                continue;
            }
            tickers.insert(t);
        }

        if tickers.is_empty() {
            return Err(UniverseError::NoTickers);
        }
        Ok(Self { tickers })
    }

    /// Membership test against an already-normalized (trimmed, uppercase) symbol.
    pub fn contains(&self, symbol: &str) -> bool {
        self.tickers.contains(symbol)
    }

    /// Number of tickers.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Tickers in lexicographic order.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.tickers.iter().map(String::as_str)
    }
}
