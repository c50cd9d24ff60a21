//! Sanity gate — the row-count thresholds standing between a fetch and the
//! persisted stores.
//!
//! A dataset below either threshold is treated as a provider malfunction or
//! a silently broken universe match; nothing is written and the previously
//! persisted snapshot keeps serving.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("raw dataset too small: {got} rows (minimum {min})")]
    RawDataTooSmall { got: usize, min: usize },

    #[error("filtered dataset too small: {got} rows (minimum {min})")]
    FilteredDataTooSmall { got: usize, min: usize },
}

/// Pass/fail decision over the raw and filtered row counts.
///
/// The raw threshold duplicates the fetch-time strict check on purpose: the
/// gate is the last line of defense before anything touches disk.
#[derive(Debug, Clone, Copy)]
pub struct SanityGate {
    pub min_raw_rows: usize,
    pub min_filtered_rows: usize,
}

impl SanityGate {
    pub fn check(&self, raw_count: usize, filtered_count: usize) -> Result<(), GateError> {
        if raw_count < self.min_raw_rows {
            return Err(GateError::RawDataTooSmall {
                got: raw_count,
                min: self.min_raw_rows,
            });
        }
        if filtered_count < self.min_filtered_rows {
            return Err(GateError::FilteredDataTooSmall {
                got: filtered_count,
                min: self.min_filtered_rows,
            });
        }
        Ok(())
    }
}
