//! Universe filter — reduce the bulk calendar to watchlist rows.
//!
//! A pure transform: no I/O, no reordering. A row survives iff its
//! uppercased symbol is a universe member and it carries a report date.

use crate::provider::RawCalendarRow;
use crate::universe::Universe;
use serde::{Deserialize, Serialize};

/// A normalized calendar row, shaped for the front-end JSON.
///
/// `estimate` serializes as `null` when the provider sent an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRow {
    pub symbol: String,
    pub name: String,
    pub report_date: String,
    pub fiscal_date_ending: String,
    pub estimate: Option<String>,
    pub currency: String,
}

/// Keep rows whose uppercased symbol is in `universe` and whose report date
/// is non-empty; trim every field and normalize an empty estimate to `None`.
/// Provider order is preserved.
pub fn filter_to_universe(universe: &Universe, raw: &[RawCalendarRow]) -> Vec<EarningsRow> {
    let mut out = Vec::new();
    for r in raw {
        let symbol = r.symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() || !universe.contains(&symbol) {
            continue;
        }
        let report_date = r.report_date.trim();
        if report_date.is_empty() {
            continue;
        }
        let estimate = r.estimate.trim();
        out.push(EarningsRow {
            symbol,
            name: r.name.trim().to_string(),
            report_date: report_date.to_string(),
            fiscal_date_ending: r.fiscal_date_ending.trim().to_string(),
            estimate: (!estimate.is_empty()).then(|| estimate.to_string()),
            currency: r.currency.trim().to_string(),
        });
    }
    out
}
