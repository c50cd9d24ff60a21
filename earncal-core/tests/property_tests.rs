//! Property tests for the universe loader and the universe filter.
//!
//! Uses proptest to verify:
//! 1. Loader output is always sorted, deduplicated, uppercase, and free of
//!    placeholder tokens, for arbitrary single-column CSV input
//! 2. A row survives the filter iff its uppercased symbol is a universe
//!    member and its report date is non-empty

use proptest::prelude::*;

use earncal_core::{filter_to_universe, RawCalendarRow, Universe};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Cells that may or may not survive normalization: mixed case, padding,
/// placeholders, empties.
fn arb_cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9]{1,6}",
        "[a-z]{1,4}",
        Just("TICKER".to_string()),
        Just("...".to_string()),
        Just(String::new()),
        Just("  aapl  ".to_string()),
    ]
}

fn arb_symbol() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("AAPL".to_string()),
        Just("aapl".to_string()),
        Just(" MSFT ".to_string()),
        Just("GOOG".to_string()),
        Just("ZM".to_string()),
        Just(String::new()),
    ]
}

fn arb_report_date() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("2025-06-01".to_string()),
        Just("2025-06-10".to_string()),
        Just(String::new()),
        Just("   ".to_string()),
    ]
}

// ── 1. Loader invariants ─────────────────────────────────────────────

proptest! {
    /// Whatever the input cells, a successfully loaded universe is sorted,
    /// deduplicated, uppercase, and never contains placeholder tokens.
    #[test]
    fn loader_output_is_normalized(cells in prop::collection::vec(arb_cell(), 1..30)) {
        let csv = cells.join("\n");
        if let Ok(universe) = Universe::from_csv(&csv) {
            let tickers: Vec<&str> = universe.tickers().collect();

            prop_assert!(!tickers.is_empty());
            for pair in tickers.windows(2) {
                prop_assert!(pair[0] < pair[1], "sorted and deduplicated");
            }
            for t in &tickers {
                prop_assert_eq!(*t, t.trim());
                prop_assert_eq!((*t).to_string(), t.to_ascii_uppercase());
                prop_assert!(!t.is_empty());
                prop_assert_ne!(*t, "TICKER");
                prop_assert_ne!(*t, "...");
            }
        }
    }

    /// Every non-placeholder cell lands in the universe after normalization.
    #[test]
    fn loader_keeps_all_valid_cells(cells in prop::collection::vec("[A-Z]{1,5}", 1..20)) {
        let csv = cells.join("\n");
        let universe = Universe::from_csv(&csv).unwrap();
        for cell in &cells {
            if cell != "TICKER" {
                prop_assert!(universe.contains(cell));
            }
        }
    }
}

// ── 2. Filter membership ─────────────────────────────────────────────

proptest! {
    /// A raw row survives iff its normalized symbol is in the universe and
    /// its trimmed report date is non-empty; survivors keep provider order.
    #[test]
    fn filter_keeps_exactly_matching_rows(
        inputs in prop::collection::vec((arb_symbol(), arb_report_date()), 0..25)
    ) {
        let universe = Universe::from_csv("ticker\nAAPL\nMSFT\n").unwrap();
        let raw: Vec<RawCalendarRow> = inputs
            .iter()
            .map(|(symbol, date)| RawCalendarRow {
                symbol: symbol.clone(),
                report_date: date.clone(),
                ..Default::default()
            })
            .collect();

        let out = filter_to_universe(&universe, &raw);

        let expected: Vec<String> = inputs
            .iter()
            .filter(|(symbol, date)| {
                universe.contains(&symbol.trim().to_ascii_uppercase())
                    && !date.trim().is_empty()
            })
            .map(|(symbol, _)| symbol.trim().to_ascii_uppercase())
            .collect();

        let got: Vec<String> = out.iter().map(|r| r.symbol.clone()).collect();
        prop_assert_eq!(got, expected);
    }
}
