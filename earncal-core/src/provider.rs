//! Calendar provider — one bulk request, strict response classification.
//!
//! AlphaVantage answers `EARNINGS_CALENDAR` with CSV on success, but
//! rate-limit and advisory responses come back as small JSON bodies with a
//! 200 status. Classification treats any JSON object body as a provider
//! error and digs the human-readable message out of the known note fields.
//!
//! The [`CalendarSource`] trait abstracts the transport so jobs run against
//! canned bodies in tests. No retries live here; if a scheduler wants retry
//! behavior it re-invokes the whole run.

use crate::config::Horizon;
use std::time::Duration;
use thiserror::Error;

/// Fields AlphaVantage uses for advisory / rate-limit messages.
const NOTE_FIELDS: [&str; 3] = ["Note", "Error Message", "Information"];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("empty response from provider")]
    EmptyResponse,

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("calendar schema mismatch: {0}")]
    Schema(String),

    #[error("provider returned {got} rows (expected at least {min})")]
    InsufficientRows { got: usize, min: usize },
}

/// A provider record exactly as received; absent cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCalendarRow {
    pub symbol: String,
    pub name: String,
    pub report_date: String,
    pub fiscal_date_ending: String,
    pub estimate: String,
    pub currency: String,
}

/// A source of raw calendar bodies.
pub trait CalendarSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the raw calendar body for the given horizon. Exactly one
    /// request; no retries.
    fn fetch_raw(&self, horizon: Horizon) -> Result<String, FetchError>;
}

/// AlphaVantage `EARNINGS_CALENDAR` source over blocking HTTP.
pub struct AlphaVantageSource {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl AlphaVantageSource {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

impl CalendarSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alphavantage"
    }

    fn fetch_raw(&self, horizon: Horizon) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("function", "EARNINGS_CALENDAR"),
                ("horizon", horizon.as_str()),
                ("apikey", self.api_key.as_str()),
                ("datatype", "csv"),
            ])
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {status}")));
        }
        resp.text().map_err(|e| FetchError::Network(e.to_string()))
    }
}

/// Classify a response body and parse it into raw rows.
///
/// - empty body → [`FetchError::EmptyResponse`]
/// - JSON object body → [`FetchError::Provider`] carrying the note message
/// - CSV without both `symbol` and `reportDate` columns → [`FetchError::Schema`]
/// - fewer than `min_raw_rows` rows → [`FetchError::InsufficientRows`]
///
/// Pass `min_raw_rows = 0` to disable the row-count check.
pub fn parse_calendar(body: &str, min_raw_rows: usize) -> Result<Vec<RawCalendarRow>, FetchError> {
    let text = body.trim();
    if text.is_empty() {
        return Err(FetchError::EmptyResponse);
    }
    if text.starts_with('{') {
        return Err(FetchError::Provider {
            message: extract_note(text),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| FetchError::Schema(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    for required in ["symbol", "reportdate"] {
        if !headers.iter().any(|h| h == required) {
            return Err(FetchError::Schema(format!(
                "header is missing a '{required}' column"
            )));
        }
    }

    let col = |name: &str| headers.iter().position(|h| h == name);
    let symbol_idx = col("symbol");
    let name_idx = col("name");
    let report_idx = col("reportdate");
    let fiscal_idx = col("fiscaldateending");
    let estimate_idx = col("estimate");
    let currency_idx = col("currency");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| FetchError::Schema(e.to_string()))?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
        };
        rows.push(RawCalendarRow {
            symbol: cell(symbol_idx),
            name: cell(name_idx),
            report_date: cell(report_idx),
            fiscal_date_ending: cell(fiscal_idx),
            estimate: cell(estimate_idx),
            currency: cell(currency_idx),
        });
    }

    if rows.len() < min_raw_rows {
        return Err(FetchError::InsufficientRows {
            got: rows.len(),
            min: min_raw_rows,
        });
    }
    Ok(rows)
}

/// Pull a human-readable message out of a JSON error body, falling back to
/// the raw text when it does not parse or carries none of the known fields.
fn extract_note(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(obj) => NOTE_FIELDS
            .iter()
            .find_map(|f| obj.get(f).and_then(|v| v.as_str()).map(str::to_string))
            .unwrap_or_else(|| text.to_string()),
        Err(_) => text.to_string(),
    }
}
