//! Observations — the two raw inputs of the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One closing print of the benchmark index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexObservation {
    pub date: NaiveDate,
    pub close: f64,
}

impl IndexObservation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// One daily close/volume print for a single ticker.
///
/// The panel is sparse: a ticker with no row on a date simply did not
/// trade (or has no data) that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockObservation {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}

impl StockObservation {
    pub fn new(ticker: impl Into<String>, date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            close,
            volume,
        }
    }

    /// Traded value for the day: close × volume.
    pub fn matching_value(&self) -> f64 {
        self.close * self.volume
    }

    /// A row is usable when its close is a positive finite price and its
    /// volume is a finite non-negative quantity.
    pub fn is_usable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0 && self.volume.is_finite() && self.volume >= 0.0
    }
}

/// Percentage change from `prev` to `curr`.
///
/// Returns `None` when `prev` is zero or either value is not finite.
pub fn pct_change(prev: f64, curr: f64) -> Option<f64> {
    if !prev.is_finite() || !curr.is_finite() || prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev * 100.0)
}

/// Daily % change of the index close; `None` for the first observation.
pub fn index_changes(index: &[IndexObservation]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(index.len());
    for (i, obs) in index.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(pct_change(index[i - 1].close, obs.close));
        }
    }
    out
}
