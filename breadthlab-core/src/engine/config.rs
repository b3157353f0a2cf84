//! Engine configuration and error types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Window lengths and thresholds for one breadth computation.
///
/// Defaults reproduce the standard dashboard: 50-day MA breadth, 20-day
/// new highs/lows, 15-day sums, 20-day means, RSI 21/70, ±1% classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trailing MA length for breadth (observations of the ticker itself).
    pub ma_period: usize,
    /// Trailing window for new-high / new-low detection.
    pub extrema_period: usize,
    /// Rolling sum length for MFI, A/D and NHNL nets.
    pub sum_window: usize,
    /// Rolling mean length for breadth and the rolling sums.
    pub avg_window: usize,
    /// RSI period for the index and for every breadth series.
    pub rsi_fast: usize,
    /// Second, slower RSI period applied to the index only.
    pub rsi_slow: usize,
    /// Daily % change beyond which a ticker is an advance/decline.
    /// The bound itself is excluded on both sides.
    pub change_threshold_pct: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ma_period: 50,
            extrema_period: 20,
            sum_window: 15,
            avg_window: 20,
            rsi_fast: 21,
            rsi_slow: 70,
            change_threshold_pct: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let windows = [
            ("ma_period", self.ma_period),
            ("extrema_period", self.extrema_period),
            ("sum_window", self.sum_window),
            ("avg_window", self.avg_window),
            ("rsi_fast", self.rsi_fast),
            ("rsi_slow", self.rsi_slow),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(EngineError::InvalidConfig(format!("{name} must be >= 1")));
            }
        }
        if !self.change_threshold_pct.is_finite() || self.change_threshold_pct < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "change_threshold_pct must be finite and >= 0, got {}",
                self.change_threshold_pct
            )));
        }
        Ok(())
    }
}

/// Fatal input problems. The engine refuses to produce a table.
///
/// Insufficient history, missing observations and empty eligible sets are
/// not errors: they surface as `None` cells in the table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("index series is empty")]
    EmptyIndex,

    #[error("index series is out of order: {prev} is followed by {next}")]
    UnorderedIndex { prev: NaiveDate, next: NaiveDate },

    #[error("index series has more than one row for {0}")]
    DuplicateIndexDate(NaiveDate),

    #[error("index close on {date} is not a finite number: {close}")]
    NonFiniteIndexClose { date: NaiveDate, close: f64 },

    #[error("stock panel has more than one row for {ticker} on {date}")]
    DuplicateObservation { ticker: String, date: NaiveDate },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}
