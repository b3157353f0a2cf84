//! Per-ticker causal windows.
//!
//! Each ticker's trailing MA, trailing high/low and previous close are
//! computed once from a scan of its own ordered history and never mutated
//! afterwards. Tickers are independent, so the scans run in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;

use super::config::EngineConfig;
use super::input::TickerHistory;
use crate::indicators::{rolling, trailing_extrema, Aggregation};

/// Everything the cross-sectional aggregator needs from one ticker on one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerDay {
    pub date: NaiveDate,
    pub close: f64,
    pub matching_value: f64,
    /// Trailing MA over the ticker's last `ma_period` observations, ending today.
    pub ma: Option<f64>,
    /// (max, min) close over the last `extrema_period` observations, ending today.
    pub extrema: Option<(f64, f64)>,
    /// Close of the ticker's immediately preceding observation.
    pub prev_close: Option<f64>,
}

/// Causal window state for one ticker.
#[derive(Debug, Clone)]
pub struct TickerWindows {
    ticker: String,
    days: Vec<TickerDay>,
}

impl TickerWindows {
    pub fn build(history: &TickerHistory, config: &EngineConfig) -> Self {
        let closes: Vec<f64> = history.observations.iter().map(|o| o.close).collect();
        let as_series: Vec<Option<f64>> = closes.iter().map(|&c| Some(c)).collect();
        let ma = rolling(&as_series, config.ma_period, Aggregation::Mean);
        let extrema = trailing_extrema(&closes, config.extrema_period);

        let days = history
            .observations
            .iter()
            .enumerate()
            .map(|(i, obs)| TickerDay {
                date: obs.date,
                close: obs.close,
                matching_value: obs.matching_value(),
                ma: ma[i],
                extrema: extrema[i],
                prev_close: i.checked_sub(1).map(|p| closes[p]),
            })
            .collect();

        Self {
            ticker: history.ticker.clone(),
            days,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn days(&self) -> &[TickerDay] {
        &self.days
    }
}

/// Build window state for every ticker. Output keeps the input order.
pub fn build_ticker_windows(
    histories: &[TickerHistory],
    config: &EngineConfig,
) -> Vec<TickerWindows> {
    histories
        .par_iter()
        .map(|h| TickerWindows::build(h, config))
        .collect()
}
