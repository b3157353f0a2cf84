//! Per-date rows produced by the engine.
//!
//! Every metric is `Option`-typed. `None` is the missing-value marker: it
//! means "not computable on this date" and is never conflated with zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cross-sectional aggregates for one trading date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregateRow {
    pub date: NaiveDate,
    /// Percent of eligible tickers closing above their trailing MA.
    pub breadth_above_ma: Option<f64>,
    pub advances: Option<u32>,
    pub declines: Option<u32>,
    pub mfi_up_value: Option<f64>,
    pub mfi_down_value: Option<f64>,
    pub new_highs: Option<u32>,
    pub new_lows: Option<u32>,
}

impl DailyAggregateRow {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }

    /// advances − declines.
    pub fn net_ad(&self) -> Option<i64> {
        Some(i64::from(self.advances?) - i64::from(self.declines?))
    }

    /// new_highs − new_lows.
    pub fn net_nhnl(&self) -> Option<i64> {
        Some(i64::from(self.new_highs?) - i64::from(self.new_lows?))
    }

    /// Up value − down value.
    pub fn mfi_net(&self) -> Option<f64> {
        Some(self.mfi_up_value? - self.mfi_down_value?)
    }
}

/// One row of the final breadth table.
///
/// Column order of the exported table follows the field order here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub date: NaiveDate,
    pub index_close: f64,
    pub index_change_pct: Option<f64>,
    pub index_rsi_fast: Option<f64>,
    pub index_rsi_slow: Option<f64>,

    pub breadth_above_ma: Option<f64>,
    pub breadth_avg: Option<f64>,
    pub breadth_rsi: Option<f64>,

    pub advances: Option<u32>,
    pub declines: Option<u32>,
    pub net_ad: Option<i64>,
    pub mfi_up_value: Option<f64>,
    pub mfi_down_value: Option<f64>,
    pub mfi_net: Option<f64>,
    pub new_highs: Option<u32>,
    pub new_lows: Option<u32>,
    pub net_nhnl: Option<i64>,

    pub mfi_sum: Option<f64>,
    pub ad_sum: Option<f64>,
    pub nhnl_sum: Option<f64>,
    pub mfi_avg: Option<f64>,
    pub ad_avg: Option<f64>,
    pub nhnl_avg: Option<f64>,

    pub mfi_rsi: Option<f64>,
    pub ad_rsi: Option<f64>,
    pub nhnl_rsi: Option<f64>,

    pub score: Option<f64>,

    /// Externally supplied, merged after computation. Not used by `score`.
    #[serde(default)]
    pub new_high_win_rate: Option<f64>,
    #[serde(default)]
    pub break_out: Option<f64>,
}
