//! Oscillator stage: Wilder RSI over the index close and the breadth series.
//!
//! Every series gets its own `Rsi` instance, so no smoothing state is shared.

use super::config::EngineConfig;
use super::windows::WindowedSeries;
use crate::domain::DailyAggregateRow;
use crate::indicators::Rsi;

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorSeries {
    pub index_fast: Vec<Option<f64>>,
    pub index_slow: Vec<Option<f64>>,
    pub mfi: Vec<Option<f64>>,
    pub ad: Vec<Option<f64>>,
    pub nhnl: Vec<Option<f64>>,
    pub breadth: Vec<Option<f64>>,
}

pub fn compute_oscillators(
    index_closes: &[f64],
    rows: &[DailyAggregateRow],
    windowed: &WindowedSeries,
    config: &EngineConfig,
) -> OscillatorSeries {
    let index: Vec<Option<f64>> = index_closes.iter().map(|&c| Some(c)).collect();
    let breadth: Vec<Option<f64>> = rows.iter().map(|r| r.breadth_above_ma).collect();
    let fast = Rsi::new(config.rsi_fast);

    OscillatorSeries {
        index_fast: fast.compute(&index),
        index_slow: Rsi::new(config.rsi_slow).compute(&index),
        mfi: fast.compute(&windowed.mfi_sum),
        ad: fast.compute(&windowed.ad_sum),
        nhnl: fast.compute(&windowed.nhnl_sum),
        breadth: fast.compute(&breadth),
    }
}
