//! Table assembly: every per-date series joined onto the index date domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::input::PanelStats;
use super::oscillators::OscillatorSeries;
use super::windows::WindowedSeries;
use crate::domain::{DailyAggregateRow, IndexObservation, ResultRow};

/// The engine's output: one row per index date, ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthTable {
    pub rows: Vec<ResultRow>,
    pub panel: PanelStats,
}

/// Externally supplied per-date series merged after computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuxiliaryKind {
    NewHighWinRate,
    BreakOut,
}

/// Per-date inputs to `assemble`, all aligned with the index series.
pub struct AssemblyInputs<'a> {
    pub index: &'a [IndexObservation],
    pub index_changes: &'a [Option<f64>],
    pub aggregates: &'a [DailyAggregateRow],
    pub windowed: &'a WindowedSeries,
    pub oscillators: &'a OscillatorSeries,
    pub score: &'a [Option<f64>],
}

pub fn assemble(inputs: AssemblyInputs<'_>, panel: PanelStats) -> BreadthTable {
    let w = inputs.windowed;
    let o = inputs.oscillators;

    let rows = inputs
        .index
        .iter()
        .zip(inputs.aggregates)
        .enumerate()
        .map(|(i, (obs, agg))| {
            debug_assert_eq!(obs.date, agg.date, "aggregate row out of step with index");
            ResultRow {
                date: obs.date,
                index_close: obs.close,
                index_change_pct: inputs.index_changes[i],
                index_rsi_fast: o.index_fast[i],
                index_rsi_slow: o.index_slow[i],
                breadth_above_ma: agg.breadth_above_ma,
                breadth_avg: w.breadth_avg[i],
                breadth_rsi: o.breadth[i],
                advances: agg.advances,
                declines: agg.declines,
                net_ad: agg.net_ad(),
                mfi_up_value: agg.mfi_up_value,
                mfi_down_value: agg.mfi_down_value,
                mfi_net: agg.mfi_net(),
                new_highs: agg.new_highs,
                new_lows: agg.new_lows,
                net_nhnl: agg.net_nhnl(),
                mfi_sum: w.mfi_sum[i],
                ad_sum: w.ad_sum[i],
                nhnl_sum: w.nhnl_sum[i],
                mfi_avg: w.mfi_avg[i],
                ad_avg: w.ad_avg[i],
                nhnl_avg: w.nhnl_avg[i],
                mfi_rsi: o.mfi[i],
                ad_rsi: o.ad[i],
                nhnl_rsi: o.nhnl[i],
                score: inputs.score[i],
                new_high_win_rate: None,
                break_out: None,
            }
        })
        .collect();

    BreadthTable { rows, panel }
}

impl BreadthTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    pub fn row(&self, date: NaiveDate) -> Option<&ResultRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Keep rows with `start <= date <= end`.
    ///
    /// Applied after computation, so no remaining value changes.
    pub fn filter_dates(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|r| start.map_or(true, |s| r.date >= s) && end.map_or(true, |e| r.date <= e))
            .cloned()
            .collect();
        Self {
            rows,
            panel: self.panel,
        }
    }

    /// Left-join an external `(date, fraction)` series as a percent column.
    ///
    /// Returns the number of rows holding a value afterwards. Later
    /// duplicates of a date in `series` win.
    pub fn attach_auxiliary(&mut self, kind: AuxiliaryKind, series: &[(NaiveDate, f64)]) -> usize {
        for &(date, fraction) in series {
            let Ok(i) = self.rows.binary_search_by_key(&date, |r| r.date) else {
                continue;
            };
            *auxiliary_slot(&mut self.rows[i], kind) =
                fraction.is_finite().then_some(fraction * 100.0);
        }
        self.rows
            .iter()
            .filter(|r| match kind {
                AuxiliaryKind::NewHighWinRate => r.new_high_win_rate.is_some(),
                AuxiliaryKind::BreakOut => r.break_out.is_some(),
            })
            .count()
    }
}

fn auxiliary_slot(row: &mut ResultRow, kind: AuxiliaryKind) -> &mut Option<f64> {
    match kind {
        AuxiliaryKind::NewHighWinRate => &mut row.new_high_win_rate,
        AuxiliaryKind::BreakOut => &mut row.break_out,
    }
}
