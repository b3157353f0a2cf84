//! Cross-sectional aggregation.
//!
//! For every index date, scans all tickers that traded that day and tallies
//! breadth, advance/decline, money flow and new-high/new-low counts. A
//! metric whose eligible set is empty on a date stays `None`.
//!
//! Tickers are folded in the order given (sorted by ticker upstream), which
//! fixes the floating-point summation order of the money-flow values.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::config::EngineConfig;
use super::ticker::{TickerDay, TickerWindows};
use crate::domain::{pct_change, DailyAggregateRow};

/// Running counts for one date.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    ma_eligible: u32,
    above_ma: u32,
    ad_eligible: u32,
    advances: u32,
    declines: u32,
    mfi_up: f64,
    mfi_down: f64,
    nhnl_eligible: u32,
    new_highs: u32,
    new_lows: u32,
}

impl Tally {
    fn add(&mut self, day: &TickerDay, threshold: f64) {
        if let Some(ma) = day.ma {
            self.ma_eligible += 1;
            if day.close > ma {
                self.above_ma += 1;
            }
        }

        if let Some(change) = day.prev_close.and_then(|prev| pct_change(prev, day.close)) {
            self.ad_eligible += 1;
            if change > threshold {
                self.advances += 1;
                self.mfi_up += day.matching_value;
            } else if change < -threshold {
                self.declines += 1;
                self.mfi_down += day.matching_value;
            }
        }

        // Both flags may fire on a flat window.
        if let Some((high, low)) = day.extrema {
            self.nhnl_eligible += 1;
            if day.close >= high {
                self.new_highs += 1;
            }
            if day.close <= low {
                self.new_lows += 1;
            }
        }
    }

    fn into_row(self, date: NaiveDate) -> DailyAggregateRow {
        let mut row = DailyAggregateRow::empty(date);
        if self.ma_eligible > 0 {
            row.breadth_above_ma =
                Some(f64::from(self.above_ma) / f64::from(self.ma_eligible) * 100.0);
        }
        if self.ad_eligible > 0 {
            row.advances = Some(self.advances);
            row.declines = Some(self.declines);
            row.mfi_up_value = Some(self.mfi_up);
            row.mfi_down_value = Some(self.mfi_down);
        }
        if self.nhnl_eligible > 0 {
            row.new_highs = Some(self.new_highs);
            row.new_lows = Some(self.new_lows);
        }
        row
    }
}

/// One `DailyAggregateRow` per entry of `dates`, in the same order.
///
/// Ticker observations on dates outside `dates` feed the per-ticker
/// windows but produce no row.
pub fn aggregate(
    dates: &[NaiveDate],
    tickers: &[TickerWindows],
    config: &EngineConfig,
) -> Vec<DailyAggregateRow> {
    let position: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();
    let mut tallies = vec![Tally::default(); dates.len()];

    for ticker in tickers {
        for day in ticker.days() {
            if let Some(&i) = position.get(&day.date) {
                tallies[i].add(day, config.change_threshold_pct);
            }
        }
    }

    tallies
        .into_iter()
        .zip(dates)
        .map(|(tally, date)| tally.into_row(*date))
        .collect()
}
