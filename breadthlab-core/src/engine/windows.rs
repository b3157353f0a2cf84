//! Rolling-window stage: 15-day sums of the daily nets and 20-day means.

use super::config::EngineConfig;
use crate::domain::DailyAggregateRow;
use crate::indicators::{rolling, Aggregation};

/// Windowed series aligned with the aggregate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedSeries {
    pub mfi_sum: Vec<Option<f64>>,
    pub ad_sum: Vec<Option<f64>>,
    pub nhnl_sum: Vec<Option<f64>>,
    pub breadth_avg: Vec<Option<f64>>,
    pub mfi_avg: Vec<Option<f64>>,
    pub ad_avg: Vec<Option<f64>>,
    pub nhnl_avg: Vec<Option<f64>>,
}

pub fn compute_windows(rows: &[DailyAggregateRow], config: &EngineConfig) -> WindowedSeries {
    let mfi_net: Vec<Option<f64>> = rows.iter().map(DailyAggregateRow::mfi_net).collect();
    let ad_net: Vec<Option<f64>> = rows.iter().map(|r| r.net_ad().map(|v| v as f64)).collect();
    let nhnl_net: Vec<Option<f64>> = rows
        .iter()
        .map(|r| r.net_nhnl().map(|v| v as f64))
        .collect();
    let breadth: Vec<Option<f64>> = rows.iter().map(|r| r.breadth_above_ma).collect();

    let mfi_sum = rolling(&mfi_net, config.sum_window, Aggregation::Sum);
    let ad_sum = rolling(&ad_net, config.sum_window, Aggregation::Sum);
    let nhnl_sum = rolling(&nhnl_net, config.sum_window, Aggregation::Sum);

    WindowedSeries {
        breadth_avg: rolling(&breadth, config.avg_window, Aggregation::Mean),
        mfi_avg: rolling(&mfi_sum, config.avg_window, Aggregation::Mean),
        ad_avg: rolling(&ad_sum, config.avg_window, Aggregation::Mean),
        nhnl_avg: rolling(&nhnl_sum, config.avg_window, Aggregation::Mean),
        mfi_sum,
        ad_sum,
        nhnl_sum,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows(n: usize) -> Vec<DailyAggregateRow> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| DailyAggregateRow {
                date: base + chrono::Duration::days(i as i64),
                breadth_above_ma: Some(50.0),
                advances: Some(i as u32),
                declines: Some(1),
                mfi_up_value: Some(10.0),
                mfi_down_value: Some(4.0),
                new_highs: Some(2),
                new_lows: Some(3),
            })
            .collect()
    }

    #[test]
    fn sums_then_means() {
        let cfg = EngineConfig {
            sum_window: 3,
            avg_window: 2,
            ..EngineConfig::default()
        };
        let w = compute_windows(&rows(6), &cfg);
        assert_eq!(w.mfi_sum[1], None);
        assert_eq!(w.mfi_sum[2], Some(18.0));
        assert_eq!(w.nhnl_sum[2], Some(-3.0));
        // ad nets: -1, 0, 1, 2, 3, 4
        assert_eq!(w.ad_sum[2], Some(0.0));
        assert_eq!(w.ad_sum[5], Some(9.0));
        // avg needs two defined sums
        assert_eq!(w.ad_avg[2], None);
        assert_eq!(w.ad_avg[3], Some(1.5));
        assert_eq!(w.breadth_avg[1], Some(50.0));
    }

    #[test]
    fn missing_aggregate_breaks_window() {
        let mut r = rows(5);
        r[2].advances = None;
        let cfg = EngineConfig {
            sum_window: 2,
            avg_window: 2,
            ..EngineConfig::default()
        };
        let w = compute_windows(&r, &cfg);
        assert_eq!(w.ad_sum[2], None);
        assert_eq!(w.ad_sum[3], None);
        assert_eq!(w.ad_sum[4], Some(5.0));
        // other series are unaffected
        assert_eq!(w.mfi_sum[3], Some(12.0));
    }
}
