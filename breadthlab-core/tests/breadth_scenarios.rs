//! End-to-end scenarios for the breadth engine.
//!
//! Each test builds a small hand-checked index/panel and asserts on the
//! assembled table.

use breadthlab_core::domain::{IndexObservation, StockObservation};
use breadthlab_core::engine::EngineError;
use breadthlab_core::{compute_breadth, EngineConfig};
use chrono::NaiveDate;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

fn linear_index(days: usize, start: f64, step: f64) -> Vec<IndexObservation> {
    (0..days)
        .map(|i| IndexObservation::new(day(i), start + step * i as f64))
        .collect()
}

fn ticker(name: &str, closes: &[(usize, f64)]) -> Vec<StockObservation> {
    closes
        .iter()
        .map(|&(i, c)| StockObservation::new(name, day(i), c, 1_000.0))
        .collect()
}

#[test]
fn rising_index_rsi_is_100_from_day_22() {
    let index = linear_index(25, 1_000.0, 1.0);
    let table = compute_breadth(&index, &[], &EngineConfig::default()).unwrap();

    for row in &table.rows[..21] {
        assert_eq!(row.index_rsi_fast, None, "{}", row.date);
    }
    for row in &table.rows[21..] {
        assert_eq!(row.index_rsi_fast, Some(100.0), "{}", row.date);
    }
    assert!(table.rows.iter().all(|r| r.index_rsi_slow.is_none()));
}

#[test]
fn breadth_ignores_tickers_without_enough_history() {
    let index = linear_index(60, 1_000.0, 0.5);
    let a: Vec<(usize, f64)> = (0..60).map(|i| (i, 10.0 + i as f64 * 0.1)).collect();
    let b: Vec<(usize, f64)> = (50..60).map(|i| (i, 50.0 - i as f64 * 0.1)).collect();
    let c: Vec<(usize, f64)> = (45..60).map(|i| (i, 30.0)).collect();

    let mut panel = ticker("A", &a);
    panel.extend(ticker("B", &b));
    panel.extend(ticker("C", &c));

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();

    // A reaches 50 observations on day 49 and trades above its rising MA.
    assert_eq!(table.rows[48].breadth_above_ma, None);
    assert_eq!(table.rows[49].breadth_above_ma, Some(100.0));
    assert_eq!(table.rows[59].breadth_above_ma, Some(100.0));
}

#[test]
fn flat_ticker_is_not_above_its_moving_average() {
    let index = linear_index(140, 1_000.0, 0.5);
    let closes: Vec<(usize, f64)> = (0..140)
        .map(|i| {
            let close = if i < 80 {
                10.0 + ((i * 17) % 13) as f64 * 0.37
            } else {
                10.3
            };
            (i, close)
        })
        .collect();
    let panel = ticker("FLAT", &closes);

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();

    // the MA window covers only flat days from day 129 on
    for row in &table.rows[129..] {
        assert_eq!(row.breadth_above_ma, Some(0.0), "{}", row.date);
    }
    // and the 20-day breadth mean is exactly zero once every input is
    assert_eq!(table.rows[139].breadth_avg, Some(0.0));
}

#[test]
fn steady_full_breadth_averages_to_exactly_100() {
    let index = linear_index(120, 1_000.0, 0.5);
    let closes: Vec<(usize, f64)> = (0..120).map(|i| (i, 7.3 + i as f64 * 0.11)).collect();
    let panel = ticker("RISE", &closes);

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();
    for row in &table.rows[68..] {
        assert_eq!(row.breadth_avg, Some(100.0), "{}", row.date);
    }
}

#[test]
fn exactly_one_percent_is_excluded_from_advances_and_money_flow() {
    let index = linear_index(2, 1_000.0, 1.0);
    let mut panel = ticker("EDGE", &[(0, 100.0), (1, 101.0)]);
    panel.extend(ticker("UP", &[(0, 100.0), (1, 101.5)]));

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();
    let row = &table.rows[1];
    assert_eq!(row.advances, Some(1));
    assert_eq!(row.declines, Some(0));
    assert_eq!(row.mfi_up_value, Some(101.5 * 1_000.0));
    assert_eq!(row.mfi_down_value, Some(0.0));
    assert_eq!(row.net_ad, Some(1));
}

#[test]
fn panel_only_dates_produce_no_rows() {
    let index = vec![
        IndexObservation::new(day(0), 1_000.0),
        IndexObservation::new(day(2), 1_001.0),
    ];
    let panel = ticker("A", &[(0, 10.0), (1, 11.0), (2, 12.0)]);

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();
    let dates: Vec<_> = table.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(0), day(2)]);
    assert!(table.row(day(1)).is_none());
    // day 2 compares against the ticker's day-1 close: +9.09%
    assert_eq!(table.rows[1].advances, Some(1));
}

#[test]
fn empty_eligible_set_is_missing_not_zero() {
    let index = linear_index(5, 1_000.0, 1.0);
    let panel = ticker("A", &[(0, 10.0), (1, 10.0), (2, 10.0)]);

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();
    // day 0: A has no previous close
    assert_eq!(table.rows[0].advances, None);
    assert_eq!(table.rows[0].mfi_up_value, None);
    // day 1: A is flat, so counts are a computed zero
    assert_eq!(table.rows[1].advances, Some(0));
    // days 3-4: nobody traded
    assert_eq!(table.rows[3].advances, None);
    assert_eq!(table.rows[3].net_ad, None);
    assert_eq!(table.rows[4].breadth_above_ma, None);
    assert_eq!(table.rows[4].new_highs, None);
}

#[test]
fn first_index_change_is_undefined() {
    let table = compute_breadth(&linear_index(3, 200.0, 2.0), &[], &EngineConfig::default())
        .unwrap();
    assert_eq!(table.rows[0].index_change_pct, None);
    assert_eq!(table.rows[1].index_change_pct, Some(1.0));
}

#[test]
fn rolling_sums_and_means_match_direct_computation() {
    let days = 80;
    let index = linear_index(days, 1_000.0, 1.0);
    let mut panel = Vec::new();
    for t in 0..6 {
        let closes: Vec<(usize, f64)> = (0..days)
            .map(|i| {
                let wiggle = if (i + t) % 3 == 0 { 1.05 } else { 0.97 };
                (i, 10.0 * wiggle + i as f64 * 0.01)
            })
            .collect();
        panel.extend(ticker(&format!("S{t}"), &closes));
    }

    let config = EngineConfig::default();
    let table = compute_breadth(&index, &panel, &config).unwrap();
    let rows = &table.rows;

    for t in 0..days {
        let sum = rows[t].ad_sum;
        if t + 1 < 1 + config.sum_window {
            // day 0 has no A/D, so the first full window ends on day 15
            assert_eq!(sum, None, "day {t}");
            continue;
        }
        let direct: i64 = rows[t + 1 - config.sum_window..=t]
            .iter()
            .map(|r| r.net_ad.unwrap())
            .sum();
        assert_eq!(sum, Some(direct as f64), "day {t}");

        if let Some(avg) = rows[t].ad_avg {
            let window = &rows[t + 1 - config.avg_window..=t];
            let mean = window.iter().map(|r| r.ad_sum.unwrap()).sum::<f64>()
                / config.avg_window as f64;
            assert!((avg - mean).abs() < 1e-9, "day {t}: {avg} vs {mean}");
        }
    }
    assert!(rows[34].ad_avg.is_some());
    assert!(rows[33].ad_avg.is_none());
}

#[test]
fn score_is_mean_of_six_inputs() {
    let days = 150;
    let index: Vec<_> = (0..days)
        .map(|i| IndexObservation::new(day(i), 1_000.0 + (i as f64 * 0.3).sin() * 20.0))
        .collect();
    let mut panel = Vec::new();
    for t in 0..8 {
        let closes: Vec<(usize, f64)> = (0..days)
            .map(|i| (i, 20.0 + ((i + 5 * t) as f64 * 0.21).sin() * 3.0))
            .collect();
        panel.extend(ticker(&format!("K{t}"), &closes));
    }

    let table = compute_breadth(&index, &panel, &EngineConfig::default()).unwrap();
    let mut scored = 0;
    for row in &table.rows {
        let inputs = [
            row.index_rsi_fast,
            row.index_rsi_slow,
            row.mfi_rsi,
            row.nhnl_rsi,
            row.ad_rsi,
            row.breadth_above_ma,
        ];
        match row.score {
            Some(score) => {
                scored += 1;
                let mean = inputs.iter().map(|v| v.unwrap()).sum::<f64>() / 6.0;
                assert!((score - mean).abs() < 1e-9);
                assert!((0.0..=100.0).contains(&score));
            }
            None => assert!(inputs.iter().any(Option::is_none), "{}", row.date),
        }
    }
    assert!(scored > 0, "expected some scored rows");
}

#[test]
fn inconsistent_index_aborts() {
    let mut index = linear_index(5, 1_000.0, 1.0);
    index.swap(1, 3);
    let err = compute_breadth(&index, &[], &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::UnorderedIndex { .. }));

    let err = compute_breadth(&[], &[], &EngineConfig::default()).unwrap_err();
    assert_eq!(err, EngineError::EmptyIndex);
}
