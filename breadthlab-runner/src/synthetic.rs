//! Synthetic index and panel for demos, benches and tests.
//!
//! A one-factor random walk: every ticker's daily return is a shared market
//! move plus its own noise, and the index follows the market move. About
//! one observation in twenty is missing, and some tickers list late, so the
//! engine sees a sparse panel like a real exchange feed.
//!
//! Output depends only on `(tickers, days, seed)`.

use breadthlab_core::domain::{IndexObservation, StockObservation};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Probability that a ticker has no row on a given day.
const MISSING_RATE: f64 = 0.05;

/// A generated index series and stock panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticData {
    pub index: Vec<IndexObservation>,
    pub panel: Vec<StockObservation>,
}

/// Weekdays starting 2022-10-31.
fn trading_days(count: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(count);
    let mut current = NaiveDate::from_ymd_opt(2022, 10, 31).unwrap_or_default();
    while out.len() < count {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(current);
        }
        current += chrono::Duration::days(1);
    }
    out
}

/// Ticker symbol for position `i`: `SYN000`, `SYN001`, ...
pub fn ticker_name(i: usize) -> String {
    format!("SYN{i:03}")
}

/// Generate `days` trading days of index closes and a `tickers`-wide panel.
pub fn generate(tickers: usize, days: usize, seed: u64) -> SyntheticData {
    let mut rng = StdRng::seed_from_u64(seed);
    let dates = trading_days(days);

    let market: Vec<f64> = dates.iter().map(|_| rng.gen_range(-0.015..0.015)).collect();

    let mut index = Vec::with_capacity(days);
    let mut level = 1_000.0_f64;
    for (date, m) in dates.iter().zip(&market) {
        level *= 1.0 + m;
        index.push(IndexObservation::new(*date, level));
    }

    let mut panel = Vec::with_capacity(tickers * days);
    for t in 0..tickers {
        let symbol = ticker_name(t);
        let beta: f64 = rng.gen_range(0.6..1.4);
        let mut price: f64 = rng.gen_range(5.0..150.0);
        let base_volume: f64 = rng.gen_range(50_000.0..5_000_000.0);
        // a quarter of the universe lists partway through
        let listed_from = if rng.gen_bool(0.25) {
            rng.gen_range(0..days.max(1))
        } else {
            0
        };

        for (i, (date, m)) in dates.iter().zip(&market).enumerate() {
            let noise: f64 = rng.gen_range(-0.025..0.025);
            price = (price * (1.0 + beta * m + noise)).max(0.01);
            if i < listed_from || rng.gen_bool(MISSING_RATE) {
                continue;
            }
            let volume = (base_volume * rng.gen_range(0.3..2.5)).round();
            panel.push(StockObservation::new(
                symbol.as_str(),
                *date,
                (price * 100.0).round() / 100.0,
                volume,
            ));
        }
    }

    SyntheticData { index, panel }
}
