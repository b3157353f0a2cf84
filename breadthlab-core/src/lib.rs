//! BreadthLab Core — market breadth indicator engine.
//!
//! This crate turns a per-ticker daily price/volume panel plus a benchmark
//! index series into one daily table of breadth and oscillator metrics:
//! - Domain types (index/stock observations, aggregate and result rows)
//! - Per-ticker causal windows (trailing MA, trailing high/low)
//! - Cross-sectional aggregation (breadth, A/D, money flow, NH/NL)
//! - Rolling sums/means and Wilder RSI
//! - Composite score and table assembly
//! - polars DataFrame adapters for inputs and output
//!
//! There is no I/O here; loading and export live in `breadthlab-runner`.

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;

pub use engine::{compute_breadth, BreadthTable, EngineConfig, EngineError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all public engine types are Send + Sync.
    ///
    /// The runner hands tables across threads; if a type stops being
    /// Send + Sync the build breaks here first.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::IndexObservation>();
        require_sync::<domain::IndexObservation>();
        require_send::<domain::StockObservation>();
        require_sync::<domain::StockObservation>();
        require_send::<domain::DailyAggregateRow>();
        require_sync::<domain::DailyAggregateRow>();
        require_send::<domain::ResultRow>();
        require_sync::<domain::ResultRow>();

        // Engine types
        require_send::<engine::EngineConfig>();
        require_sync::<engine::EngineConfig>();
        require_send::<engine::BreadthTable>();
        require_sync::<engine::BreadthTable>();
        require_send::<engine::TickerWindows>();
        require_sync::<engine::TickerWindows>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();

        // Indicator state
        require_send::<indicators::RollingWindow>();
        require_sync::<indicators::RollingWindow>();
        require_send::<indicators::WilderState>();
        require_sync::<indicators::WilderState>();
    }

    /// Architecture contract: the aggregator only sees per-ticker window
    /// state, never the raw panel, so it cannot peek at later observations.
    #[test]
    fn aggregator_takes_window_state_not_raw_panel() {
        fn _check_signature(
            dates: &[chrono::NaiveDate],
            tickers: &[engine::TickerWindows],
            config: &EngineConfig,
        ) -> Vec<domain::DailyAggregateRow> {
            engine::aggregate(dates, tickers, config)
        }
    }
}
