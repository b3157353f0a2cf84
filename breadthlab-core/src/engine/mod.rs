//! Breadth engine — batch pipeline from raw observations to the result table.
//!
//! Stages, each consuming the previous stage's immutable output:
//!
//! 1. Input: validate the index, group the panel per ticker
//! 2. Per-ticker causal windows (MA, trailing high/low), in parallel
//! 3. Cross-sectional aggregation per index date
//! 4. Rolling sums and means
//! 5. Wilder RSI per series
//! 6. Composite score
//! 7. Table assembly on the index date domain
//!
//! The whole table is recomputed on every call; either a complete table or
//! an `EngineError` comes out.

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod input;
pub mod oscillators;
pub mod score;
pub mod ticker;
pub mod windows;

pub use aggregate::aggregate;
pub use assemble::{assemble, AssemblyInputs, AuxiliaryKind, BreadthTable};
pub use config::{EngineConfig, EngineError};
pub use input::{group_panel, validate_index, PanelStats, TickerHistory};
pub use oscillators::{compute_oscillators, OscillatorSeries};
pub use score::{composite_score, score_of};
pub use ticker::{build_ticker_windows, TickerDay, TickerWindows};
pub use windows::{compute_windows, WindowedSeries};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{index_changes, IndexObservation, StockObservation};

/// Compute the full breadth table.
pub fn compute_breadth(
    index: &[IndexObservation],
    panel: &[StockObservation],
    config: &EngineConfig,
) -> Result<BreadthTable, EngineError> {
    config.validate()?;
    validate_index(index)?;

    let (histories, stats) = group_panel(panel)?;
    info!(
        index_rows = index.len(),
        tickers = stats.tickers,
        observations = stats.observations,
        "computing breadth"
    );

    let tickers = build_ticker_windows(&histories, config);
    debug!(tickers = tickers.len(), "per-ticker windows built");

    let dates: Vec<NaiveDate> = index.iter().map(|o| o.date).collect();
    let aggregates = aggregate(&dates, &tickers, config);

    let windowed = compute_windows(&aggregates, config);
    let closes: Vec<f64> = index.iter().map(|o| o.close).collect();
    let oscillators = compute_oscillators(&closes, &aggregates, &windowed, config);

    let breadth: Vec<Option<f64>> = aggregates.iter().map(|r| r.breadth_above_ma).collect();
    let score = composite_score([
        &oscillators.index_fast,
        &oscillators.index_slow,
        &oscillators.mfi,
        &oscillators.nhnl,
        &oscillators.ad,
        &breadth,
    ]);
    let changes = index_changes(index);

    let table = assemble(
        AssemblyInputs {
            index,
            index_changes: &changes,
            aggregates: &aggregates,
            windowed: &windowed,
            oscillators: &oscillators,
            score: &score,
        },
        stats,
    );
    debug!(
        rows = table.len(),
        scored = table.rows.iter().filter(|r| r.score.is_some()).count(),
        "breadth table assembled"
    );
    Ok(table)
}
