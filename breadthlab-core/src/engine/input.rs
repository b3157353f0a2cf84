//! Input validation and per-ticker grouping.
//!
//! The index series must be non-empty, strictly ascending and finite.
//! Panel rows are grouped by ticker and sorted by date; unusable rows
//! (non-positive or non-finite close, bad volume) are dropped and counted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::config::EngineError;
use crate::domain::{IndexObservation, StockObservation};

/// Check the index series for fatal inconsistencies.
pub fn validate_index(index: &[IndexObservation]) -> Result<(), EngineError> {
    let first = index.first().ok_or(EngineError::EmptyIndex)?;
    if !first.close.is_finite() {
        return Err(EngineError::NonFiniteIndexClose {
            date: first.date,
            close: first.close,
        });
    }

    for pair in index.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.date == prev.date {
            return Err(EngineError::DuplicateIndexDate(next.date));
        }
        if next.date < prev.date {
            return Err(EngineError::UnorderedIndex {
                prev: prev.date,
                next: next.date,
            });
        }
        if !next.close.is_finite() {
            return Err(EngineError::NonFiniteIndexClose {
                date: next.date,
                close: next.close,
            });
        }
    }
    Ok(())
}

/// One ticker's usable observations, ascending by date.
#[derive(Debug, Clone)]
pub struct TickerHistory {
    pub ticker: String,
    pub observations: Vec<StockObservation>,
}

/// Bookkeeping about the panel as consumed by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelStats {
    pub tickers: usize,
    pub observations: usize,
    pub dropped_rows: usize,
}

/// Group the panel by ticker, sorted by ticker then date.
pub fn group_panel(
    panel: &[StockObservation],
) -> Result<(Vec<TickerHistory>, PanelStats), EngineError> {
    let mut grouped: BTreeMap<&str, Vec<&StockObservation>> = BTreeMap::new();
    let mut dropped_rows = 0;

    for obs in panel {
        if !obs.is_usable() {
            dropped_rows += 1;
            continue;
        }
        grouped.entry(obs.ticker.as_str()).or_default().push(obs);
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, "dropped unusable panel rows (bad close or volume)");
    }

    let mut histories = Vec::with_capacity(grouped.len());
    let mut observations = 0;
    for (ticker, mut rows) in grouped {
        rows.sort_by_key(|o| o.date);
        for pair in rows.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(EngineError::DuplicateObservation {
                    ticker: ticker.to_string(),
                    date: pair[1].date,
                });
            }
        }
        observations += rows.len();
        histories.push(TickerHistory {
            ticker: ticker.to_string(),
            observations: rows.into_iter().cloned().collect(),
        });
    }

    let stats = PanelStats {
        tickers: histories.len(),
        observations,
        dropped_rows,
    };
    Ok((histories, stats))
}
