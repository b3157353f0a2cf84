//! Breadth runner — wires together loading, the engine, and the auxiliary merge.
//!
//! Two entry points:
//! - `run_breadth()`: loads inputs named by a `BreadthConfig`, then runs. Used by CLI.
//! - `run_from_data()`: takes pre-loaded observations. No I/O besides the
//!   optional auxiliary files.

use std::path::Path;

use breadthlab_core::domain::{IndexObservation, StockObservation};
use breadthlab_core::engine::{AuxiliaryKind, BreadthTable};
use breadthlab_core::{compute_breadth, EngineConfig, EngineError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::auxiliary::merge_auxiliary;
use crate::config::{BreadthConfig, ConfigError};
use crate::data_loader::{load_inputs, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Headline numbers of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rows in the (date-filtered) table.
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Rows with a defined Score.
    pub scored_rows: usize,
    pub tickers: usize,
    pub observations: usize,
    /// Panel rows the engine dropped as unusable.
    pub dropped_rows: usize,
    /// Panel rows removed by the universe filter before the engine ran.
    pub filtered_rows: usize,
    /// Rows holding a new-high win rate, when that series was supplied.
    pub win_rate_rows: Option<usize>,
    /// Rows holding a break-out value, when that series was supplied.
    pub break_out_rows: Option<usize>,
}

/// Complete result of a breadth run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadthRun {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub engine: EngineConfig,
    pub dataset_hash: String,
    pub summary: RunSummary,
    pub table: BreadthTable,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Auxiliary file paths for `run_from_data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuxiliaryInputs<'a> {
    pub win_rate: Option<&'a Path>,
    pub break_out: Option<&'a Path>,
}

/// Run from a `BreadthConfig` (loads inputs from disk).
pub fn run_breadth(config: &BreadthConfig) -> Result<BreadthRun, RunError> {
    config.validate()?;
    let loaded = load_inputs(&config.inputs)?;

    let mut run = run_from_data(
        &loaded.index,
        &loaded.panel,
        &config.engine,
        AuxiliaryInputs {
            win_rate: config.inputs.win_rate.as_deref(),
            break_out: config.inputs.break_out.as_deref(),
        },
        config.output.start,
        config.output.end,
        &loaded.dataset_hash,
    )?;
    run.summary.filtered_rows = loaded.filtered_rows;
    Ok(run)
}

/// Run with pre-loaded observations.
///
/// The full history is computed first and the `[start, end]` window is cut
/// afterwards, so the window never changes a value.
pub fn run_from_data(
    index: &[IndexObservation],
    panel: &[StockObservation],
    engine: &EngineConfig,
    auxiliary: AuxiliaryInputs<'_>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    dataset_hash: &str,
) -> Result<BreadthRun, RunError> {
    let mut table = compute_breadth(index, panel, engine)?;

    let win_rate_rows = auxiliary
        .win_rate
        .map(|path| merge_auxiliary(&mut table, AuxiliaryKind::NewHighWinRate, path))
        .transpose()?;
    let break_out_rows = auxiliary
        .break_out
        .map(|path| merge_auxiliary(&mut table, AuxiliaryKind::BreakOut, path))
        .transpose()?;

    let table = if start.is_some() || end.is_some() {
        table.filter_dates(start, end)
    } else {
        table
    };

    let summary = RunSummary {
        rows: table.len(),
        first_date: table.first_date(),
        last_date: table.last_date(),
        scored_rows: table.rows.iter().filter(|r| r.score.is_some()).count(),
        tickers: table.panel.tickers,
        observations: table.panel.observations,
        dropped_rows: table.panel.dropped_rows,
        filtered_rows: 0,
        win_rate_rows,
        break_out_rows,
    };
    info!(
        rows = summary.rows,
        scored = summary.scored_rows,
        first = ?summary.first_date,
        last = ?summary.last_date,
        "breadth run complete"
    );

    Ok(BreadthRun {
        schema_version: SCHEMA_VERSION,
        engine: engine.clone(),
        dataset_hash: dataset_hash.to_string(),
        summary,
        table,
    })
}
