//! Export — CSV, display CSV, JSON manifest and Parquet artifacts.
//!
//! - **CSV**: one column per `ResultRow` field, ascending dates, empty cell
//!   for a missing value
//! - **Display CSV**: dashboard layout with human labels, newest date first
//! - **JSON**: the whole `BreadthRun` with schema versioning
//! - **Parquet**: the polars frame from `table_to_frame`
//!
//! Unknown schema versions are rejected on load.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use breadthlab_core::data::table_to_frame;
use breadthlab_core::domain::ResultRow;
use breadthlab_core::{BreadthTable, EngineConfig};
use polars::prelude::ParquetWriter;
use tracing::info;

use crate::config::ExportFormat;
use crate::runner::{BreadthRun, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BreadthRun` to pretty JSON.
pub fn export_json(run: &BreadthRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize BreadthRun to JSON")
}

/// Deserialize a `BreadthRun` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BreadthRun> {
    let run: BreadthRun =
        serde_json::from_str(json).context("failed to deserialize BreadthRun from JSON")?;
    if run.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            run.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(run)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the table in machine layout: header = `ResultRow` field names.
pub fn export_csv(table: &BreadthTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in &table.rows {
        wtr.serialize(row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// How a display cell renders its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    /// `1234.5`
    Decimal,
    /// `56.7%`
    Percent,
    /// Value in billions, thousands-separated, no decimals: `1,234`
    Billions,
    /// `-12`
    Integer,
}

struct DisplayColumn {
    label: String,
    cell: Cell,
    value: fn(&ResultRow) -> Option<f64>,
}

fn column(label: impl Into<String>, cell: Cell, value: fn(&ResultRow) -> Option<f64>) -> DisplayColumn {
    DisplayColumn {
        label: label.into(),
        cell,
        value,
    }
}

fn count(v: Option<u32>) -> Option<f64> {
    v.map(f64::from)
}

fn net(v: Option<i64>) -> Option<f64> {
    v.map(|n| n as f64)
}

/// Dashboard column order. Labels follow the configured windows; the
/// auxiliary columns appear only when some row holds a value.
fn display_columns(table: &BreadthTable, config: &EngineConfig) -> Vec<DisplayColumn> {
    let avg = config.avg_window;
    let mut columns = vec![
        column("VnIndex", Cell::Decimal, |r| Some(r.index_close)),
        column(format!("VNI RSI{}", config.rsi_fast), Cell::Decimal, |r| r.index_rsi_fast),
        column(format!("VNI RSI{}", config.rsi_slow), Cell::Decimal, |r| r.index_rsi_slow),
        column(
            format!("Breadth - % > MA{}", config.ma_period),
            Cell::Percent,
            |r| r.breadth_above_ma,
        ),
        column("NHNL RSI", Cell::Decimal, |r| r.nhnl_rsi),
        column("MFI RSI", Cell::Decimal, |r| r.mfi_rsi),
        column("A/D RSI", Cell::Decimal, |r| r.ad_rsi),
        column("Score", Cell::Decimal, |r| r.score),
        column("MFI", Cell::Billions, |r| r.mfi_sum),
        column("AD", Cell::Integer, |r| r.ad_sum),
        column("NHNL", Cell::Integer, |r| r.nhnl_sum),
    ];
    if table.rows.iter().any(|r| r.new_high_win_rate.is_some()) {
        columns.push(column("New High", Cell::Percent, |r| r.new_high_win_rate));
    }
    if table.rows.iter().any(|r| r.break_out.is_some()) {
        columns.push(column("Break Out", Cell::Percent, |r| r.break_out));
    }
    columns.extend([
        column(format!("{avg}D Avg Breadth"), Cell::Percent, |r| r.breadth_avg),
        column("MFI: Up Value", Cell::Billions, |r| r.mfi_up_value),
        column("MFI: Down Value", Cell::Billions, |r| r.mfi_down_value),
        column(format!("{avg}D Avg MFI"), Cell::Billions, |r| r.mfi_avg),
        column("A/D: Advances", Cell::Integer, |r| count(r.advances)),
        column("A/D: Declines", Cell::Integer, |r| count(r.declines)),
        column("A/D: Net (A-B)", Cell::Integer, |r| net(r.net_ad)),
        column(format!("{avg}D Avg A/D"), Cell::Decimal, |r| r.ad_avg),
        column("NHNL: New Highs", Cell::Integer, |r| count(r.new_highs)),
        column("NHNL: New Lows", Cell::Integer, |r| count(r.new_lows)),
        column("NHNL: Net (A-B)", Cell::Integer, |r| net(r.net_nhnl)),
        column(format!("{avg}D Avg NHNL"), Cell::Decimal, |r| r.nhnl_avg),
    ]);
    columns
}

fn format_cell(cell: Cell, value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return String::new();
    };
    match cell {
        Cell::Decimal => format!("{v:.1}"),
        Cell::Percent => format!("{v:.1}%"),
        Cell::Billions => group_thousands(v / 1e9),
        Cell::Integer => format!("{v:.0}"),
    }
}

/// Round to an integer and insert `,` every three digits.
fn group_thousands(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if v < 0.0 && digits != "0" {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Export the table in dashboard layout, newest date first.
pub fn export_display_csv(table: &BreadthTable, config: &EngineConfig) -> Result<String> {
    let columns = display_columns(table, config);
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["Date".to_string()];
    header.extend(columns.iter().map(|c| c.label.clone()));
    wtr.write_record(&header)?;

    for row in table.rows.iter().rev() {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        record.extend(columns.iter().map(|c| format_cell(c.cell, (c.value)(row))));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Parquet export ─────────────────────────────────────────────────

/// Write the table as Parquet to `path`.
pub fn export_parquet(table: &BreadthTable, path: &Path) -> Result<()> {
    let mut df = table_to_frame(table).context("failed to build result frame")?;
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the selected artifacts for a run.
///
/// Creates a directory named `breadth_{timestamp}/` under `output_dir`
/// holding one file per format (see `ExportFormat::file_name`).
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    run: &BreadthRun,
    output_dir: &Path,
    formats: &[ExportFormat],
) -> Result<PathBuf> {
    let dirname = format!("breadth_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let mut seen = HashSet::new();
    for &format in formats {
        if !seen.insert(format) {
            continue;
        }
        let path = run_dir.join(format.file_name());
        match format {
            ExportFormat::Csv => std::fs::write(&path, export_csv(&run.table)?)?,
            ExportFormat::DisplayCsv => {
                std::fs::write(&path, export_display_csv(&run.table, &run.engine)?)?
            }
            ExportFormat::Json => std::fs::write(&path, export_json(run)?)?,
            ExportFormat::Parquet => export_parquet(&run.table, &path)?,
        }
    }

    info!(dir = %run_dir.display(), files = seen.len(), "artifacts written");
    Ok(run_dir)
}

/// Load a `BreadthRun` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BreadthRun> {
    let manifest_path = dir.join(ExportFormat::Json.file_name());
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
