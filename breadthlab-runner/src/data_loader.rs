//! Loading of the index and panel tables.
//!
//! Inputs are flat tables, either CSV (read with serde records) or Parquet
//! (read with polars and converted by the core frame adapters). CSV headers
//! accept the common vendor spellings:
//!
//! - index: `date` / `time` / `Date` / `Trading Date`, `close` / `Close`
//! - panel: `ticker` / `symbol` / `TICKER`, `date` / `Trading Date`,
//!   `close` / `Daily Closing Price`, `volume` / `Matching Volume`
//!
//! A blank close or volume cell is read as NaN and left to the engine,
//! which drops the panel row or rejects the index.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use breadthlab_core::data::{index_from_frame, panel_from_frame, SchemaError};
use breadthlab_core::domain::{IndexObservation, StockObservation};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::InputsConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{path} line {line}: unparseable date '{value}'")]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("unsupported input format for {0} (expected .csv or .parquet)")]
    UnsupportedFormat(PathBuf),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("parquet error: {0}")]
    Polars(#[from] PolarsError),
    #[error("missing required input '{0}'")]
    MissingInput(&'static str),
}

/// On-disk table format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Ok(InputFormat::Csv),
            Some("parquet") | Some("pq") => Ok(InputFormat::Parquet),
            _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IndexRecord {
    #[serde(alias = "time", alias = "Date", alias = "Trading Date")]
    date: String,
    #[serde(alias = "Close", alias = "Daily Closing Price")]
    close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PanelRecord {
    #[serde(alias = "symbol", alias = "TICKER", alias = "Ticker")]
    ticker: String,
    #[serde(alias = "time", alias = "Date", alias = "Trading Date")]
    date: String,
    #[serde(alias = "Close", alias = "Daily Closing Price")]
    close: Option<f64>,
    #[serde(alias = "Volume", alias = "Matching Volume")]
    volume: Option<f64>,
}

/// Everything a run needs from disk.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub index: Vec<IndexObservation>,
    pub panel: Vec<StockObservation>,
    /// Panel rows removed by the universe filter.
    pub filtered_rows: usize,
    /// BLAKE3 over the sorted index and panel.
    pub dataset_hash: String,
}

/// Load the index and panel named in `inputs`, applying the universe filter.
pub fn load_inputs(inputs: &InputsConfig) -> Result<LoadedInputs, LoadError> {
    let index_path = inputs.index.as_deref().ok_or(LoadError::MissingInput("index"))?;
    let panel_path = inputs.panel.as_deref().ok_or(LoadError::MissingInput("panel"))?;

    let index = load_index(index_path)?;
    let mut panel = load_panel(panel_path)?;

    let mut filtered_rows = 0;
    if let Some(universe) = &inputs.universe {
        let before = panel.len();
        panel = filter_universe(panel, universe);
        filtered_rows = before - panel.len();
        debug!(
            universe = universe.len(),
            removed = filtered_rows,
            "universe filter applied"
        );
    }

    let dataset_hash = compute_dataset_hash(&index, &panel);
    info!(
        index_rows = index.len(),
        panel_rows = panel.len(),
        hash = %&dataset_hash[..12],
        "inputs loaded"
    );

    Ok(LoadedInputs {
        index,
        panel,
        filtered_rows,
        dataset_hash,
    })
}

/// Load index closes from a CSV or Parquet file, in file order.
pub fn load_index(path: &Path) -> Result<Vec<IndexObservation>, LoadError> {
    match InputFormat::from_path(path)? {
        InputFormat::Csv => {
            let mut out = Vec::new();
            for (line, record) in read_csv::<IndexRecord>(path)? {
                out.push(IndexObservation::new(
                    parse_date_at(path, line, &record.date)?,
                    record.close.unwrap_or(f64::NAN),
                ));
            }
            Ok(out)
        }
        InputFormat::Parquet => Ok(index_from_frame(&read_parquet(path)?)?),
    }
}

/// Load the stock panel from a CSV or Parquet file, in file order.
pub fn load_panel(path: &Path) -> Result<Vec<StockObservation>, LoadError> {
    match InputFormat::from_path(path)? {
        InputFormat::Csv => {
            let mut out = Vec::new();
            for (line, record) in read_csv::<PanelRecord>(path)? {
                out.push(StockObservation::new(
                    record.ticker.trim(),
                    parse_date_at(path, line, &record.date)?,
                    record.close.unwrap_or(f64::NAN),
                    record.volume.unwrap_or(f64::NAN),
                ));
            }
            Ok(out)
        }
        InputFormat::Parquet => Ok(panel_from_frame(&read_parquet(path)?)?),
    }
}

/// Keep only panel rows whose ticker is in `universe`.
pub fn filter_universe(panel: Vec<StockObservation>, universe: &[String]) -> Vec<StockObservation> {
    let allowed: HashSet<&str> = universe.iter().map(|t| t.trim()).collect();
    panel
        .into_iter()
        .filter(|o| allowed.contains(o.ticker.as_str()))
        .collect()
}

/// Read every record of a CSV file, paired with its 1-based line number.
pub(crate) fn read_csv<T>(path: &Path) -> Result<Vec<(u64, T)>, LoadError>
where
    T: serde::de::DeserializeOwned,
{
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let mut out = Vec::new();
    for result in reader.deserialize::<T>() {
        let record = result.map_err(csv_err)?;
        // header is line 1
        out.push((out.len() as u64 + 2, record));
    }
    Ok(out)
}

fn read_parquet(path: &Path) -> Result<DataFrame, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ParquetReader::new(file).finish()?)
}

/// Parse `YYYY-MM-DD`, ignoring any time-of-day suffix
/// (`2024-01-02 00:00:00`, `2024-01-02T00:00:00Z`).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

pub(crate) fn parse_date_at(path: &Path, line: u64, value: &str) -> Result<NaiveDate, LoadError> {
    parse_date(value).ok_or_else(|| LoadError::InvalidDate {
        path: path.to_path_buf(),
        line,
        value: value.to_string(),
    })
}

/// Compute a deterministic BLAKE3 hash over the inputs.
///
/// The panel is hashed in (ticker, date) order so the hash does not depend
/// on file row order.
pub fn compute_dataset_hash(index: &[IndexObservation], panel: &[StockObservation]) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(b"index");
    for obs in index {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.close.to_le_bytes());
    }

    let mut rows: Vec<&StockObservation> = panel.iter().collect();
    rows.sort_by(|a, b| (&a.ticker, a.date).cmp(&(&b.ticker, b.date)));

    hasher.update(b"panel");
    for obs in rows {
        hasher.update(obs.ticker.as_bytes());
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.close.to_le_bytes());
        hasher.update(&obs.volume.to_le_bytes());
    }

    hasher.finalize().to_hex().to_string()
}

/// Write index closes as a `date,close` CSV.
pub fn write_index_csv(index: &[IndexObservation], path: &Path) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(["date", "close"]).map_err(csv_err)?;
    for obs in index {
        wtr.write_record([obs.date.to_string(), obs.close.to_string()])
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the panel as a `ticker,date,close,volume` CSV.
pub fn write_panel_csv(panel: &[StockObservation], path: &Path) -> Result<(), LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(["ticker", "date", "close", "volume"])
        .map_err(csv_err)?;
    for obs in panel {
        wtr.write_record([
            obs.ticker.clone(),
            obs.date.to_string(),
            obs.close.to_string(),
            obs.volume.to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadthlab_core::data::{index_to_frame, panel_to_frame};
    use std::io::Write;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_date_accepts_time_suffix() {
        assert_eq!(parse_date("2024-01-02"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02 00:00:00"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("2024-01-02T07:00:00Z"), Some(d(2024, 1, 2)));
        assert_eq!(parse_date("02/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.CSV")).unwrap(), InputFormat::Csv);
        assert_eq!(
            InputFormat::from_path(Path::new("a.parquet")).unwrap(),
            InputFormat::Parquet
        );
        assert!(InputFormat::from_path(Path::new("a.xlsx")).is_err());
    }

    #[test]
    fn index_csv_with_vendor_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "index.csv",
            "time,open,close\n2024-01-02 00:00:00,1,1130.5\n2024-01-03 00:00:00,1,\n",
        );
        let index = load_index(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].date, d(2024, 1, 2));
        assert_eq!(index[0].close, 1130.5);
        assert!(index[1].close.is_nan());
    }

    #[test]
    fn panel_csv_with_original_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "panel.csv",
            "TICKER,Trading Date,Daily Closing Price,Matching Volume\n\
             FPT,2024-01-02,95.1,120000\n\
             HPG, 2024-01-02 ,27.3,\n",
        );
        let panel = load_panel(&path).unwrap();
        assert_eq!(panel.len(), 2);
        assert_eq!(panel[0].ticker, "FPT");
        assert_eq!(panel[0].volume, 120_000.0);
        assert_eq!(panel[1].date, d(2024, 1, 2));
        assert!(panel[1].volume.is_nan());
    }

    #[test]
    fn bad_date_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "index.csv", "date,close\n2024-01-02,1\nyesterday,2\n");
        match load_index(&path).unwrap_err() {
            LoadError::InvalidDate { line, value, .. } => {
                assert_eq!(line, 3);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parquet_inputs_load_through_frames() {
        let dir = tempfile::tempdir().unwrap();
        let index = vec![
            IndexObservation::new(d(2024, 3, 1), 1200.0),
            IndexObservation::new(d(2024, 3, 4), 1210.0),
        ];
        let panel = vec![StockObservation::new("VNM", d(2024, 3, 1), 66.0, 1_000.0)];

        let index_path = dir.path().join("index.parquet");
        let mut df = index_to_frame(&index).unwrap();
        ParquetWriter::new(File::create(&index_path).unwrap())
            .finish(&mut df)
            .unwrap();
        let panel_path = dir.path().join("panel.parquet");
        let mut df = panel_to_frame(&panel).unwrap();
        ParquetWriter::new(File::create(&panel_path).unwrap())
            .finish(&mut df)
            .unwrap();

        assert_eq!(load_index(&index_path).unwrap(), index);
        assert_eq!(load_panel(&panel_path).unwrap(), panel);
    }

    #[test]
    fn universe_filter_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let index_path = write(dir.path(), "i.csv", "date,close\n2024-01-02,1000\n");
        let panel_path = write(
            dir.path(),
            "p.csv",
            "symbol,date,close,volume\nAAA,2024-01-02,10,1\nBBB,2024-01-02,20,1\n",
        );
        let mut inputs = InputsConfig {
            index: Some(index_path),
            panel: Some(panel_path),
            ..InputsConfig::default()
        };

        let all = load_inputs(&inputs).unwrap();
        assert_eq!(all.panel.len(), 2);
        assert_eq!(all.filtered_rows, 0);

        inputs.universe = Some(vec!["BBB".into()]);
        let filtered = load_inputs(&inputs).unwrap();
        assert_eq!(filtered.panel.len(), 1);
        assert_eq!(filtered.panel[0].ticker, "BBB");
        assert_eq!(filtered.filtered_rows, 1);
        assert_ne!(all.dataset_hash, filtered.dataset_hash);
    }

    #[test]
    fn dataset_hash_ignores_panel_row_order() {
        let index = vec![IndexObservation::new(d(2024, 1, 2), 1.0)];
        let a = StockObservation::new("A", d(2024, 1, 2), 1.0, 1.0);
        let b = StockObservation::new("B", d(2024, 1, 2), 2.0, 1.0);
        assert_eq!(
            compute_dataset_hash(&index, &[a.clone(), b.clone()]),
            compute_dataset_hash(&index, &[b, a])
        );
    }

    #[test]
    fn csv_writers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let index = vec![IndexObservation::new(d(2024, 1, 2), 1234.25)];
        let panel = vec![StockObservation::new("SSI", d(2024, 1, 2), 33.5, 10_500.0)];

        write_index_csv(&index, &dir.path().join("i.csv")).unwrap();
        write_panel_csv(&panel, &dir.path().join("p.csv")).unwrap();

        assert_eq!(load_index(&dir.path().join("i.csv")).unwrap(), index);
        assert_eq!(load_panel(&dir.path().join("p.csv")).unwrap(), panel);
    }
}
