//! TOML run configuration.
//!
//! ```toml
//! [engine]
//! ma_period = 50
//! rsi_fast = 21
//!
//! [inputs]
//! index = "data/vnindex.csv"
//! panel = "data/prices.parquet"
//! win_rate = "data/win_rate.csv"
//! universe = ["ACB", "FPT", "HPG"]
//!
//! [output]
//! dir = "output"
//! start = "2023-01-01"
//! formats = ["csv", "display_csv", "json"]
//! ```
//!
//! Every section is optional; missing engine fields take their defaults.
//! The `inputs.index` and `inputs.panel` paths are required before a run.

use std::path::{Path, PathBuf};

use breadthlab_core::{EngineConfig, EngineError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from reading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine config: {0}")]
    Engine(#[from] EngineError),
    #[error("missing required input '{0}'")]
    MissingInput(&'static str),
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("no output formats selected")]
    NoFormats,
}

/// Full configuration of one breadth run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreadthConfig {
    pub engine: EngineConfig,
    pub inputs: InputsConfig,
    pub output: OutputConfig,
}

/// Where the input tables live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    /// Index closes (`.csv` or `.parquet`).
    pub index: Option<PathBuf>,
    /// Stock price/volume panel (`.csv` or `.parquet`).
    pub panel: Option<PathBuf>,
    /// Optional `(date, value)` new-high win rate table, values as fractions.
    pub win_rate: Option<PathBuf>,
    /// Optional `(date, value)` break-out table, values as fractions.
    pub break_out: Option<PathBuf>,
    /// Ticker allow-list. Panel rows for other tickers are dropped on load.
    pub universe: Option<Vec<String>>,
}

/// Output artifact selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// First date kept in the exported table (inclusive).
    pub start: Option<NaiveDate>,
    /// Last date kept in the exported table (inclusive).
    pub end: Option<NaiveDate>,
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            start: None,
            end: None,
            formats: ExportFormat::ALL.to_vec(),
        }
    }
}

/// Artifact kinds written by `save_artifacts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// `breadth.csv`: machine layout, ascending dates.
    Csv,
    /// `breadth_display.csv`: dashboard layout, descending dates.
    DisplayCsv,
    /// `manifest.json`: config, dataset hash, summary and the full table.
    Json,
    /// `breadth.parquet`.
    Parquet,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Csv,
        ExportFormat::DisplayCsv,
        ExportFormat::Json,
        ExportFormat::Parquet,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Csv => "breadth.csv",
            ExportFormat::DisplayCsv => "breadth_display.csv",
            ExportFormat::Json => "manifest.json",
            ExportFormat::Parquet => "breadth.parquet",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "display_csv" | "display" => Ok(ExportFormat::DisplayCsv),
            "json" => Ok(ExportFormat::Json),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(format!(
                "unknown format '{other}' (expected csv, display_csv, json, parquet)"
            )),
        }
    }
}

impl BreadthConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Check everything a run needs before any file is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.inputs.index.is_none() {
            return Err(ConfigError::MissingInput("index"));
        }
        if self.inputs.panel.is_none() {
            return Err(ConfigError::MissingInput("panel"));
        }
        if let (Some(start), Some(end)) = (self.output.start, self.output.end) {
            if start > end {
                return Err(ConfigError::InvertedRange { start, end });
            }
        }
        if self.output.formats.is_empty() {
            return Err(ConfigError::NoFormats);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BreadthConfig::from_toml("").unwrap();
        assert_eq!(config, BreadthConfig::default());
        assert_eq!(config.engine.ma_period, 50);
        assert_eq!(config.output.formats.len(), 4);
    }

    #[test]
    fn parses_full_config() {
        let config = BreadthConfig::from_toml(
            r#"
            [engine]
            ma_period = 30
            change_threshold_pct = 2.0

            [inputs]
            index = "idx.csv"
            panel = "panel.parquet"
            break_out = "bo.csv"
            universe = ["FPT", "HPG"]

            [output]
            dir = "out"
            start = "2024-01-01"
            end = "2024-06-30"
            formats = ["csv", "display_csv"]
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.ma_period, 30);
        assert_eq!(config.engine.rsi_fast, 21);
        assert_eq!(config.engine.change_threshold_pct, 2.0);
        assert_eq!(config.inputs.panel, Some(PathBuf::from("panel.parquet")));
        assert_eq!(config.inputs.win_rate, None);
        assert_eq!(
            config.inputs.universe,
            Some(vec!["FPT".to_string(), "HPG".to_string()])
        );
        assert_eq!(config.output.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(
            config.output.formats,
            vec![ExportFormat::Csv, ExportFormat::DisplayCsv]
        );
        config.validate().unwrap();
    }

    #[test]
    fn missing_inputs_rejected() {
        let err = BreadthConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingInput("index")));
    }

    #[test]
    fn inverted_range_rejected() {
        let mut config = BreadthConfig::default();
        config.inputs.index = Some("i.csv".into());
        config.inputs.panel = Some("p.csv".into());
        config.output.start = NaiveDate::from_ymd_opt(2024, 5, 1);
        config.output.end = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvertedRange { .. }
        ));
    }

    #[test]
    fn invalid_engine_window_rejected() {
        let err = BreadthConfig::from_toml("[engine]\nsum_window = 0\n")
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Engine(_)));
    }

    #[test]
    fn unknown_field_type_is_parse_error() {
        let err = BreadthConfig::from_toml("[engine]\nma_period = \"fifty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn format_from_str() {
        assert_eq!("Parquet".parse::<ExportFormat>(), Ok(ExportFormat::Parquet));
        assert_eq!("display".parse::<ExportFormat>(), Ok(ExportFormat::DisplayCsv));
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
