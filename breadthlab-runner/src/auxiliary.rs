//! Externally supplied per-date series (new-high win rate, break-out).
//!
//! Each file is a two-column `(date, value)` CSV with values as fractions.
//! The value column may be named `value`, `winRate` or `breakOut`. Blank and
//! non-finite values are skipped; the engine never reads these series.

use std::path::Path;

use breadthlab_core::engine::{AuxiliaryKind, BreadthTable};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::data_loader::{parse_date_at, read_csv, LoadError};

#[derive(Debug, Deserialize)]
struct AuxiliaryRecord {
    #[serde(alias = "time", alias = "Date", alias = "Trading Date")]
    date: String,
    #[serde(
        alias = "winRate",
        alias = "win_rate",
        alias = "breakOut",
        alias = "break_out"
    )]
    value: Option<f64>,
}

/// Load a `(date, fraction)` series in file order.
pub fn load_auxiliary(path: &Path) -> Result<Vec<(NaiveDate, f64)>, LoadError> {
    let mut series = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in read_csv::<AuxiliaryRecord>(path)? {
        let date = parse_date_at(path, line, &record.date)?;
        match record.value.filter(|v| v.is_finite()) {
            Some(v) => series.push((date, v)),
            None => skipped += 1,
        }
    }

    if series.is_empty() {
        warn!(path = %path.display(), "auxiliary series is empty");
    } else {
        debug!(path = %path.display(), rows = series.len(), skipped, "auxiliary series loaded");
    }
    Ok(series)
}

/// Load `path` and left-join it onto `table` as `kind`.
///
/// Returns the number of table rows holding a value.
pub fn merge_auxiliary(
    table: &mut BreadthTable,
    kind: AuxiliaryKind,
    path: &Path,
) -> Result<usize, LoadError> {
    let series = load_auxiliary(path)?;
    let matched = table.attach_auxiliary(kind, &series);
    debug!(?kind, matched, "auxiliary series merged");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use breadthlab_core::domain::IndexObservation;
    use breadthlab_core::{compute_breadth, EngineConfig};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    #[test]
    fn reads_api_style_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("win_rate.csv");
        std::fs::write(
            &path,
            "date,winRate\n2024-02-01T00:00:00Z,0.25\n2024-02-02T00:00:00Z,\n2024-02-05T00:00:00Z,0.5\n",
        )
        .unwrap();

        let series = load_auxiliary(&path).unwrap();
        assert_eq!(series, vec![(d(1), 0.25), (d(5), 0.5)]);
    }

    #[test]
    fn merge_is_percent_and_left_join() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("break_out.csv");
        // 2024-02-03 is not an index date
        std::fs::write(&path, "date,breakOut\n2024-02-01,0.125\n2024-02-03,0.9\n").unwrap();

        let index = vec![
            IndexObservation::new(d(1), 1000.0),
            IndexObservation::new(d(2), 1001.0),
        ];
        let mut table = compute_breadth(&index, &[], &EngineConfig::default()).unwrap();
        let before = table.clone();

        let matched = merge_auxiliary(&mut table, AuxiliaryKind::BreakOut, &path).unwrap();
        assert_eq!(matched, 1);
        assert_eq!(table.rows[0].break_out, Some(12.5));
        assert_eq!(table.rows[1].break_out, None);
        assert_eq!(table.rows[0].new_high_win_rate, None);
        assert_eq!(table.rows[0].score, before.rows[0].score);
        assert_eq!(table.len(), before.len());
    }
}
