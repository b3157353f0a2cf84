//! Conversions between polars DataFrames and engine types.
//!
//! Input frames are validated against `IndexSchema` / `PanelSchema` and
//! read column-wise. The result table becomes a frame with nullable
//! columns: null is the missing-value marker.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::schema::{IndexSchema, PanelSchema, SchemaError};
use crate::domain::{IndexObservation, ResultRow, StockObservation};
use crate::engine::BreadthTable;

/// Days from 0001-01-01 (CE) to 1970-01-01, polars' `Date` epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn read_dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, SchemaError> {
    let column = df.column(name)?.cast(&DataType::Date)?.cast(&DataType::Int32)?;
    column
        .i32()?
        .into_iter()
        .map(|v| {
            v.and_then(date_from_days)
                .ok_or_else(|| SchemaError::NullValue {
                    column: name.to_string(),
                    count: 1,
                })
        })
        .collect()
}

fn read_numbers(df: &DataFrame, name: &str) -> Result<Vec<f64>, SchemaError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    Ok(values)
}

/// Read an index frame (`date`, `close`) into observations, in frame order.
pub fn index_from_frame(df: &DataFrame) -> Result<Vec<IndexObservation>, SchemaError> {
    IndexSchema::validate(df)?;
    let dates = read_dates(df, "date")?;
    let closes = read_numbers(df, "close")?;
    Ok(dates
        .into_iter()
        .zip(closes)
        .map(|(date, close)| IndexObservation { date, close })
        .collect())
}

/// Read a panel frame (`ticker`, `date`, `close`, `volume`) into observations.
pub fn panel_from_frame(df: &DataFrame) -> Result<Vec<StockObservation>, SchemaError> {
    PanelSchema::validate(df)?;
    let dates = read_dates(df, "date")?;
    let closes = read_numbers(df, "close")?;
    let volumes = read_numbers(df, "volume")?;
    let tickers = df.column("ticker")?.str()?;

    let mut out = Vec::with_capacity(df.height());
    for (i, ticker) in tickers.into_iter().enumerate() {
        let ticker = ticker.ok_or_else(|| SchemaError::NullValue {
            column: "ticker".into(),
            count: 1,
        })?;
        out.push(StockObservation {
            ticker: ticker.to_string(),
            date: dates[i],
            close: closes[i],
            volume: volumes[i],
        });
    }
    Ok(out)
}

/// Build an index frame from observations.
pub fn index_to_frame(index: &[IndexObservation]) -> PolarsResult<DataFrame> {
    let days: Vec<i32> = index.iter().map(|o| days_from_date(o.date)).collect();
    let closes: Vec<f64> = index.iter().map(|o| o.close).collect();
    DataFrame::new(vec![
        Series::new("date".into(), days).cast(&DataType::Date)?.into(),
        Series::new("close".into(), closes).into(),
    ])
}

/// Build a panel frame from observations.
pub fn panel_to_frame(panel: &[StockObservation]) -> PolarsResult<DataFrame> {
    let tickers: Vec<&str> = panel.iter().map(|o| o.ticker.as_str()).collect();
    let days: Vec<i32> = panel.iter().map(|o| days_from_date(o.date)).collect();
    let closes: Vec<f64> = panel.iter().map(|o| o.close).collect();
    let volumes: Vec<f64> = panel.iter().map(|o| o.volume).collect();
    DataFrame::new(vec![
        Series::new("ticker".into(), tickers).into(),
        Series::new("date".into(), days).cast(&DataType::Date)?.into(),
        Series::new("close".into(), closes).into(),
        Series::new("volume".into(), volumes).into(),
    ])
}

/// Convert the result table to a frame, one column per `ResultRow` field.
pub fn table_to_frame(table: &BreadthTable) -> PolarsResult<DataFrame> {
    let rows = &table.rows;

    fn floats<F: Fn(&ResultRow) -> Option<f64>>(
        rows: &[ResultRow],
        name: &str,
        f: F,
    ) -> Column {
        let values: Vec<Option<f64>> = rows.iter().map(f).collect();
        Series::new(name.into(), values).into()
    }
    fn counts<F: Fn(&ResultRow) -> Option<u32>>(
        rows: &[ResultRow],
        name: &str,
        f: F,
    ) -> Column {
        let values: Vec<Option<u32>> = rows.iter().map(f).collect();
        Series::new(name.into(), values).into()
    }
    fn nets<F: Fn(&ResultRow) -> Option<i64>>(
        rows: &[ResultRow],
        name: &str,
        f: F,
    ) -> Column {
        let values: Vec<Option<i64>> = rows.iter().map(f).collect();
        Series::new(name.into(), values).into()
    }

    let days: Vec<i32> = rows.iter().map(|r| days_from_date(r.date)).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.index_close).collect();

    DataFrame::new(vec![
        Series::new("date".into(), days).cast(&DataType::Date)?.into(),
        Series::new("index_close".into(), closes).into(),
        floats(rows, "index_change_pct", |r| r.index_change_pct),
        floats(rows, "index_rsi_fast", |r| r.index_rsi_fast),
        floats(rows, "index_rsi_slow", |r| r.index_rsi_slow),
        floats(rows, "breadth_above_ma", |r| r.breadth_above_ma),
        floats(rows, "breadth_avg", |r| r.breadth_avg),
        floats(rows, "breadth_rsi", |r| r.breadth_rsi),
        counts(rows, "advances", |r| r.advances),
        counts(rows, "declines", |r| r.declines),
        nets(rows, "net_ad", |r| r.net_ad),
        floats(rows, "mfi_up_value", |r| r.mfi_up_value),
        floats(rows, "mfi_down_value", |r| r.mfi_down_value),
        floats(rows, "mfi_net", |r| r.mfi_net),
        counts(rows, "new_highs", |r| r.new_highs),
        counts(rows, "new_lows", |r| r.new_lows),
        nets(rows, "net_nhnl", |r| r.net_nhnl),
        floats(rows, "mfi_sum", |r| r.mfi_sum),
        floats(rows, "ad_sum", |r| r.ad_sum),
        floats(rows, "nhnl_sum", |r| r.nhnl_sum),
        floats(rows, "mfi_avg", |r| r.mfi_avg),
        floats(rows, "ad_avg", |r| r.ad_avg),
        floats(rows, "nhnl_avg", |r| r.nhnl_avg),
        floats(rows, "mfi_rsi", |r| r.mfi_rsi),
        floats(rows, "ad_rsi", |r| r.ad_rsi),
        floats(rows, "nhnl_rsi", |r| r.nhnl_rsi),
        floats(rows, "score", |r| r.score),
        floats(rows, "new_high_win_rate", |r| r.new_high_win_rate),
        floats(rows, "break_out", |r| r.break_out),
    ])
}
