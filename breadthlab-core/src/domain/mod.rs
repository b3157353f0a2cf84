//! Domain types for BreadthLab

pub mod observation;
pub mod row;

pub use observation::{index_changes, pct_change, IndexObservation, StockObservation};
pub use row::{DailyAggregateRow, ResultRow};
