//! DataFrame adapters for the engine's tabular inputs and output.

pub mod frame;
pub mod schema;

pub use frame::{
    index_from_frame, index_to_frame, panel_from_frame, panel_to_frame, table_to_frame,
};
pub use schema::{ColumnKind, IndexSchema, PanelSchema, SchemaError};
