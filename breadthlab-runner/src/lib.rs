//! BreadthLab Runner — run orchestration around the breadth engine.
//!
//! This crate builds on `breadthlab-core` to provide:
//! - TOML run configuration
//! - CSV / Parquet loading of the index and the stock panel
//! - Merge of the externally supplied win-rate and break-out series
//! - Export to CSV, dashboard CSV, JSON manifest and Parquet
//! - Seeded synthetic data for demos and benches

pub mod auxiliary;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod synthetic;

pub use auxiliary::{load_auxiliary, merge_auxiliary};
pub use config::{BreadthConfig, ConfigError, ExportFormat, InputsConfig, OutputConfig};
pub use data_loader::{
    compute_dataset_hash, load_index, load_inputs, load_panel, write_index_csv, write_panel_csv,
    LoadError, LoadedInputs,
};
pub use export::{
    export_csv, export_display_csv, export_json, export_parquet, import_json, load_artifacts,
    save_artifacts,
};
pub use runner::{
    run_breadth, run_from_data, AuxiliaryInputs, BreadthRun, RunError, RunSummary,
    SCHEMA_VERSION,
};
pub use synthetic::{generate, SyntheticData};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BreadthConfig>();
        assert_sync::<BreadthConfig>();
        assert_send::<ExportFormat>();
        assert_sync::<ExportFormat>();
    }

    #[test]
    fn breadth_run_is_send_sync() {
        assert_send::<BreadthRun>();
        assert_sync::<BreadthRun>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
    }

    #[test]
    fn loaded_inputs_is_send_sync() {
        assert_send::<LoadedInputs>();
        assert_sync::<LoadedInputs>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
