//! Shared application service layer for the rotor designer.
//!
//! Front ends go through this crate for project loading, blade design,
//! performance runs with result caching, and queries over stored runs.

pub mod error;
pub mod progress;
pub mod project_service;
pub mod query;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{
    StationSummary, build_design_stations, fluid_properties, list_stations, load_project,
    operative_state, save_project, solver_config, validate_project,
};
pub use query::{ExportKind, RunSummary, export_csv, find_evaluation, get_run_summary};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, design_project, design_records,
    efficiency_records, ensure_run, ensure_run_with_progress, list_runs, load_run,
};
