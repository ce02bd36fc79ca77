//! Error types for the bemt-app service layer.

/// Application error type that wraps errors from the backend crates
/// behind one interface for every front end.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Hydrofoil error: {0}")]
    Hydro(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stations whose solve failed, by station index.
    #[error("Unresolved stations: {}", .stations.join("; "))]
    UnresolvedStations { stations: Vec<String> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bemt-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bemt_project::ProjectError> for AppError {
    fn from(err: bemt_project::ProjectError) -> Self {
        match err {
            bemt_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<bemt_project::ValidationError> for AppError {
    fn from(err: bemt_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<bemt_hydro::HydroError> for AppError {
    fn from(err: bemt_hydro::HydroError) -> Self {
        AppError::Hydro(err.to_string())
    }
}

impl From<bemt_solver::SolverError> for AppError {
    fn from(err: bemt_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<bemt_results::ResultsError> for AppError {
    fn from(err: bemt_results::ResultsError) -> Self {
        match err {
            bemt_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_stations_lists_every_station() {
        let err = AppError::UnresolvedStations {
            stations: vec!["0: diverged".to_string(), "3: exhausted".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unresolved stations: 0: diverged; 3: exhausted"
        );
    }

    #[test]
    fn missing_runs_keep_their_id() {
        let err: AppError = bemt_results::ResultsError::RunNotFound {
            run_id: "abc".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::RunNotFound(id) if id == "abc"));
    }
}
