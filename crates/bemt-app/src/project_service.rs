//! Project loading, saving, validation, and introspection.

use std::path::Path;

use bemt_hydro::{FluidProperties, Polar};
use bemt_project::schema::Project;
use bemt_solver::{DesignStation, OperativeState, SolverConfig, build_stations};

use crate::error::{AppError, AppResult};

/// Summary of one design station for listing.
#[derive(Debug, Clone)]
pub struct StationSummary {
    pub index: usize,
    pub hydrofoil_id: String,
    pub hydrofoil_name: Option<String>,
    pub radius_m: f64,
    pub reynolds: f64,
    pub sample_count: usize,
    pub alpha_range_deg: (f64, f64),
}

/// Load and validate a project; the format follows the file extension.
pub fn load_project(path: &Path) -> AppResult<Project> {
    Ok(bemt_project::load(path)?)
}

/// Save a project as YAML or JSON depending on the file extension.
pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => bemt_project::save_yaml(path, project)?,
        Some("json") => bemt_project::save_json(path, project)?,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Unsupported project extension: {}",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Validate project structure and the settings derived from it.
pub fn validate_project(project: &Project) -> AppResult<()> {
    bemt_project::validate_project(project)?;
    fluid_properties(project)?;
    solver_config(project)?;
    operative_state(project)
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(())
}

pub fn fluid_properties(project: &Project) -> AppResult<FluidProperties> {
    let fluid = &project.fluid;
    Ok(FluidProperties::new(
        fluid.density,
        fluid.kinematic_viscosity,
        fluid.dynamic_viscosity,
    )?)
}

pub fn operative_state(project: &Project) -> OperativeState {
    let op = &project.operative_state;
    OperativeState {
        optimal_speed: op.optimal_speed,
        blade_radius: op.blade_radius,
        blade_count: op.no_blades,
        hub_fraction: op.radius_hub_pctg,
        initial_fraction: op.initial_point_pctg,
        final_fraction: op.final_point_pctg,
        design_points: op.no_design_points,
        tip_speed_ratio: op.tip_speed_ratio,
    }
}

/// Solver defaults with the project's overrides applied.
pub fn solver_config(project: &Project) -> AppResult<SolverConfig> {
    let overrides = &project.solver;
    let mut config = SolverConfig::default();

    if let Some(tolerance) = overrides.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(cap) = overrides.max_inner_iterations {
        config.max_inner_iterations = cap;
    }
    if let Some(omega) = overrides.relaxation {
        config.relaxation = omega;
    }
    if let Some(step) = overrides.chord_step {
        config.chord_step = step;
    }
    if let Some(fraction) = overrides.max_chord_fraction {
        config.max_chord_fraction = fraction;
    }
    if let Some(cap) = overrides.max_outer_iterations {
        config.max_outer_iterations = cap;
    }
    if let Some(clearance) = overrides.tip_clearance {
        config.tip_clearance = clearance;
    }
    if let Some(parallel) = overrides.parallel {
        config.parallel = parallel;
    }

    config
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(config)
}

/// Measured polars in project order (hub to tip).
pub fn hydrofoil_polars(project: &Project) -> AppResult<Vec<(String, Polar)>> {
    project
        .hydrofoils
        .iter()
        .map(|foil| {
            let polar = Polar::new(
                foil.reynolds,
                foil.alpha.clone(),
                foil.cl.clone(),
                foil.cd.clone(),
            )
            .map_err(|e| AppError::Hydro(format!("hydrofoil '{}': {}", foil.id, e)))?;
            Ok((foil.id.clone(), polar))
        })
        .collect()
}

/// Pair every hydrofoil with its design radius.
pub fn build_design_stations(project: &Project) -> AppResult<Vec<DesignStation>> {
    let config = solver_config(project)?;
    let state = operative_state(project);
    let polars = hydrofoil_polars(project)?;
    Ok(build_stations(&state, polars, config.tip_clearance)?)
}

/// List design stations with their hydrofoils.
pub fn list_stations(project: &Project) -> AppResult<Vec<StationSummary>> {
    let stations = build_design_stations(project)?;
    Ok(stations
        .iter()
        .map(|station| {
            let name = project
                .hydrofoils
                .iter()
                .find(|f| f.id == station.hydrofoil_id)
                .and_then(|f| f.name.clone());
            StationSummary {
                index: station.id.index(),
                hydrofoil_id: station.hydrofoil_id.clone(),
                hydrofoil_name: name,
                radius_m: station.radius,
                reynolds: station.polar.reynolds(),
                sample_count: station.polar.len(),
                alpha_range_deg: station.polar.alpha_range(),
            }
        })
        .collect())
}
