//! Project validation logic.

use crate::LATEST_VERSION;
use crate::schema::{
    EvaluationDef, FluidDef, HydrofoilDef, OperativeStateDef, Project, SolverDef,
};
use std::collections::HashSet;

/// Smallest polar the degree-7 optimizer fit accepts.
pub const MIN_POLAR_SAMPLES: usize = 8;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid polar '{id}': {reason}")]
    InvalidPolar { id: String, reason: String },

    #[error("Configuration mismatch: {expected} design points but {got} hydrofoils")]
    ConfigurationMismatch { expected: usize, got: usize },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_fluid(&project.fluid)?;
    validate_operative_state(&project.operative_state)?;

    let mut ids = HashSet::new();
    for foil in &project.hydrofoils {
        if !ids.insert(&foil.id) {
            return Err(ValidationError::DuplicateId {
                id: foil.id.clone(),
                context: "hydrofoils".to_string(),
            });
        }
        validate_hydrofoil(foil)?;
    }

    let expected = project.operative_state.no_design_points;
    if project.hydrofoils.len() != expected {
        return Err(ValidationError::ConfigurationMismatch {
            expected,
            got: project.hydrofoils.len(),
        });
    }

    validate_evaluation(&project.evaluation)?;
    validate_solver(&project.solver)?;
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        })
    }
}

fn fraction(field: &str, value: f64, reason: &str, ok: bool) -> Result<(), ValidationError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }
}

fn validate_fluid(fluid: &FluidDef) -> Result<(), ValidationError> {
    positive("fluid.density", fluid.density)?;
    positive("fluid.kinematic_viscosity", fluid.kinematic_viscosity)?;
    positive("fluid.dynamic_viscosity", fluid.dynamic_viscosity)
}

fn validate_operative_state(op: &OperativeStateDef) -> Result<(), ValidationError> {
    positive("operative_state.optimal_speed", op.optimal_speed)?;
    positive("operative_state.blade_radius", op.blade_radius)?;
    positive("operative_state.tip_speed_ratio", op.tip_speed_ratio)?;

    if op.no_blades == 0 {
        return Err(ValidationError::InvalidValue {
            field: "operative_state.no_blades".to_string(),
            value: "0".to_string(),
            reason: "rotor needs at least one blade".to_string(),
        });
    }
    if op.no_design_points < 2 {
        return Err(ValidationError::InvalidValue {
            field: "operative_state.no_design_points".to_string(),
            value: op.no_design_points.to_string(),
            reason: "at least two design points are required".to_string(),
        });
    }

    fraction(
        "operative_state.radius_hub_pctg",
        op.radius_hub_pctg,
        "must lie in [0, 1)",
        (0.0..1.0).contains(&op.radius_hub_pctg),
    )?;
    fraction(
        "operative_state.initial_point_pctg",
        op.initial_point_pctg,
        "must lie above the hub fraction",
        op.initial_point_pctg > op.radius_hub_pctg,
    )?;
    fraction(
        "operative_state.final_point_pctg",
        op.final_point_pctg,
        "must lie in (initial_point_pctg, 1]",
        op.final_point_pctg > op.initial_point_pctg && op.final_point_pctg <= 1.0,
    )
}

fn validate_hydrofoil(foil: &HydrofoilDef) -> Result<(), ValidationError> {
    let invalid = |reason: String| ValidationError::InvalidPolar {
        id: foil.id.clone(),
        reason,
    };

    if !(foil.reynolds.is_finite() && foil.reynolds > 0.0) {
        return Err(invalid(format!(
            "Reynolds number must be positive, got {}",
            foil.reynolds
        )));
    }
    let n = foil.alpha.len();
    if foil.cl.len() != n || foil.cd.len() != n {
        return Err(invalid(format!(
            "series lengths differ (alpha={}, cl={}, cd={})",
            n,
            foil.cl.len(),
            foil.cd.len()
        )));
    }
    if n < MIN_POLAR_SAMPLES {
        return Err(invalid(format!(
            "at least {MIN_POLAR_SAMPLES} samples required, got {n}"
        )));
    }
    if foil
        .alpha
        .iter()
        .chain(&foil.cl)
        .chain(&foil.cd)
        .any(|v| !v.is_finite())
    {
        return Err(invalid("non-finite sample".to_string()));
    }
    if foil.alpha.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("alpha must be strictly increasing".to_string()));
    }
    if let Some(i) = foil.cd.iter().position(|&cd| cd <= 0.0) {
        return Err(invalid(format!(
            "drag must be positive, got cd = {} at alpha = {}",
            foil.cd[i], foil.alpha[i]
        )));
    }

    // Range the full-circle extrapolation can extend
    let (first, last) = (foil.alpha[0], foil.alpha[n - 1]);
    if !(last > 0.0 && last < 90.0) {
        return Err(invalid(format!(
            "last alpha must lie in (0, 90) deg, got {last}"
        )));
    }
    if first <= -90.0 {
        return Err(invalid(format!("first alpha must exceed -90 deg, got {first}")));
    }
    Ok(())
}

fn validate_evaluation(eval: &EvaluationDef) -> Result<(), ValidationError> {
    for tsr in &eval.tip_speed_ratios {
        positive("evaluation.tip_speed_ratios", *tsr)?;
    }
    if eval.interpolation_range == 0 {
        return Err(ValidationError::InvalidValue {
            field: "evaluation.interpolation_range".to_string(),
            value: "0".to_string(),
            reason: "at least one integration segment is required".to_string(),
        });
    }
    positive(
        "evaluation.extrapolation.aspect_ratio",
        eval.extrapolation.aspect_ratio,
    )?;
    if eval.extrapolation.nalpha < 3 {
        return Err(ValidationError::InvalidValue {
            field: "evaluation.extrapolation.nalpha".to_string(),
            value: eval.extrapolation.nalpha.to_string(),
            reason: "at least 3 points per segment".to_string(),
        });
    }
    if let Some(cd_max) = eval.extrapolation.cd_max {
        positive("evaluation.extrapolation.cd_max", cd_max)?;
    }
    Ok(())
}

fn validate_solver(solver: &SolverDef) -> Result<(), ValidationError> {
    if let Some(tol) = solver.tolerance {
        positive("solver.tolerance", tol)?;
    }
    if let Some(step) = solver.chord_step {
        positive("solver.chord_step", step)?;
    }
    if let Some(max_chord) = solver.max_chord_fraction {
        positive("solver.max_chord_fraction", max_chord)?;
    }
    if let Some(omega) = solver.relaxation {
        fraction(
            "solver.relaxation",
            omega,
            "must lie in (0, 1]",
            omega > 0.0 && omega <= 1.0,
        )?;
    }
    if let Some(clearance) = solver.tip_clearance {
        fraction(
            "solver.tip_clearance",
            clearance,
            "must lie in (0, 1]",
            clearance > 0.0 && clearance <= 1.0,
        )?;
    }
    for (field, cap) in [
        ("solver.max_inner_iterations", solver.max_inner_iterations),
        ("solver.max_outer_iterations", solver.max_outer_iterations),
    ] {
        if cap == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
    }
    Ok(())
}
