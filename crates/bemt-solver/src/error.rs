//! Error types for rotor design and evaluation.

use bemt_core::BemtError;
use bemt_hydro::HydroError;
use thiserror::Error;

/// Errors raised while solving blade elements, sizing chords or integrating
/// rotor loads.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Station count disagrees with the configured number of design points.
    #[error("Configuration mismatch: expected {expected} stations, got {got}")]
    ConfigurationMismatch { expected: usize, got: usize },

    /// Inner induction loop failed to converge or produced non-finite values.
    #[error("Numerical divergence: {what} (last |da| = {delta_a:.3e}, |db| = {delta_b:.3e})")]
    NumericalDivergence {
        what: String,
        delta_a: f64,
        delta_b: f64,
    },

    /// Chord search ran past its bounds without reaching the Betz induction.
    #[error(
        "Outer search exhausted after {iterations} chord steps (chord = {chord:.6} m, a = {axial_induction:.4})"
    )]
    OuterSearchExhaustion {
        iterations: usize,
        chord: f64,
        axial_induction: f64,
    },

    /// Polar with zero drag cannot be optimized.
    #[error("Singular polar: {what}")]
    SingularPolar { what: String },

    #[error("Hydrofoil error: {0}")]
    Hydro(HydroError),

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<HydroError> for SolverError {
    fn from(err: HydroError) -> Self {
        match err {
            HydroError::SingularPolar { what } => SolverError::SingularPolar { what },
            other => SolverError::Hydro(other),
        }
    }
}

impl From<BemtError> for SolverError {
    fn from(err: BemtError) -> Self {
        SolverError::Numeric {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_polar_is_lifted_out_of_hydro_errors() {
        let err: SolverError = HydroError::SingularPolar {
            what: "cd = 0".into(),
        }
        .into();
        assert!(matches!(err, SolverError::SingularPolar { .. }));

        let err: SolverError = HydroError::InsufficientSamples { needed: 8, got: 2 }.into();
        assert!(matches!(err, SolverError::Hydro(_)));
    }

    #[test]
    fn display_carries_context() {
        let err = SolverError::ConfigurationMismatch {
            expected: 5,
            got: 4,
        };
        assert_eq!(
            err.to_string(),
            "Configuration mismatch: expected 5 stations, got 4"
        );

        let err = SolverError::NumericalDivergence {
            what: "inner loop".into(),
            delta_a: 0.5,
            delta_b: 0.01,
        };
        assert!(err.to_string().contains("5.000e-1"));
    }
}
