//! Hydrofoil and fluid property errors.

use bemt_core::BemtError;
use thiserror::Error;

/// Result type for hydrodynamic data operations.
pub type HydroResult<T> = Result<T, HydroError>;

/// Errors raised while building, fitting or extending hydrofoil data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HydroError {
    /// Polar samples are malformed (length mismatch, non-increasing alpha, ...).
    #[error("Invalid polar: {what}")]
    InvalidPolar { what: String },

    /// Not enough samples for the requested polynomial degree.
    #[error("Insufficient samples: need at least {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    /// Zero (or non-positive) drag makes the lift-to-drag ratio singular.
    #[error("Singular polar: {what}")]
    SingularPolar { what: String },

    /// Least-squares polynomial fit could not be solved.
    #[error("Polynomial fit failed: {what}")]
    FitFailed { what: String },

    /// Non-physical fluid property or argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Polar extrapolation preconditions not met.
    #[error("Extrapolation failed: {what}")]
    Extrapolation { what: String },

    /// Shared numeric helper failed.
    #[error("Numeric error: {0}")]
    Core(#[from] BemtError),
}

impl From<HydroError> for BemtError {
    fn from(err: HydroError) -> Self {
        match err {
            HydroError::InvalidPolar { .. } => BemtError::InvalidArg {
                what: "invalid polar",
            },
            HydroError::InsufficientSamples { .. } => BemtError::InvalidArg {
                what: "insufficient polar samples",
            },
            HydroError::SingularPolar { .. } => BemtError::Invariant {
                what: "singular polar",
            },
            HydroError::FitFailed { .. } => BemtError::Invariant {
                what: "polynomial fit failed",
            },
            HydroError::InvalidArg { what } => BemtError::InvalidArg { what },
            HydroError::Extrapolation { .. } => BemtError::Invariant {
                what: "polar extrapolation failed",
            },
            HydroError::Core(inner) => inner,
        }
    }
}
