//! Solver settings shared by the designer and the evaluator.

use crate::error::{SolverError, SolverResult};
use crate::roots::RootConfig;

/// Iteration controls for the induction loop and the chord search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    /// Inner loop stops once both |da| and |db| fall below this
    pub tolerance: f64,
    /// Inner loop iteration cap
    pub max_inner_iterations: usize,
    /// Initial under-relaxation factor of the induction update
    pub relaxation: f64,
    /// Floor for the relaxation factor once oscillation halves it
    pub min_relaxation: f64,
    /// Inflow angle is clamped to [phi_min, 90 - phi_min] degrees
    pub phi_min_deg: f64,
    /// Floor on the combined tip/root loss factor
    pub min_loss_factor: f64,
    /// First chord tried by the designer, as a fraction of blade radius
    pub initial_chord_fraction: f64,
    /// Chord increment (m)
    pub chord_step: f64,
    /// Chord search gives up beyond this fraction of blade radius
    pub max_chord_fraction: f64,
    /// Chord search iteration cap
    pub max_outer_iterations: usize,
    /// Axial induction at which the chord search stops
    pub target_axial_induction: f64,
    /// Multiplier applied to the outermost station radius
    pub tip_clearance: f64,
    /// Fan stations out over the rayon pool
    pub parallel: bool,
    /// Scalar root finder settings
    pub root: RootConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_inner_iterations: 500,
            relaxation: 0.5,
            min_relaxation: 1e-3,
            phi_min_deg: 0.01,
            min_loss_factor: 1e-4,
            initial_chord_fraction: 0.01,
            chord_step: 1e-5,
            max_chord_fraction: 1.0,
            max_outer_iterations: 1_000_000,
            target_axial_induction: 1.0 / 3.0,
            tip_clearance: 0.975,
            parallel: true,
            root: RootConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Reject settings the solver cannot work with.
    pub fn validate(&self) -> SolverResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.tolerance) {
            return Err(SolverError::InvalidArg {
                what: "tolerance must be positive",
            });
        }
        if self.max_inner_iterations == 0 || self.max_outer_iterations == 0 {
            return Err(SolverError::InvalidArg {
                what: "iteration caps must be at least 1",
            });
        }
        if !(positive(self.relaxation)
            && self.relaxation <= 1.0
            && positive(self.min_relaxation)
            && self.min_relaxation <= self.relaxation)
        {
            return Err(SolverError::InvalidArg {
                what: "relaxation must satisfy 0 < min_relaxation <= relaxation <= 1",
            });
        }
        if !(positive(self.phi_min_deg) && self.phi_min_deg < 45.0) {
            return Err(SolverError::InvalidArg {
                what: "phi_min_deg must lie in (0, 45)",
            });
        }
        if !(positive(self.min_loss_factor) && self.min_loss_factor <= 1.0) {
            return Err(SolverError::InvalidArg {
                what: "min_loss_factor must lie in (0, 1]",
            });
        }
        if !positive(self.initial_chord_fraction) || !positive(self.chord_step) {
            return Err(SolverError::InvalidArg {
                what: "initial chord and chord step must be positive",
            });
        }
        if !(self.max_chord_fraction.is_finite()
            && self.max_chord_fraction > self.initial_chord_fraction)
        {
            return Err(SolverError::InvalidArg {
                what: "max_chord_fraction must exceed initial_chord_fraction",
            });
        }
        if !(positive(self.target_axial_induction) && self.target_axial_induction < 1.0) {
            return Err(SolverError::InvalidArg {
                what: "target axial induction must lie in (0, 1)",
            });
        }
        if !(positive(self.tip_clearance) && self.tip_clearance <= 1.0) {
            return Err(SolverError::InvalidArg {
                what: "tip_clearance must lie in (0, 1]",
            });
        }
        self.root.validate()
    }
}
