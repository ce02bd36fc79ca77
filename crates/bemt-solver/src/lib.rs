//! Blade element momentum solver for axial-flow rotors.
//!
//! Given per-station hydrofoil polars and a rotor operating point this crate
//! sizes the blade (chord and twist per station) and evaluates the thrust and
//! power of a fixed geometry:
//!
//! - [`InductionSolver`]: axial/tangential induction and tip/root losses of a
//!   single blade element
//! - [`ChordTwistDesigner`]: chord search driving each station to the Betz
//!   induction
//! - [`PerformanceEvaluator`]: station solves on extended polars integrated
//!   into rotor loads
//!
//! Stations are independent and may be solved on the rayon pool.

pub mod config;
pub mod design;
pub mod error;
pub mod evaluate;
pub mod induction;
pub mod ordering;
pub mod roots;
pub mod station;

pub use config::SolverConfig;
pub use design::{ChordTwistDesigner, DesignReport, StationDesign, StationOutcome};
pub use error::{SolverError, SolverResult};
pub use evaluate::{
    DEFAULT_INTERPOLATION_RANGE, EvaluatedStation, EvaluationReport, PerformanceEvaluator,
    RadialDistribution, RotorPerformance, SegmentContribution, StationFailure,
};
pub use induction::{
    BladeElement, BladeElementIterationState, ConvergedBladeElementState, FixedOperatingPoint,
    HydroCoefficients, InductionSolver, InflowKinematics, InnerStep, PolarLookup, SectionSample,
};
pub use ordering::StationOrdering;
pub use roots::{Root, RootConfig, newton_scalar};
pub use station::{BladeSection, DesignStation, OperativeState, RotorGeometry, build_stations};
