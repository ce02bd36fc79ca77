//! bemt-core: stable foundation for the BEMT rotor designer.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + grids, interpolation, quadrature)
//! - ids (compact station identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BemtError, BemtResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
