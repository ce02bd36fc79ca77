//! bemt-hydro: hydrofoil section data for the BEMT rotor designer.
//!
//! Provides:
//! - Polar storage and linear coefficient lookup
//! - Polynomial fitting (SVD least squares via nalgebra)
//! - Optimal operating point extraction (`PolarOptimizer`)
//! - Full-range polar extrapolation (`PolarExtrapolator`, Viterna model)
//! - Working fluid properties
//!
//! # Example
//!
//! ```
//! use bemt_hydro::{Polar, PolarOptimizer};
//!
//! let alpha: Vec<f64> = (-4..=12).map(f64::from).collect();
//! let cl = alpha.iter().map(|a| 0.4 + 0.11 * a - 0.003 * a * a).collect();
//! let cd = alpha.iter().map(|a| 0.01 + 0.00025 * a * a).collect();
//! let polar = Polar::new(2.0e5, alpha, cl, cd).unwrap();
//!
//! let opt = PolarOptimizer::new().find_optimal_operating_point(&polar).unwrap();
//! assert!(opt.alpha > 0.0 && opt.alpha < 8.0);
//! ```

pub mod error;
pub mod extrapolate;
pub mod fluid;
pub mod optimizer;
pub mod polar;
pub mod polyfit;

pub use error::{HydroError, HydroResult};
pub use extrapolate::{
    DEFAULT_ASPECT_RATIO, PolarExtrapolator, ViternaExtrapolator, flat_plate_cd_max,
};
pub use fluid::FluidProperties;
pub use optimizer::{EfficiencyCurve, OptimalOperatingPoint, PolarOptimizer};
pub use polar::{Polar, SectionCoefficients};
pub use polyfit::Polynomial;
