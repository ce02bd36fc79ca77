//! Optimal operating point extraction from a polar.
//!
//! Lift, drag and lift-to-drag efficiency are each fitted with an independent
//! degree-7 polynomial over the raw samples. The efficiency fit is resampled on
//! an evenly spaced grid spanning the sampled alpha range; the grid point with
//! the highest fitted efficiency selects `alpha*`. `cl*` and `cd*` are then read
//! from the lift and drag fits at that same alpha, never from the efficiency
//! fit, so fit errors do not compound.

use crate::error::{HydroError, HydroResult};
use crate::polar::Polar;
use crate::polyfit::Polynomial;
use bemt_core::{argmax_first, linspace};

/// Degree of the lift, drag and efficiency fits.
pub const FIT_DEGREE: usize = 7;

/// Number of resampling points for the efficiency fit.
pub const FIT_SAMPLES: usize = 100;

/// Angle of attack of maximum lift-to-drag ratio with its coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OptimalOperatingPoint {
    /// Angle of attack [deg]
    pub alpha: f64,
    /// Lift coefficient from the lift fit at `alpha`
    pub cl: f64,
    /// Drag coefficient from the drag fit at `alpha`
    pub cd: f64,
    /// Fitted efficiency at `alpha`
    pub efficiency: f64,
}

/// Raw and fitted efficiency curves of one polar, for plotting.
#[derive(Clone, Debug, PartialEq)]
pub struct EfficiencyCurve {
    pub alpha_raw: Vec<f64>,
    pub efficiency_raw: Vec<f64>,
    pub alpha_fit: Vec<f64>,
    pub efficiency_fit: Vec<f64>,
    pub optimum: OptimalOperatingPoint,
}

/// Polynomial-fit optimizer for hydrofoil polars.
#[derive(Clone, Copy, Debug)]
pub struct PolarOptimizer {
    degree: usize,
    samples: usize,
}

impl Default for PolarOptimizer {
    fn default() -> Self {
        Self {
            degree: FIT_DEGREE,
            samples: FIT_SAMPLES,
        }
    }
}

impl PolarOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find `(alpha*, cl*, cd*)` for `polar`.
    pub fn find_optimal_operating_point(
        &self,
        polar: &Polar,
    ) -> HydroResult<OptimalOperatingPoint> {
        self.analyze(polar).map(|curve| curve.optimum)
    }

    /// Fit the polar and return the optimum together with the efficiency curves.
    ///
    /// # Errors
    /// - [`HydroError::SingularPolar`] if any drag sample is zero, or the drag fit
    ///   is not strictly positive at the optimum
    /// - [`HydroError::InsufficientSamples`] with fewer than 8 samples
    pub fn analyze(&self, polar: &Polar) -> HydroResult<EfficiencyCurve> {
        let efficiency_raw = polar.efficiency()?;
        let alpha = polar.alpha();

        let eff_fit = Polynomial::fit(alpha, &efficiency_raw, self.degree)?;
        let cl_fit = Polynomial::fit(alpha, polar.cl(), self.degree)?;
        let cd_fit = Polynomial::fit(alpha, polar.cd(), self.degree)?;

        let (alpha_min, alpha_max) = polar.alpha_range();
        let alpha_fit = linspace(alpha_min, alpha_max, self.samples);
        let efficiency_fit = eff_fit.eval_many(&alpha_fit);

        let best = argmax_first(&efficiency_fit).ok_or_else(|| HydroError::FitFailed {
            what: "efficiency fit produced no finite values".to_string(),
        })?;
        let alpha_opt = alpha_fit[best];
        let cl = cl_fit.eval(alpha_opt);
        let cd = cd_fit.eval(alpha_opt);

        if !(cd.is_finite() && cd > 0.0) {
            return Err(HydroError::SingularPolar {
                what: format!("fitted cd = {cd} at optimum alpha = {alpha_opt}"),
            });
        }
        if !cl.is_finite() {
            return Err(HydroError::FitFailed {
                what: format!("fitted cl is not finite at alpha = {alpha_opt}"),
            });
        }

        let optimum = OptimalOperatingPoint {
            alpha: alpha_opt,
            cl,
            cd,
            efficiency: efficiency_fit[best],
        };

        Ok(EfficiencyCurve {
            alpha_raw: alpha.to_vec(),
            efficiency_raw,
            alpha_fit,
            efficiency_fit,
            optimum,
        })
    }
}
