//! Hydrofoil lift/drag polars.

use crate::error::{HydroError, HydroResult};
use bemt_core::{interp_linear, is_strictly_increasing};

/// Lift and drag coefficients of a section at one angle of attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionCoefficients {
    pub cl: f64,
    pub cd: f64,
}

/// Lift/drag polar of one hydrofoil at one Reynolds number.
///
/// Angles are in degrees and strictly increasing. The polar is immutable once
/// built; extrapolation produces a new `Polar`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polar {
    reynolds: f64,
    alpha: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
}

impl Polar {
    /// Build a polar from raw samples.
    ///
    /// # Errors
    /// Returns [`HydroError::InvalidPolar`] when the series lengths differ, fewer
    /// than two samples are given, any value is non-finite, alpha is not
    /// strictly increasing, or a drag coefficient is negative.
    pub fn new(reynolds: f64, alpha: Vec<f64>, cl: Vec<f64>, cd: Vec<f64>) -> HydroResult<Self> {
        if alpha.len() != cl.len() || alpha.len() != cd.len() {
            return Err(HydroError::InvalidPolar {
                what: format!(
                    "series lengths differ (alpha={}, cl={}, cd={})",
                    alpha.len(),
                    cl.len(),
                    cd.len()
                ),
            });
        }
        if alpha.len() < 2 {
            return Err(HydroError::InvalidPolar {
                what: format!("at least 2 samples required, got {}", alpha.len()),
            });
        }
        if !(reynolds.is_finite() && reynolds > 0.0) {
            return Err(HydroError::InvalidPolar {
                what: format!("Reynolds number must be positive, got {reynolds}"),
            });
        }
        let all_finite = alpha
            .iter()
            .chain(cl.iter())
            .chain(cd.iter())
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(HydroError::InvalidPolar {
                what: "non-finite sample".to_string(),
            });
        }
        if !is_strictly_increasing(&alpha) {
            return Err(HydroError::InvalidPolar {
                what: "alpha must be strictly increasing".to_string(),
            });
        }
        if let Some(i) = cd.iter().position(|&v| v < 0.0) {
            return Err(HydroError::InvalidPolar {
                what: format!("negative drag coefficient at alpha = {}", alpha[i]),
            });
        }

        Ok(Self {
            reynolds,
            alpha,
            cl,
            cd,
        })
    }

    pub fn reynolds(&self) -> f64 {
        self.reynolds
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn cl(&self) -> &[f64] {
        &self.cl
    }

    pub fn cd(&self) -> &[f64] {
        &self.cd
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// `(min alpha, max alpha)` in degrees.
    pub fn alpha_range(&self) -> (f64, f64) {
        (self.alpha[0], self.alpha[self.alpha.len() - 1])
    }

    pub fn min_cd(&self) -> f64 {
        self.cd.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_cd(&self) -> f64 {
        self.cd.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lift-to-drag ratio of every raw sample.
    ///
    /// # Errors
    /// Returns [`HydroError::SingularPolar`] if any drag sample is zero.
    pub fn efficiency(&self) -> HydroResult<Vec<f64>> {
        if let Some(i) = self.cd.iter().position(|&v| v == 0.0) {
            return Err(HydroError::SingularPolar {
                what: format!("cd = 0 at alpha = {}", self.alpha[i]),
            });
        }
        Ok(self
            .cl
            .iter()
            .zip(self.cd.iter())
            .map(|(cl, cd)| cl / cd)
            .collect())
    }

    /// Linearly interpolated coefficients at `alpha_deg`.
    ///
    /// Outside the sampled range the end samples are held.
    pub fn coefficients_at(&self, alpha_deg: f64) -> HydroResult<SectionCoefficients> {
        let cl = interp_linear(alpha_deg, &self.alpha, &self.cl)?;
        let cd = interp_linear(alpha_deg, &self.alpha, &self.cd)?;
        Ok(SectionCoefficients { cl, cd })
    }
}
