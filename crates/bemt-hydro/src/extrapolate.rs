//! Full-range polar extrapolation.
//!
//! Evaluation needs lift and drag at any angle of attack the converging flow
//! may visit, so measured polars are extended to [-180°, 180°] before use.
//! [`ViternaExtrapolator`] implements the Viterna–Corrigan flat-plate model
//! with the blending used by AirfoilPrep:
//!
//! ```text
//! cl = cdmax/2 · sin 2α + A · cos²α / sin α
//! cd = cdmax · sin²α + B · cos α
//! A  = (cl_h − cdmax · sin α_h · cos α_h) · sin α_h / cos² α_h
//! B  = (cd_h − cdmax · sin² α_h) / cos α_h
//! ```
//!
//! where `(α_h, cl_h, cd_h)` is the last measured sample. Lift is scaled by
//! 0.7 on the reversed-flow branches and varies linearly to zero at ±180°.

use crate::error::{HydroError, HydroResult};
use crate::polar::Polar;
use bemt_core::{is_strictly_increasing, linspace};
use std::f64::consts::{FRAC_PI_2, PI};

/// Default aspect ratio used for the flat-plate drag estimate.
pub const DEFAULT_ASPECT_RATIO: f64 = 10.0;

/// Maximum flat-plate drag coefficient for a blade of aspect ratio `ar`.
pub fn flat_plate_cd_max(aspect_ratio: f64) -> f64 {
    1.11 + 0.018 * aspect_ratio
}

/// Extends a bounded polar to the full angle-of-attack range.
pub trait PolarExtrapolator {
    /// Return a new polar covering [-180°, 180°].
    ///
    /// `cd_min` floors the drag of the extended polar; the flat-plate drag used
    /// at 90° is `max(cd_max, max measured cd)`.
    fn extrapolate(
        &self,
        polar: &Polar,
        aspect_ratio: f64,
        cd_min: f64,
        cd_max: f64,
    ) -> HydroResult<Polar>;

    /// Extrapolate with `cd_min` = smallest measured drag and the flat-plate
    /// `cd_max` for `aspect_ratio`.
    fn extrapolate_default(&self, polar: &Polar, aspect_ratio: f64) -> HydroResult<Polar> {
        self.extrapolate(
            polar,
            aspect_ratio,
            polar.min_cd(),
            flat_plate_cd_max(aspect_ratio),
        )
    }
}

/// Viterna–Corrigan extrapolation.
#[derive(Clone, Copy, Debug)]
pub struct ViternaExtrapolator {
    /// Points per blending segment
    pub nalpha: usize,
    /// Lift scaling on the reversed-flow branches
    pub cl_adjust: f64,
}

impl Default for ViternaExtrapolator {
    fn default() -> Self {
        Self {
            nalpha: 15,
            cl_adjust: 0.7,
        }
    }
}

/// Fitted Viterna model anchored at the last measured sample.
struct ViternaModel {
    cd_max: f64,
    a: f64,
    b: f64,
}

impl ViternaModel {
    fn coefficients(&self, alpha_rad: f64, cl_adjust: f64) -> (f64, f64) {
        // sin(alpha) appears in a denominator
        let alpha = alpha_rad.max(1e-4);
        let (sa, ca) = alpha.sin_cos();
        let cl = (self.cd_max / 2.0 * (2.0 * alpha).sin() + self.a * ca * ca / sa) * cl_adjust;
        let cd = self.cd_max * sa * sa + self.b * ca;
        (cl, cd)
    }
}

/// Extended polar under construction; generated angles arrive in radians.
#[derive(Default)]
struct Table {
    alpha: Vec<f64>,
    cl: Vec<f64>,
    cd: Vec<f64>,
}

impl Table {
    fn push(&mut self, alpha_rad: f64, cl: f64, cd: f64) {
        self.alpha.push(alpha_rad.to_degrees());
        self.cl.push(cl);
        self.cd.push(cd);
    }
}

/// `linspace(start, end, n)` without its first point.
fn open_start(start: f64, end: f64, n: usize) -> Vec<f64> {
    linspace(start, end, n).into_iter().skip(1).collect()
}

impl PolarExtrapolator for ViternaExtrapolator {
    fn extrapolate(
        &self,
        polar: &Polar,
        aspect_ratio: f64,
        cd_min: f64,
        cd_max: f64,
    ) -> HydroResult<Polar> {
        if self.nalpha < 3 {
            return Err(HydroError::InvalidArg {
                what: "extrapolation needs at least 3 points per segment",
            });
        }
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(HydroError::InvalidArg {
                what: "aspect ratio must be positive",
            });
        }
        if !(cd_min.is_finite() && cd_min >= 0.0) {
            return Err(HydroError::InvalidArg {
                what: "cd_min must be non-negative",
            });
        }
        if !cd_max.is_finite() {
            return Err(HydroError::InvalidArg {
                what: "cd_max must be finite",
            });
        }

        let alpha = polar.alpha();
        let cl = polar.cl();
        let cd = polar.cd();
        let last = polar.len() - 1;

        let alpha_high = alpha[last].to_radians();
        let alpha_low = alpha[0].to_radians();
        if !(alpha_high > 0.0 && alpha_high < FRAC_PI_2) {
            return Err(HydroError::Extrapolation {
                what: format!("last alpha must lie in (0, 90) deg, got {}", alpha[last]),
            });
        }
        if alpha_low <= -FRAC_PI_2 {
            return Err(HydroError::Extrapolation {
                what: format!("first alpha must exceed -90 deg, got {}", alpha[0]),
            });
        }
        let (cl_high, cd_high) = (cl[last], cd[last]);
        let (cl_low, cd_low) = (cl[0], cd[0]);

        let cd_max = cd_max.max(polar.max_cd());
        let (sa, ca) = alpha_high.sin_cos();
        let model = ViternaModel {
            cd_max,
            a: (cl_high - cd_max * sa * ca) * sa / (ca * ca),
            b: (cd_high - cd_max * sa * sa) / ca,
        };

        let n = self.nalpha;
        let adj = self.cl_adjust;

        let mut table = Table::default();

        // -180 <-> -180 + alpha_high: linear lift back to zero
        for a in linspace(-PI, -PI + alpha_high, n) {
            let (_, d) = model.coefficients(a + PI, 1.0);
            table.push(a, (a + PI) / alpha_high * cl_high * adj, d);
        }
        // -180 + alpha_high <-> -90
        for a in open_start(-PI + alpha_high, -FRAC_PI_2, n) {
            let (l, d) = model.coefficients(a + PI, adj);
            table.push(a, l, d);
        }
        // -90 <-> -alpha_high (or alpha_low when the data already reaches it)
        let mirrored_data = alpha_low <= -alpha_high;
        let upper = if mirrored_data { alpha_low } else { -alpha_high };
        let mut seg = open_start(-FRAC_PI_2, upper, n);
        if mirrored_data {
            // alpha_low itself is a measured sample
            seg.pop();
        }
        for a in seg {
            let (l, d) = model.coefficients(-a, -adj);
            table.push(a, l, d);
        }
        // -alpha_high <-> alpha_low: linear blend into the measured data
        if !mirrored_data {
            let pts = linspace(-alpha_high, alpha_low, n);
            for &a in &pts[1..n - 1] {
                let l = -cl_high * adj
                    + (a + alpha_high) / (alpha_low + alpha_high) * (cl_low + cl_high * adj);
                let d = cd_low + (a - alpha_low) / (-alpha_high - alpha_low) * (cd_high - cd_low);
                table.push(a, l, d);
            }
        }

        // Measured samples, unchanged
        table.alpha.extend_from_slice(alpha);
        table.cl.extend_from_slice(cl);
        table.cd.extend_from_slice(cd);

        // alpha_high <-> 90
        for a in open_start(alpha_high, FRAC_PI_2, n) {
            let (l, d) = model.coefficients(a, 1.0);
            table.push(a, l, d);
        }
        // 90 <-> 180 - alpha_high
        for a in open_start(FRAC_PI_2, PI - alpha_high, n) {
            let (l, d) = model.coefficients(PI - a, -adj);
            table.push(a, l, d);
        }
        // 180 - alpha_high <-> 180: linear lift back to zero
        for a in open_start(PI - alpha_high, PI, n) {
            let (_, d) = model.coefficients(PI - a, 1.0);
            table.push(a, (a - PI) / alpha_high * cl_high * adj, d);
        }

        let Table {
            alpha: mut ext_alpha,
            cl: ext_cl,
            cd: mut ext_cd,
        } = table;

        // Pin the end points against round-off in the degree conversion
        let count = ext_alpha.len();
        ext_alpha[0] = -180.0;
        ext_alpha[count - 1] = 180.0;

        for d in ext_cd.iter_mut() {
            *d = d.max(cd_min);
        }

        if !is_strictly_increasing(&ext_alpha) {
            return Err(HydroError::Extrapolation {
                what: "extended alpha is not strictly increasing".to_string(),
            });
        }

        Polar::new(polar.reynolds(), ext_alpha, ext_cl, ext_cd)
    }
}
