//! Least-squares polynomial fitting.

use crate::error::{HydroError, HydroResult};
use nalgebra::{DMatrix, DVector};

/// Singular values below this are treated as zero by the SVD solve.
const SVD_EPS: f64 = 1e-12;

/// Polynomial fitted over a finite interval.
///
/// The abscissa is mapped affinely onto `[-1, 1]` before fitting, which spans
/// the same polynomial space as fitting in raw `x` but keeps the Vandermonde
/// system well conditioned for high degrees.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    /// Coefficients in the scaled variable, lowest order first
    coeffs: Vec<f64>,
    center: f64,
    half_width: f64,
}

impl Polynomial {
    /// Least-squares fit of degree `degree` to `(xs, ys)`.
    ///
    /// # Errors
    /// - [`HydroError::InsufficientSamples`] with fewer than `degree + 1` samples
    /// - [`HydroError::FitFailed`] on mismatched input, a degenerate interval or
    ///   a failed SVD solve
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> HydroResult<Self> {
        if xs.len() != ys.len() {
            return Err(HydroError::FitFailed {
                what: format!("x/y lengths differ ({} != {})", xs.len(), ys.len()),
            });
        }
        let needed = degree + 1;
        if xs.len() < needed {
            return Err(HydroError::InsufficientSamples {
                needed,
                got: xs.len(),
            });
        }

        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let half_width = 0.5 * (hi - lo);
        if !(half_width.is_finite() && half_width > 0.0) {
            return Err(HydroError::FitFailed {
                what: "fit interval has zero width".to_string(),
            });
        }
        let center = 0.5 * (hi + lo);

        let vandermonde = DMatrix::from_fn(xs.len(), needed, |i, j| {
            ((xs[i] - center) / half_width).powi(j as i32)
        });
        let rhs = DVector::from_column_slice(ys);

        let solution = vandermonde
            .svd(true, true)
            .solve(&rhs, SVD_EPS)
            .map_err(|e| HydroError::FitFailed {
                what: e.to_string(),
            })?;

        if solution.iter().any(|c| !c.is_finite()) {
            return Err(HydroError::FitFailed {
                what: "non-finite coefficient".to_string(),
            });
        }

        Ok(Self {
            coeffs: solution.iter().copied().collect(),
            center,
            half_width,
        })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate at `x` (Horner scheme in the scaled variable).
    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.half_width;
        self.coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }

    /// Evaluate at every point of `xs`.
    pub fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bemt_core::linspace;

    #[test]
    fn reproduces_exact_polynomial() {
        let xs = linspace(-10.0, 20.0, 31);
        let ys: Vec<f64> = xs
            .iter()
            .map(|x| 0.3 + 0.1 * x - 0.004 * x * x + 1e-5 * x.powi(3))
            .collect();

        let poly = Polynomial::fit(&xs, &ys, 7).unwrap();
        assert_eq!(poly.degree(), 7);
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((poly.eval(*x) - y).abs() < 1e-9, "x = {x}");
        }
        // Between samples too
        let x: f64 = 3.3;
        let expected = 0.3 + 0.1 * x - 0.004 * x * x + 1e-5 * x.powi(3);
        assert!((poly.eval(x) - expected).abs() < 1e-9);
    }

    #[test]
    fn least_squares_line_through_noisy_points() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.1, 0.9, 2.1, 2.9];
        let poly = Polynomial::fit(&xs, &ys, 1).unwrap();
        // Normal equations give slope 0.96 and intercept 0.06
        assert!((poly.eval(0.0) - 0.06).abs() < 1e-10);
        assert!((poly.eval(1.0) - 1.02).abs() < 1e-10);
    }

    #[test]
    fn needs_degree_plus_one_samples() {
        let err = Polynomial::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0], 7).unwrap_err();
        assert_eq!(err, HydroError::InsufficientSamples { needed: 8, got: 3 });
    }

    #[test]
    fn rejects_degenerate_interval() {
        assert!(Polynomial::fit(&[1.0, 1.0], &[0.0, 1.0], 1).is_err());
    }
}
