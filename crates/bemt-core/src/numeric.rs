use crate::BemtError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, BemtError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BemtError::NonFinite { what, value: v })
    }
}

/// Evenly spaced points over `[start, end]`, endpoints included.
///
/// The last point is pinned to `end` exactly.
pub fn linspace(start: Real, end: Real, num_points: usize) -> Vec<Real> {
    match num_points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let delta = (end - start) / (n - 1) as Real;
            let mut points: Vec<Real> = (0..n).map(|i| start + i as Real * delta).collect();
            points[n - 1] = end;
            points
        }
    }
}

/// Check that `xs` is strictly increasing.
pub fn is_strictly_increasing(xs: &[Real]) -> bool {
    xs.windows(2).all(|w| w[0] < w[1])
}

/// Piecewise linear interpolation of `(xs, ys)` at `x`.
///
/// `xs` must be strictly increasing. Outside the sampled range the end values
/// are held constant.
pub fn interp_linear(x: Real, xs: &[Real], ys: &[Real]) -> Result<Real, BemtError> {
    if xs.len() != ys.len() {
        return Err(BemtError::LengthMismatch {
            what: "interpolation table",
            left: xs.len(),
            right: ys.len(),
        });
    }
    let n = xs.len();
    if n == 0 {
        return Err(BemtError::InvalidArg {
            what: "interpolation table is empty",
        });
    }
    if !x.is_finite() {
        return Err(BemtError::NonFinite {
            what: "interpolation point",
            value: x,
        });
    }

    if x <= xs[0] {
        return Ok(ys[0]);
    }
    if x >= xs[n - 1] {
        return Ok(ys[n - 1]);
    }

    // First index with xs[i] > x; guaranteed in 1..n by the checks above
    let hi = xs.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let t = (x - xs[lo]) / (xs[hi] - xs[lo]);
    Ok(ys[lo] + t * (ys[hi] - ys[lo]))
}

/// Resample `(xs, ys)` onto `grid` with [`interp_linear`].
pub fn resample_linear(grid: &[Real], xs: &[Real], ys: &[Real]) -> Result<Vec<Real>, BemtError> {
    grid.iter().map(|&x| interp_linear(x, xs, ys)).collect()
}

/// Simpson's rule over a single segment `[lo, hi]` using its midpoint.
///
/// Exact for polynomials up to degree three.
pub fn simpson<F>(f: F, lo: Real, hi: Real) -> Real
where
    F: Fn(Real) -> Real,
{
    let mid = 0.5 * (lo + hi);
    (hi - lo) / 6.0 * (f(lo) + 4.0 * f(mid) + f(hi))
}

/// Index of the largest value; the first one wins on ties. NaNs are skipped.
pub fn argmax_first(values: &[Real]) -> Option<usize> {
    let mut best: Option<(usize, Real)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
