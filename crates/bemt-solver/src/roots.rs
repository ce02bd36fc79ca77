//! Scalar Newton root finder with backtracking.

use crate::error::{SolverError, SolverResult};

/// Newton configuration for one-dimensional residuals.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance on |residual|
    pub abs_tol: f64,
    /// Relative tolerance on the Newton step |dx| / (1 + |x|)
    pub step_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-12,
            step_tol: 1e-12,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

impl RootConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::InvalidArg {
                what: "root finder needs at least one iteration",
            });
        }
        if !(self.abs_tol.is_finite() && self.abs_tol > 0.0)
            || !(self.step_tol.is_finite() && self.step_tol > 0.0)
        {
            return Err(SolverError::InvalidArg {
                what: "root finder tolerance must be positive",
            });
        }
        if !(self.line_search_beta > 0.0 && self.line_search_beta < 1.0) {
            return Err(SolverError::InvalidArg {
                what: "line search factor must lie in (0, 1)",
            });
        }
        Ok(())
    }
}

/// Converged root.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Root {
    pub x: f64,
    pub residual: f64,
    pub iterations: usize,
}

/// Solve `f(x) = 0` from `x0`.
///
/// `f` returns `(residual, derivative)`. A full Newton step is tried first and
/// halved until |f| decreases. The root is accepted once |f| drops below
/// `abs_tol` or the Newton step shrinks below `step_tol` relative to `x`; the
/// latter covers steep residuals whose round-off floor sits above `abs_tol`.
pub fn newton_scalar<F>(x0: f64, f: F, config: &RootConfig) -> SolverResult<Root>
where
    F: Fn(f64) -> (f64, f64),
{
    let mut x = x0;
    let (mut r, mut dr) = f(x);

    for iter in 0..config.max_iterations {
        if !r.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at x = {x}"),
            });
        }
        if r.abs() < config.abs_tol {
            return Ok(Root {
                x,
                residual: r,
                iterations: iter,
            });
        }
        if !dr.is_finite() || dr == 0.0 {
            return Err(SolverError::Numeric {
                what: format!("zero or non-finite derivative at x = {x}"),
            });
        }

        let dx = -r / dr;
        if dx.abs() <= config.step_tol * (1.0 + x.abs()) {
            return Ok(Root {
                x,
                residual: r,
                iterations: iter,
            });
        }

        let mut step = 1.0;
        let mut x_new = x + dx;
        let (mut r_new, mut dr_new) = f(x_new);

        for _ in 0..config.max_line_search_iters {
            if r_new.is_finite() && r_new.abs() < r.abs() {
                break;
            }
            step *= config.line_search_beta;
            x_new = x + step * dx;
            (r_new, dr_new) = f(x_new);
        }

        x = x_new;
        r = r_new;
        dr = dr_new;

        if step < 1e-10 {
            return Err(SolverError::Numeric {
                what: format!("line search stagnated at iteration {iter}"),
            });
        }
    }

    if r.is_finite() && r.abs() < config.abs_tol {
        return Ok(Root {
            x,
            residual: r,
            iterations: config.max_iterations,
        });
    }
    Err(SolverError::Numeric {
        what: format!(
            "root finder reached {} iterations, residual = {r:e}",
            config.max_iterations
        ),
    })
}
