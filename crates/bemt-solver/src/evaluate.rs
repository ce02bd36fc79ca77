//! Rotor performance from a fixed blade geometry.
//!
//! Every station is converged once in evaluation mode: the twist is fixed and
//! lift/drag are interpolated from the extended polar at `α = φ − twist`.
//! Station results are resampled onto `interpolation_range + 1` evenly spaced
//! radii over `[initial_fraction · R, R]`, and each segment contributes
//!
//! ```text
//! dT = ∫ 4π r ρ U∞² a(1 − a) F dr
//! dP = ∫ 4π r³ ρ U∞ Ω b(1 − a) F dr
//! ```
//!
//! with `a`, `b` and `F` frozen at the segment's leading grid point. The
//! integrals are evaluated with Simpson's rule, exact for these integrands.

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::induction::{ConvergedBladeElementState, InductionSolver, PolarLookup};
use crate::ordering::StationOrdering;
use crate::station::{OperativeState, RotorGeometry};
use bemt_core::units::{Force, Power, newton, watt};
use bemt_core::{
    StationId, ensure_finite, is_strictly_increasing, linspace, resample_linear, simpson,
};
use bemt_hydro::{FluidProperties, Polar};
use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::{debug, info, warn};

/// Default number of integration segments.
pub const DEFAULT_INTERPOLATION_RANGE: usize = 100;

/// Converged station in evaluation mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluatedStation {
    pub id: StationId,
    /// Position in evaluation order
    pub evaluation_index: usize,
    pub radius: f64,
    pub chord: f64,
    pub twist: f64,
    pub state: ConvergedBladeElementState,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StationFailure {
    pub id: StationId,
    pub radius: f64,
    pub error: SolverError,
}

/// Station quantities resampled onto the integration grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialDistribution {
    pub radius: Vec<f64>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub f_total: Vec<f64>,
    pub w: Vec<f64>,
    pub cx: Vec<f64>,
    pub cy: Vec<f64>,
    pub chord: Vec<f64>,
    pub phi: Vec<f64>,
}

/// Loads carried by one radial segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentContribution {
    pub r_start: f64,
    pub r_end: f64,
    /// Thrust (N)
    pub thrust: f64,
    /// Power (W)
    pub power: f64,
}

/// Integrated rotor loads.
#[derive(Clone, Debug, PartialEq)]
pub struct RotorPerformance {
    /// Total thrust (N)
    pub total_thrust: f64,
    /// Total power (W)
    pub total_power: f64,
    /// `T / (½ρπR²U∞²)`
    pub thrust_coefficient: f64,
    /// `P / (½ρπR²U∞³)`
    pub power_coefficient: f64,
    pub distribution: RadialDistribution,
    pub segments: Vec<SegmentContribution>,
}

impl RotorPerformance {
    pub fn thrust(&self) -> Force {
        newton(self.total_thrust)
    }

    pub fn power(&self) -> Power {
        watt(self.total_power)
    }
}

/// Evaluation of one tip speed ratio.
///
/// `performance` is present only when every station converged.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationReport {
    pub tip_speed_ratio: f64,
    /// Rotor speed (rad/s)
    pub omega: f64,
    /// Converged stations in evaluation order (tip to hub)
    pub stations: Vec<EvaluatedStation>,
    pub failures: Vec<StationFailure>,
    pub performance: Option<RotorPerformance>,
}

impl EvaluationReport {
    pub fn all_resolved(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load integrator over a designed blade.
#[derive(Clone, Copy, Debug)]
pub struct PerformanceEvaluator {
    config: SolverConfig,
    interpolation_range: usize,
}

impl Default for PerformanceEvaluator {
    fn default() -> Self {
        Self::new(SolverConfig::default(), DEFAULT_INTERPOLATION_RANGE)
    }
}

impl PerformanceEvaluator {
    pub fn new(config: SolverConfig, interpolation_range: usize) -> Self {
        Self {
            config,
            interpolation_range,
        }
    }

    pub fn interpolation_range(&self) -> usize {
        self.interpolation_range
    }

    /// Evaluate `geometry` at tip speed ratio `tsr`.
    ///
    /// `polars` are the extended polars in design order, one per section.
    ///
    /// # Errors
    /// [`SolverError::ConfigurationMismatch`] when the polar count differs
    /// from the section count; invalid arguments are rejected up front.
    /// Station convergence failures are reported in the result instead.
    pub fn evaluate(
        &self,
        geometry: &RotorGeometry,
        polars: &[Polar],
        state: &OperativeState,
        fluid: &FluidProperties,
        tsr: f64,
    ) -> SolverResult<EvaluationReport> {
        if polars.len() != geometry.len() {
            return Err(SolverError::ConfigurationMismatch {
                expected: geometry.len(),
                got: polars.len(),
            });
        }
        if !(tsr.is_finite() && tsr > 0.0) {
            return Err(SolverError::InvalidArg {
                what: "tip speed ratio must be positive",
            });
        }
        if self.interpolation_range == 0 {
            return Err(SolverError::InvalidArg {
                what: "interpolation range must be at least 1",
            });
        }
        state.validate()?;
        self.config.validate()?;

        let omega = state.omega_at(tsr);
        let ordering = StationOrdering::new(geometry.len());
        let solver = InductionSolver::new(self.config);
        let sections = geometry.sections();

        info!(tsr, omega, stations = sections.len(), "evaluating rotor");

        let solve = |evaluation_index: usize| -> SolverResult<Result<EvaluatedStation, StationFailure>> {
            let i = ordering.evaluation_to_design(evaluation_index)?;
            let section = sections[i];
            let lookup = PolarLookup {
                polar: &polars[i],
                twist: section.twist,
            };
            let element = state.element(section.radius, section.chord, omega);
            let outcome = match solver.solve(&element, &lookup, section.design_induction) {
                Ok(converged) => {
                    debug!(station = %section.id, a = converged.a, b = converged.b, "station evaluated");
                    Ok(EvaluatedStation {
                        id: section.id,
                        evaluation_index,
                        radius: section.radius,
                        chord: section.chord,
                        twist: section.twist,
                        state: converged,
                    })
                }
                Err(error) => {
                    warn!(station = %section.id, error = %error, "station did not converge");
                    Err(StationFailure {
                        id: section.id,
                        radius: section.radius,
                        error,
                    })
                }
            };
            Ok(outcome)
        };

        let outcomes: Vec<Result<EvaluatedStation, StationFailure>> = if self.config.parallel {
            (0..sections.len())
                .into_par_iter()
                .map(solve)
                .collect::<SolverResult<_>>()?
        } else {
            (0..sections.len())
                .map(solve)
                .collect::<SolverResult<_>>()?
        };

        let mut stations = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(s) => stations.push(s),
                Err(f) => failures.push(f),
            }
        }

        let performance = if failures.is_empty() {
            Some(self.integrate(&stations, &ordering, state, fluid, omega)?)
        } else {
            None
        };

        Ok(EvaluationReport {
            tip_speed_ratio: tsr,
            omega,
            stations,
            failures,
            performance,
        })
    }

    /// Evaluate each tip speed ratio independently.
    pub fn evaluate_sweep(
        &self,
        geometry: &RotorGeometry,
        polars: &[Polar],
        state: &OperativeState,
        fluid: &FluidProperties,
        tip_speed_ratios: &[f64],
    ) -> SolverResult<Vec<EvaluationReport>> {
        tip_speed_ratios
            .iter()
            .map(|&tsr| self.evaluate(geometry, polars, state, fluid, tsr))
            .collect()
    }

    fn integrate(
        &self,
        stations: &[EvaluatedStation],
        ordering: &StationOrdering,
        state: &OperativeState,
        fluid: &FluidProperties,
        omega: f64,
    ) -> SolverResult<RotorPerformance> {
        // Back to design order for interpolation over increasing radius
        let mut by_radius: Vec<&EvaluatedStation> = Vec::with_capacity(stations.len());
        for design_index in 0..ordering.len() {
            let j = ordering.design_to_evaluation(design_index)?;
            by_radius.push(&stations[j]);
        }

        let xs: Vec<f64> = by_radius.iter().map(|s| s.radius).collect();
        if !is_strictly_increasing(&xs) {
            return Err(SolverError::Numeric {
                what: "station radii are not strictly increasing".to_string(),
            });
        }

        let grid = linspace(
            state.initial_fraction * state.blade_radius,
            state.blade_radius,
            self.interpolation_range + 1,
        );
        let resample = |f: fn(&EvaluatedStation) -> f64| -> SolverResult<Vec<f64>> {
            let ys: Vec<f64> = by_radius.iter().map(|s| f(s)).collect();
            Ok(resample_linear(&grid, &xs, &ys)?)
        };

        let distribution = RadialDistribution {
            a: resample(|s| s.state.a)?,
            b: resample(|s| s.state.b)?,
            f_total: resample(|s| s.state.f_total)?,
            w: resample(|s| s.state.w)?,
            cx: resample(|s| s.state.cx)?,
            cy: resample(|s| s.state.cy)?,
            chord: resample(|s| s.chord)?,
            phi: resample(|s| s.state.phi)?,
            radius: grid.clone(),
        };

        let rho = fluid.rho();
        let u = state.optimal_speed;
        let segments: Vec<SegmentContribution> = grid
            .windows(2)
            .enumerate()
            .map(|(k, w)| {
                let a = distribution.a[k];
                let b = distribution.b[k];
                let f = distribution.f_total[k];
                let thrust = simpson(
                    |r| 4.0 * PI * r * rho * u * u * a * (1.0 - a) * f,
                    w[0],
                    w[1],
                );
                let power = simpson(
                    |r| 4.0 * PI * r.powi(3) * rho * u * omega * b * (1.0 - a) * f,
                    w[0],
                    w[1],
                );
                SegmentContribution {
                    r_start: w[0],
                    r_end: w[1],
                    thrust,
                    power,
                }
            })
            .collect();

        let total_thrust = ensure_finite(segments.iter().map(|s| s.thrust).sum(), "total thrust")?;
        let total_power = ensure_finite(segments.iter().map(|s| s.power).sum(), "total power")?;
        let dynamic = 0.5 * rho * state.disk_area();

        Ok(RotorPerformance {
            total_thrust,
            total_power,
            thrust_coefficient: total_thrust / (dynamic * u * u),
            power_coefficient: total_power / (dynamic * u * u * u),
            distribution,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::induction::BladeElementIterationState;
    use crate::station::BladeSection;

    fn state() -> OperativeState {
        OperativeState {
            optimal_speed: 1.5,
            blade_radius: 0.5,
            blade_count: 3,
            hub_fraction: 0.1,
            initial_fraction: 0.2,
            final_fraction: 1.0,
            design_points: 3,
            tip_speed_ratio: 5.0,
        }
    }

    fn flat_polar() -> Polar {
        Polar::new(
            1e5,
            vec![-180.0, 0.0, 180.0],
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    fn geometry() -> RotorGeometry {
        let sections = [0.1, 0.3, 0.4875]
            .iter()
            .enumerate()
            .map(|(i, &r)| BladeSection {
                id: StationId::from_index(i),
                radius: r,
                chord: 0.05,
                twist: 5.0,
                design_induction: BladeElementIterationState::default(),
            })
            .collect();
        RotorGeometry::new(sections).unwrap()
    }

    #[test]
    fn unloaded_blade_produces_no_loads() {
        let polars = vec![flat_polar(); 3];
        let report = PerformanceEvaluator::default()
            .evaluate(&geometry(), &polars, &state(), &FluidProperties::seawater(), 5.0)
            .unwrap();

        let perf = report.performance.unwrap();
        assert_eq!(perf.total_thrust, 0.0);
        assert_eq!(perf.total_power, 0.0);
        assert_eq!(perf.segments.len(), DEFAULT_INTERPOLATION_RANGE);
        assert_eq!(perf.distribution.radius.len(), DEFAULT_INTERPOLATION_RANGE + 1);
    }

    #[test]
    fn stations_are_reported_tip_first() {
        let polars = vec![flat_polar(); 3];
        let report = PerformanceEvaluator::default()
            .evaluate(&geometry(), &polars, &state(), &FluidProperties::seawater(), 5.0)
            .unwrap();

        let ids: Vec<usize> = report.stations.iter().map(|s| s.id.index()).collect();
        assert_eq!(ids, vec![2, 1, 0]);
        assert_eq!(report.stations[0].evaluation_index, 0);
        assert!((report.omega - 15.0).abs() < 1e-12);
    }

    #[test]
    fn unconverged_station_is_reported_without_totals() {
        // Unloaded sections settle on the first iteration; the loaded one cannot
        let loaded = Polar::new(
            1e5,
            vec![-180.0, 0.0, 180.0],
            vec![0.8, 0.8, 0.8],
            vec![0.01, 0.01, 0.01],
        )
        .unwrap();
        let polars = vec![flat_polar(), loaded, flat_polar()];
        let evaluator = PerformanceEvaluator::new(
            SolverConfig {
                max_inner_iterations: 1,
                ..SolverConfig::default()
            },
            DEFAULT_INTERPOLATION_RANGE,
        );
        let report = evaluator
            .evaluate(&geometry(), &polars, &state(), &FluidProperties::seawater(), 5.0)
            .unwrap();

        assert!(!report.all_resolved());
        assert!(report.performance.is_none());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id.index(), 1);
        assert!((report.failures[0].radius - 0.3).abs() < 1e-12);
        assert!(matches!(
            report.failures[0].error,
            SolverError::NumericalDivergence { .. }
        ));

        let ids: Vec<usize> = report.stations.iter().map(|s| s.id.index()).collect();
        assert_eq!(ids, vec![2, 0]);
        let order: Vec<usize> = report.stations.iter().map(|s| s.evaluation_index).collect();
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn evaluation_starts_from_design_induction() {
        // A section seeded at its own fixed point settles in one iteration
        let polars = vec![flat_polar(); 3];
        let sections = geometry()
            .sections()
            .iter()
            .map(|s| BladeSection {
                design_induction: BladeElementIterationState::new(0.0, 0.0),
                ..*s
            })
            .collect();
        let geometry = RotorGeometry::new(sections).unwrap();
        let report = PerformanceEvaluator::default()
            .evaluate(&geometry, &polars, &state(), &FluidProperties::seawater(), 5.0)
            .unwrap();
        assert!(report.stations.iter().all(|s| s.state.iterations == 1));

        // Seeded away from it, the loop has to walk back
        let sections = geometry
            .sections()
            .iter()
            .map(|s| BladeSection {
                design_induction: BladeElementIterationState::new(0.3, 0.05),
                ..*s
            })
            .collect();
        let geometry = RotorGeometry::new(sections).unwrap();
        let report = PerformanceEvaluator::default()
            .evaluate(&geometry, &polars, &state(), &FluidProperties::seawater(), 5.0)
            .unwrap();
        assert!(report.stations.iter().all(|s| s.state.iterations > 1));
        assert!(report.stations.iter().all(|s| s.state.a.abs() < 1e-3));
    }

    #[test]
    fn polar_count_must_match_sections() {
        let err = PerformanceEvaluator::default()
            .evaluate(
                &geometry(),
                &[flat_polar()],
                &state(),
                &FluidProperties::seawater(),
                5.0,
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::ConfigurationMismatch { expected: 3, got: 1 }));
    }

    #[test]
    fn segment_integrals_match_closed_form() {
        // Uniform a, b, F: dT = 2πρU²a(1−a)F (r1² − r0²), dP = πρUΩ b(1−a)F (r1⁴ − r0⁴)
        let (rho, u, omega) = (1000.0, 2.0, 10.0);
        let (a, b, f) = (0.3, 0.02, 0.9);
        let (r0, r1) = (0.2, 0.25);
        let thrust = simpson(|r| 4.0 * PI * r * rho * u * u * a * (1.0 - a) * f, r0, r1);
        let power = simpson(
            |r| 4.0 * PI * r.powi(3) * rho * u * omega * b * (1.0 - a) * f,
            r0,
            r1,
        );

        let expected_t = 2.0 * PI * rho * u * u * a * (1.0 - a) * f * (r1 * r1 - r0 * r0);
        let expected_p = PI * rho * u * omega * b * (1.0 - a) * f * (r1.powi(4) - r0.powi(4));
        assert!((thrust - expected_t).abs() < 1e-9 * expected_t);
        assert!((power - expected_p).abs() < 1e-9 * expected_p);
    }
}
