//! Blade element induction loop.
//!
//! For one radial station the loop alternates between flow kinematics and
//! momentum balance:
//!
//! 1. `U_disk = U∞(1 − a)`, `U_tang = Ωr(1 + b)`, `φ = atan2(U_disk, U_tang)`
//! 2. section coefficients at `φ` (fixed operating point or polar lookup)
//! 3. `Cx = Cl cosφ + Cd sinφ`, `Cy = Cl sinφ − Cd cosφ`, `σ = Nb·c / (2πr)`
//! 4. Prandtl tip and root losses, `F = F_tip · F_root`
//! 5. solve `a/(1 − a) = σCx / (4F sin²φ)` and `b/(1 + b) = σCy / (4F sinφ cosφ)`
//!
//! until both |Δa| and |Δb| drop below the tolerance. Each iteration consumes
//! a [`BladeElementIterationState`] by value and returns the next one.

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::roots::newton_scalar;
use bemt_hydro::{OptimalOperatingPoint, Polar};
use std::f64::consts::{FRAC_2_PI, PI};
use tracing::warn;

/// Induction factors carried between inner iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BladeElementIterationState {
    /// Axial induction factor
    pub a: f64,
    /// Tangential induction factor
    pub b: f64,
}

impl BladeElementIterationState {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }
}

/// Geometry and operating point of one blade element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeElement {
    /// Station radius (m)
    pub radius: f64,
    /// Hub radius (m)
    pub hub_radius: f64,
    /// Blade tip radius (m)
    pub blade_radius: f64,
    pub blade_count: u32,
    /// Chord (m)
    pub chord: f64,
    /// Free-stream velocity (m/s)
    pub free_stream: f64,
    /// Rotor speed (rad/s)
    pub omega: f64,
}

impl BladeElement {
    pub fn validate(&self) -> SolverResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.radius) || !positive(self.blade_radius) {
            return Err(SolverError::InvalidArg {
                what: "station and blade radius must be positive",
            });
        }
        if !(self.hub_radius.is_finite() && self.hub_radius >= 0.0) {
            return Err(SolverError::InvalidArg {
                what: "hub radius must be non-negative",
            });
        }
        if !positive(self.chord) {
            return Err(SolverError::InvalidArg {
                what: "chord must be positive",
            });
        }
        if self.blade_count == 0 {
            return Err(SolverError::InvalidArg {
                what: "rotor needs at least one blade",
            });
        }
        if !positive(self.free_stream) || !positive(self.omega) {
            return Err(SolverError::InvalidArg {
                what: "free-stream velocity and rotor speed must be positive",
            });
        }
        Ok(())
    }

    /// Local solidity `Nb·c / (2πr)`.
    pub fn solidity(&self) -> f64 {
        self.blade_count as f64 * self.chord / (2.0 * PI * self.radius)
    }

    pub fn with_chord(self, chord: f64) -> Self {
        Self { chord, ..self }
    }
}

/// Section angle of attack, twist and coefficients at one inflow angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectionSample {
    /// Angle of attack (deg)
    pub alpha: f64,
    /// Twist `φ − α` (deg)
    pub twist: f64,
    pub cl: f64,
    pub cd: f64,
}

/// Source of lift and drag for a given inflow angle.
pub trait HydroCoefficients: Sync {
    /// Section state at inflow angle `phi_deg`.
    fn sample(&self, phi_deg: f64) -> SolverResult<SectionSample>;
}

/// Design mode: the section always runs at its optimal operating point and the
/// twist follows the inflow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedOperatingPoint {
    pub alpha: f64,
    pub cl: f64,
    pub cd: f64,
}

impl From<OptimalOperatingPoint> for FixedOperatingPoint {
    fn from(opt: OptimalOperatingPoint) -> Self {
        Self {
            alpha: opt.alpha,
            cl: opt.cl,
            cd: opt.cd,
        }
    }
}

impl HydroCoefficients for FixedOperatingPoint {
    fn sample(&self, phi_deg: f64) -> SolverResult<SectionSample> {
        Ok(SectionSample {
            alpha: self.alpha,
            twist: phi_deg - self.alpha,
            cl: self.cl,
            cd: self.cd,
        })
    }
}

/// Evaluation mode: fixed twist, coefficients interpolated from a polar at
/// `α = φ − twist`.
#[derive(Clone, Copy, Debug)]
pub struct PolarLookup<'a> {
    pub polar: &'a Polar,
    /// Twist (deg)
    pub twist: f64,
}

impl HydroCoefficients for PolarLookup<'_> {
    fn sample(&self, phi_deg: f64) -> SolverResult<SectionSample> {
        let alpha = phi_deg - self.twist;
        let c = self.polar.coefficients_at(alpha)?;
        Ok(SectionSample {
            alpha,
            twist: self.twist,
            cl: c.cl,
            cd: c.cd,
        })
    }
}

/// Flow state of a blade element for given induction factors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InflowKinematics {
    /// Axial velocity through the disk (m/s)
    pub u_disk: f64,
    /// Tangential velocity at the element (m/s)
    pub u_tang: f64,
    /// Inflow angle after clamping (deg)
    pub phi: f64,
    pub phi_clamped: bool,
    pub section: SectionSample,
    /// Axial force coefficient
    pub cx: f64,
    /// Tangential force coefficient
    pub cy: f64,
    pub solidity: f64,
    pub f_tip: f64,
    pub f_root: f64,
    /// Combined loss, floored at `min_loss_factor`
    pub f_total: f64,
}

impl InflowKinematics {
    /// Right-hand side of `a/(1 − a) = σCx / (4F sin²φ)`.
    pub fn axial_load(&self) -> f64 {
        let s = self.phi.to_radians().sin();
        self.solidity * self.cx / (4.0 * self.f_total * s * s)
    }

    /// Right-hand side of `b/(1 + b) = σCy / (4F sinφ cosφ)`.
    pub fn tangential_load(&self) -> f64 {
        let (s, c) = self.phi.to_radians().sin_cos();
        self.solidity * self.cy / (4.0 * self.f_total * s * c)
    }

    /// Relative velocity magnitude.
    pub fn relative_speed(&self) -> f64 {
        self.u_disk.hypot(self.u_tang)
    }
}

/// `a − k(1 − a)` and its derivative; zero at `a/(1 − a) = k`.
pub fn axial_residual(a: f64, load: f64) -> (f64, f64) {
    (a - load * (1.0 - a), 1.0 + load)
}

/// `b − k(1 + b)` and its derivative; zero at `b/(1 + b) = k`.
pub fn tangential_residual(b: f64, load: f64) -> (f64, f64) {
    (b - load * (1.0 + b), 1.0 - load)
}

/// Prandtl loss `(2/π) acos(exp(−g))` with `g` clamped to be non-negative.
fn prandtl_loss(exponent: f64) -> f64 {
    FRAC_2_PI * (-exponent.max(0.0)).exp().acos()
}

/// One inner iteration: kinematics at the incoming state and the next state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InnerStep {
    pub kinematics: InflowKinematics,
    pub next: BladeElementIterationState,
}

/// Converged blade element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvergedBladeElementState {
    pub a: f64,
    pub b: f64,
    /// Inflow angle (deg)
    pub phi: f64,
    pub phi_clamped: bool,
    /// Angle of attack (deg)
    pub alpha: f64,
    /// Twist (deg)
    pub twist: f64,
    pub cl: f64,
    pub cd: f64,
    pub cx: f64,
    pub cy: f64,
    pub solidity: f64,
    pub f_tip: f64,
    pub f_root: f64,
    pub f_total: f64,
    /// Axial velocity through the disk (m/s)
    pub u_disk: f64,
    /// Tangential velocity (m/s)
    pub u_tang: f64,
    /// Relative velocity (m/s)
    pub w: f64,
    /// Inner iterations used
    pub iterations: usize,
}

impl ConvergedBladeElementState {
    /// Seed for a neighbouring solve.
    pub fn iteration_state(&self) -> BladeElementIterationState {
        BladeElementIterationState::new(self.a, self.b)
    }
}

/// Nested fixed-point / Newton solver for one blade element.
#[derive(Clone, Copy, Debug, Default)]
pub struct InductionSolver {
    config: SolverConfig,
}

impl InductionSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Flow kinematics, section coefficients and losses at `state`.
    pub fn kinematics(
        &self,
        element: &BladeElement,
        coefficients: &dyn HydroCoefficients,
        state: BladeElementIterationState,
    ) -> SolverResult<InflowKinematics> {
        let u_disk = element.free_stream * (1.0 - state.a);
        let u_tang = element.omega * element.radius * (1.0 + state.b);

        let phi_raw = u_disk.atan2(u_tang).to_degrees();
        if !phi_raw.is_finite() {
            return Err(divergence("non-finite inflow angle", 0.0, 0.0));
        }
        let phi_min = self.config.phi_min_deg;
        let phi = phi_raw.clamp(phi_min, 90.0 - phi_min);
        let phi_clamped = phi != phi_raw;

        let section = coefficients.sample(phi)?;
        let (s, c) = phi.to_radians().sin_cos();
        let cx = section.cl * c + section.cd * s;
        let cy = section.cl * s - section.cd * c;
        let solidity = element.solidity();

        let half_blades = element.blade_count as f64 / 2.0;
        let r_over_tip = element.radius / element.blade_radius;
        let f_tip = prandtl_loss(half_blades * (1.0 - r_over_tip) / (r_over_tip * s));
        let f_root =
            prandtl_loss(half_blades * (element.radius - element.hub_radius) / (element.radius * s));
        let f_total = (f_tip * f_root).max(self.config.min_loss_factor);

        Ok(InflowKinematics {
            u_disk,
            u_tang,
            phi,
            phi_clamped,
            section,
            cx,
            cy,
            solidity,
            f_tip,
            f_root,
            f_total,
        })
    }

    /// One inner iteration from `state`.
    ///
    /// Both momentum equations are solved with the root finder seeded at the
    /// incoming induction factors.
    pub fn step(
        &self,
        element: &BladeElement,
        coefficients: &dyn HydroCoefficients,
        state: BladeElementIterationState,
    ) -> SolverResult<InnerStep> {
        let kinematics = self.kinematics(element, coefficients, state)?;
        let ka = kinematics.axial_load();
        let kb = kinematics.tangential_load();

        let root_failed = |e: SolverError| divergence(&e.to_string(), f64::NAN, f64::NAN);
        let a = newton_scalar(state.a, |a| axial_residual(a, ka), &self.config.root)
            .map_err(root_failed)?;
        let b = newton_scalar(state.b, |b| tangential_residual(b, kb), &self.config.root)
            .map_err(root_failed)?;

        Ok(InnerStep {
            kinematics,
            next: BladeElementIterationState::new(a.x, b.x),
        })
    }

    /// Iterate from `seed` until both induction factors settle.
    ///
    /// Each factor moves towards the momentum solution by its own relaxation
    /// factor, starting at `relaxation`. A factor whose update flips sign while
    /// still above the tolerance is oscillating, and its relaxation is halved
    /// down to `min_relaxation`. The loop stops once the unrelaxed updates
    /// |Δa| and |Δb| are both below the tolerance and returns the momentum
    /// solution of the last iterate.
    ///
    /// # Errors
    /// [`SolverError::NumericalDivergence`] when the iteration cap is reached
    /// or any quantity turns non-finite.
    pub fn solve(
        &self,
        element: &BladeElement,
        coefficients: &dyn HydroCoefficients,
        seed: BladeElementIterationState,
    ) -> SolverResult<ConvergedBladeElementState> {
        element.validate()?;

        let tol = self.config.tolerance;
        let mut state = seed;
        let mut relax_a = Relaxation::new(&self.config);
        let mut relax_b = Relaxation::new(&self.config);
        let mut delta_a = f64::INFINITY;
        let mut delta_b = f64::INFINITY;

        for iteration in 1..=self.config.max_inner_iterations {
            let target = self.step(element, coefficients, state)?.next;
            if !(target.a.is_finite() && target.b.is_finite()) {
                return Err(divergence("non-finite induction factor", delta_a, delta_b));
            }

            let step_a = target.a - state.a;
            let step_b = target.b - state.b;
            delta_a = step_a.abs();
            delta_b = step_b.abs();

            if delta_a < tol && delta_b < tol {
                return self.converged(element, coefficients, target, iteration);
            }

            state = BladeElementIterationState::new(
                state.a + relax_a.factor(step_a, tol) * step_a,
                state.b + relax_b.factor(step_b, tol) * step_b,
            );
        }

        Err(divergence(
            &format!(
                "inner loop reached {} iterations at r = {:.4} m",
                self.config.max_inner_iterations, element.radius
            ),
            delta_a,
            delta_b,
        ))
    }

    fn converged(
        &self,
        element: &BladeElement,
        coefficients: &dyn HydroCoefficients,
        state: BladeElementIterationState,
        iterations: usize,
    ) -> SolverResult<ConvergedBladeElementState> {
        let k = self.kinematics(element, coefficients, state)?;
        if k.phi_clamped {
            warn!(radius = element.radius, phi = k.phi, "inflow angle clamped");
        }
        Ok(ConvergedBladeElementState {
            a: state.a,
            b: state.b,
            phi: k.phi,
            phi_clamped: k.phi_clamped,
            alpha: k.section.alpha,
            twist: k.section.twist,
            cl: k.section.cl,
            cd: k.section.cd,
            cx: k.cx,
            cy: k.cy,
            solidity: k.solidity,
            f_tip: k.f_tip,
            f_root: k.f_root,
            f_total: k.f_total,
            u_disk: k.u_disk,
            u_tang: k.u_tang,
            w: k.relative_speed(),
            iterations,
        })
    }
}

/// Under-relaxation of one induction factor.
#[derive(Clone, Copy, Debug)]
struct Relaxation {
    factor: f64,
    floor: f64,
    last_step: f64,
}

impl Relaxation {
    fn new(config: &SolverConfig) -> Self {
        Self {
            factor: config.relaxation,
            floor: config.min_relaxation,
            last_step: 0.0,
        }
    }

    /// Factor to apply to `step`, halved when the update reverses direction.
    fn factor(&mut self, step: f64, tol: f64) -> f64 {
        if step.abs() >= tol && step * self.last_step < 0.0 {
            self.factor = (0.5 * self.factor).max(self.floor);
        }
        self.last_step = step;
        self.factor
    }
}

fn divergence(what: &str, delta_a: f64, delta_b: f64) -> SolverError {
    SolverError::NumericalDivergence {
        what: what.to_string(),
        delta_a,
        delta_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nb = 3, R = 0.5 m, hub 10 %, U = 1.5 m/s, TSR 5 => omega = 15 rad/s
    fn element(radius: f64, chord: f64) -> BladeElement {
        BladeElement {
            radius,
            hub_radius: 0.05,
            blade_radius: 0.5,
            blade_count: 3,
            chord,
            free_stream: 1.5,
            omega: 15.0,
        }
    }

    fn operating_point() -> FixedOperatingPoint {
        FixedOperatingPoint {
            alpha: 3.0,
            cl: 0.703,
            cd: 0.01225,
        }
    }

    #[test]
    fn first_inflow_angle_ignores_chord() {
        let solver = InductionSolver::default();
        let seed = BladeElementIterationState::default();
        let expected = (1.5_f64 / 6.0).atan().to_degrees();

        for chord in [0.005, 0.05, 0.2] {
            let step = solver
                .step(&element(0.4, chord), &operating_point(), seed)
                .unwrap();
            assert!((step.kinematics.phi - expected).abs() < 1e-12);
            assert!((step.kinematics.phi - 14.036).abs() < 1e-3);
            assert!(!step.kinematics.phi_clamped);
        }
    }

    #[test]
    fn design_twist_follows_inflow() {
        let solver = InductionSolver::default();
        let step = solver
            .step(
                &element(0.4, 0.05),
                &operating_point(),
                BladeElementIterationState::default(),
            )
            .unwrap();
        let s = step.kinematics.section;
        assert!((s.twist - (step.kinematics.phi - 3.0)).abs() < 1e-12);
    }

    #[test]
    fn converged_state_is_a_fixed_point() {
        let solver = InductionSolver::default();
        let elem = element(0.4, 0.04);
        let coeffs = operating_point();
        let conv = solver
            .solve(&elem, &coeffs, BladeElementIterationState::default())
            .unwrap();

        assert!(conv.a > 0.0 && conv.a < 0.5);
        assert!(conv.b > 0.0);
        assert!(conv.f_total > 0.0 && conv.f_total <= 1.0);

        let tol = solver.config().tolerance;
        let next = solver.step(&elem, &coeffs, conv.iteration_state()).unwrap().next;
        assert!((next.a - conv.a).abs() < tol);
        assert!((next.b - conv.b).abs() < tol);

        let w = (1.5 * (1.0 - conv.a)).hypot(15.0 * 0.4 * (1.0 + conv.b));
        assert!((conv.w - w).abs() < 1e-12);
    }

    #[test]
    fn root_loss_at_hub_is_finite() {
        let solver = InductionSolver::default();
        let elem = BladeElement {
            radius: 0.05,
            ..element(0.4, 0.03)
        };
        let step = solver
            .step(&elem, &operating_point(), BladeElementIterationState::default())
            .unwrap();

        assert_eq!(step.kinematics.f_root, 0.0);
        assert!(step.kinematics.f_total > 0.0);
        assert!(step.next.a.is_finite() && step.next.b.is_finite());

        let conv = solver
            .solve(&elem, &operating_point(), BladeElementIterationState::default())
            .unwrap();
        assert_eq!(conv.f_root, 0.0);
        assert_eq!(conv.f_total, solver.config().min_loss_factor);
        assert!(conv.a.is_finite() && conv.b.is_finite());
        assert!(conv.a > 0.0 && conv.a < 1.0);
    }

    #[test]
    fn hub_station_converges_with_wide_chord() {
        // Floored loss gives momentum loads in the thousands
        let solver = InductionSolver::default();
        let elem = BladeElement {
            radius: 0.05,
            ..element(0.4, 0.05)
        };
        let coeffs = FixedOperatingPoint {
            alpha: 3.0,
            cl: 0.7,
            cd: 0.012,
        };
        let conv = solver
            .solve(&elem, &coeffs, BladeElementIterationState::default())
            .unwrap();
        assert!(conv.a.is_finite() && conv.b.is_finite());
        assert!(conv.w.is_finite());
    }

    fn steep_polar() -> Polar {
        let alpha: Vec<f64> = (-20..=40).map(f64::from).collect();
        let cl = alpha.iter().map(|a| 0.11 * a).collect();
        let cd = alpha.iter().map(|a| 0.01 + 0.0002 * a * a).collect();
        Polar::new(2.0e5, alpha, cl, cd).unwrap()
    }

    #[test]
    fn relaxation_settles_polar_feedback_at_inner_station() {
        // High solidity at local speed ratio 1: α = φ − twist feeds back hard
        let polar = steep_polar();
        let lookup = PolarLookup {
            polar: &polar,
            twist: 25.0,
        };
        let elem = element(0.1, 0.12);
        let seed = BladeElementIterationState::default();

        let solver = InductionSolver::default();
        let conv = solver.solve(&elem, &lookup, seed).unwrap();
        assert!(conv.a > 0.0 && conv.a < 1.0);

        let tol = solver.config().tolerance;
        let next = solver.step(&elem, &lookup, conv.iteration_state()).unwrap().next;
        assert!((next.a - conv.a).abs() < 10.0 * tol);
        assert!((next.b - conv.b).abs() < 10.0 * tol);
    }

    #[test]
    fn relaxation_does_not_change_the_fixed_point() {
        let elem = element(0.4, 0.04);
        let coeffs = operating_point();
        let seed = BladeElementIterationState::default();
        let tight = |relaxation: f64| {
            InductionSolver::new(SolverConfig {
                tolerance: 1e-10,
                relaxation,
                min_relaxation: relaxation.min(1e-3),
                ..SolverConfig::default()
            })
            .solve(&elem, &coeffs, seed)
            .unwrap()
        };
        let full = tight(1.0);
        let damped = tight(0.3);
        assert!((full.a - damped.a).abs() < 1e-8);
        assert!((full.b - damped.b).abs() < 1e-8);
    }

    #[test]
    fn tip_loss_vanishes_at_blade_tip() {
        let solver = InductionSolver::default();
        let step = solver
            .step(
                &element(0.5, 0.03),
                &operating_point(),
                BladeElementIterationState::default(),
            )
            .unwrap();
        assert_eq!(step.kinematics.f_tip, 0.0);
        assert_eq!(step.kinematics.f_total, solver.config().min_loss_factor);
    }

    #[test]
    fn reversed_axial_flow_clamps_inflow_angle() {
        let solver = InductionSolver::default();
        let k = solver
            .kinematics(
                &element(0.4, 0.05),
                &operating_point(),
                BladeElementIterationState::new(1.5, 0.0),
            )
            .unwrap();
        assert!(k.phi_clamped);
        assert_eq!(k.phi, solver.config().phi_min_deg);
    }

    #[test]
    fn iteration_cap_reports_divergence() {
        let solver = InductionSolver::new(SolverConfig {
            tolerance: 1e-14,
            max_inner_iterations: 2,
            ..SolverConfig::default()
        });
        let err = solver
            .solve(
                &element(0.4, 0.05),
                &operating_point(),
                BladeElementIterationState::default(),
            )
            .unwrap_err();
        match err {
            SolverError::NumericalDivergence { delta_a, .. } => assert!(delta_a > 0.0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn polar_lookup_uses_fixed_twist() {
        let polar = Polar::new(
            1e5,
            vec![0.0, 10.0],
            vec![0.0, 1.0],
            vec![0.01, 0.02],
        )
        .unwrap();
        let lookup = PolarLookup {
            polar: &polar,
            twist: 5.0,
        };
        let s = lookup.sample(10.0).unwrap();
        assert_eq!(s.alpha, 5.0);
        assert_eq!(s.twist, 5.0);
        assert!((s.cl - 0.5).abs() < 1e-12);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::roots::RootConfig;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cleared_residuals_match_momentum_ratio(ka in 0.0_f64..5.0, kb in -0.5_f64..0.9) {
            let cfg = RootConfig::default();
            let a = newton_scalar(0.0, |a| axial_residual(a, ka), &cfg).unwrap().x;
            let b = newton_scalar(0.0, |b| tangential_residual(b, kb), &cfg).unwrap().x;
            prop_assert!((a / (1.0 - a) - ka).abs() < 1e-8 * (1.0 + ka));
            prop_assert!((b / (1.0 + b) - kb).abs() < 1e-8);
        }
    }
}
