//! Chord and twist design.
//!
//! Each station runs at the optimal operating point of its polar. The chord
//! grows from `initial_chord_fraction · R` in steps of `chord_step`; every
//! chord is converged by the induction loop, seeded with the previous chord's
//! state, and the first chord whose axial induction reaches the Betz value
//! (a = 1/3 by default) is the design chord. Twist is `φ − α*` at that chord.

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::induction::{
    BladeElementIterationState, ConvergedBladeElementState, FixedOperatingPoint, InductionSolver,
};
use crate::station::{BladeSection, DesignStation, OperativeState, RotorGeometry};
use bemt_core::StationId;
use bemt_hydro::{EfficiencyCurve, FluidProperties, OptimalOperatingPoint, PolarOptimizer};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Design result of one station.
#[derive(Clone, Debug, PartialEq)]
pub struct StationDesign {
    pub id: StationId,
    pub hydrofoil_id: String,
    /// Radius (m)
    pub radius: f64,
    /// Chord (m)
    pub chord: f64,
    /// Twist (deg)
    pub twist: f64,
    pub optimum: OptimalOperatingPoint,
    /// Converged blade element at the design chord
    pub state: ConvergedBladeElementState,
    /// Local chord Reynolds number `W·c/ν`
    pub reynolds: f64,
    /// Chord increments taken
    pub outer_iterations: usize,
    /// Inner iterations summed over all chords
    pub inner_iterations: usize,
    pub efficiency_curve: EfficiencyCurve,
}

/// Outcome of one station, resolved or not.
#[derive(Clone, Debug, PartialEq)]
pub struct StationOutcome {
    pub id: StationId,
    pub hydrofoil_id: String,
    pub radius: f64,
    pub result: SolverResult<StationDesign>,
}

/// Per-station outcomes in station order.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignReport {
    pub outcomes: Vec<StationOutcome>,
}

impl DesignReport {
    pub fn designs(&self) -> impl Iterator<Item = &StationDesign> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (StationId, &SolverError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.id, e)))
    }

    pub fn all_resolved(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Blade geometry, available only when every station resolved.
    pub fn geometry(&self) -> Option<RotorGeometry> {
        if !self.all_resolved() {
            return None;
        }
        let sections = self
            .designs()
            .map(|d| BladeSection {
                id: d.id,
                radius: d.radius,
                chord: d.chord,
                twist: d.twist,
                design_induction: d.state.iteration_state(),
            })
            .collect();
        RotorGeometry::new(sections).ok()
    }
}

/// Outer chord search driving each station to the Betz induction.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChordTwistDesigner {
    config: SolverConfig,
    optimizer: PolarOptimizer,
}

impl ChordTwistDesigner {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            optimizer: PolarOptimizer::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Design chord and twist of a single station.
    ///
    /// # Errors
    /// - [`SolverError::SingularPolar`] when the polar cannot be optimized
    /// - [`SolverError::NumericalDivergence`] from the induction loop
    /// - [`SolverError::OuterSearchExhaustion`] when the chord bound or the
    ///   iteration cap is hit first
    pub fn design_station(
        &self,
        station: &DesignStation,
        state: &OperativeState,
        fluid: &FluidProperties,
    ) -> SolverResult<StationDesign> {
        let curve = self.optimizer.analyze(&station.polar)?;
        let optimum = curve.optimum;
        let coefficients = FixedOperatingPoint::from(optimum);
        let solver = InductionSolver::new(self.config);

        let start = self.config.initial_chord_fraction * state.blade_radius;
        let max_chord = self.config.max_chord_fraction * state.blade_radius;
        let element = state.element(station.radius, start, state.omega());

        let mut seed = BladeElementIterationState::default();
        let mut inner_iterations = 0;
        let mut last_a = 0.0;

        for outer in 0..self.config.max_outer_iterations {
            let chord = start + outer as f64 * self.config.chord_step;
            if chord > max_chord {
                return Err(SolverError::OuterSearchExhaustion {
                    iterations: outer,
                    chord,
                    axial_induction: last_a,
                });
            }

            let converged = solver.solve(&element.with_chord(chord), &coefficients, seed)?;
            inner_iterations += converged.iterations;

            if converged.a >= self.config.target_axial_induction {
                return Ok(StationDesign {
                    id: station.id,
                    hydrofoil_id: station.hydrofoil_id.clone(),
                    radius: station.radius,
                    chord,
                    twist: converged.twist,
                    optimum,
                    reynolds: fluid.reynolds(converged.w, chord),
                    state: converged,
                    outer_iterations: outer,
                    inner_iterations,
                    efficiency_curve: curve,
                });
            }

            last_a = converged.a;
            seed = converged.iteration_state();
        }

        Err(SolverError::OuterSearchExhaustion {
            iterations: self.config.max_outer_iterations,
            chord: start + self.config.max_outer_iterations as f64 * self.config.chord_step,
            axial_induction: last_a,
        })
    }

    /// Design every station.
    ///
    /// Station failures are recorded in the report and do not stop the other
    /// stations.
    ///
    /// # Errors
    /// [`SolverError::ConfigurationMismatch`] when the station count differs
    /// from `state.design_points`; invalid settings are rejected up front.
    pub fn design(
        &self,
        stations: &[DesignStation],
        state: &OperativeState,
        fluid: &FluidProperties,
    ) -> SolverResult<DesignReport> {
        if stations.len() != state.design_points {
            return Err(SolverError::ConfigurationMismatch {
                expected: state.design_points,
                got: stations.len(),
            });
        }
        state.validate()?;
        self.config.validate()?;

        info!(
            stations = stations.len(),
            parallel = self.config.parallel,
            "designing blade"
        );

        let outcomes: Vec<StationOutcome> = if self.config.parallel {
            stations
                .par_iter()
                .map(|s| self.outcome(s, state, fluid))
                .collect()
        } else {
            stations
                .iter()
                .map(|s| self.outcome(s, state, fluid))
                .collect()
        };

        Ok(DesignReport { outcomes })
    }

    fn outcome(
        &self,
        station: &DesignStation,
        state: &OperativeState,
        fluid: &FluidProperties,
    ) -> StationOutcome {
        let result = self.design_station(station, state, fluid);
        match &result {
            Ok(d) => debug!(
                station = %station.id,
                radius = d.radius,
                chord = d.chord,
                twist = d.twist,
                a = d.state.a,
                outer = d.outer_iterations,
                "station designed"
            ),
            Err(e) => warn!(station = %station.id, radius = station.radius, error = %e, "station failed"),
        }
        StationOutcome {
            id: station.id,
            hydrofoil_id: station.hydrofoil_id.clone(),
            radius: station.radius,
            result,
        }
    }
}
