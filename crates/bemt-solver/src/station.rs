//! Operating point, design stations and blade geometry.

use crate::error::{SolverError, SolverResult};
use crate::induction::{BladeElement, BladeElementIterationState};
use bemt_core::units::{AngularVelocity, Length, Velocity, m, mps, rad_per_s};
use bemt_core::{StationId, linspace};
use bemt_hydro::Polar;

/// Rotor operating point and station layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OperativeState {
    /// Free-stream velocity U∞ (m/s)
    pub optimal_speed: f64,
    /// Blade tip radius R (m)
    pub blade_radius: f64,
    pub blade_count: u32,
    /// Hub radius as a fraction of R
    pub hub_fraction: f64,
    /// Innermost station as a fraction of R
    pub initial_fraction: f64,
    /// Outermost station as a fraction of R (before tip clearance)
    pub final_fraction: f64,
    pub design_points: usize,
    /// Design tip speed ratio λ
    pub tip_speed_ratio: f64,
}

impl OperativeState {
    pub fn validate(&self) -> SolverResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.optimal_speed) {
            return Err(SolverError::InvalidArg {
                what: "free-stream velocity must be positive",
            });
        }
        if !positive(self.blade_radius) {
            return Err(SolverError::InvalidArg {
                what: "blade radius must be positive",
            });
        }
        if self.blade_count == 0 {
            return Err(SolverError::InvalidArg {
                what: "rotor needs at least one blade",
            });
        }
        if !positive(self.tip_speed_ratio) {
            return Err(SolverError::InvalidArg {
                what: "tip speed ratio must be positive",
            });
        }
        if !(self.hub_fraction.is_finite() && (0.0..1.0).contains(&self.hub_fraction)) {
            return Err(SolverError::InvalidArg {
                what: "hub fraction must lie in [0, 1)",
            });
        }
        if !(self.initial_fraction > self.hub_fraction
            && self.initial_fraction < self.final_fraction
            && self.final_fraction <= 1.0)
        {
            return Err(SolverError::InvalidArg {
                what: "station fractions must satisfy hub < initial < final <= 1",
            });
        }
        if self.design_points < 2 {
            return Err(SolverError::InvalidArg {
                what: "at least two design points are required",
            });
        }
        Ok(())
    }

    pub fn hub_radius(&self) -> f64 {
        self.hub_fraction * self.blade_radius
    }

    /// Rotor speed `Ω = U∞·λ/R` for tip speed ratio `tsr`.
    pub fn omega_at(&self, tsr: f64) -> f64 {
        self.optimal_speed * tsr / self.blade_radius
    }

    /// Rotor speed at the design tip speed ratio.
    pub fn omega(&self) -> f64 {
        self.omega_at(self.tip_speed_ratio)
    }

    /// Design station radii, hub to tip.
    ///
    /// The outermost radius is scaled by `tip_clearance` so it stays inside
    /// the blade tip.
    pub fn station_radii(&self, tip_clearance: f64) -> Vec<f64> {
        let mut radii = linspace(
            self.initial_fraction * self.blade_radius,
            self.final_fraction * self.blade_radius,
            self.design_points,
        );
        if let Some(last) = radii.last_mut() {
            *last *= tip_clearance;
        }
        radii
    }

    /// Blade element at `radius` with `chord`, spinning at `omega`.
    pub fn element(&self, radius: f64, chord: f64, omega: f64) -> BladeElement {
        BladeElement {
            radius,
            hub_radius: self.hub_radius(),
            blade_radius: self.blade_radius,
            blade_count: self.blade_count,
            chord,
            free_stream: self.optimal_speed,
            omega,
        }
    }

    pub fn free_stream(&self) -> Velocity {
        mps(self.optimal_speed)
    }

    pub fn rotor_radius(&self) -> Length {
        m(self.blade_radius)
    }

    pub fn rotor_speed(&self) -> AngularVelocity {
        rad_per_s(self.omega())
    }

    /// Swept disk area πR² (m²).
    pub fn disk_area(&self) -> f64 {
        std::f64::consts::PI * self.blade_radius * self.blade_radius
    }
}

/// Radial station awaiting design.
#[derive(Clone, Debug, PartialEq)]
pub struct DesignStation {
    pub id: StationId,
    pub hydrofoil_id: String,
    /// Radius (m)
    pub radius: f64,
    pub polar: Polar,
}

/// Pair hydrofoils (hub to tip) with the station radii of `state`.
///
/// # Errors
/// [`SolverError::ConfigurationMismatch`] unless exactly one hydrofoil is
/// supplied per design point.
pub fn build_stations(
    state: &OperativeState,
    hydrofoils: Vec<(String, Polar)>,
    tip_clearance: f64,
) -> SolverResult<Vec<DesignStation>> {
    state.validate()?;
    if hydrofoils.len() != state.design_points {
        return Err(SolverError::ConfigurationMismatch {
            expected: state.design_points,
            got: hydrofoils.len(),
        });
    }

    Ok(state
        .station_radii(tip_clearance)
        .into_iter()
        .zip(hydrofoils)
        .enumerate()
        .map(|(i, (radius, (hydrofoil_id, polar)))| DesignStation {
            id: StationId::from_index(i),
            hydrofoil_id,
            radius,
            polar,
        })
        .collect())
}

/// Designed blade section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BladeSection {
    pub id: StationId,
    /// Radius (m)
    pub radius: f64,
    /// Chord (m)
    pub chord: f64,
    /// Twist (deg)
    pub twist: f64,
    /// Induction the section was designed for; seeds evaluation solves
    pub design_induction: BladeElementIterationState,
}

/// Ordered blade geometry, hub to tip.
#[derive(Clone, Debug, PartialEq)]
pub struct RotorGeometry {
    sections: Vec<BladeSection>,
}

impl RotorGeometry {
    /// # Errors
    /// Rejects empty geometry, non-increasing radii and non-positive chords.
    pub fn new(sections: Vec<BladeSection>) -> SolverResult<Self> {
        if sections.is_empty() {
            return Err(SolverError::InvalidArg {
                what: "geometry needs at least one section",
            });
        }
        if sections.windows(2).any(|w| w[0].radius >= w[1].radius) {
            return Err(SolverError::InvalidArg {
                what: "section radii must increase from hub to tip",
            });
        }
        if sections
            .iter()
            .any(|s| !(s.chord.is_finite() && s.chord > 0.0) || !s.twist.is_finite())
        {
            return Err(SolverError::InvalidArg {
                what: "sections need a positive chord and finite twist",
            });
        }
        Ok(Self { sections })
    }

    pub fn sections(&self) -> &[BladeSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
