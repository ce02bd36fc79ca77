//! Working fluid properties.

use crate::error::{HydroError, HydroResult};
use bemt_core::units::{Density, DynVisc, KinVisc, kg_per_m3, m2ps, pa_s};

/// Constant properties of the working fluid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidProperties {
    pub density: Density,
    pub kinematic_viscosity: KinVisc,
    pub dynamic_viscosity: DynVisc,
}

impl FluidProperties {
    /// Create fluid properties from SI values.
    ///
    /// # Errors
    /// Returns error if any property is non-finite or not strictly positive.
    pub fn new(
        density_kg_m3: f64,
        kinematic_viscosity_m2_s: f64,
        dynamic_viscosity_pa_s: f64,
    ) -> HydroResult<Self> {
        if !(density_kg_m3.is_finite() && density_kg_m3 > 0.0) {
            return Err(HydroError::InvalidArg {
                what: "density must be positive",
            });
        }
        if !(kinematic_viscosity_m2_s.is_finite() && kinematic_viscosity_m2_s > 0.0) {
            return Err(HydroError::InvalidArg {
                what: "kinematic viscosity must be positive",
            });
        }
        if !(dynamic_viscosity_pa_s.is_finite() && dynamic_viscosity_pa_s > 0.0) {
            return Err(HydroError::InvalidArg {
                what: "dynamic viscosity must be positive",
            });
        }

        Ok(Self {
            density: kg_per_m3(density_kg_m3),
            kinematic_viscosity: m2ps(kinematic_viscosity_m2_s),
            dynamic_viscosity: pa_s(dynamic_viscosity_pa_s),
        })
    }

    /// Sea water at roughly 15 °C.
    pub fn seawater() -> Self {
        Self {
            density: kg_per_m3(1025.0),
            kinematic_viscosity: m2ps(1.19e-6),
            dynamic_viscosity: pa_s(1.22e-3),
        }
    }

    /// Density in kg/m³.
    pub fn rho(&self) -> f64 {
        self.density.value
    }

    /// Kinematic viscosity in m²/s.
    pub fn nu(&self) -> f64 {
        self.kinematic_viscosity.value
    }

    /// Chord Reynolds number `W·c/ν`.
    pub fn reynolds(&self, relative_speed_m_s: f64, chord_m: f64) -> f64 {
        relative_speed_m_s * chord_m / self.nu()
    }
}
