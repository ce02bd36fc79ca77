//! Project schema definitions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fluid: FluidDef,
    pub operative_state: OperativeStateDef,
    /// Hydrofoil polars, one per design station, hub to tip
    #[serde(default)]
    pub hydrofoils: Vec<HydrofoilDef>,
    #[serde(default)]
    pub evaluation: EvaluationDef,
    #[serde(default)]
    pub solver: SolverDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    /// kg/m³
    pub density: f64,
    /// m²/s
    pub kinematic_viscosity: f64,
    /// Pa·s
    pub dynamic_viscosity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperativeStateDef {
    /// Free-stream velocity (m/s)
    pub optimal_speed: f64,
    /// Blade tip radius (m)
    pub blade_radius: f64,
    pub no_blades: u32,
    /// Hub radius as a fraction of blade radius
    pub radius_hub_pctg: f64,
    /// First design station as a fraction of blade radius
    pub initial_point_pctg: f64,
    /// Last design station as a fraction of blade radius
    pub final_point_pctg: f64,
    pub no_design_points: usize,
    pub tip_speed_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HydrofoilDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub reynolds: f64,
    /// Angle of attack samples (deg), strictly increasing
    pub alpha: Vec<f64>,
    pub cl: Vec<f64>,
    pub cd: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationDef {
    /// Tip speed ratios to evaluate; empty means the design value only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tip_speed_ratios: Vec<f64>,
    #[serde(default = "default_interpolation_range")]
    pub interpolation_range: usize,
    #[serde(default)]
    pub extrapolation: ExtrapolationDef,
}

impl Default for EvaluationDef {
    fn default() -> Self {
        Self {
            tip_speed_ratios: Vec::new(),
            interpolation_range: default_interpolation_range(),
            extrapolation: ExtrapolationDef::default(),
        }
    }
}

fn default_interpolation_range() -> usize {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtrapolationDef {
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
    #[serde(default = "default_nalpha")]
    pub nalpha: usize,
    /// Flat-plate drag override; derived from the aspect ratio when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cd_max: Option<f64>,
}

impl Default for ExtrapolationDef {
    fn default() -> Self {
        Self {
            aspect_ratio: default_aspect_ratio(),
            nalpha: default_nalpha(),
            cd_max: None,
        }
    }
}

fn default_aspect_ratio() -> f64 {
    10.0
}

fn default_nalpha() -> usize {
    15
}

/// Optional solver overrides; unset fields keep the solver defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_inner_iterations: Option<usize>,
    /// Starting under-relaxation of the induction update, in (0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relaxation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chord_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_outer_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip_clearance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
}

impl Project {
    /// Tip speed ratios to evaluate, falling back to the design value.
    pub fn evaluation_tip_speed_ratios(&self) -> Vec<f64> {
        if self.evaluation.tip_speed_ratios.is_empty() {
            vec![self.operative_state.tip_speed_ratio]
        } else {
            self.evaluation.tip_speed_ratios.clone()
        }
    }
}
