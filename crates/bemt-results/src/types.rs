//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub project_name: String,
    /// RFC 3339 creation time
    pub timestamp: String,
    pub solver_version: String,
    pub station_count: usize,
    pub tip_speed_ratios: Vec<f64>,
}

/// Designed station, one JSON line per station in `design.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignRecord {
    pub station: usize,
    pub hydrofoil_id: String,
    pub radius_m: f64,
    pub chord_m: f64,
    pub twist_deg: f64,
    pub alpha_opt_deg: f64,
    pub cl_opt: f64,
    pub cd_opt: f64,
    pub a: f64,
    pub b: f64,
    pub phi_deg: f64,
    pub tip_loss: f64,
    pub root_loss: f64,
    pub total_loss: f64,
    pub solidity: f64,
    pub disk_velocity_m_s: f64,
    pub tangential_velocity_m_s: f64,
    pub relative_velocity_m_s: f64,
    pub cx: f64,
    pub cy: f64,
    pub reynolds: f64,
    pub outer_iterations: usize,
    pub inner_iterations: usize,
}

/// Raw and fitted lift-to-drag curves of one station, for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyCurveRecord {
    pub station: usize,
    pub hydrofoil_id: String,
    pub alpha_raw_deg: Vec<f64>,
    pub efficiency_raw: Vec<f64>,
    pub alpha_fit_deg: Vec<f64>,
    pub efficiency_fit: Vec<f64>,
    pub alpha_opt_deg: f64,
    pub efficiency_opt: f64,
}

/// Evaluation at one tip speed ratio, one JSON line each in `evaluation.jsonl`.
///
/// Totals are absent when any station failed to converge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRecord {
    pub tip_speed_ratio: f64,
    pub omega_rad_s: f64,
    pub total_thrust_n: Option<f64>,
    pub total_power_w: Option<f64>,
    pub thrust_coefficient: Option<f64>,
    pub power_coefficient: Option<f64>,
    /// Stations in evaluation order (tip to hub)
    pub stations: Vec<EvaluatedStationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<StationFailureRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatedStationRecord {
    pub station: usize,
    pub evaluation_index: usize,
    pub radius_m: f64,
    pub chord_m: f64,
    pub twist_deg: f64,
    pub a: f64,
    pub b: f64,
    pub phi_deg: f64,
    pub alpha_deg: f64,
    pub cl: f64,
    pub cd: f64,
    pub total_loss: f64,
    pub relative_velocity_m_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationFailureRecord {
    pub station: usize,
    pub radius_m: f64,
    pub error: String,
}

/// Everything persisted for one run besides the manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunArtifacts {
    pub design: Vec<DesignRecord>,
    pub efficiency: Vec<EfficiencyCurveRecord>,
    pub evaluations: Vec<EvaluationRecord>,
}
