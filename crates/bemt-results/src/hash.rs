//! Content-based hashing for run IDs.

use bemt_project::schema::Project;
use sha2::{Digest, Sha256};

/// Run id from everything that influences the results.
///
/// The project name and description are left out so renaming a project keeps
/// its cached runs.
pub fn compute_run_id(project: &Project, tip_speed_ratios: &[f64], solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let inputs = [
        serde_json::to_string(&project.fluid),
        serde_json::to_string(&project.operative_state),
        serde_json::to_string(&project.hydrofoils),
        serde_json::to_string(&project.evaluation.interpolation_range),
        serde_json::to_string(&project.evaluation.extrapolation),
        serde_json::to_string(&project.solver),
        serde_json::to_string(tip_speed_ratios),
    ];
    for json in inputs {
        hasher.update(json.unwrap_or_default().as_bytes());
        hasher.update(b"\n");
    }

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
