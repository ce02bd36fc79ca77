use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use bemt_results::{
    DesignRecord, EfficiencyCurveRecord, EvaluatedStationRecord, EvaluationRecord, ResultsError,
    RunArtifacts, RunManifest, RunStore, StationFailureRecord,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn manifest(run_id: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        project_name: "demo".to_string(),
        timestamp: timestamp.to_string(),
        solver_version: "0.1.0".to_string(),
        station_count: 1,
        tip_speed_ratios: vec![4.0, 5.0],
    }
}

fn artifacts() -> RunArtifacts {
    RunArtifacts {
        design: vec![DesignRecord {
            station: 0,
            hydrofoil_id: "h1".to_string(),
            radius_m: 0.4,
            chord_m: 0.061,
            twist_deg: 6.2,
            alpha_opt_deg: 3.1,
            cl_opt: 0.70,
            cd_opt: 0.012,
            a: 0.334,
            b: 0.012,
            phi_deg: 9.3,
            tip_loss: 0.93,
            root_loss: 1.0,
            total_loss: 0.93,
            solidity: 0.073,
            disk_velocity_m_s: 1.0,
            tangential_velocity_m_s: 6.07,
            relative_velocity_m_s: 6.15,
            cx: 0.69,
            cy: 0.10,
            reynolds: 3.6e5,
            outer_iterations: 5600,
            inner_iterations: 5700,
        }],
        efficiency: vec![EfficiencyCurveRecord {
            station: 0,
            hydrofoil_id: "h1".to_string(),
            alpha_raw_deg: vec![0.0, 5.0],
            efficiency_raw: vec![40.0, 45.0],
            alpha_fit_deg: vec![0.0, 2.5, 5.0],
            efficiency_fit: vec![40.0, 47.0, 45.0],
            alpha_opt_deg: 2.5,
            efficiency_opt: 47.0,
        }],
        evaluations: vec![
            EvaluationRecord {
                tip_speed_ratio: 5.0,
                omega_rad_s: 15.0,
                total_thrust_n: Some(520.0),
                total_power_w: Some(610.0),
                thrust_coefficient: Some(0.6),
                power_coefficient: Some(0.45),
                stations: vec![EvaluatedStationRecord {
                    station: 0,
                    evaluation_index: 0,
                    radius_m: 0.4,
                    chord_m: 0.061,
                    twist_deg: 6.2,
                    a: 0.33,
                    b: 0.012,
                    phi_deg: 9.3,
                    alpha_deg: 3.1,
                    cl: 0.70,
                    cd: 0.012,
                    total_loss: 0.93,
                    relative_velocity_m_s: 6.15,
                }],
                failures: Vec::new(),
            },
            EvaluationRecord {
                tip_speed_ratio: 4.0,
                omega_rad_s: 12.0,
                total_thrust_n: None,
                total_power_w: None,
                thrust_coefficient: None,
                power_coefficient: None,
                stations: Vec::new(),
                failures: vec![StationFailureRecord {
                    station: 0,
                    radius_m: 0.4,
                    error: "Numerical divergence".to_string(),
                }],
            },
        ],
    }
}

#[test]
fn save_list_load_roundtrip() {
    let project_dir = unique_temp_dir("bemt_results_project");
    fs::create_dir_all(&project_dir).expect("failed to create temp project dir");
    let project_path = project_dir.join("project.yaml");
    fs::write(&project_path, "version: 1\nname: demo\n").expect("failed to write project file");

    let store = RunStore::for_project(&project_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".bemt/runs"));

    let artifacts = artifacts();
    store
        .save_run(&manifest("run-old", "2026-01-01T00:00:00+00:00"), &artifacts)
        .expect("failed to save run");
    store
        .save_run(&manifest("run-new", "2026-03-01T00:00:00+00:00"), &artifacts)
        .expect("failed to save run");

    assert!(store.has_run("run-new"));
    let runs = store.list_runs("demo").expect("failed to list runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, "run-new");
    assert!(store.list_runs("other").unwrap().is_empty());

    let loaded = store
        .load_artifacts("run-old")
        .expect("failed to load artifacts");
    assert_eq!(loaded, artifacts);

    store.delete_run("run-old").unwrap();
    assert!(!store.has_run("run-old"));
}

#[test]
fn missing_run_is_reported() {
    let store = RunStore::new(unique_temp_dir("bemt_results_missing")).unwrap();
    assert!(matches!(
        store.load_manifest("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(matches!(
        store.load_design("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
}
