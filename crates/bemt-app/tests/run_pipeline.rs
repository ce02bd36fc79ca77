//! End-to-end runs over the demo project.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bemt_app::{
    AppError, ExportKind, RunOptions, RunProgressEvent, RunRequest, RunStage, ensure_run,
    ensure_run_with_progress, export_csv, get_run_summary, list_runs, load_project, load_run,
    save_project,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

/// Copy the demo project into a fresh directory so runs land in its store.
fn demo_project(prefix: &str) -> PathBuf {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects/tidal_demo.yaml");
    let target = unique_temp_dir(prefix).join("tidal_demo.yaml");
    fs::copy(&source, &target).expect("failed to copy demo project");
    target
}

fn design_point_options(use_cache: bool) -> RunOptions {
    RunOptions {
        use_cache,
        tip_speed_ratios: Some(vec![5.0]),
        ..RunOptions::default()
    }
}

#[test]
fn design_point_run_reports_stages_and_persists() {
    let project_path = demo_project("bemt_app_stages");
    let request = RunRequest {
        project_path: &project_path,
        options: design_point_options(false),
    };

    let mut events: Vec<RunProgressEvent> = Vec::new();
    let response = ensure_run_with_progress(&request, Some(&mut |event| events.push(event)))
        .expect("design point run should succeed");

    assert!(!response.loaded_from_cache);
    assert!(response.all_resolved);
    assert_eq!(response.manifest.station_count, 5);
    assert_eq!(response.manifest.tip_speed_ratios, vec![5.0]);
    assert_eq!(response.manifest.project_name, "tidal demo rotor");

    let stages: Vec<RunStage> = events.iter().map(|e| e.stage).collect();
    for expected in [
        RunStage::LoadingProject,
        RunStage::CheckingCache,
        RunStage::Designing,
        RunStage::Extrapolating,
        RunStage::Evaluating,
        RunStage::SavingResults,
        RunStage::Completed,
    ] {
        assert!(stages.contains(&expected), "missing stage {:?}", expected);
    }
    assert!(!stages.contains(&RunStage::LoadingCachedResult));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert!(
        events
            .iter()
            .any(|e| e.stage == RunStage::Evaluating && e.tip_speed_ratio == Some(5.0))
    );
    assert!(
        events
            .windows(2)
            .all(|w| w[0].elapsed_wall_s <= w[1].elapsed_wall_s)
    );

    let (manifest, artifacts) =
        load_run(&project_path, &response.run_id).expect("run should load");
    assert_eq!(manifest, response.manifest);
    assert_eq!(artifacts.design.len(), 5);
    assert_eq!(artifacts.efficiency.len(), 5);
    assert_eq!(artifacts.evaluations.len(), 1);

    // Every designed station sits on the Betz boundary
    for record in &artifacts.design {
        assert!(record.a >= 1.0 / 3.0 && record.a < 0.36, "a = {}", record.a);
        assert!(record.chord_m > 0.0);
    }
    let radii: Vec<f64> = artifacts.design.iter().map(|d| d.radius_m).collect();
    assert!(radii.windows(2).all(|w| w[0] < w[1]));

    let evaluation = &artifacts.evaluations[0];
    let cp = evaluation.power_coefficient.expect("power coefficient");
    let ct = evaluation.thrust_coefficient.expect("thrust coefficient");
    assert!(cp > 0.0 && cp < 16.0 / 27.0, "Cp = {}", cp);
    assert!(ct > 0.0 && ct < 1.0, "Ct = {}", ct);
    assert!(evaluation.total_power_w.unwrap_or(0.0) > 0.0);

    // Evaluation runs tip to hub
    let first = &evaluation.stations[0];
    assert_eq!(first.evaluation_index, 0);
    assert_eq!(first.station, 4);

    let summary = get_run_summary(&artifacts).expect("summary");
    assert_eq!(summary.station_count, 5);
    assert_eq!(summary.unresolved_evaluations, 0);
    assert_eq!(summary.peak_power_coefficient, Some((5.0, cp)));
}

#[test]
fn second_run_is_served_from_cache() {
    let project_path = demo_project("bemt_app_cache");
    let first = ensure_run(&RunRequest {
        project_path: &project_path,
        options: design_point_options(true),
    })
    .expect("first run");
    assert!(!first.loaded_from_cache);

    let mut stages = Vec::new();
    let second = ensure_run_with_progress(
        &RunRequest {
            project_path: &project_path,
            options: design_point_options(true),
        },
        Some(&mut |event: RunProgressEvent| stages.push(event.stage)),
    )
    .expect("cached run");

    assert!(second.loaded_from_cache);
    assert_eq!(second.run_id, first.run_id);
    assert_eq!(second.manifest, first.manifest);
    assert_eq!(second.all_resolved, first.all_resolved);
    assert!(stages.contains(&RunStage::LoadingCachedResult));
    assert!(!stages.contains(&RunStage::Designing));

    let runs = list_runs(&project_path).expect("list runs");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, first.run_id);
}

#[test]
fn project_sweep_resolves_every_tip_speed_ratio() {
    let project_path = demo_project("bemt_app_project_sweep");
    let response = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    })
    .expect("project sweep run");

    assert!(response.all_resolved);
    assert_eq!(response.manifest.tip_speed_ratios, vec![3.0, 4.0, 5.0, 6.0, 7.0]);

    let (_, artifacts) = load_run(&project_path, &response.run_id).expect("sweep should load");
    assert_eq!(artifacts.evaluations.len(), 5);
    for evaluation in &artifacts.evaluations {
        assert!(
            evaluation.failures.is_empty(),
            "λ = {}: {:?}",
            evaluation.tip_speed_ratio,
            evaluation.failures
        );
        assert_eq!(evaluation.stations.len(), 5);
        assert!(evaluation.power_coefficient.is_some());
        assert!(evaluation.thrust_coefficient.is_some());
    }
    assert_eq!(get_run_summary(&artifacts).expect("summary").unresolved_evaluations, 0);
}

#[test]
fn different_tip_speed_ratios_get_a_new_run() {
    let project_path = demo_project("bemt_app_sweep");
    let design_point = ensure_run(&RunRequest {
        project_path: &project_path,
        options: design_point_options(true),
    })
    .expect("design point run");
    let sweep = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            tip_speed_ratios: Some(vec![4.5, 5.0, 5.5]),
            ..RunOptions::default()
        },
    })
    .expect("sweep run");

    assert_ne!(design_point.run_id, sweep.run_id);
    assert!(!sweep.loaded_from_cache);

    let (_, artifacts) = load_run(&project_path, &sweep.run_id).expect("sweep should load");
    assert_eq!(artifacts.evaluations.len(), 3);
    assert_eq!(list_runs(&project_path).expect("list runs").len(), 2);

    let csv = export_csv(&artifacts, ExportKind::Performance);
    assert_eq!(csv.lines().count(), 1 + 3 * 5);
}

#[test]
fn unreachable_chord_bound_fails_without_storing_a_run() {
    let project_path = demo_project("bemt_app_unresolved");
    let mut project = load_project(&project_path).expect("demo loads");
    // Far below the chord any station needs
    project.solver.max_chord_fraction = Some(0.012);
    save_project(&project_path, &project).expect("save project");

    let result = ensure_run(&RunRequest {
        project_path: &project_path,
        options: design_point_options(false),
    });

    match result {
        Err(AppError::UnresolvedStations { stations }) => assert_eq!(stations.len(), 5),
        other => panic!("expected unresolved stations, got {:?}", other),
    }
    assert!(list_runs(&project_path).expect("list runs").is_empty());
}

#[test]
fn non_positive_tip_speed_ratio_is_rejected() {
    let project_path = demo_project("bemt_app_bad_tsr");
    let result = ensure_run(&RunRequest {
        project_path: &project_path,
        options: RunOptions {
            tip_speed_ratios: Some(vec![5.0, 0.0]),
            ..RunOptions::default()
        },
    });
    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[test]
fn unknown_run_is_reported() {
    let project_path = demo_project("bemt_app_missing");
    let result = load_run(&project_path, "does-not-exist");
    assert!(matches!(result, Err(AppError::RunNotFound(id)) if id == "does-not-exist"));
}
