//! Run execution and caching service.
//!
//! A run designs the blade, extends the measured polars to the full circle
//! and evaluates the designed rotor at every requested tip speed ratio. Runs
//! are keyed by a hash of their inputs and reused from the project's run
//! store unless caching is disabled.

use std::path::Path;
use std::time::Instant;

use bemt_hydro::{PolarExtrapolator, ViternaExtrapolator, flat_plate_cd_max};
use bemt_project::schema::Project;
use bemt_results::{
    DesignRecord, EfficiencyCurveRecord, EvaluatedStationRecord, EvaluationRecord, RunArtifacts,
    RunManifest, RunStore, StationFailureRecord, compute_run_id,
};
use bemt_solver::{
    ChordTwistDesigner, DesignReport, EvaluationReport, PerformanceEvaluator, RotorGeometry,
};
use tracing::{info, warn};
use uom::si::force::newton;
use uom::si::power::watt;

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};
use crate::project_service;

/// Options for running a design and evaluation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub solver_version: String,
    /// Replaces the project's evaluation tip speed ratios when set
    pub tip_speed_ratios: Option<Vec<f64>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            solver_version: "0.1.0".to_string(),
            tip_speed_ratios: None,
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub project_path: &'a Path,
    pub options: RunOptions,
}

/// Concise timing summary for a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub design_time_s: f64,
    pub extrapolation_time_s: f64,
    pub evaluation_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    /// Every station converged at every tip speed ratio
    pub all_resolved: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    tip_speed_ratio: Option<f64>,
    completed: Option<(usize, usize)>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        let mut event =
            RunProgressEvent::stage(stage, started.elapsed().as_secs_f64(), message);
        event.tip_speed_ratio = tip_speed_ratio;
        event.completed = completed;
        cb(event);
    }
}

/// Execute a run or load it from the cache.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute a run or load it from the cache, reporting progress.
///
/// # Errors
/// [`AppError::UnresolvedStations`] when a station cannot be designed; no
/// run is stored in that case. Evaluation failures are stored with the run
/// and flagged through [`RunResponse::all_resolved`].
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingProject,
        started,
        None,
        None,
        None,
    );
    let project = project_service::load_project(request.project_path)?;
    let tip_speed_ratios = match &request.options.tip_speed_ratios {
        Some(tsrs) => tsrs.clone(),
        None => project.evaluation_tip_speed_ratios(),
    };
    if tip_speed_ratios.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one tip speed ratio is required".to_string(),
        ));
    }
    if let Some(bad) = tip_speed_ratios
        .iter()
        .find(|tsr| !(tsr.is_finite() && **tsr > 0.0))
    {
        return Err(AppError::InvalidInput(format!(
            "Tip speed ratio must be positive, got {bad}"
        )));
    }

    let run_id = compute_run_id(
        &project,
        &tip_speed_ratios,
        &request.options.solver_version,
    );
    let store = RunStore::for_project(request.project_path)?;

    emit_progress(
        &mut progress_cb,
        RunStage::CheckingCache,
        started,
        None,
        None,
        None,
    );
    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            None,
            None,
            None,
        );

        let mut timing = RunTimingSummary::default();
        let load_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        let evaluations = store.load_evaluations(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
            None,
            None,
        );
        info!(run_id = %run_id, "loaded cached run");

        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            all_resolved: evaluations.iter().all(|e| e.failures.is_empty()),
            timing,
        });
    }

    let mut timing = RunTimingSummary::default();
    let artifacts = execute_run(
        &project,
        &tip_speed_ratios,
        &mut progress_cb,
        started,
        &mut timing,
    )?;
    let all_resolved = artifacts.evaluations.iter().all(|e| e.failures.is_empty());

    emit_progress(
        &mut progress_cb,
        RunStage::SavingResults,
        started,
        None,
        None,
        None,
    );
    let save_started = Instant::now();
    let manifest = RunManifest {
        run_id: run_id.clone(),
        project_name: project.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: request.options.solver_version.clone(),
        station_count: artifacts.design.len(),
        tip_speed_ratios,
    };
    store.save_run(&manifest, &artifacts)?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
        None,
        None,
    );
    info!(
        run_id = %run_id,
        all_resolved,
        total_s = timing.total_time_s,
        "run completed"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        all_resolved,
        timing,
    })
}

fn execute_run(
    project: &Project,
    tip_speed_ratios: &[f64],
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    timing: &mut RunTimingSummary,
) -> AppResult<RunArtifacts> {
    let station_count = project.operative_state.no_design_points;

    emit_progress(
        progress_cb,
        RunStage::Designing,
        started,
        None,
        None,
        Some((0, station_count)),
    );
    let design_started = Instant::now();
    let report = design_project(project)?;
    timing.design_time_s = design_started.elapsed().as_secs_f64();
    let geometry = resolved_geometry(&report)?;

    emit_progress(
        progress_cb,
        RunStage::Extrapolating,
        started,
        None,
        None,
        Some((0, station_count)),
    );
    let extrapolation_started = Instant::now();
    let extended = extended_polars(project)?;
    timing.extrapolation_time_s = extrapolation_started.elapsed().as_secs_f64();

    let config = project_service::solver_config(project)?;
    let state = project_service::operative_state(project);
    let fluid = project_service::fluid_properties(project)?;
    let evaluator = PerformanceEvaluator::new(config, project.evaluation.interpolation_range);

    let evaluation_started = Instant::now();
    let mut evaluations = Vec::with_capacity(tip_speed_ratios.len());
    for (i, &tsr) in tip_speed_ratios.iter().enumerate() {
        emit_progress(
            progress_cb,
            RunStage::Evaluating,
            started,
            None,
            Some(tsr),
            Some((i, tip_speed_ratios.len())),
        );
        let evaluation = evaluator.evaluate(&geometry, &extended, &state, &fluid, tsr)?;
        if !evaluation.all_resolved() {
            warn!(
                tsr,
                failed = evaluation.failures.len(),
                "evaluation left stations unresolved"
            );
        }
        evaluations.push(evaluation_record(&evaluation));
    }
    timing.evaluation_time_s = evaluation_started.elapsed().as_secs_f64();

    Ok(RunArtifacts {
        design: design_records(&report),
        efficiency: efficiency_records(&report),
        evaluations,
    })
}

/// Design chord and twist for every station of `project`.
///
/// Station failures stay inside the report.
pub fn design_project(project: &Project) -> AppResult<DesignReport> {
    let stations = project_service::build_design_stations(project)?;
    let config = project_service::solver_config(project)?;
    let state = project_service::operative_state(project);
    let fluid = project_service::fluid_properties(project)?;

    Ok(ChordTwistDesigner::new(config).design(&stations, &state, &fluid)?)
}

fn resolved_geometry(report: &DesignReport) -> AppResult<RotorGeometry> {
    if !report.all_resolved() {
        let stations = report
            .failures()
            .map(|(id, err)| format!("{id}: {err}"))
            .collect();
        return Err(AppError::UnresolvedStations { stations });
    }
    report.geometry().ok_or_else(|| AppError::UnresolvedStations {
        stations: Vec::new(),
    })
}

/// Measured polars extended to [-180°, 180°] with the project's settings.
fn extended_polars(project: &Project) -> AppResult<Vec<bemt_hydro::Polar>> {
    let settings = &project.evaluation.extrapolation;
    let extrapolator = ViternaExtrapolator {
        nalpha: settings.nalpha,
        ..ViternaExtrapolator::default()
    };
    let cd_max = settings
        .cd_max
        .unwrap_or_else(|| flat_plate_cd_max(settings.aspect_ratio));

    project_service::hydrofoil_polars(project)?
        .into_iter()
        .map(|(id, polar)| {
            extrapolator
                .extrapolate(&polar, settings.aspect_ratio, polar.min_cd(), cd_max)
                .map_err(|e| AppError::Hydro(format!("hydrofoil '{id}': {e}")))
        })
        .collect()
}

/// Persisted form of the designed stations, hub to tip.
pub fn design_records(report: &DesignReport) -> Vec<DesignRecord> {
    report
        .designs()
        .map(|d| DesignRecord {
            station: d.id.index(),
            hydrofoil_id: d.hydrofoil_id.clone(),
            radius_m: d.radius,
            chord_m: d.chord,
            twist_deg: d.twist,
            alpha_opt_deg: d.optimum.alpha,
            cl_opt: d.optimum.cl,
            cd_opt: d.optimum.cd,
            a: d.state.a,
            b: d.state.b,
            phi_deg: d.state.phi,
            tip_loss: d.state.f_tip,
            root_loss: d.state.f_root,
            total_loss: d.state.f_total,
            solidity: d.state.solidity,
            disk_velocity_m_s: d.state.u_disk,
            tangential_velocity_m_s: d.state.u_tang,
            relative_velocity_m_s: d.state.w,
            cx: d.state.cx,
            cy: d.state.cy,
            reynolds: d.reynolds,
            outer_iterations: d.outer_iterations,
            inner_iterations: d.inner_iterations,
        })
        .collect()
}

/// Raw and fitted efficiency curves of the designed stations.
pub fn efficiency_records(report: &DesignReport) -> Vec<EfficiencyCurveRecord> {
    report
        .designs()
        .map(|d| {
            let curve = &d.efficiency_curve;
            EfficiencyCurveRecord {
                station: d.id.index(),
                hydrofoil_id: d.hydrofoil_id.clone(),
                alpha_raw_deg: curve.alpha_raw.clone(),
                efficiency_raw: curve.efficiency_raw.clone(),
                alpha_fit_deg: curve.alpha_fit.clone(),
                efficiency_fit: curve.efficiency_fit.clone(),
                alpha_opt_deg: curve.optimum.alpha,
                efficiency_opt: curve.optimum.efficiency,
            }
        })
        .collect()
}

fn evaluation_record(report: &EvaluationReport) -> EvaluationRecord {
    let performance = report.performance.as_ref();
    EvaluationRecord {
        tip_speed_ratio: report.tip_speed_ratio,
        omega_rad_s: report.omega,
        total_thrust_n: performance.map(|p| p.thrust().get::<newton>()),
        total_power_w: performance.map(|p| p.power().get::<watt>()),
        thrust_coefficient: performance.map(|p| p.thrust_coefficient),
        power_coefficient: performance.map(|p| p.power_coefficient),
        stations: report
            .stations
            .iter()
            .map(|s| EvaluatedStationRecord {
                station: s.id.index(),
                evaluation_index: s.evaluation_index,
                radius_m: s.radius,
                chord_m: s.chord,
                twist_deg: s.twist,
                a: s.state.a,
                b: s.state.b,
                phi_deg: s.state.phi,
                alpha_deg: s.state.alpha,
                cl: s.state.cl,
                cd: s.state.cd,
                total_loss: s.state.f_total,
                relative_velocity_m_s: s.state.w,
            })
            .collect(),
        failures: report
            .failures
            .iter()
            .map(|f| StationFailureRecord {
                station: f.id.index(),
                radius_m: f.radius,
                error: f.error.to_string(),
            })
            .collect(),
    }
}

/// List cached runs for the project, most recent first.
pub fn list_runs(project_path: &Path) -> AppResult<Vec<RunManifest>> {
    let project = project_service::load_project(project_path)?;
    let store = RunStore::for_project(project_path)?;
    Ok(store.list_runs(&project.name)?)
}

/// Load a specific run.
pub fn load_run(project_path: &Path, run_id: &str) -> AppResult<(RunManifest, RunArtifacts)> {
    let store = RunStore::for_project(project_path)?;

    let manifest = store.load_manifest(run_id)?;
    let artifacts = store.load_artifacts(run_id)?;

    Ok((manifest, artifacts))
}
