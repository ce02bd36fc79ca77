use bemt_app::{
    AppError, AppResult, ExportKind, RunOptions, RunProgressEvent, RunRequest, RunStage,
    RunTimingSummary, project_service, query, run_service,
};
use bemt_results::EvaluationRecord;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "bemt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "BEMT rotor designer - blade sizing and performance evaluation", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// List design stations of a project
    Stations {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Design chord and twist without storing a run
    Design {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Design the blade and evaluate its performance
    Run {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Tip speed ratio to evaluate (repeatable; defaults to the project's list)
        #[arg(long = "tsr")]
        tip_speed_ratios: Vec<f64>,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
    },
    /// List cached runs for a project
    Runs {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
    },
    /// Show details of a cached run
    ShowRun {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Run ID to display
        run_id: String,
    },
    /// Export a table from a run as CSV
    Export {
        /// Path to the project file (YAML or JSON)
        project_path: PathBuf,
        /// Run ID
        run_id: String,
        /// Table to export
        #[arg(value_enum)]
        table: Table,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Design,
    Performance,
    Efficiency,
}

impl From<Table> for ExportKind {
    fn from(table: Table) -> Self {
        match table {
            Table::Design => ExportKind::Design,
            Table::Performance => ExportKind::Performance,
            Table::Efficiency => ExportKind::Efficiency,
        }
    }
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so CSV on stdout stays clean
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Stations { project_path } => cmd_stations(&project_path),
        Commands::Design { project_path } => cmd_design(&project_path),
        Commands::Run {
            project_path,
            tip_speed_ratios,
            no_cache,
        } => cmd_run(&project_path, tip_speed_ratios, !no_cache),
        Commands::Runs { project_path } => cmd_runs(&project_path),
        Commands::ShowRun {
            project_path,
            run_id,
        } => cmd_show_run(&project_path, &run_id),
        Commands::Export {
            project_path,
            run_id,
            table,
            output,
        } => cmd_export(&project_path, &run_id, table.into(), output.as_deref()),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_stations(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let stations = project_service::list_stations(&project)?;

    println!("Design stations of '{}' (hub to tip):", project.name);
    for s in stations {
        let name = s.hydrofoil_name.as_deref().unwrap_or("-");
        println!(
            "  {:>2}  r={:.4} m  {} ({})  Re={:.3e}  {} samples, alpha {:.1}..{:.1} deg",
            s.index,
            s.radius_m,
            s.hydrofoil_id,
            name,
            s.reynolds,
            s.sample_count,
            s.alpha_range_deg.0,
            s.alpha_range_deg.1
        );
    }
    Ok(())
}

fn cmd_design(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    println!("Designing blade for '{}'", project.name);

    let started = Instant::now();
    let report = run_service::design_project(&project)?;
    let elapsed = started.elapsed().as_secs_f64();

    println!(
        "\n  {:>2}  {:>8}  {:>8}  {:>8}  {:>8}  {:>7}  {:>6}  {:>9}",
        "#", "r [m]", "c [m]", "twist", "alpha*", "a", "F", "Re"
    );
    for d in run_service::design_records(&report) {
        println!(
            "  {:>2}  {:>8.4}  {:>8.4}  {:>8.3}  {:>8.3}  {:>7.4}  {:>6.3}  {:>9.3e}",
            d.station,
            d.radius_m,
            d.chord_m,
            d.twist_deg,
            d.alpha_opt_deg,
            d.a,
            d.total_loss,
            d.reynolds
        );
    }
    println!("\nDesign time: {:.3}s", elapsed);

    let failures: Vec<String> = report
        .failures()
        .map(|(id, err)| format!("station {}: {}", id, err))
        .collect();
    if failures.is_empty() {
        println!("✓ All {} stations designed", report.outcomes.len());
        Ok(())
    } else {
        Err(AppError::UnresolvedStations { stations: failures })
    }
}

fn cmd_run(project_path: &Path, tip_speed_ratios: Vec<f64>, use_cache: bool) -> AppResult<()> {
    println!("Running rotor design: {}", project_path.display());

    let request = RunRequest {
        project_path,
        options: RunOptions {
            use_cache,
            tip_speed_ratios: if tip_speed_ratios.is_empty() {
                None
            } else {
                Some(tip_speed_ratios)
            },
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage: Option<RunStage> = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Run completed: {}", response.run_id);
    }

    print_timing_summary(&response.timing);

    let (_manifest, artifacts) = run_service::load_run(project_path, &response.run_id)?;
    print_performance(&artifacts.evaluations);

    if response.all_resolved {
        Ok(())
    } else {
        let stations = artifacts
            .evaluations
            .iter()
            .flat_map(|e| {
                e.failures.iter().map(move |f| {
                    format!("tsr {}: station {}: {}", e.tip_speed_ratio, f.station, f.error)
                })
            })
            .collect();
        Err(AppError::UnresolvedStations { stations })
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let spinner = ['|', '/', '-', '\\'];
    let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
    let mut line = format!(
        "\r{} {}  elapsed={:.2}s",
        spinner[spin_idx],
        event.stage.label(),
        event.elapsed_wall_s
    );
    if let Some(tsr) = event.tip_speed_ratio {
        line.push_str(&format!("  tsr={}", tsr));
    }
    if let Some((done, total)) = event.completed {
        line.push_str(&format!("  [{}/{}]", done, total));
    }
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_timing_summary(timing: &RunTimingSummary) {
    println!("\nTiming summary:");
    if timing.load_cache_time_s > 0.0 {
        println!("  Cache load: {:.3}s", timing.load_cache_time_s);
    } else {
        let total = timing.total_time_s.max(1.0e-12);
        for (label, t) in [
            ("Design:     ", timing.design_time_s),
            ("Polars:     ", timing.extrapolation_time_s),
            ("Evaluation: ", timing.evaluation_time_s),
            ("Save:       ", timing.save_time_s),
        ] {
            println!("  {}{:.3}s ({:.1}%)", label, t, 100.0 * t / total);
        }
    }
    println!("  Total:      {:.3}s", timing.total_time_s);
}

fn print_performance(evaluations: &[EvaluationRecord]) {
    println!("\nPerformance:");
    for e in evaluations {
        match (e.total_thrust_n, e.total_power_w, e.power_coefficient) {
            (Some(thrust), Some(power), Some(cp)) => println!(
                "  tsr={:<5} T={:>10.2} N  P={:>10.2} W  Ct={:.4}  Cp={:.4}",
                e.tip_speed_ratio,
                thrust,
                power,
                e.thrust_coefficient.unwrap_or(f64::NAN),
                cp
            ),
            _ => println!(
                "  tsr={:<5} unresolved ({} station(s) failed)",
                e.tip_speed_ratio,
                e.failures.len()
            ),
        }
    }
}

fn cmd_runs(project_path: &Path) -> AppResult<()> {
    let runs = run_service::list_runs(project_path)?;

    if runs.is_empty() {
        println!("No cached runs found for: {}", project_path.display());
    } else {
        println!("Cached runs:");
        for manifest in runs {
            println!(
                "  {} ({}, tsr {:?})",
                manifest.run_id, manifest.timestamp, manifest.tip_speed_ratios
            );
        }
    }
    Ok(())
}

fn cmd_show_run(project_path: &Path, run_id: &str) -> AppResult<()> {
    println!("Loading run: {}", run_id);

    let (manifest, artifacts) = run_service::load_run(project_path, run_id)?;
    let summary = query::get_run_summary(&artifacts)?;

    println!("\nRun Summary:");
    println!("  Project: {}", manifest.project_name);
    println!("  Created: {}", manifest.timestamp);
    println!("  Solver version: {}", manifest.solver_version);
    println!("  Stations: {}", summary.station_count);
    println!(
        "  Radius: {:.4} - {:.4} m",
        summary.radius_range_m.0, summary.radius_range_m.1
    );
    println!(
        "  Chord: {:.4} - {:.4} m",
        summary.chord_range_m.0, summary.chord_range_m.1
    );
    println!(
        "  Twist: {:.3} - {:.3} deg",
        summary.twist_range_deg.0, summary.twist_range_deg.1
    );
    println!(
        "  Evaluations: {} ({} unresolved)",
        summary.evaluation_count, summary.unresolved_evaluations
    );
    if let Some((tsr, cp)) = summary.peak_power_coefficient {
        println!("  Peak Cp: {:.4} at tsr {}", cp, tsr);
    }

    print_performance(&artifacts.evaluations);
    Ok(())
}

fn cmd_export(
    project_path: &Path,
    run_id: &str,
    kind: ExportKind,
    output: Option<&Path>,
) -> AppResult<()> {
    let (_manifest, artifacts) = run_service::load_run(project_path, run_id)?;
    let csv = query::export_csv(&artifacts, kind);

    if let Some(path) = output {
        std::fs::write(path, &csv)?;
        println!(
            "✓ Exported {} rows to {}",
            csv.lines().count().saturating_sub(1),
            path.display()
        );
    } else {
        print!("{}", csv);
    }
    Ok(())
}
