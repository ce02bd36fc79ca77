//! Query helpers for extracting data from loaded runs.

use std::borrow::Cow;
use std::fmt::Write as _;

use bemt_core::{Tolerances, nearly_equal};
use bemt_results::{DesignRecord, EfficiencyCurveRecord, EvaluationRecord, RunArtifacts};

use crate::error::{AppError, AppResult};

/// Summary of a run's blade and performance data.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub station_count: usize,
    pub radius_range_m: (f64, f64),
    pub chord_range_m: (f64, f64),
    pub twist_range_deg: (f64, f64),
    pub evaluation_count: usize,
    /// Evaluations where at least one station failed
    pub unresolved_evaluations: usize,
    /// `(tip speed ratio, Cp)` of the best resolved evaluation
    pub peak_power_coefficient: Option<(f64, f64)>,
}

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Get run summary from stored artifacts.
pub fn get_run_summary(artifacts: &RunArtifacts) -> AppResult<RunSummary> {
    let design = &artifacts.design;
    if design.is_empty() {
        return Err(AppError::InvalidInput("No design records in run".to_string()));
    }

    let peak_power_coefficient = artifacts
        .evaluations
        .iter()
        .filter_map(|e| e.power_coefficient.map(|cp| (e.tip_speed_ratio, cp)))
        .fold(None, |best: Option<(f64, f64)>, (tsr, cp)| match best {
            Some((_, best_cp)) if best_cp >= cp => best,
            _ => Some((tsr, cp)),
        });

    Ok(RunSummary {
        station_count: design.len(),
        radius_range_m: range(design.iter().map(|d| d.radius_m)),
        chord_range_m: range(design.iter().map(|d| d.chord_m)),
        twist_range_deg: range(design.iter().map(|d| d.twist_deg)),
        evaluation_count: artifacts.evaluations.len(),
        unresolved_evaluations: artifacts
            .evaluations
            .iter()
            .filter(|e| !e.failures.is_empty())
            .count(),
        peak_power_coefficient,
    })
}

/// Evaluation stored for `tsr`.
pub fn find_evaluation(evaluations: &[EvaluationRecord], tsr: f64) -> AppResult<&EvaluationRecord> {
    evaluations
        .iter()
        .find(|e| nearly_equal(e.tip_speed_ratio, tsr, Tolerances::default()))
        .ok_or_else(|| AppError::InvalidInput(format!("No evaluation at tip speed ratio {tsr}")))
}

/// Table that can be exported from a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// One row per designed station
    Design,
    /// One row per evaluated station and tip speed ratio, plus rotor totals
    Performance,
    /// Raw and fitted lift-to-drag samples per station
    Efficiency,
}

/// Render one table of a run as CSV.
pub fn export_csv(artifacts: &RunArtifacts, kind: ExportKind) -> String {
    match kind {
        ExportKind::Design => design_csv(&artifacts.design),
        ExportKind::Performance => performance_csv(&artifacts.evaluations),
        ExportKind::Efficiency => efficiency_csv(&artifacts.efficiency),
    }
}

/// Quote a text field when it holds a separator, a quote or a line break.
fn text_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn design_csv(records: &[DesignRecord]) -> String {
    let mut csv = String::from(
        "station,hydrofoil_id,radius_m,chord_m,twist_deg,alpha_opt_deg,a,b,phi_deg,\
         total_loss,solidity,disk_velocity_m_s,tangential_velocity_m_s,cx,cy,reynolds\n",
    );
    for d in records {
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            d.station,
            text_field(&d.hydrofoil_id),
            d.radius_m,
            d.chord_m,
            d.twist_deg,
            d.alpha_opt_deg,
            d.a,
            d.b,
            d.phi_deg,
            d.total_loss,
            d.solidity,
            d.disk_velocity_m_s,
            d.tangential_velocity_m_s,
            d.cx,
            d.cy,
            d.reynolds
        );
    }
    csv
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn performance_csv(evaluations: &[EvaluationRecord]) -> String {
    let mut csv = String::from(
        "tip_speed_ratio,omega_rad_s,total_thrust_n,total_power_w,ct,cp,\
         station,radius_m,a,b,phi_deg,alpha_deg,cl,cd,total_loss\n",
    );
    for e in evaluations {
        let totals = format!(
            "{},{},{},{},{},{}",
            e.tip_speed_ratio,
            e.omega_rad_s,
            optional(e.total_thrust_n),
            optional(e.total_power_w),
            optional(e.thrust_coefficient),
            optional(e.power_coefficient)
        );
        // Hub to tip reads naturally in a spreadsheet
        let mut stations: Vec<_> = e.stations.iter().collect();
        stations.sort_by_key(|s| s.station);
        for s in stations {
            let _ = writeln!(
                csv,
                "{},{},{},{},{},{},{},{},{},{}",
                totals,
                s.station,
                s.radius_m,
                s.a,
                s.b,
                s.phi_deg,
                s.alpha_deg,
                s.cl,
                s.cd,
                s.total_loss
            );
        }
    }
    csv
}

fn efficiency_csv(records: &[EfficiencyCurveRecord]) -> String {
    let mut csv = String::from("station,hydrofoil_id,series,alpha_deg,efficiency\n");
    for r in records {
        let hydrofoil_id = text_field(&r.hydrofoil_id);
        let series = [
            ("raw", &r.alpha_raw_deg, &r.efficiency_raw),
            ("fit", &r.alpha_fit_deg, &r.efficiency_fit),
        ];
        for (name, alpha, efficiency) in series {
            for (a, e) in alpha.iter().zip(efficiency.iter()) {
                let _ = writeln!(csv, "{},{},{},{},{}", r.station, hydrofoil_id, name, a, e);
            }
        }
        let _ = writeln!(
            csv,
            "{},{},optimum,{},{}",
            r.station, hydrofoil_id, r.alpha_opt_deg, r.efficiency_opt
        );
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use bemt_results::{EvaluatedStationRecord, StationFailureRecord};

    fn design(station: usize, radius_m: f64, chord_m: f64, twist_deg: f64) -> DesignRecord {
        DesignRecord {
            station,
            hydrofoil_id: format!("h{station}"),
            radius_m,
            chord_m,
            twist_deg,
            alpha_opt_deg: 4.0,
            cl_opt: 0.8,
            cd_opt: 0.012,
            a: 0.334,
            b: 0.01,
            phi_deg: 10.0,
            tip_loss: 0.9,
            root_loss: 1.0,
            total_loss: 0.9,
            solidity: 0.05,
            disk_velocity_m_s: 1.0,
            tangential_velocity_m_s: 6.0,
            relative_velocity_m_s: 6.1,
            cx: 0.2,
            cy: 0.1,
            reynolds: 3.0e5,
            outer_iterations: 10,
            inner_iterations: 40,
        }
    }

    fn station(station: usize, evaluation_index: usize, radius_m: f64) -> EvaluatedStationRecord {
        EvaluatedStationRecord {
            station,
            evaluation_index,
            radius_m,
            chord_m: 0.05,
            twist_deg: 5.0,
            a: 0.3,
            b: 0.01,
            phi_deg: 9.0,
            alpha_deg: 4.0,
            cl: 0.8,
            cd: 0.012,
            total_loss: 0.95,
            relative_velocity_m_s: 6.0,
        }
    }

    fn evaluation(tsr: f64, cp: Option<f64>) -> EvaluationRecord {
        EvaluationRecord {
            tip_speed_ratio: tsr,
            omega_rad_s: tsr * 3.0,
            total_thrust_n: cp.map(|_| 500.0),
            total_power_w: cp.map(|_| 700.0),
            thrust_coefficient: cp.map(|_| 0.8),
            power_coefficient: cp,
            stations: vec![station(1, 0, 0.45), station(0, 1, 0.1)],
            failures: if cp.is_some() {
                Vec::new()
            } else {
                vec![StationFailureRecord {
                    station: 1,
                    radius_m: 0.45,
                    error: "diverged".to_string(),
                }]
            },
        }
    }

    fn artifacts() -> RunArtifacts {
        RunArtifacts {
            design: vec![design(0, 0.1, 0.15, 20.0), design(1, 0.45, 0.04, 2.0)],
            efficiency: vec![EfficiencyCurveRecord {
                station: 0,
                hydrofoil_id: "h0".to_string(),
                alpha_raw_deg: vec![0.0, 5.0],
                efficiency_raw: vec![30.0, 60.0],
                alpha_fit_deg: vec![0.0, 2.5, 5.0],
                efficiency_fit: vec![30.0, 48.0, 60.0],
                alpha_opt_deg: 5.0,
                efficiency_opt: 60.0,
            }],
            evaluations: vec![
                evaluation(4.0, Some(0.41)),
                evaluation(5.0, Some(0.45)),
                evaluation(8.0, None),
            ],
        }
    }

    #[test]
    fn summary_spans_the_blade() {
        let summary = get_run_summary(&artifacts()).unwrap();
        assert_eq!(summary.station_count, 2);
        assert_eq!(summary.radius_range_m, (0.1, 0.45));
        assert_eq!(summary.chord_range_m, (0.04, 0.15));
        assert_eq!(summary.twist_range_deg, (2.0, 20.0));
        assert_eq!(summary.evaluation_count, 3);
        assert_eq!(summary.unresolved_evaluations, 1);
        assert_eq!(summary.peak_power_coefficient, Some((5.0, 0.45)));
    }

    #[test]
    fn empty_run_has_no_summary() {
        assert!(get_run_summary(&RunArtifacts::default()).is_err());
    }

    #[test]
    fn evaluations_are_found_by_tip_speed_ratio() {
        let artifacts = artifacts();
        let found = find_evaluation(&artifacts.evaluations, 5.0).unwrap();
        assert_eq!(found.power_coefficient, Some(0.45));
        assert!(find_evaluation(&artifacts.evaluations, 6.0).is_err());
    }

    #[test]
    fn design_csv_has_one_row_per_station() {
        let csv = export_csv(&artifacts(), ExportKind::Design);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("station,hydrofoil_id,radius_m,chord_m,twist_deg"));
        assert!(lines[1].starts_with("0,h0,0.1,0.15,20,"));
        let columns = lines[0].split(',').count();
        assert!(lines.iter().all(|l| l.split(',').count() == columns));
    }

    #[test]
    fn performance_csv_lists_stations_hub_first() {
        let csv = export_csv(&artifacts(), ExportKind::Performance);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 1 + 3 * 2);
        assert!(lines[1].starts_with("4,12,500,700,0.8,0.41,0,0.1,"));
        assert!(lines[2].starts_with("4,12,500,700,0.8,0.41,1,0.45,"));
        // Unresolved evaluations leave the totals empty
        assert!(lines[5].starts_with("8,24,,,,,0,"));
    }

    #[test]
    fn efficiency_csv_carries_raw_fit_and_optimum() {
        let csv = export_csv(&artifacts(), ExportKind::Efficiency);
        assert_eq!(csv.lines().filter(|l| l.contains(",raw,")).count(), 2);
        assert_eq!(csv.lines().filter(|l| l.contains(",fit,")).count(), 3);
        assert!(csv.lines().any(|l| l == "0,h0,optimum,5,60"));
    }

    #[test]
    fn hydrofoil_ids_with_separators_are_quoted() {
        let mut artifacts = artifacts();
        artifacts.design[0].hydrofoil_id = "h,1".to_string();
        artifacts.design[1].hydrofoil_id = "naca \"4412\"".to_string();
        artifacts.efficiency[0].hydrofoil_id = "h,1".to_string();

        let csv = export_csv(&artifacts, ExportKind::Design);
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("0,\"h,1\",0.1,"));
        assert!(lines[2].starts_with("1,\"naca \"\"4412\"\"\",0.45,"));

        let csv = export_csv(&artifacts, ExportKind::Efficiency);
        assert!(csv.lines().any(|l| l == "0,\"h,1\",optimum,5,60"));
        assert!(csv.lines().skip(1).all(|l| l.starts_with("0,\"h,1\",")));

        assert_eq!(text_field("h0"), "h0");
        assert!(matches!(text_field("h0"), Cow::Borrowed(_)));
    }
}
