//! Run storage API.
//!
//! Layout of one run directory:
//!
//! ```text
//! <root>/<run_id>/manifest.json
//!                 design.jsonl
//!                 efficiency.jsonl
//!                 evaluation.jsonl
//! ```

use crate::types::{
    DesignRecord, EfficiencyCurveRecord, EvaluationRecord, RunArtifacts, RunManifest,
};
use crate::{ResultsError, ResultsResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST: &str = "manifest.json";
const DESIGN: &str = "design.jsonl";
const EFFICIENCY: &str = "efficiency.jsonl";
const EVALUATION: &str = "evaluation.jsonl";

#[derive(Clone, Debug)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        fs::create_dir_all(&root_dir)?;
        Ok(Self { root_dir })
    }

    /// Store under `.bemt/runs` next to the project file.
    pub fn for_project(project_path: &Path) -> ResultsResult<Self> {
        let project_dir = project_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "project path has no parent directory".to_string(),
            })?;
        Self::new(project_dir.join(".bemt").join("runs"))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join(MANIFEST).exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, artifacts: &RunArtifacts) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        write_jsonl(&run_dir.join(DESIGN), &artifacts.design)?;
        write_jsonl(&run_dir.join(EFFICIENCY), &artifacts.efficiency)?;
        write_jsonl(&run_dir.join(EVALUATION), &artifacts.evaluations)?;

        // Manifest last: its presence marks a complete run
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join(MANIFEST), manifest_json)?;

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join(MANIFEST);

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_design(&self, run_id: &str) -> ResultsResult<Vec<DesignRecord>> {
        self.load_records(run_id, DESIGN)
    }

    pub fn load_efficiency(&self, run_id: &str) -> ResultsResult<Vec<EfficiencyCurveRecord>> {
        self.load_records(run_id, EFFICIENCY)
    }

    pub fn load_evaluations(&self, run_id: &str) -> ResultsResult<Vec<EvaluationRecord>> {
        self.load_records(run_id, EVALUATION)
    }

    pub fn load_artifacts(&self, run_id: &str) -> ResultsResult<RunArtifacts> {
        Ok(RunArtifacts {
            design: self.load_design(run_id)?,
            efficiency: self.load_efficiency(run_id)?,
            evaluations: self.load_evaluations(run_id)?,
        })
    }

    fn load_records<T: DeserializeOwned>(&self, run_id: &str, file: &str) -> ResultsResult<Vec<T>> {
        let path = self.run_dir(run_id).join(file);

        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        let mut records = Vec::new();
        for line in content.lines() {
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(line)?);
            }
        }
        Ok(records)
    }

    /// Runs recorded for `project_name`, newest first.
    pub fn list_runs(&self, project_name: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let run_id = entry.file_name().to_string_lossy().to_string();
            if let Ok(manifest) = self.load_manifest(&run_id) {
                if manifest.project_name == project_name {
                    runs.push(manifest);
                }
            }
        }

        // RFC 3339 timestamps sort lexicographically
        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> ResultsResult<()> {
    let mut content = String::new();
    for record in records {
        content.push_str(&serde_json::to_string(record)?);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
