//! Run progress reporting shared by the front ends.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    CheckingCache,
    LoadingCachedResult,
    Designing,
    Extrapolating,
    Evaluating,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingProject => "loading project",
            RunStage::CheckingCache => "checking cache",
            RunStage::LoadingCachedResult => "loading cached result",
            RunStage::Designing => "designing blade",
            RunStage::Extrapolating => "extending polars",
            RunStage::Evaluating => "evaluating",
            RunStage::SavingResults => "saving results",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    /// Tip speed ratio under evaluation
    pub tip_speed_ratio: Option<f64>,
    /// `(done, total)` for the current stage
    pub completed: Option<(usize, usize)>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            tip_speed_ratio: None,
            completed: None,
        }
    }
}
