use super::context::PipelineContext;
use super::error::EngineError;
use crate::core::models::stage::Stage;
use crate::core::models::status::StageStatus;
use crate::core::models::structure::Structure;
use tracing::debug;

/// A snapshot of one stage directory as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: String,
    pub status: StageStatus,
    /// Structures lacking an input artifact, in structure order.
    pub missing_inputs: Vec<String>,
    /// Structures lacking an output artifact or an input, in structure order.
    pub missing_outputs: Vec<String>,
    pub missing_shared_files: Vec<String>,
}

/// Derives stage status from the filesystem.
///
/// Nothing is cached: every query rescans the stage directory, so the answer
/// is always the current state of disk and never depends on earlier calls.
pub struct StageTracker<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> StageTracker<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn inspect(&self, stage: &Stage) -> StageReport {
        let dir = self.ctx.stage_dir(stage);
        let all: Vec<&Structure> = self.ctx.structures.iter().collect();
        let names = |list: &[&Structure]| list.iter().map(|s| s.name().to_string()).collect();

        if !dir.is_dir() {
            debug!(stage = %stage.name, "Stage directory absent");
            return StageReport {
                stage: stage.name.clone(),
                status: StageStatus::NoDirectory,
                missing_inputs: names(&all),
                missing_outputs: names(&all),
                missing_shared_files: stage.shared_files.clone(),
            };
        }

        let missing_shared_files: Vec<String> = stage
            .shared_files
            .iter()
            .filter(|f| !dir.join(f).is_file())
            .cloned()
            .collect();

        let mut missing_inputs = Vec::new();
        let mut missing_outputs = Vec::new();
        for structure in &all {
            let has_input = missing_shared_files.is_empty()
                && stage.input_path(&dir, structure).is_file();
            if !has_input {
                missing_inputs.push(*structure);
            }
            let has_outputs = stage
                .output_paths(&dir, structure)
                .iter()
                .all(|p| p.is_file());
            if !has_input || !has_outputs {
                missing_outputs.push(*structure);
            }
        }

        let status = if !missing_inputs.is_empty() || !missing_shared_files.is_empty() {
            StageStatus::DirectoryExists
        } else if !missing_outputs.is_empty() {
            StageStatus::InputsComplete
        } else {
            StageStatus::OutputsComplete
        };
        debug!(
            stage = %stage.name,
            status = status.code(),
            missing_inputs = missing_inputs.len(),
            missing_outputs = missing_outputs.len(),
            "Inspected stage"
        );

        StageReport {
            stage: stage.name.clone(),
            status,
            missing_inputs: names(&missing_inputs),
            missing_outputs: names(&missing_outputs),
            missing_shared_files,
        }
    }

    pub fn status(&self, stage: &Stage) -> StageStatus {
        self.inspect(stage).status
    }

    pub fn missing_inputs(&self, stage: &Stage) -> Vec<String> {
        self.inspect(stage).missing_inputs
    }

    pub fn missing_outputs(&self, stage: &Stage) -> Vec<String> {
        self.inspect(stage).missing_outputs
    }

    pub fn inspect_named(&self, name: &str) -> Result<StageReport, EngineError> {
        Ok(self.inspect(self.ctx.stage(name)?))
    }

    /// Reports for every stage, in catalog order.
    pub fn inspect_all(&self) -> Vec<StageReport> {
        self.ctx
            .catalog
            .stages()
            .iter()
            .map(|s| self.inspect(s))
            .collect()
    }
}
