use crate::engine::context::PipelineContext;
use crate::engine::error::EngineError;
use crate::engine::generator::generate;
use crate::engine::launcher::Launcher;
use crate::engine::outcome::{GenerateOutcome, RunOutcome};
use crate::engine::progress::ProgressReporter;
use crate::engine::runner::run;
use crate::engine::tracker::{StageReport, StageTracker};
use tracing::{info, instrument};

/// Stages whose inputs come straight from the raw models.
pub const FIRST_STEP_STAGES: [&str; 4] = ["DFT-mod", "gauxtb-mod", "xtb-mod", "xtb-fixmod"];

pub const XTB_OPT_STAGES: [&str; 2] = ["xtb-mod", "xtb-fixmod"];
pub const XTB_SP_STAGES: [&str; 2] = ["xtb-mod-xtb-sp", "xtb-fixmod-xtb-sp"];

/// Generates the inputs of every raw-model stage, then reports all stages.
#[instrument(skip_all, name = "first_step")]
pub fn first_step(
    ctx: &PipelineContext,
    reporter: &ProgressReporter,
) -> Result<Vec<StageReport>, EngineError> {
    for name in FIRST_STEP_STAGES {
        let outcome = generate(ctx, ctx.stage(name)?, false, reporter)?;
        log_generate(name, &outcome);
    }
    Ok(StageTracker::new(ctx).inspect_all())
}

/// Runs both xtb optimizations and the single points that follow them.
///
/// Each stage is generated and run in turn; a single point whose optimization
/// did not finish for every structure stays pending.
#[instrument(skip_all, name = "xtb_chain")]
pub fn xtb_chain(
    ctx: &PipelineContext,
    launcher: &dyn Launcher,
    reporter: &ProgressReporter,
) -> Result<Vec<StageReport>, EngineError> {
    for name in XTB_OPT_STAGES.into_iter().chain(XTB_SP_STAGES) {
        let stage = ctx.stage(name)?;
        let generated = generate(ctx, stage, false, reporter)?;
        log_generate(name, &generated);
        if matches!(generated, GenerateOutcome::PrerequisitePending { .. }) {
            continue;
        }
        let ran = run(ctx, stage, launcher, reporter)?;
        log_run(name, &ran);
    }
    Ok(StageTracker::new(ctx).inspect_all())
}

fn log_generate(stage: &str, outcome: &GenerateOutcome) {
    info!(stage, "Generate: {}", outcome);
}

fn log_run(stage: &str, outcome: &RunOutcome) {
    info!(stage, "Run: {}", outcome);
}
