use super::open_database;
use crate::cli::{DatabaseArgs, GenerateArgs, StageArg};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use qcdb::engine::context::PipelineContext;
use qcdb::engine::generator::generate as generate_inputs;
use qcdb::engine::harvest::{check_terminations, harvest as harvest_outputs};
use qcdb::engine::launcher::SystemLauncher;
use qcdb::engine::outcome::{Failure, GenerateOutcome, RunOutcome, TerminationCheck};
use qcdb::engine::progress::ProgressReporter;
use qcdb::engine::runner;
use tracing::info;

pub fn generate(args: GenerateArgs, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let outcome = execute_generate(&ctx, &args.stage, args.force, &reporter)?;
    println!("{}: {}", args.stage, outcome);
    match outcome {
        GenerateOutcome::Generated { failed, .. } if !failed.is_empty() => {
            Err(failures_error(&args.stage, &failed))
        }
        _ => Ok(()),
    }
}

pub fn execute_generate(
    ctx: &PipelineContext,
    stage: &str,
    force: bool,
    reporter: &ProgressReporter,
) -> Result<GenerateOutcome> {
    info!("Generating inputs for stage '{}' (force: {})", stage, force);
    Ok(generate_inputs(ctx, ctx.stage(stage)?, force, reporter)?)
}

pub fn run(args: StageArg, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Running xtb jobs for stage '{}'", args.stage);
    let outcome = runner::run(&ctx, ctx.stage(&args.stage)?, &SystemLauncher, &reporter)?;
    println!("{}: {}", args.stage, outcome);
    match outcome {
        RunOutcome::Ran { failed, .. } if !failed.is_empty() => {
            Err(failures_error(&args.stage, &failed))
        }
        _ => Ok(()),
    }
}

pub fn submit(args: StageArg, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;

    info!("Submitting stage '{}' to the scheduler", args.stage);
    let outcome = runner::submit(&ctx, ctx.stage(&args.stage)?, &SystemLauncher)?;
    println!("{}: {}", args.stage, outcome);
    match outcome {
        RunOutcome::Submitted { accepted: false } => Err(CliError::Failed(format!(
            "Scheduler '{}' rejected stage '{}'",
            ctx.config.scheduler.program, args.stage
        ))),
        _ => Ok(()),
    }
}

pub fn harvest(args: StageArg, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let outcome = harvest_outputs(&ctx, ctx.stage(&args.stage)?)?;
    println!("{}: {}", args.stage, outcome);
    Ok(())
}

pub fn check(args: StageArg, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let outcome = check_terminations(&ctx, ctx.stage(&args.stage)?)?;
    println!("{}: {}", args.stage, outcome);
    match outcome {
        TerminationCheck::Abnormal { files } => Err(CliError::Failed(format!(
            "{} log(s) of stage '{}' did not terminate normally",
            files.len(),
            args.stage
        ))),
        _ => Ok(()),
    }
}

fn failures_error(stage: &str, failed: &[Failure]) -> CliError {
    CliError::Failed(format!(
        "{} structure(s) failed in stage '{}'",
        failed.len(),
        stage
    ))
}
