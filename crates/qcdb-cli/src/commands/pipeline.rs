use super::open_database;
use super::status::render_reports;
use crate::cli::{DatabaseArgs, PipelineArgs, PipelineCommands};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use qcdb::engine::launcher::SystemLauncher;
use qcdb::engine::progress::ProgressReporter;
use qcdb::workflows::pipeline;
use tracing::info;

pub fn run(args: PipelineArgs, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let reports = match args.command {
        PipelineCommands::FirstStep => {
            info!("Preparing every raw-model stage.");
            pipeline::first_step(&ctx, &reporter)?
        }
        PipelineCommands::XtbChain => {
            info!("Driving the xtb optimization and single-point chain.");
            pipeline::xtb_chain(&ctx, &SystemLauncher, &reporter)?
        }
    };

    print!("{}", render_reports(&reports, false));
    Ok(())
}
