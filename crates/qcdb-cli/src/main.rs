mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("🚀 qcdb CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let db = &cli.database;
    let command_result = match cli.command {
        Commands::Status(args) => {
            info!("Dispatching to 'status' command.");
            commands::status::run(args, db)
        }
        Commands::Generate(args) => {
            info!("Dispatching to 'generate' command.");
            commands::stage::generate(args, db)
        }
        Commands::Run(args) => {
            info!("Dispatching to 'run' command.");
            commands::stage::run(args, db)
        }
        Commands::Submit(args) => {
            info!("Dispatching to 'submit' command.");
            commands::stage::submit(args, db)
        }
        Commands::Harvest(args) => {
            info!("Dispatching to 'harvest' command.");
            commands::stage::harvest(args, db)
        }
        Commands::Check(args) => {
            info!("Dispatching to 'check' command.");
            commands::stage::check(args, db)
        }
        Commands::Collect(args) => {
            info!("Dispatching to 'collect' command.");
            commands::collect::run(args, db)
        }
        Commands::Pipeline(args) => {
            info!("Dispatching to 'pipeline' command.");
            commands::pipeline::run(args, db)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }

    command_result
}
