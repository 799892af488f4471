use super::open_database;
use crate::cli::{CollectArgs, DatabaseArgs};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use qcdb::engine::context::PipelineContext;
use qcdb::engine::progress::ProgressReporter;
use qcdb::workflows::dataset::{CollectRequest, DATA_CSV, DatasetAssembler, PAIR_DATA_CSV};
use std::path::PathBuf;
use tracing::info;

/// Where the tables of one `collect` invocation end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub columns: usize,
    pub data_path: PathBuf,
    pub pair_path: Option<PathBuf>,
}

pub fn run(args: CollectArgs, db: &DatabaseArgs) -> Result<()> {
    let ctx = open_database(db)?;
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = execute(&ctx, args, &reporter)?;

    println!(
        "Wrote {} column(s) for {} structure(s) to {}",
        summary.columns,
        ctx.structures.len(),
        summary.data_path.display()
    );
    if let Some(pair_path) = &summary.pair_path {
        println!("Wrote pair table to {}", pair_path.display());
    }
    Ok(())
}

pub fn execute(
    ctx: &PipelineContext,
    args: CollectArgs,
    reporter: &ProgressReporter,
) -> Result<CollectSummary> {
    let request = CollectRequest {
        stages: args.stages,
        descriptors: args.descriptors,
        atoms: args.atoms,
        bonds: args.bonds,
    };
    info!("Collecting descriptors: {:?}", request);

    let mut assembler = DatasetAssembler::new(ctx);
    assembler.collect(&request, reporter)?;
    let dataset = assembler.into_dataset();

    let data_dir = &ctx.config.paths.data_dir;
    let data_path = args.output.unwrap_or_else(|| data_dir.join(DATA_CSV));
    dataset.write_csv(&data_path)?;

    let pair_path = if args.pair {
        let pairs = dataset.pair(ctx.config.dataset.pair_suffix_len)?;
        let path = args.pair_output.unwrap_or_else(|| data_dir.join(PAIR_DATA_CSV));
        pairs.write_csv(&path)?;
        Some(path)
    } else {
        None
    };

    Ok(CollectSummary {
        columns: dataset.columns().len(),
        data_path,
        pair_path,
    })
}
