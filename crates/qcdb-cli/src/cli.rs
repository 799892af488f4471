use clap::{Args, Parser, Subcommand};
use qcdb::core::extract::descriptor::Descriptor;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "qcdb - stage tracking, job generation and descriptor collection for quantum-chemistry calculation databases.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Options shared by every command that opens a database.
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database root directory. Overrides `paths.root` from the config file.
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S xtb.charge=-1
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the status of one or more stages.
    Status(StatusArgs),
    /// Generate the missing input files of a stage.
    Generate(GenerateArgs),
    /// Run the xtb jobs of a stage whose inputs are complete.
    Run(StageArg),
    /// Submit a Gaussian stage to the batch scheduler.
    Submit(StageArg),
    /// Move finished scheduler output from numbered job directories into place.
    Harvest(StageArg),
    /// Check that every log of a finished Gaussian stage terminated normally.
    Check(StageArg),
    /// Extract descriptors from finished stages into CSV tables.
    Collect(CollectArgs),
    /// Run a composite pipeline step.
    Pipeline(PipelineArgs),
}

#[derive(Args, Debug)]
pub struct StageArg {
    /// Stage name, e.g. `xtb-mod` or `DFT-mod-gau-sp`.
    #[arg(required = true, value_name = "STAGE")]
    pub stage: String,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Stages to inspect. All stages are reported when omitted.
    #[arg(value_name = "STAGE")]
    pub stages: Vec<String>,

    /// List the structures that are missing inputs or outputs.
    #[arg(short, long)]
    pub list: bool,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(required = true, value_name = "STAGE")]
    pub stage: String,

    /// Regenerate the inputs of every structure, even existing ones.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Stage to collect from. Can be repeated. Defaults to every finished stage.
    #[arg(short, long = "stage", value_name = "STAGE")]
    pub stages: Vec<String>,

    /// Descriptor to extract (SPE, Grad, Gap, EHOMO, ELUMO, ForceRMS,
    /// ForceMax, G, Gcorr, charge, wbo). Can be repeated.
    #[arg(short, long = "descriptor", value_name = "NAME")]
    pub descriptors: Vec<Descriptor>,

    /// Atom index for per-atom descriptors. Can be repeated.
    #[arg(short, long = "atom", value_name = "INDEX")]
    pub atoms: Vec<usize>,

    /// Atom pair for per-bond descriptors, written `A-B`. Can be repeated.
    #[arg(short, long = "bond", value_name = "A-B", value_parser = parse_bond)]
    pub bonds: Vec<(usize, usize)>,

    /// Path of the per-structure table. Defaults to `<data-dir>/data.csv`.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Also write the major/minor pair table.
    #[arg(short, long)]
    pub pair: bool,

    /// Path of the pair table. Defaults to `<data-dir>/pair_data.csv`.
    #[arg(long, value_name = "PATH", requires = "pair")]
    pub pair_output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    #[command(subcommand)]
    pub command: PipelineCommands,
}

#[derive(Subcommand, Debug)]
pub enum PipelineCommands {
    /// Generate the inputs of every stage fed directly by the raw models.
    FirstStep,
    /// Generate and run both xtb optimizations and their single points.
    XtbChain,
}

pub fn parse_bond(s: &str) -> Result<(usize, usize), String> {
    let (a, b) = s
        .split_once('-')
        .ok_or_else(|| format!("Invalid bond '{}'. Expected A-B.", s))?;
    let parse = |t: &str| {
        t.trim()
            .parse::<usize>()
            .map_err(|_| format!("Invalid atom index '{}' in bond '{}'", t, s))
    };
    Ok((parse(a)?, parse(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bond_accepts_dash_separated_indices() {
        assert_eq!(parse_bond("3-7"), Ok((3, 7)));
        assert_eq!(parse_bond(" 1 - 2 "), Ok((1, 2)));
    }

    #[test]
    fn parse_bond_rejects_malformed_input() {
        assert!(parse_bond("3").is_err());
        assert!(parse_bond("a-2").is_err());
        assert!(parse_bond("1-").is_err());
    }

    #[test]
    fn collect_arguments_parse() {
        let cli = Cli::parse_from([
            "qcdb", "-r", "/db", "collect", "-s", "xtb-mod", "-d", "SPE", "-d", "charge", "-a",
            "5", "-b", "1-2", "--pair",
        ]);
        assert_eq!(cli.database.root, Some(PathBuf::from("/db")));
        let Commands::Collect(args) = cli.command else {
            panic!("Expected 'collect' subcommand");
        };
        assert_eq!(args.stages, vec!["xtb-mod"]);
        assert_eq!(args.descriptors, vec![Descriptor::Spe, Descriptor::Charge]);
        assert_eq!(args.atoms, vec![5]);
        assert_eq!(args.bonds, vec![(1, 2)]);
        assert!(args.pair);
        assert!(args.pair_output.is_none());
    }

    #[test]
    fn unknown_descriptor_is_rejected() {
        let result = Cli::try_parse_from(["qcdb", "collect", "-d", "energy"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_options_follow_subcommands() {
        let cli = Cli::parse_from([
            "qcdb", "generate", "xtb-mod", "--force", "-vv", "-S", "xtb.charge=-1",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.database.set_values, vec!["xtb.charge=-1"]);
        let Commands::Generate(args) = cli.command else {
            panic!("Expected 'generate' subcommand");
        };
        assert_eq!(args.stage, "xtb-mod");
        assert!(args.force);
    }

    #[test]
    fn pipeline_subcommands_parse() {
        let cli = Cli::parse_from(["qcdb", "pipeline", "xtb-chain"]);
        assert!(matches!(
            cli.command,
            Commands::Pipeline(PipelineArgs {
                command: PipelineCommands::XtbChain
            })
        ));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["qcdb", "-q", "-v", "status"]).is_err());
    }
}
