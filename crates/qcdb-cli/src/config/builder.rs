use super::AppConfig;
use super::file::FileConfig;
use crate::cli::DatabaseArgs;
use crate::error::{CliError, Result};
use qcdb::core::models::catalog::StageCatalog;
use qcdb::engine::config::PipelineConfigBuilder;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Merges defaults, the config file, `-S` overrides and CLI flags, in that
/// order of increasing precedence.
pub fn build_config(args: &DatabaseArgs) -> Result<AppConfig> {
    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let file_config = apply_set_values(file_config, &args.set_values)?;

    let paths = file_config.paths.unwrap_or_default();
    let xtb = file_config.xtb.unwrap_or_default();
    let scheduler = file_config.scheduler.unwrap_or_default();
    let dataset = file_config.dataset.unwrap_or_default();

    let root = args
        .root
        .clone()
        .or(paths.root)
        .unwrap_or_else(|| PathBuf::from("."));
    debug!("Database root resolved to {:?}", root);

    let mut builder = PipelineConfigBuilder::new().root(root.clone());
    if let Some(dir) = paths.raw_model_dir {
        builder = builder.raw_model_dir(dir);
    }
    if let Some(dir) = paths.templates_dir {
        builder = builder.templates_dir(dir);
    }
    if let Some(dir) = paths.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(ext) = paths.raw_extension {
        builder = builder.raw_extension(ext);
    }
    if let Some(program) = xtb.program {
        builder = builder.xtb_program(program);
    }
    if let Some(method) = xtb.method {
        builder = builder.xtb_method(method);
    }
    if let Some(charge) = xtb.charge {
        builder = builder.charge(charge);
    }
    if let Some(uhf) = xtb.uhf {
        builder = builder.uhf(uhf);
    }
    if let Some(program) = scheduler.program {
        builder = builder.scheduler_program(program);
    }
    if let Some(len) = dataset.pair_suffix_len {
        builder = builder.pair_suffix_len(len);
    }
    let pipeline = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let catalog = match file_config.stages_file {
        Some(path) => {
            let path = if path.is_absolute() {
                path
            } else {
                root.join(path)
            };
            debug!("Loading stage catalog from {:?}", path);
            StageCatalog::load(&path)?
        }
        None => StageCatalog::standard(),
    };

    Ok(AppConfig { pipeline, catalog })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        let path = || Some(PathBuf::from(value_str));
        match key {
            "stages-file" => config.stages_file = path(),
            "paths.root" => config.paths.get_or_insert_with(Default::default).root = path(),
            "paths.raw-model-dir" => {
                config
                    .paths
                    .get_or_insert_with(Default::default)
                    .raw_model_dir = path()
            }
            "paths.templates-dir" => {
                config
                    .paths
                    .get_or_insert_with(Default::default)
                    .templates_dir = path()
            }
            "paths.data-dir" => {
                config.paths.get_or_insert_with(Default::default).data_dir = path()
            }
            "paths.raw-extension" => {
                config
                    .paths
                    .get_or_insert_with(Default::default)
                    .raw_extension = Some(value_str.to_string())
            }
            "xtb.program" => {
                config.xtb.get_or_insert_with(Default::default).program =
                    Some(value_str.to_string())
            }
            "xtb.method" => {
                config.xtb.get_or_insert_with(Default::default).method =
                    Some(value_str.to_string())
            }
            "xtb.charge" => {
                config.xtb.get_or_insert_with(Default::default).charge =
                    Some(parse_value(key, value_str, "integer")?)
            }
            "xtb.uhf" => {
                config.xtb.get_or_insert_with(Default::default).uhf =
                    Some(parse_value(key, value_str, "non-negative integer")?)
            }
            "scheduler.program" => {
                config.scheduler.get_or_insert_with(Default::default).program =
                    Some(value_str.to_string())
            }
            "dataset.pair-suffix-len" => {
                config
                    .dataset
                    .get_or_insert_with(Default::default)
                    .pair_suffix_len = Some(parse_value(key, value_str, "non-negative integer")?)
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
