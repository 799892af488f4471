use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilePathsConfig {
    pub root: Option<PathBuf>,
    #[serde(rename = "raw-model-dir")]
    pub raw_model_dir: Option<PathBuf>,
    #[serde(rename = "templates-dir")]
    pub templates_dir: Option<PathBuf>,
    #[serde(rename = "data-dir")]
    pub data_dir: Option<PathBuf>,
    #[serde(rename = "raw-extension")]
    pub raw_extension: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileXtbConfig {
    pub program: Option<String>,
    pub method: Option<String>,
    pub charge: Option<i32>,
    pub uhf: Option<u32>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileSchedulerConfig {
    pub program: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileDatasetConfig {
    #[serde(rename = "pair-suffix-len")]
    pub pair_suffix_len: Option<usize>,
}

/// On-disk configuration. Every field is optional; anything left out falls
/// back to the library defaults.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// TOML stage catalog replacing the built-in stages.
    #[serde(rename = "stages-file")]
    pub stages_file: Option<PathBuf>,
    pub paths: Option<FilePathsConfig>,
    pub xtb: Option<FileXtbConfig>,
    pub scheduler: Option<FileSchedulerConfig>,
    pub dataset: Option<FileDatasetConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }
}
