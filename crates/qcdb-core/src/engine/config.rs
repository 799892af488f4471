use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Directory layout of one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// Database root; every stage directory lives directly under it.
    pub root: PathBuf,
    pub raw_model_dir: PathBuf,
    /// Model gjf files and shared control files copied into stage directories.
    pub templates_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl PathsConfig {
    pub fn stage_dir(&self, stage_name: &str) -> PathBuf {
        self.root.join(stage_name)
    }

    pub fn template(&self, file_name: &str) -> PathBuf {
        self.templates_dir.join(file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XtbConfig {
    pub program: String,
    pub method_flag: String,
    pub charge: i32,
    pub uhf: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub program: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Characters stripped from a structure name to obtain its pair base name.
    pub pair_suffix_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    /// Extension of the raw model files (without dot).
    pub raw_extension: String,
    pub xtb: XtbConfig,
    pub scheduler: SchedulerConfig,
    pub dataset: DatasetConfig,
}

impl PipelineConfig {
    pub fn raw_model_path(&self, structure: &str) -> PathBuf {
        self.paths
            .raw_model_dir
            .join(format!("{}.{}", structure, self.raw_extension))
    }
}

pub const DEFAULT_RAW_MODEL_DIR: &str = "rawmodel";
pub const DEFAULT_TEMPLATES_DIR: &str = "utils";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_RAW_EXTENSION: &str = "gjf";
pub const DEFAULT_XTB_PROGRAM: &str = "xtb";
pub const DEFAULT_XTB_METHOD: &str = "--gfn2";
pub const DEFAULT_SCHEDULER_PROGRAM: &str = "qg09";
pub const DEFAULT_PAIR_SUFFIX_LEN: usize = 6;

#[derive(Default)]
pub struct PipelineConfigBuilder {
    root: Option<PathBuf>,
    raw_model_dir: Option<PathBuf>,
    templates_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    raw_extension: Option<String>,
    xtb_program: Option<String>,
    xtb_method: Option<String>,
    charge: Option<i32>,
    uhf: Option<u32>,
    scheduler_program: Option<String>,
    pair_suffix_len: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(mut self, path: PathBuf) -> Self {
        self.root = Some(path);
        self
    }
    /// Relative paths are resolved against the root.
    pub fn raw_model_dir(mut self, path: PathBuf) -> Self {
        self.raw_model_dir = Some(path);
        self
    }
    pub fn templates_dir(mut self, path: PathBuf) -> Self {
        self.templates_dir = Some(path);
        self
    }
    pub fn data_dir(mut self, path: PathBuf) -> Self {
        self.data_dir = Some(path);
        self
    }
    pub fn raw_extension(mut self, ext: impl Into<String>) -> Self {
        self.raw_extension = Some(ext.into());
        self
    }
    pub fn xtb_program(mut self, program: impl Into<String>) -> Self {
        self.xtb_program = Some(program.into());
        self
    }
    pub fn xtb_method(mut self, flag: impl Into<String>) -> Self {
        self.xtb_method = Some(flag.into());
        self
    }
    pub fn charge(mut self, charge: i32) -> Self {
        self.charge = Some(charge);
        self
    }
    pub fn uhf(mut self, uhf: u32) -> Self {
        self.uhf = Some(uhf);
        self
    }
    pub fn scheduler_program(mut self, program: impl Into<String>) -> Self {
        self.scheduler_program = Some(program.into());
        self
    }
    pub fn pair_suffix_len(mut self, len: usize) -> Self {
        self.pair_suffix_len = Some(len);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let root = self.root.ok_or(ConfigError::MissingParameter("root"))?;
        let resolve = |path: Option<PathBuf>, default: &str| -> PathBuf {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        };
        let paths = PathsConfig {
            raw_model_dir: resolve(self.raw_model_dir, DEFAULT_RAW_MODEL_DIR),
            templates_dir: resolve(self.templates_dir, DEFAULT_TEMPLATES_DIR),
            data_dir: resolve(self.data_dir, DEFAULT_DATA_DIR),
            root: root.clone(),
        };

        let raw_extension = self
            .raw_extension
            .unwrap_or_else(|| DEFAULT_RAW_EXTENSION.to_string())
            .trim_start_matches('.')
            .to_string();
        if raw_extension.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "raw_extension",
                reason: "must not be empty".to_string(),
            });
        }

        let xtb = XtbConfig {
            program: self
                .xtb_program
                .unwrap_or_else(|| DEFAULT_XTB_PROGRAM.to_string()),
            method_flag: self
                .xtb_method
                .unwrap_or_else(|| DEFAULT_XTB_METHOD.to_string()),
            charge: self.charge.unwrap_or(0),
            uhf: self.uhf.unwrap_or(0),
        };
        let scheduler = SchedulerConfig {
            program: self
                .scheduler_program
                .unwrap_or_else(|| DEFAULT_SCHEDULER_PROGRAM.to_string()),
        };
        let dataset = DatasetConfig {
            pair_suffix_len: self.pair_suffix_len.unwrap_or(DEFAULT_PAIR_SUFFIX_LEN),
        };

        Ok(PipelineConfig {
            paths,
            raw_extension,
            xtb,
            scheduler,
            dataset,
        })
    }
}

/// Convenience for tests and callers that only know the root.
pub fn default_config(root: &Path) -> PipelineConfig {
    PipelineConfig {
        paths: PathsConfig {
            root: root.to_path_buf(),
            raw_model_dir: root.join(DEFAULT_RAW_MODEL_DIR),
            templates_dir: root.join(DEFAULT_TEMPLATES_DIR),
            data_dir: root.join(DEFAULT_DATA_DIR),
        },
        raw_extension: DEFAULT_RAW_EXTENSION.to_string(),
        xtb: XtbConfig {
            program: DEFAULT_XTB_PROGRAM.to_string(),
            method_flag: DEFAULT_XTB_METHOD.to_string(),
            charge: 0,
            uhf: 0,
        },
        scheduler: SchedulerConfig {
            program: DEFAULT_SCHEDULER_PROGRAM.to_string(),
        },
        dataset: DatasetConfig {
            pair_suffix_len: DEFAULT_PAIR_SUFFIX_LEN,
        },
    }
}
