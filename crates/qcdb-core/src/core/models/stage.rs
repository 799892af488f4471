use super::structure::Structure;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One per-structure file of a stage, named `<structure>-<suffix><tail>`.
///
/// Gaussian stages keep their logs and checkpoints in `log/` and `fchk/`
/// subdirectories of the stage directory; `subdir` records that.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Artifact {
    pub tail: String,
    #[serde(default)]
    pub subdir: Option<String>,
}

impl Artifact {
    pub fn new(tail: &str) -> Self {
        Self {
            tail: tail.to_string(),
            subdir: None,
        }
    }

    pub fn in_subdir(subdir: &str, tail: &str) -> Self {
        Self {
            tail: tail.to_string(),
            subdir: Some(subdir.to_string()),
        }
    }

    /// Directory holding this artifact for every structure.
    pub fn dir(&self, stage_dir: &Path) -> PathBuf {
        match &self.subdir {
            Some(sub) => stage_dir.join(sub),
            None => stage_dir.to_path_buf(),
        }
    }

    pub fn file_name(&self, structure: &Structure, suffix: &str) -> String {
        structure.artifact_name(suffix, &self.tail)
    }

    pub fn path(&self, stage_dir: &Path, structure: &Structure, suffix: &str) -> PathBuf {
        self.dir(stage_dir).join(self.file_name(structure, suffix))
    }

    /// Extension of the artifact without the dot (`-out.xyz` -> `xyz`).
    pub fn extension(&self) -> Option<&str> {
        self.tail.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Where the inputs of a stage are synthesized from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", deny_unknown_fields)]
pub enum InputSource {
    /// The structure's file in the raw-model directory.
    RawModel,
    /// An output artifact of another stage, which becomes a prerequisite.
    Stage { stage: String, artifact: Artifact },
}

/// The templating rule that turns a source artifact into a stage input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Conversion {
    GjfToGjf,
    GjfToXyz,
    LogToGjf,
    XyzToGjf,
    Copy,
}

impl Conversion {
    pub fn needs_template(self) -> bool {
        matches!(self, Self::GjfToGjf | Self::LogToGjf | Self::XyzToGjf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum XtbJob {
    Opt,
    Sp,
}

/// How the calculations of a stage are carried out.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", deny_unknown_fields)]
pub enum Execution {
    /// xtb run locally, once per structure.
    Xtb {
        job: XtbJob,
        #[serde(default, rename = "control-file")]
        control_file: Option<String>,
    },
    /// One batch submission to the queueing system for the whole directory.
    Scheduler {
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Which program family wrote a stage's outputs, and therefore which parsers
/// apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFlavor {
    Xtb,
    Gaussian,
}

/// A processing step of the pipeline, described entirely as data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Stage {
    pub name: String,
    pub suffix: String,
    pub input: Artifact,
    pub outputs: Vec<Artifact>,
    #[serde(default)]
    pub shared_files: Vec<String>,
    pub source: InputSource,
    pub conversion: Conversion,
    #[serde(default)]
    pub template: Option<String>,
    pub execution: Execution,
}

impl Stage {
    /// The stage that must be complete before inputs of this one can be made.
    pub fn prerequisite(&self) -> Option<&str> {
        match &self.source {
            InputSource::RawModel => None,
            InputSource::Stage { stage, .. } => Some(stage),
        }
    }

    pub fn flavor(&self) -> OutputFlavor {
        match self.execution {
            Execution::Xtb { .. } => OutputFlavor::Xtb,
            Execution::Scheduler { .. } => OutputFlavor::Gaussian,
        }
    }

    pub fn input_path(&self, stage_dir: &Path, structure: &Structure) -> PathBuf {
        self.input.path(stage_dir, structure, &self.suffix)
    }

    pub fn output_paths(&self, stage_dir: &Path, structure: &Structure) -> Vec<PathBuf> {
        self.outputs
            .iter()
            .map(|a| a.path(stage_dir, structure, &self.suffix))
            .collect()
    }

    /// The first output artifact with the given extension (without dot).
    pub fn output_with_extension(&self, extension: &str) -> Option<&Artifact> {
        self.outputs
            .iter()
            .find(|a| a.tail.ends_with(&format!(".{}", extension)) && !a.tail.contains("-out"))
            .or_else(|| self.outputs.iter().find(|a| a.extension() == Some(extension)))
    }

    /// Directory in which the stage's log files live.
    pub fn log_dir(&self, stage_dir: &Path) -> PathBuf {
        self.output_with_extension("log")
            .map_or_else(|| stage_dir.to_path_buf(), |a| a.dir(stage_dir))
    }
}
