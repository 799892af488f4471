use super::stage::{Artifact, Conversion, Execution, InputSource, Stage, XtbJob};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Stage '{0}' is defined more than once")]
    DuplicateStage(String),
    #[error("Stage '{stage}' depends on unknown stage '{prerequisite}'")]
    UnknownPrerequisite { stage: String, prerequisite: String },
    #[error("Stage '{stage}' must be listed after its prerequisite '{prerequisite}'")]
    PrerequisiteOrder { stage: String, prerequisite: String },
    #[error("Stage '{stage}' reads '{tail}' which stage '{prerequisite}' does not produce")]
    UnknownSourceArtifact {
        stage: String,
        prerequisite: String,
        tail: String,
    },
    #[error("Stage '{0}' uses a templated conversion but names no template")]
    MissingTemplate(String),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(rename = "stage", default)]
    stages: Vec<Stage>,
}

/// The ordered list of stages that make up a pipeline.
///
/// Stages are listed so that every prerequisite precedes its dependents, which
/// makes catalog order a valid execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    stages: Vec<Stage>,
}

impl StageCatalog {
    pub fn from_stages(stages: Vec<Stage>) -> Result<Self, CatalogError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let all: HashSet<&str> = stages.iter().map(|s| s.name.as_str()).collect();

        for stage in &stages {
            if !seen.insert(stage.name.as_str()) {
                return Err(CatalogError::DuplicateStage(stage.name.clone()));
            }
            if stage.conversion.needs_template() && stage.template.is_none() {
                return Err(CatalogError::MissingTemplate(stage.name.clone()));
            }
            if let InputSource::Stage {
                stage: prerequisite,
                artifact,
            } = &stage.source
            {
                if !all.contains(prerequisite.as_str()) {
                    return Err(CatalogError::UnknownPrerequisite {
                        stage: stage.name.clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
                if !seen.contains(prerequisite.as_str()) || prerequisite == &stage.name {
                    return Err(CatalogError::PrerequisiteOrder {
                        stage: stage.name.clone(),
                        prerequisite: prerequisite.clone(),
                    });
                }
                let produces = stages
                    .iter()
                    .find(|s| &s.name == prerequisite)
                    .is_some_and(|p| p.outputs.contains(artifact));
                if !produces {
                    return Err(CatalogError::UnknownSourceArtifact {
                        stage: stage.name.clone(),
                        prerequisite: prerequisite.clone(),
                        tail: artifact.tail.clone(),
                    });
                }
            }
        }

        Ok(Self { stages })
    }

    /// Loads a catalog from a TOML file with one `[[stage]]` table per stage.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|e| CatalogError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_stages(file.stages)
    }

    /// The ten stages of the reaction-selectivity database.
    pub fn standard() -> Self {
        let stages = vec![
            gaussian_stage("DFT-mod", "gau", InputSource::RawModel, Conversion::GjfToGjf, "gaumodel.gjf", &[], &["-p", "8", "-a"]),
            xtb_opt_stage("xtb-mod", "xtb", "constrain.inp"),
            xtb_opt_stage("xtb-fixmod", "xtbfix", "fix.inp"),
            gaussian_stage(
                "gauxtb-mod",
                "gauxtb",
                InputSource::RawModel,
                Conversion::GjfToGjf,
                "gauxtbmodel.gjf",
                &["extderi", "genxyz", "xtb.sh"],
                &["-p", "1", "-x", "-a"],
            ),
            gaussian_sp_stage("DFT-mod-gau-sp", "gaugausp", from_stage("DFT-mod", Artifact::in_subdir("log", ".log")), Conversion::LogToGjf),
            gaussian_sp_stage("gauxtb-mod-gau-sp", "gauxtbgausp", from_stage("gauxtb-mod", Artifact::in_subdir("log", ".log")), Conversion::LogToGjf),
            xtb_sp_stage("xtb-mod-xtb-sp", "xtb-sp", "xtb-mod"),
            xtb_sp_stage("xtb-fixmod-xtb-sp", "xtbfix-sp", "xtb-fixmod"),
            gaussian_sp_stage("xtb-mod-gau-sp", "xtbgausp", from_stage("xtb-mod", Artifact::new("-out.xyz")), Conversion::XyzToGjf),
            gaussian_sp_stage("xtb-fixmod-gau-sp", "xtbfixgausp", from_stage("xtb-fixmod", Artifact::new("-out.xyz")), Conversion::XyzToGjf),
        ];
        Self { stages }
    }

    pub fn get(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn from_stage(stage: &str, artifact: Artifact) -> InputSource {
    InputSource::Stage {
        stage: stage.to_string(),
        artifact,
    }
}

fn gaussian_outputs() -> Vec<Artifact> {
    vec![
        Artifact::in_subdir("log", ".log"),
        Artifact::in_subdir("fchk", ".fchk"),
    ]
}

fn gaussian_stage(
    name: &str,
    suffix: &str,
    source: InputSource,
    conversion: Conversion,
    template: &str,
    shared_files: &[&str],
    args: &[&str],
) -> Stage {
    Stage {
        name: name.to_string(),
        suffix: suffix.to_string(),
        input: Artifact::new(".gjf"),
        outputs: gaussian_outputs(),
        shared_files: shared_files.iter().map(|s| s.to_string()).collect(),
        source,
        conversion,
        template: Some(template.to_string()),
        execution: Execution::Scheduler {
            args: args.iter().map(|s| s.to_string()).collect(),
        },
    }
}

fn gaussian_sp_stage(name: &str, suffix: &str, source: InputSource, conversion: Conversion) -> Stage {
    gaussian_stage(name, suffix, source, conversion, "gauspmodel.gjf", &[], &["-p", "8", "-a"])
}

fn xtb_opt_stage(name: &str, suffix: &str, control_file: &str) -> Stage {
    Stage {
        name: name.to_string(),
        suffix: suffix.to_string(),
        input: Artifact::new(".xyz"),
        outputs: vec![
            Artifact::new(".log"),
            Artifact::new("-out.xyz"),
            Artifact::new(".charges"),
            Artifact::new(".wbo"),
        ],
        shared_files: vec![control_file.to_string()],
        source: InputSource::RawModel,
        conversion: Conversion::GjfToXyz,
        template: None,
        execution: Execution::Xtb {
            job: XtbJob::Opt,
            control_file: Some(control_file.to_string()),
        },
    }
}

fn xtb_sp_stage(name: &str, suffix: &str, prerequisite: &str) -> Stage {
    Stage {
        name: name.to_string(),
        suffix: suffix.to_string(),
        input: Artifact::new(".xyz"),
        outputs: vec![
            Artifact::new(".log"),
            Artifact::new(".charges"),
            Artifact::new(".wbo"),
        ],
        shared_files: vec![],
        source: from_stage(prerequisite, Artifact::new("-out.xyz")),
        conversion: Conversion::Copy,
        template: None,
        execution: Execution::Xtb {
            job: XtbJob::Sp,
            control_file: None,
        },
    }
}
