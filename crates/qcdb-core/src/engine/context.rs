use super::config::PipelineConfig;
use super::error::EngineError;
use crate::core::models::catalog::StageCatalog;
use crate::core::models::stage::Stage;
use crate::core::models::structure::StructureSet;
use std::path::PathBuf;
use tracing::info;

/// Everything the engine needs to reason about one database: where it lives,
/// which stages it has and which structures it contains.
///
/// The structure set is enumerated once, when the context is created.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub catalog: StageCatalog,
    pub structures: StructureSet,
}

impl PipelineContext {
    pub fn new(config: PipelineConfig, catalog: StageCatalog) -> Result<Self, EngineError> {
        let raw_dir = &config.paths.raw_model_dir;
        let structures =
            StructureSet::discover(raw_dir).map_err(|e| EngineError::io(raw_dir, e))?;
        info!(
            structures = structures.len(),
            pairs = structures.len() / 2,
            "Loaded database at {}",
            config.paths.root.display()
        );
        Ok(Self {
            config,
            catalog,
            structures,
        })
    }

    pub fn with_structures(
        config: PipelineConfig,
        catalog: StageCatalog,
        structures: StructureSet,
    ) -> Self {
        Self {
            config,
            catalog,
            structures,
        }
    }

    pub fn stage(&self, name: &str) -> Result<&Stage, EngineError> {
        self.catalog
            .get(name)
            .ok_or_else(|| EngineError::UnknownStage(name.to_string()))
    }

    pub fn stage_dir(&self, stage: &Stage) -> PathBuf {
        self.config.paths.stage_dir(&stage.name)
    }
}
