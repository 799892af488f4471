pub mod builder;
pub mod file;

use qcdb::core::models::catalog::StageCatalog;
use qcdb::engine::config::PipelineConfig;

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub catalog: StageCatalog,
}
