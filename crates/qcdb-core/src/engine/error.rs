use thiserror::Error;

use super::config::ConfigError;
use super::launcher::LaunchError;
use crate::core::io::traits::CoordinateError;
use crate::core::models::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Stage catalog error: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Stage '{stage}' is not a {expected} stage")]
    WrongExecution {
        stage: String,
        expected: &'static str,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid template '{path}': {source}")]
    Template {
        path: String,
        source: CoordinateError,
    },

    #[error("External program failed: {source}")]
    Launch {
        #[from]
        source: LaunchError,
    },
}

impl EngineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
