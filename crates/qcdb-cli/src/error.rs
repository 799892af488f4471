use qcdb::core::models::catalog::CatalogError;
use qcdb::engine::error::EngineError;
use qcdb::workflows::dataset::DatasetError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The command ran but its result must be reported as a failure.
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
