use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortarixError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Catalogue error: {0}")]
    Catalog(#[from] serde_yaml::Error),

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MortarixError>;
