use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirnyxError {
    #[error("required input not found: {0:?}")]
    MissingInput(PathBuf),

    #[error("no common samples between gene and miRNA expression matrices")]
    NoOverlap,

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("metadata parse error: {0}")]
    Metadata(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MirnyxError>;
