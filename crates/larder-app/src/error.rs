//! Application-level error type shared across the binary and library modules.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::config::AppConfigError;
use crate::ingestion::{ExtractError, FetchError};
use crate::paths::PathError;
use crate::pipeline::BatchError;
use crate::queue::QueueError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    ConfigLoad(#[from] AppConfigError),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Paths(#[from] PathError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read input file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
