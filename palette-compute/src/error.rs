use std::path::PathBuf;

use palette_sort::{RegistryError, SelectError, SortError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid method filter")]
    Filter(#[from] regex::Error),

    #[error("could not start the worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Sort(#[from] SortError),

    #[error(transparent)]
    Select(#[from] SelectError),
}
