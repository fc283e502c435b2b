//! Error types for af-pipeline
//!
//! Only configuration problems escape [`Pipeline::run`]; every step failure is
//! captured into the report instead.
//!
//! [`Pipeline::run`]: crate::pipeline::Pipeline::run

use af_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline configuration errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: Project root does not exist or is not a directory
    #[error("[P001] Project directory not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// P002: An exclusion glob failed to compile
    #[error("[P002] Invalid exclusion pattern '{pattern}': {message}")]
    InvalidExcludePattern { pattern: String, message: String },

    /// P003: Fetch parameters are unusable (bad address)
    #[error("[P003] Invalid fetch request: {message}")]
    InvalidFetchRequest { message: String },

    /// P004: Any other configuration problem
    #[error("[P004] Invalid configuration: {0}")]
    Config(CoreError),
}

impl From<CoreError> for PipelineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProjectNotFound { path } => PipelineError::ProjectNotFound {
                path: PathBuf::from(path),
            },
            CoreError::InvalidExcludePattern { pattern, message } => {
                PipelineError::InvalidExcludePattern { pattern, message }
            }
            other => PipelineError::Config(other),
        }
    }
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
