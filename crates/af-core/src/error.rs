//! Error types for af-core

use thiserror::Error;

/// Core error type for Auditflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: Project directory not found or not a directory
    #[error("[C004] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// C005: Exclusion glob could not be compiled
    #[error("[C005] Invalid exclusion pattern '{pattern}': {message}")]
    InvalidExcludePattern { pattern: String, message: String },

    /// C006: Source file is not valid UTF-8 text
    #[error("[C006] Source file '{path}' is not valid UTF-8")]
    NonUtf8Source { path: String },

    /// C007: IO error
    #[error("[C007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// C008: IO error with file path context
    #[error("[C008] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C009: YAML parse error
    #[error("[C009] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
