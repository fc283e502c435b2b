//! Error types for af-cache

use crate::provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Cache and provider errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// K001: Address is not a 20-byte hex string
    #[error("[K001] Invalid contract address '{address}': expected 0x followed by 40 hex digits")]
    InvalidAddress { address: String },

    /// K002: Network name not recognized
    #[error("[K002] Unsupported network '{name}'. Supported: {supported}")]
    UnsupportedNetwork { name: String, supported: String },

    /// K003: Chain-data provider returned an error
    #[error("[K003] Chain data provider error: {0}")]
    Provider(#[from] ProviderError),

    /// K004: No API key configured for the provider
    #[error("[K004] No chain data API key configured (set ETHERSCAN_API_KEY or chain.api_key)")]
    MissingApiKey,

    /// K005: Verified source contained no usable files
    #[error("[K005] Verified source for {address} contains no source files")]
    EmptySource { address: String },

    /// K006: IO error with path context
    #[error("[K006] IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// K007: JSON serialization error
    #[error("[K007] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// K008: HTTP client could not be constructed
    #[error("[K008] HTTP client error: {0}")]
    Http(String),
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for CacheError
pub type CacheResult<T> = Result<T, CacheError>;
