//! Chain-data provider interface

use crate::network::Network;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured provider failure, mirroring the provider's own `{status, message}`
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("status {status}: {message}")]
pub struct ProviderError {
    pub status: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
        }
    }
}

/// One verified source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFile {
    /// Path as reported by the provider (not yet sanitized)
    pub path: String,
    pub content: String,
}

/// Verified source and compiler settings for a deployed contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSource {
    pub contract_name: String,
    pub compiler_version: String,
    pub optimization_used: bool,
    pub runs: u32,
    pub evm_version: String,
    pub files: Vec<VerifiedFile>,
}

/// Source of verified contract code
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Fetch verified source for `address` on `network`.
    ///
    /// `address` is already validated and lower-cased.
    async fn fetch_source(
        &self,
        network: Network,
        address: &str,
    ) -> Result<VerifiedSource, ProviderError>;
}
