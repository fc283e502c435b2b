//! Etherscan V2 chain-data provider
//!
//! One API key covers every supported chain; the chain is selected with the
//! `chainid` query parameter.

use crate::error::{CacheError, CacheResult};
use crate::network::Network;
use crate::provider::{ChainDataProvider, ProviderError, VerifiedFile, VerifiedSource};
use af_core::config::ChainConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Fetches verified source from an Etherscan-compatible explorer API
#[derive(Debug, Clone)]
pub struct EtherscanProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl EtherscanProvider {
    /// Build a provider from chain settings; requires `api_key`
    pub fn from_config(config: &ChainConfig) -> CacheResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CacheError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CacheError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ChainDataProvider for EtherscanProvider {
    async fn fetch_source(
        &self,
        network: Network,
        address: &str,
    ) -> Result<VerifiedSource, ProviderError> {
        log::info!(
            "Fetching {} from {} (chain {})",
            address,
            network,
            network.chain_id()
        );

        let chain_id = network.chain_id().to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::new("request", e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(status.as_u16().to_string(), e.to_string()))?;
        if !status.is_success() {
            return Err(ProviderError::new(
                status.as_u16().to_string(),
                format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
            ));
        }

        parse_source_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SourceRecord {
    #[serde(default)]
    source_code: String,
    #[serde(default)]
    contract_name: String,
    #[serde(default)]
    compiler_version: String,
    #[serde(default)]
    optimization_used: String,
    #[serde(default)]
    runs: String,
    #[serde(default, rename = "EVMVersion")]
    evm_version: String,
}

#[derive(Debug, Deserialize)]
struct StandardJsonInput {
    sources: BTreeMap<String, SourceContent>,
}

#[derive(Debug, Deserialize)]
struct SourceContent {
    content: String,
}

/// Parse a `getsourcecode` response body
pub fn parse_source_response(body: &str) -> Result<VerifiedSource, ProviderError> {
    let response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::new("invalid_response", e.to_string()))?;

    if response.status != "1" {
        let detail = match &response.result {
            serde_json::Value::String(s) if !s.is_empty() => format!("{}: {}", response.message, s),
            _ => response.message.clone(),
        };
        return Err(ProviderError::new(response.status, detail));
    }

    let records: Vec<SourceRecord> = serde_json::from_value(response.result)
        .map_err(|e| ProviderError::new("invalid_response", e.to_string()))?;
    let record = records
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::new("not_found", "empty result set"))?;

    if record.source_code.trim().is_empty() {
        return Err(ProviderError::new(
            "unverified",
            "contract source code not verified",
        ));
    }

    let contract_name = if record.contract_name.is_empty() {
        "Contract".to_string()
    } else {
        record.contract_name
    };
    let files = split_sources(&record.source_code, &contract_name);

    Ok(VerifiedSource {
        contract_name,
        compiler_version: record.compiler_version,
        optimization_used: record.optimization_used.trim() == "1",
        runs: record.runs.trim().parse().unwrap_or(0),
        evm_version: if record.evm_version.is_empty() {
            "unknown".to_string()
        } else {
            record.evm_version
        },
        files,
    })
}

/// Split a `SourceCode` field into files.
///
/// Multi-file sources arrive either as standard-json input wrapped in an
/// extra pair of braces (`{{ ... }}`) or as a bare `{path: {content}}` map.
/// Anything else is a single flattened file named after the contract.
fn split_sources(source_code: &str, contract_name: &str) -> Vec<VerifiedFile> {
    let trimmed = source_code.trim();
    let candidate = if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
        Some(&trimmed[1..trimmed.len() - 1])
    } else if trimmed.starts_with('{') {
        Some(trimmed)
    } else {
        None
    };

    if let Some(json) = candidate {
        if let Ok(input) = serde_json::from_str::<StandardJsonInput>(json) {
            return into_files(input.sources);
        }
        if let Ok(sources) = serde_json::from_str::<BTreeMap<String, SourceContent>>(json) {
            return into_files(sources);
        }
        log::warn!("Multi-file source for {} did not parse; storing as one file", contract_name);
    }

    vec![VerifiedFile {
        path: format!("{}.sol", contract_name),
        content: source_code.to_string(),
    }]
}

fn into_files(sources: BTreeMap<String, SourceContent>) -> Vec<VerifiedFile> {
    sources
        .into_iter()
        .map(|(path, source)| VerifiedFile {
            path,
            content: source.content,
        })
        .collect()
}

#[cfg(test)]
#[path = "etherscan_test.rs"]
mod tests;
