//! Supported EVM networks

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A chain addressable through the unified Etherscan V2 API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Arbitrum,
    Base,
    Polygon,
    Optimism,
    Bsc,
    Avalanche,
}

impl Network {
    pub const ALL: [Network; 7] = [
        Network::Mainnet,
        Network::Arbitrum,
        Network::Base,
        Network::Polygon,
        Network::Optimism,
        Network::Bsc,
        Network::Avalanche,
    ];

    /// EIP-155 chain id
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Arbitrum => 42161,
            Network::Base => 8453,
            Network::Polygon => 137,
            Network::Optimism => 10,
            Network::Bsc => 56,
            Network::Avalanche => 43114,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Arbitrum => "arbitrum",
            Network::Base => "base",
            Network::Polygon => "polygon",
            Network::Optimism => "optimism",
            Network::Bsc => "bsc",
            Network::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = CacheError;

    fn from_str(s: &str) -> CacheResult<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Network::ALL
            .into_iter()
            .find(|n| n.as_str() == lower)
            .ok_or_else(|| CacheError::UnsupportedNetwork {
                name: s.to_string(),
                supported: Network::ALL
                    .iter()
                    .map(Network::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Validate a contract address and return its lower-cased form
pub fn normalize_address(address: &str) -> CacheResult<String> {
    let trimmed = address.trim();
    let valid = trimmed.len() == 42
        && (trimmed.starts_with("0x") || trimmed.starts_with("0X"))
        && trimmed[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(CacheError::InvalidAddress {
            address: address.to_string(),
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}
