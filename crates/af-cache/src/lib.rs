//! af-cache - Contract source cache for Auditflow
//!
//! Verified contract sources are fetched once per `(network, address)` and
//! published atomically under the cache directory. Contracts are immutable
//! on-chain, so a published entry is never refreshed.

pub mod cache;
pub mod error;
pub mod etherscan;
pub mod network;
pub mod provider;

pub use cache::{list_entries, CacheEntry, CacheMetadata, ContractCache};
pub use error::{CacheError, CacheResult};
pub use etherscan::EtherscanProvider;
pub use network::{normalize_address, Network};
pub use provider::{ChainDataProvider, ProviderError, VerifiedFile, VerifiedSource};
