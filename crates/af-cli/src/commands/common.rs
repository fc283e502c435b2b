//! Shared utilities for CLI commands

use af_cache::Network;
use af_core::Config;
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Environment variable holding the chain explorer API key
pub(crate) const API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors (temp dirs, child processes) run first.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing user-facing to print.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// The project directory from the global args
pub(crate) fn project_dir(global: &GlobalArgs) -> PathBuf {
    PathBuf::from(&global.project_dir)
}

/// Load the config from `--config` or the project directory, then fill the
/// API key from the environment when the file leaves it unset
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::load_from_dir(&project_dir(global)).context("Failed to load config")?,
    };
    apply_api_key(&mut config, std::env::var(API_KEY_ENV).ok());
    Ok(config)
}

fn apply_api_key(config: &mut Config, from_env: Option<String>) {
    if config.chain.api_key.is_none() {
        config.chain.api_key = from_env.filter(|key| !key.trim().is_empty());
    }
}

pub(crate) fn parse_network(name: &str) -> Result<Network> {
    name.parse::<Network>()
        .with_context(|| format!("Invalid --network '{}'", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_fills_missing_api_key() {
        let mut config = Config::default();
        apply_api_key(&mut config, Some("ENVKEY".to_string()));
        assert_eq!(config.chain.api_key.as_deref(), Some("ENVKEY"));
    }

    #[test]
    fn test_configured_api_key_wins() {
        let mut config = Config::default();
        config.chain.api_key = Some("FILEKEY".to_string());
        apply_api_key(&mut config, Some("ENVKEY".to_string()));
        assert_eq!(config.chain.api_key.as_deref(), Some("FILEKEY"));
    }

    #[test]
    fn test_blank_env_key_is_ignored() {
        let mut config = Config::default();
        apply_api_key(&mut config, Some("  ".to_string()));
        assert!(config.chain.api_key.is_none());
    }

    #[test]
    fn test_parse_network() {
        assert_eq!(parse_network("arbitrum").unwrap(), Network::Arbitrum);
        assert!(parse_network("goerli").is_err());
    }
}
