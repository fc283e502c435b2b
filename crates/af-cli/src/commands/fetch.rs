//! Fetch command implementation

use af_cache::{list_entries, ContractCache, EtherscanProvider};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::{FetchArgs, GlobalArgs};
use crate::commands::common::{load_config, parse_network, project_dir};

/// Execute the fetch command
pub async fn execute(args: &FetchArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let cache_dir = config.cache_dir_absolute(&project_dir(global));

    if args.list {
        return print_entries(&cache_dir);
    }

    let Some(address) = args.address.as_deref() else {
        anyhow::bail!("An address is required unless --list is given");
    };
    let network = parse_network(&args.network)?;
    let provider = EtherscanProvider::from_config(&config.chain)
        .context("Chain data provider is not configured")?;
    let cache = ContractCache::new(cache_dir, Arc::new(provider));

    let cached = cache
        .get(network, address)
        .context("Invalid fetch request")?
        .is_some();
    let entry = cache
        .fetch(network, address)
        .await
        .with_context(|| format!("Failed to fetch {} on {}", address, network))?;

    let meta = entry.metadata();
    println!(
        "{} {} ({}) {}",
        if cached { "Cached" } else { "Fetched" },
        meta.contract_name,
        meta.compiler_version,
        entry.dir().display()
    );
    if global.verbose {
        for file in &meta.files {
            println!("  {}", file);
        }
    }
    Ok(())
}

fn print_entries(cache_dir: &Path) -> Result<()> {
    let entries = list_entries(cache_dir).context("Failed to read the contract cache")?;
    if entries.is_empty() {
        println!("No cached contracts in {}", cache_dir.display());
        return Ok(());
    }
    for meta in entries {
        println!(
            "{:<10} {}  {:<24} {} files  fetched {}",
            meta.network.as_str(),
            meta.address,
            meta.contract_name,
            meta.files.len(),
            meta.fetched_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}
