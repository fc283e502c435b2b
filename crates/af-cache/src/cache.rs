//! Content-addressed contract source cache
//!
//! An entry lives at `<cache_dir>/<network>_<address>/` and holds
//! `sources/` plus `metadata.json`. Entries are staged in a hidden sibling
//! directory and published with a single directory rename, so readers see a
//! complete entry or none at all. `metadata.json` is written last; an entry
//! without readable metadata is treated as corrupt and never returned.

use crate::error::{CacheError, CacheResult};
use crate::network::{normalize_address, Network};
use crate::provider::{ChainDataProvider, VerifiedSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

const METADATA_FILE: &str = "metadata.json";
const SOURCES_DIR: &str = "sources";

/// Descriptive data stored alongside cached sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub contract_name: String,
    pub compiler_version: String,
    pub optimization_used: bool,
    pub runs: u32,
    pub evm_version: String,
    pub network: Network,
    pub address: String,
    /// Relative path (under `sources/`) of the file declaring the contract
    pub main_file: String,
    /// Every stored file, relative to `sources/`
    pub files: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// A published cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    dir: PathBuf,
    metadata: CacheMetadata,
}

impl CacheEntry {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding the verified source tree
    pub fn sources_dir(&self) -> PathBuf {
        self.dir.join(SOURCES_DIR)
    }

    pub fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }

    pub fn main_file_path(&self) -> PathBuf {
        self.sources_dir().join(&self.metadata.main_file)
    }

    /// Read every stored source file, keyed by relative path
    pub fn read_sources(&self) -> CacheResult<BTreeMap<String, Vec<u8>>> {
        let sources = self.sources_dir();
        self.metadata
            .files
            .iter()
            .map(|rel| {
                let path = sources.join(rel);
                fs::read(&path)
                    .map(|bytes| (rel.clone(), bytes))
                    .map_err(|e| CacheError::io(path, e))
            })
            .collect()
    }
}

/// What is on disk for a key
#[derive(Debug)]
pub(crate) enum EntryState {
    Missing,
    Valid(CacheEntry),
    Corrupt(String),
}

/// Cache of verified contract sources, backed by a chain-data provider
pub struct ContractCache {
    dir: PathBuf,
    provider: Arc<dyn ChainDataProvider>,
}

impl ContractCache {
    pub fn new(dir: impl Into<PathBuf>, provider: Arc<dyn ChainDataProvider>) -> Self {
        Self {
            dir: dir.into(),
            provider,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory name for a key, after address validation
    pub fn entry_key(network: Network, address: &str) -> CacheResult<String> {
        Ok(format!("{}_{}", network, normalize_address(address)?))
    }

    /// Look up a published entry without fetching or repairing anything
    pub fn get(&self, network: Network, address: &str) -> CacheResult<Option<CacheEntry>> {
        let key = Self::entry_key(network, address)?;
        match inspect(&self.dir.join(&key)) {
            EntryState::Valid(entry) => Ok(Some(entry)),
            EntryState::Missing | EntryState::Corrupt(_) => Ok(None),
        }
    }

    /// Return the entry for `(network, address)`, fetching and publishing it
    /// if absent.
    ///
    /// A published entry is always preferred over fetching. If a concurrent
    /// caller publishes first, its entry is returned. Provider or write
    /// failures leave any previously published entry untouched.
    pub async fn fetch(&self, network: Network, address: &str) -> CacheResult<CacheEntry> {
        let key = Self::entry_key(network, address)?;
        let target = self.dir.join(&key);

        match inspect(&target) {
            EntryState::Valid(entry) => {
                log::debug!("Cache hit for {}", key);
                return Ok(entry);
            }
            EntryState::Corrupt(reason) => {
                log::warn!("Cache entry {} is corrupt ({}); re-fetching", key, reason);
                if let Some(entry) = self.quarantine(&key, &target)? {
                    log::debug!("Cache entry {} repaired concurrently", key);
                    return Ok(entry);
                }
            }
            EntryState::Missing => {}
        }

        let normalized = normalize_address(address)?;
        let source = self.provider.fetch_source(network, &normalized).await?;

        // A concurrent caller may have published while we were fetching
        if let EntryState::Valid(entry) = inspect(&target) {
            log::debug!("Cache entry {} published concurrently", key);
            return Ok(entry);
        }

        let staged = self.stage(&key, network, &normalized, source)?;
        self.publish(&staged, &target)
    }

    /// Metadata of every valid entry, ordered by directory name
    pub fn list(&self) -> CacheResult<Vec<CacheMetadata>> {
        list_entries(&self.dir)
    }

    /// Move a corrupt entry out of the way, unless it has become valid since
    /// it was inspected, in which case that entry is returned untouched
    fn quarantine(&self, key: &str, target: &Path) -> CacheResult<Option<CacheEntry>> {
        if let EntryState::Valid(entry) = inspect(target) {
            return Ok(Some(entry));
        }
        let aside = self
            .dir
            .join(format!(".{}.corrupt-{}", key, Uuid::new_v4().simple()));
        match fs::rename(target, &aside) {
            Ok(()) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(target, e)),
        }
    }

    /// Write a complete entry into a hidden temp directory
    fn stage(
        &self,
        key: &str,
        network: Network,
        address: &str,
        source: VerifiedSource,
    ) -> CacheResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        let staged = self
            .dir
            .join(format!(".{}.tmp-{}", key, Uuid::new_v4().simple()));

        let result = write_entry(&staged, network, address, source);
        if result.is_err() {
            let _ = fs::remove_dir_all(&staged);
        }
        result.map(|_| staged)
    }

    /// Rename the staged directory into place
    fn publish(&self, staged: &Path, target: &Path) -> CacheResult<CacheEntry> {
        match fs::rename(staged, target) {
            Ok(()) => match inspect(target) {
                EntryState::Valid(entry) => {
                    log::info!("Published cache entry {}", target.display());
                    Ok(entry)
                }
                EntryState::Missing | EntryState::Corrupt(_) => Err(CacheError::io(
                    target,
                    std::io::Error::other("published entry is not readable"),
                )),
            },
            Err(e) => {
                let _ = fs::remove_dir_all(staged);
                match inspect(target) {
                    EntryState::Valid(entry) => {
                        log::debug!("Lost publish race for {}", target.display());
                        Ok(entry)
                    }
                    _ => Err(CacheError::io(target, e)),
                }
            }
        }
    }
}

/// Metadata of every valid entry under `dir`, ordered by directory name.
///
/// Needs no provider, so it works without chain credentials.
pub fn list_entries(dir: &Path) -> CacheResult<Vec<CacheMetadata>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(dir, e)),
    };

    let mut dirs: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_dir()
                && !path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'))
        })
        .collect();
    dirs.sort();

    Ok(dirs
        .iter()
        .filter_map(|dir| match inspect(dir) {
            EntryState::Valid(entry) => Some(entry.metadata),
            _ => None,
        })
        .collect())
}

fn write_entry(
    staged: &Path,
    network: Network,
    address: &str,
    source: VerifiedSource,
) -> CacheResult<()> {
    let sources_dir = staged.join(SOURCES_DIR);
    fs::create_dir_all(&sources_dir).map_err(|e| CacheError::io(&sources_dir, e))?;

    let mut files: BTreeMap<String, String> = BTreeMap::new();
    for file in source.files {
        match sanitize_source_path(&file.path) {
            Some(rel) => {
                files.insert(rel, file.content);
            }
            None => log::warn!("Dropping source with unusable path '{}'", file.path),
        }
    }
    if files.is_empty() {
        return Err(CacheError::EmptySource {
            address: address.to_string(),
        });
    }

    for (rel, content) in &files {
        let path = sources_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        fs::write(&path, content).map_err(|e| CacheError::io(&path, e))?;
    }

    let main_file = files
        .keys()
        .find(|rel| {
            Path::new(rel.as_str())
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy() == source.contract_name)
        })
        .or_else(|| files.keys().next())
        .cloned()
        .unwrap_or_default();

    let metadata = CacheMetadata {
        contract_name: source.contract_name,
        compiler_version: source.compiler_version,
        optimization_used: source.optimization_used,
        runs: source.runs,
        evm_version: source.evm_version,
        network,
        address: address.to_string(),
        main_file,
        files: files.into_keys().collect(),
        fetched_at: Utc::now(),
    };
    let metadata_path = staged.join(METADATA_FILE);
    let json = serde_json::to_vec_pretty(&metadata)?;
    fs::write(&metadata_path, json).map_err(|e| CacheError::io(&metadata_path, e))
}

/// Classify what is on disk at `dir`
pub(crate) fn inspect(dir: &Path) -> EntryState {
    if !dir.is_dir() {
        return EntryState::Missing;
    }
    let metadata_path = dir.join(METADATA_FILE);
    let bytes = match fs::read(&metadata_path) {
        Ok(bytes) => bytes,
        Err(e) => return EntryState::Corrupt(format!("metadata unreadable: {}", e)),
    };
    let metadata: CacheMetadata = match serde_json::from_slice(&bytes) {
        Ok(m) => m,
        Err(e) => return EntryState::Corrupt(format!("metadata invalid: {}", e)),
    };
    let sources = dir.join(SOURCES_DIR);
    if let Some(missing) = metadata.files.iter().find(|rel| !sources.join(rel).is_file()) {
        return EntryState::Corrupt(format!("source file {} missing", missing));
    }
    EntryState::Valid(CacheEntry {
        dir: dir.to_path_buf(),
        metadata,
    })
}

/// Turn a provider path into a safe relative path.
///
/// Drops `@` package markers, empty, `.` and `..` segments so every stored
/// file stays inside `sources/`.
pub(crate) fn sanitize_source_path(raw: &str) -> Option<String> {
    let segments: Vec<&str> = raw
        .split(['/', '\\'])
        .map(|seg| seg.trim_start_matches('@'))
        .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
