//! Audit request parameters

use af_cache::Network;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// On-chain source to fetch before auditing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub network: Network,
    pub address: String,
}

/// One audit run. Values set here override the pipeline config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRequest {
    pub project_root: PathBuf,
    pub exclude: Option<Vec<String>>,
    pub fuzz_runs: Option<u32>,
    pub fetch: Option<FetchRequest>,
}

impl AuditRequest {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            exclude: None,
            fuzz_runs: None,
            fetch: None,
        }
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = Some(patterns);
        self
    }

    pub fn with_fuzz_runs(mut self, runs: u32) -> Self {
        self.fuzz_runs = Some(runs);
        self
    }

    pub fn with_fetch(mut self, network: Network, address: impl Into<String>) -> Self {
        self.fetch = Some(FetchRequest {
            network,
            address: address.into(),
        });
        self
    }
}
