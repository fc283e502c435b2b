//! Configuration types and parsing for auditflow.yml

use crate::error::{CoreError, CoreResult};
use crate::exclusion::ExclusionSet;
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main audit configuration from auditflow.yml
///
/// Built once (from a file or [`Config::default`]) and handed to the cache,
/// the tool adapters and the pipeline at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Exclusion globs matched against project-relative paths
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// File extensions considered contract sources
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Directory holding fetched contract sources
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Report file name, relative to the project root
    #[serde(default = "default_report_file")]
    pub report_file: String,

    /// Index artifact file name, relative to the project root
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// Number of fuzz runs passed to the dynamic tester
    #[serde(default = "default_fuzz_runs")]
    pub fuzz_runs: u32,

    /// Upper bound on concurrently running external tools
    #[serde(default = "default_max_concurrent_tools")]
    pub max_concurrent_tools: usize,

    /// Wall-clock budget for an entire pipeline run
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_timeout_secs: u64,

    /// External tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Detailed index generator settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Chain-data provider settings
    #[serde(default)]
    pub chain: ChainConfig,
}

/// Settings for both external analyzers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Static analyzer (slither)
    #[serde(default)]
    pub static_analyzer: StaticAnalyzerConfig,

    /// Build/test/fuzz engine (forge)
    #[serde(default)]
    pub dynamic_tester: DynamicTesterConfig,
}

/// Static analyzer invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticAnalyzerConfig {
    #[serde(default = "default_static_binary")]
    pub binary: String,

    #[serde(default = "default_static_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip findings located in dependencies
    #[serde(default = "default_true")]
    pub exclude_dependencies: bool,

    /// Path fragments whose findings the analyzer filters out
    #[serde(default = "default_filter_paths")]
    pub filter_paths: Vec<String>,
}

impl Default for StaticAnalyzerConfig {
    fn default() -> Self {
        Self {
            binary: default_static_binary(),
            timeout_secs: default_static_timeout_secs(),
            exclude_dependencies: true,
            filter_paths: default_filter_paths(),
        }
    }
}

/// Build/test/fuzz engine invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamicTesterConfig {
    #[serde(default = "default_dynamic_binary")]
    pub binary: String,

    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,

    #[serde(default = "default_test_timeout_secs")]
    pub test_timeout_secs: u64,

    #[serde(default = "default_fuzz_timeout_secs")]
    pub fuzz_timeout_secs: u64,

    #[serde(default = "default_coverage_timeout_secs")]
    pub coverage_timeout_secs: u64,

    /// Directories searched for test sources before fuzzing
    #[serde(default = "default_test_dirs")]
    pub test_dirs: Vec<String>,
}

impl Default for DynamicTesterConfig {
    fn default() -> Self {
        Self {
            binary: default_dynamic_binary(),
            build_timeout_secs: default_build_timeout_secs(),
            test_timeout_secs: default_test_timeout_secs(),
            fuzz_timeout_secs: default_fuzz_timeout_secs(),
            coverage_timeout_secs: default_coverage_timeout_secs(),
            test_dirs: default_test_dirs(),
        }
    }
}

/// External detailed indexer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Command (program + args) run with the project root appended.
    /// When absent only the basic local index is produced.
    #[serde(default)]
    pub command: Option<Vec<String>>,

    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_index_timeout_secs(),
        }
    }
}

/// Chain-data provider (Etherscan V2) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; the CLI fills this from `ETHERSCAN_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_chain_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            timeout_secs: default_chain_timeout_secs(),
        }
    }
}

/// Library, vendor, build-output and cache locations never audited
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "lib/**",
    "**/lib/**",
    "node_modules/**",
    "**/node_modules/**",
    "**/.git/**",
    "build/**",
    "**/build/**",
    "out/**",
    "cache/**",
    "**/cache/**",
    "dist/**",
    "**/target/**",
    "vendor/**",
    "**/vendor/**",
];

const CONFIG_FILE_NAMES: &[&str] = &["auditflow.yml", "auditflow.yaml"];

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

fn default_source_extensions() -> Vec<String> {
    vec!["sol".to_string()]
}

fn default_cache_dir() -> String {
    ".audit_cache".to_string()
}

fn default_report_file() -> String {
    "audit_report.json".to_string()
}

fn default_index_file() -> String {
    "detailed_index.md".to_string()
}

fn default_fuzz_runs() -> u32 {
    256
}

fn default_max_concurrent_tools() -> usize {
    2
}

fn default_pipeline_timeout_secs() -> u64 {
    3600
}

fn default_static_binary() -> String {
    "slither".to_string()
}

fn default_static_timeout_secs() -> u64 {
    300
}

fn default_filter_paths() -> Vec<String> {
    vec!["lib/".to_string(), "node_modules/".to_string()]
}

fn default_dynamic_binary() -> String {
    "forge".to_string()
}

fn default_build_timeout_secs() -> u64 {
    300
}

fn default_test_timeout_secs() -> u64 {
    300
}

fn default_fuzz_timeout_secs() -> u64 {
    600
}

fn default_coverage_timeout_secs() -> u64 {
    300
}

fn default_test_dirs() -> Vec<String> {
    vec!["test".to_string(), "testFoundry".to_string()]
}

fn default_index_timeout_secs() -> u64 {
    600
}

fn default_api_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_chain_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            source_extensions: default_source_extensions(),
            cache_dir: default_cache_dir(),
            report_file: default_report_file(),
            index_file: default_index_file(),
            fuzz_runs: default_fuzz_runs(),
            max_concurrent_tools: default_max_concurrent_tools(),
            pipeline_timeout_secs: default_pipeline_timeout_secs(),
            tools: ToolsConfig::default(),
            index: IndexConfig::default(),
            chain: ChainConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    ///
    /// Looks for auditflow.yml or auditflow.yaml and falls back to the
    /// defaults when neither exists.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.source_extensions.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "source_extensions cannot be empty".to_string(),
            });
        }

        if self.max_concurrent_tools == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "max_concurrent_tools must be at least 1".to_string(),
            });
        }

        if self.report_file.trim().is_empty() || self.index_file.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "report_file and index_file must be non-empty".to_string(),
            });
        }

        let static_cfg = &self.tools.static_analyzer;
        let dynamic_cfg = &self.tools.dynamic_tester;
        for (name, binary) in [
            ("tools.static_analyzer.binary", &static_cfg.binary),
            ("tools.dynamic_tester.binary", &dynamic_cfg.binary),
        ] {
            if binary.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{} cannot be empty", name),
                });
            }
        }

        let timeouts = [
            ("pipeline_timeout_secs", self.pipeline_timeout_secs),
            ("tools.static_analyzer.timeout_secs", static_cfg.timeout_secs),
            (
                "tools.dynamic_tester.build_timeout_secs",
                dynamic_cfg.build_timeout_secs,
            ),
            (
                "tools.dynamic_tester.test_timeout_secs",
                dynamic_cfg.test_timeout_secs,
            ),
            (
                "tools.dynamic_tester.fuzz_timeout_secs",
                dynamic_cfg.fuzz_timeout_secs,
            ),
            (
                "tools.dynamic_tester.coverage_timeout_secs",
                dynamic_cfg.coverage_timeout_secs,
            ),
            ("index.timeout_secs", self.index.timeout_secs),
            ("chain.timeout_secs", self.chain.timeout_secs),
        ];
        for (name, secs) in timeouts {
            if secs == 0 {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{} must be greater than zero", name),
                });
            }
        }

        if let Some(command) = &self.index.command {
            if command.first().map_or(true, |p| p.trim().is_empty()) {
                return Err(CoreError::ConfigInvalid {
                    message: "index.command must name a program".to_string(),
                });
            }
        }

        self.exclusion_set()?;
        Ok(())
    }

    /// Compile the exclusion globs
    pub fn exclusion_set(&self) -> CoreResult<ExclusionSet> {
        ExclusionSet::new(&self.exclude)
    }

    /// Exclusions for an audit run: `overrides` (or the configured globs)
    /// plus the cache directory when it lives inside the project
    pub fn audit_exclusions(&self, overrides: Option<&[String]>) -> CoreResult<ExclusionSet> {
        let mut patterns = overrides
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| self.exclude.clone());
        if Path::new(&self.cache_dir).is_relative() {
            let cache_glob = format!("{}/**", self.cache_dir.trim_end_matches('/'));
            if !patterns.contains(&cache_glob) {
                patterns.push(cache_glob);
            }
        }
        ExclusionSet::new(&patterns)
    }

    /// Get the cache directory, resolved against `root` when relative
    pub fn cache_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.cache_dir)
    }

    /// Get the report path for a project root
    pub fn report_path(&self, root: &Path) -> PathBuf {
        root.join(&self.report_file)
    }

    /// Get the index artifact path for a project root
    pub fn index_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index_file)
    }

    /// Pipeline-level wall-clock budget
    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
