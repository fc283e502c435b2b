//! Detailed index generation
//!
//! An external indexer is optional. Whenever it is absent or fails, a basic
//! index is built from file enumeration alone (path, byte size, line count).

use af_core::config::IndexConfig;
use af_core::ContractProject;
use af_tools::{CommandSpec, ExitKind, ProcessRunner};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Index generation errors
#[derive(Error, Debug)]
pub enum IndexError {
    /// I001: Nothing to index
    #[error("[I001] No in-scope source files under {path}")]
    NoSources { path: PathBuf },

    /// I002: External indexer failed
    #[error("[I002] Index command failed: {0}")]
    Command(String),

    /// I003: IO error with path context
    #[error("[I003] IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// How an index was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMethod {
    Command,
    Basic,
}

/// Inputs for one index run
#[derive(Debug, Clone)]
pub struct IndexRequest {
    /// Tree the tools analyze
    pub source_root: PathBuf,
    /// File name the external indexer writes inside `source_root`
    pub index_file: String,
}

/// Generated index text
#[derive(Debug, Clone)]
pub struct GeneratedIndex {
    pub content: String,
    pub method: IndexMethod,
    pub fallback_reason: Option<String>,
}

/// Produces the detailed index document for a project
#[async_trait]
pub trait IndexGenerator: Send + Sync {
    async fn generate(
        &self,
        project: &ContractProject,
        request: &IndexRequest,
    ) -> Result<GeneratedIndex, IndexError>;
}

/// Index built purely from the in-scope file list
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicIndexGenerator;

impl BasicIndexGenerator {
    pub fn render(project: &ContractProject) -> String {
        let name = project
            .root()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| project.root().display().to_string());

        let mut out = String::from("# Smart Contract Audit Index\n\n");
        let _ = writeln!(out, "**Project**: {}", name);
        let _ = writeln!(out, "**Generated**: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "**Files**: {} source files\n", project.len());
        out.push_str("## Contract Files\n\n");
        for file in project.files() {
            let _ = writeln!(out, "### {}", file.path);
            let _ = writeln!(out, "- **Size**: {} bytes", file.byte_size());
            let _ = writeln!(out, "- **Lines**: {}\n", file.line_count());
        }
        out
    }
}

#[async_trait]
impl IndexGenerator for BasicIndexGenerator {
    async fn generate(
        &self,
        project: &ContractProject,
        _request: &IndexRequest,
    ) -> Result<GeneratedIndex, IndexError> {
        if project.is_empty() {
            return Err(IndexError::NoSources {
                path: project.root().to_path_buf(),
            });
        }
        Ok(GeneratedIndex {
            content: Self::render(project),
            method: IndexMethod::Basic,
            fallback_reason: None,
        })
    }
}

/// Runs an external indexer with the source root appended as its last
/// argument; the indexer writes `index_file` inside that root.
#[derive(Debug, Clone)]
pub struct CommandIndexGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    runner: ProcessRunner,
}

impl CommandIndexGenerator {
    /// `None` for an empty command line
    pub fn new(command: &[String], timeout: Duration, runner: ProcessRunner) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
            runner,
        })
    }
}

#[async_trait]
impl IndexGenerator for CommandIndexGenerator {
    async fn generate(
        &self,
        _project: &ContractProject,
        request: &IndexRequest,
    ) -> Result<GeneratedIndex, IndexError> {
        let spec = CommandSpec::new(&self.program)
            .args(self.args.iter().map(String::as_str))
            .arg(request.source_root.as_os_str())
            .current_dir(&request.source_root);
        let output = self.runner.run(&spec, self.timeout).await;

        match &output.exit {
            ExitKind::Exited(0) => {}
            ExitKind::Exited(code) => {
                let detail = output.stderr.lines().last().unwrap_or_default();
                return Err(IndexError::Command(format!(
                    "{} exited with status {}: {}",
                    self.program, code, detail
                )));
            }
            ExitKind::Signaled => {
                return Err(IndexError::Command(format!(
                    "{} terminated by signal",
                    self.program
                )))
            }
            ExitKind::TimedOut => {
                return Err(IndexError::Command(format!(
                    "{} exceeded {}s",
                    self.program,
                    self.timeout.as_secs()
                )))
            }
            ExitKind::Missing(msg) | ExitKind::SpawnFailed(msg) => {
                return Err(IndexError::Command(msg.clone()))
            }
        }

        let path = request.source_root.join(&request.index_file);
        let content = read_index(&path)?;
        if content.trim().is_empty() {
            return Err(IndexError::Command(format!(
                "{} produced an empty index",
                self.program
            )));
        }
        Ok(GeneratedIndex {
            content,
            method: IndexMethod::Command,
            fallback_reason: None,
        })
    }
}

fn read_index(path: &Path) -> Result<String, IndexError> {
    std::fs::read_to_string(path).map_err(|e| IndexError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// External indexer when configured, basic index otherwise or on its failure
#[derive(Debug, Clone)]
pub struct DefaultIndexGenerator {
    command: Option<CommandIndexGenerator>,
}

impl DefaultIndexGenerator {
    pub fn from_config(config: &IndexConfig, runner: &ProcessRunner) -> Self {
        let command = config.command.as_deref().and_then(|cmd| {
            CommandIndexGenerator::new(cmd, Duration::from_secs(config.timeout_secs), runner.clone())
        });
        Self { command }
    }
}

#[async_trait]
impl IndexGenerator for DefaultIndexGenerator {
    async fn generate(
        &self,
        project: &ContractProject,
        request: &IndexRequest,
    ) -> Result<GeneratedIndex, IndexError> {
        if project.is_empty() {
            return Err(IndexError::NoSources {
                path: project.root().to_path_buf(),
            });
        }

        let Some(command) = &self.command else {
            return BasicIndexGenerator.generate(project, request).await;
        };

        match command.generate(project, request).await {
            Ok(index) => Ok(index),
            Err(e) => {
                log::warn!("Detailed indexer failed, using basic index: {}", e);
                let mut index = BasicIndexGenerator.generate(project, request).await?;
                index.fallback_reason = Some(e.to_string());
                Ok(index)
            }
        }
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
