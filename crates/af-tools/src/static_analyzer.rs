//! Static analyzer adapter (slither-compatible JSON on stdout)

use crate::adapter::ToolKind;
use crate::error::ToolError;
use crate::outcome::ToolOutcome;
use crate::parse::parse_static_report;
use crate::process::{CommandSpec, ExitKind, ProcessRunner};
use af_core::config::StaticAnalyzerConfig;
use af_core::step::FailureKind;
use std::path::Path;
use std::time::Duration;

/// Runs the static analyzer over a project tree
#[derive(Debug, Clone)]
pub struct StaticAnalyzer {
    config: StaticAnalyzerConfig,
    runner: ProcessRunner,
}

impl StaticAnalyzer {
    pub fn new(config: StaticAnalyzerConfig, runner: ProcessRunner) -> Self {
        Self { config, runner }
    }

    pub fn binary(&self) -> &str {
        &self.config.binary
    }

    pub(crate) fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// The command line used against `root`
    pub fn command(&self, root: &Path) -> CommandSpec {
        let mut spec = CommandSpec::new(&self.config.binary)
            .arg(root.as_os_str())
            .args(["--json", "-"]);
        if self.config.exclude_dependencies {
            spec = spec.arg("--exclude-dependencies");
        }
        for filter in &self.config.filter_paths {
            spec = spec.arg("--filter-paths").arg(filter.as_str());
        }
        spec.current_dir(root)
    }

    /// Analyze `root`.
    ///
    /// The analyzer exits nonzero whenever it reports findings, so the exit
    /// code alone says nothing; the JSON `success` flag decides.
    pub async fn invoke(&self, root: &Path) -> ToolOutcome {
        let spec = self.command(root);
        let output = self
            .runner
            .run(&spec, Duration::from_secs(self.config.timeout_secs))
            .await;

        let mut outcome = ToolOutcome::new(ToolKind::StaticAnalyzer);
        outcome.exit_code = output.exit_code();
        outcome.duration = output.duration;

        match &output.exit {
            ExitKind::Missing(msg) => {
                log::warn!("Static analyzer unavailable: {}", msg);
                outcome.failure = Some(FailureKind::ToolMissing);
                outcome.message = Some(msg.clone());
                return outcome;
            }
            ExitKind::SpawnFailed(msg) => {
                outcome.failure = Some(FailureKind::Crashed);
                outcome.message = Some(msg.clone());
                return outcome;
            }
            ExitKind::TimedOut => {
                outcome.failure = Some(FailureKind::Timeout);
                outcome.message = Some(format!(
                    "static analysis exceeded {}s",
                    self.config.timeout_secs
                ));
                return outcome;
            }
            ExitKind::Exited(_) | ExitKind::Signaled => {}
        }

        let clean_exit = output.exit == ExitKind::Exited(0);
        match parse_static_report(&output.stdout) {
            Ok(findings) => {
                log::info!("Static analysis reported {} findings", findings.len());
                outcome.findings = findings;
            }
            Err(ToolError::AnalyzerReported(msg)) => {
                outcome.failure = Some(FailureKind::Crashed);
                outcome.message = Some(msg);
            }
            Err(e) if clean_exit => {
                log::warn!("Static analyzer output kept as raw text: {}", e);
                outcome.failure = Some(FailureKind::ParseError);
                outcome.message = Some(e.to_string());
            }
            Err(e) => {
                outcome.failure = Some(FailureKind::Crashed);
                outcome.message = Some(match output.exit {
                    ExitKind::Exited(code) => format!("exited with status {}: {}", code, e),
                    _ => format!("terminated by signal: {}", e),
                });
            }
        }

        outcome.stdout = output.stdout;
        outcome.stderr = output.stderr;
        outcome
    }
}

#[cfg(test)]
#[path = "static_analyzer_test.rs"]
mod tests;
