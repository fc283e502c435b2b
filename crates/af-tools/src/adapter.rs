//! The closed set of supported analyzers

use crate::dynamic_tester::DynamicTester;
use crate::outcome::ToolOutcome;
use crate::process::{CommandSpec, ExitKind, ProcessRunner};
use crate::static_analyzer::StaticAnalyzer;
use af_core::config::ToolsConfig;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Budget for a `--version` probe
const VERSION_PROBE_SECS: u64 = 30;

/// Which analyzer produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    StaticAnalyzer,
    DynamicTester,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::StaticAnalyzer => "static_analyzer",
            ToolKind::DynamicTester => "dynamic_tester",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-invocation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Iterations handed to the fuzz phase
    pub fuzz_runs: u32,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self { fuzz_runs: 256 }
    }
}

/// Result of probing a tool binary
#[derive(Debug, Clone, Serialize)]
pub struct ToolAvailability {
    pub tool: ToolKind,
    pub binary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolAvailability {
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// An external analyzer
#[derive(Debug, Clone)]
pub enum ToolAdapter {
    StaticAnalyzer(StaticAnalyzer),
    DynamicTester(DynamicTester),
}

impl ToolAdapter {
    /// Every configured analyzer, sharing one worker pool
    pub fn all(config: &ToolsConfig, runner: &ProcessRunner) -> Vec<ToolAdapter> {
        vec![
            ToolAdapter::StaticAnalyzer(StaticAnalyzer::new(
                config.static_analyzer.clone(),
                runner.clone(),
            )),
            ToolAdapter::DynamicTester(DynamicTester::new(
                config.dynamic_tester.clone(),
                runner.clone(),
            )),
        ]
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolAdapter::StaticAnalyzer(_) => ToolKind::StaticAnalyzer,
            ToolAdapter::DynamicTester(_) => ToolKind::DynamicTester,
        }
    }

    pub fn binary(&self) -> &str {
        match self {
            ToolAdapter::StaticAnalyzer(a) => a.binary(),
            ToolAdapter::DynamicTester(t) => t.binary(),
        }
    }

    fn runner(&self) -> &ProcessRunner {
        match self {
            ToolAdapter::StaticAnalyzer(a) => a.runner(),
            ToolAdapter::DynamicTester(t) => t.runner(),
        }
    }

    /// Run the analyzer over `project_root`. Never fails; see [`ToolOutcome`].
    pub async fn invoke(&self, project_root: &Path, options: &InvokeOptions) -> ToolOutcome {
        log::info!("Invoking {} ({})", self.kind(), self.binary());
        match self {
            ToolAdapter::StaticAnalyzer(a) => a.invoke(project_root).await,
            ToolAdapter::DynamicTester(t) => t.invoke(project_root, options).await,
        }
    }

    /// Probe the binary with `--version`
    pub async fn check_available(&self) -> ToolAvailability {
        let spec = CommandSpec::new(self.binary()).arg("--version");
        let output = self
            .runner()
            .run(&spec, Duration::from_secs(VERSION_PROBE_SECS))
            .await;

        let (version, error) = match &output.exit {
            ExitKind::Exited(0) => {
                let text = if output.stdout.trim().is_empty() {
                    &output.stderr
                } else {
                    &output.stdout
                };
                (text.lines().next().map(|l| l.trim().to_string()), None)
            }
            ExitKind::Exited(code) => (None, Some(format!("--version exited with {}", code))),
            ExitKind::Signaled => (None, Some("--version terminated by signal".to_string())),
            ExitKind::TimedOut => (None, Some("--version timed out".to_string())),
            ExitKind::Missing(msg) | ExitKind::SpawnFailed(msg) => (None, Some(msg.clone())),
        };

        ToolAvailability {
            tool: self.kind(),
            binary: self.binary().to_string(),
            version,
            error,
        }
    }
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;
