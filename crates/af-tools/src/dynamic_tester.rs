//! Build/test/fuzz/coverage engine adapter (forge-compatible CLI)
//!
//! Phases run strictly in order. A phase runs only when the one before it
//! succeeded or was skipped on purpose; once a phase fails or times out,
//! everything after it is recorded as skipped.

use crate::adapter::{InvokeOptions, ToolKind};
use crate::outcome::ToolOutcome;
use crate::parse::parse_test_summary;
use crate::process::{CommandSpec, ExitKind, ProcessOutput, ProcessRunner};
use af_core::config::DynamicTesterConfig;
use af_core::step::{FailureKind, PhaseOutcome, PhaseStatus};
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

/// A sub-phase of dynamic analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicPhase {
    Build,
    Test,
    Fuzz,
    Coverage,
}

impl DynamicPhase {
    /// Execution order
    pub const ALL: [DynamicPhase; 4] = [
        DynamicPhase::Build,
        DynamicPhase::Test,
        DynamicPhase::Fuzz,
        DynamicPhase::Coverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicPhase::Build => "build",
            DynamicPhase::Test => "test",
            DynamicPhase::Fuzz => "fuzz",
            DynamicPhase::Coverage => "coverage",
        }
    }
}

impl fmt::Display for DynamicPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the build/test engine over a project tree
#[derive(Debug, Clone)]
pub struct DynamicTester {
    config: DynamicTesterConfig,
    runner: ProcessRunner,
}

impl DynamicTester {
    pub fn new(config: DynamicTesterConfig, runner: ProcessRunner) -> Self {
        Self { config, runner }
    }

    pub fn binary(&self) -> &str {
        &self.config.binary
    }

    pub(crate) fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// The command line for one phase
    pub fn command(&self, phase: DynamicPhase, root: &Path, fuzz_runs: u32) -> CommandSpec {
        let spec = CommandSpec::new(&self.config.binary).current_dir(root);
        match phase {
            DynamicPhase::Build => spec.arg("build"),
            DynamicPhase::Test => spec.args(["test", "-vvv", "--gas-report"]),
            DynamicPhase::Fuzz => spec
                .args(["test", "--fuzz-runs"])
                .arg(fuzz_runs.to_string())
                .arg("-vvv"),
            DynamicPhase::Coverage => spec.args(["coverage", "--report", "lcov"]),
        }
    }

    fn budget(&self, phase: DynamicPhase) -> Duration {
        Duration::from_secs(match phase {
            DynamicPhase::Build => self.config.build_timeout_secs,
            DynamicPhase::Test => self.config.test_timeout_secs,
            DynamicPhase::Fuzz => self.config.fuzz_timeout_secs,
            DynamicPhase::Coverage => self.config.coverage_timeout_secs,
        })
    }

    /// Whether any configured test directory holds a source file
    pub fn has_test_sources(&self, root: &Path) -> bool {
        self.config
            .test_dirs
            .iter()
            .any(|dir| contains_sol_file(&root.join(dir)))
    }

    /// Run every phase against `root`
    pub async fn invoke(&self, root: &Path, options: &InvokeOptions) -> ToolOutcome {
        let started = Instant::now();
        let mut outcome = ToolOutcome::new(ToolKind::DynamicTester);
        let mut blocked: Option<String> = None;

        for phase in DynamicPhase::ALL {
            if let Some(reason) = &blocked {
                outcome
                    .phases
                    .push(PhaseOutcome::skipped(phase.as_str(), reason.clone()));
                continue;
            }
            if phase == DynamicPhase::Fuzz && !self.has_test_sources(root) {
                log::info!("No test sources under {:?}, skipping fuzz", self.config.test_dirs);
                outcome.phases.push(PhaseOutcome::skipped(
                    phase.as_str(),
                    "no test sources found",
                ));
                continue;
            }

            let spec = self.command(phase, root, options.fuzz_runs);
            let output = self.runner.run(&spec, self.budget(phase)).await;

            if let ExitKind::Missing(msg) = &output.exit {
                if outcome.phases.is_empty() {
                    log::warn!("Build/test engine unavailable: {}", msg);
                    outcome.failure = Some(FailureKind::ToolMissing);
                    outcome.message = Some(msg.clone());
                    outcome.duration = started.elapsed();
                    return outcome;
                }
            }

            let record = self.record_phase(phase, &output, &mut outcome);
            log::info!("Dynamic phase {} finished: {:?}", phase, record.status);
            append_section(&mut outcome.stdout, phase, &output.stdout);
            append_section(&mut outcome.stderr, phase, &output.stderr);
            outcome.exit_code = output.exit_code();

            if !matches!(record.status, PhaseStatus::Succeeded | PhaseStatus::Skipped) {
                blocked = Some(format!("{} phase did not succeed", phase));
            }
            outcome.phases.push(record);
        }

        outcome.duration = started.elapsed();
        outcome
    }

    /// Classify one executed phase, recording failures on `outcome`
    fn record_phase(
        &self,
        phase: DynamicPhase,
        output: &ProcessOutput,
        outcome: &mut ToolOutcome,
    ) -> PhaseOutcome {
        let mut record = PhaseOutcome {
            phase: phase.as_str().to_string(),
            status: PhaseStatus::Succeeded,
            exit_code: output.exit_code(),
            stdout: output.stdout.clone(),
            stderr: output.stderr.clone(),
            duration_ms: output.duration.as_millis() as u64,
            message: None,
        };

        match &output.exit {
            ExitKind::Exited(0) => {
                if matches!(phase, DynamicPhase::Test | DynamicPhase::Fuzz) {
                    if let Ok(summary) = parse_test_summary(&output.stdout) {
                        record.message = Some(format!(
                            "{} passed, {} failed, {} skipped",
                            summary.passed, summary.failed, summary.skipped
                        ));
                        if phase == DynamicPhase::Test {
                            outcome.tests = Some(summary);
                        }
                    }
                }
            }
            ExitKind::TimedOut => {
                record.status = PhaseStatus::TimedOut;
                let budget = self.budget(phase).as_secs();
                record.message = Some(classify(
                    outcome,
                    FailureKind::Timeout,
                    format!("{} phase exceeded {}s", phase, budget),
                ));
            }
            ExitKind::Missing(msg) | ExitKind::SpawnFailed(msg) => {
                record.status = PhaseStatus::Failed;
                record.message = Some(classify(outcome, FailureKind::Crashed, msg.clone()));
            }
            ExitKind::Exited(_) | ExitKind::Signaled => {
                record.status = PhaseStatus::Failed;
                let status_text = match output.exit_code() {
                    Some(code) => format!("exited with status {}", code),
                    None => "terminated by signal".to_string(),
                };
                record.message = Some(match phase {
                    DynamicPhase::Build => classify(
                        outcome,
                        FailureKind::BuildFailed,
                        format!("build {}", status_text),
                    ),
                    DynamicPhase::Test | DynamicPhase::Fuzz => {
                        match parse_test_summary(&output.stdout) {
                            Ok(summary) => {
                                if phase == DynamicPhase::Test {
                                    outcome.tests = Some(summary);
                                }
                                let total = summary.passed + summary.failed + summary.skipped;
                                format!("{} of {} tests failed", summary.failed, total)
                            }
                            Err(_) => classify(
                                outcome,
                                FailureKind::Crashed,
                                format!("{} {} without a test summary", phase, status_text),
                            ),
                        }
                    }
                    DynamicPhase::Coverage => classify(
                        outcome,
                        FailureKind::Crashed,
                        format!("coverage {}", status_text),
                    ),
                });
            }
        }

        record
    }
}

/// Record the first failure of an invocation; later ones only annotate phases
fn classify(outcome: &mut ToolOutcome, kind: FailureKind, message: String) -> String {
    if outcome.failure.is_none() {
        outcome.failure = Some(kind);
        outcome.message = Some(message.clone());
    }
    message
}

fn append_section(buffer: &mut String, phase: DynamicPhase, text: &str) {
    if text.is_empty() {
        return;
    }
    if !buffer.is_empty() {
        buffer.push('\n');
    }
    buffer.push_str(&format!("== {} ==\n{}", phase, text));
}

fn contains_sol_file(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        if path.is_dir() {
            contains_sol_file(&path)
        } else {
            path.extension().is_some_and(|ext| ext == "sol")
        }
    })
}

#[cfg(test)]
#[path = "dynamic_tester_test.rs"]
mod tests;
