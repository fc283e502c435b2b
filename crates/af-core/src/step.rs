//! Analysis step model shared by tool adapters, the orchestrator and the report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The steps of an audit pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Fetch,
    Index,
    StaticAnalysis,
    DependencyGraph,
    DynamicAnalysis,
    Aggregate,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Fetch => "fetch",
            StepKind::Index => "index",
            StepKind::StaticAnalysis => "static_analysis",
            StepKind::DependencyGraph => "dependency_graph",
            StepKind::DynamicAnalysis => "dynamic_analysis",
            StepKind::Aggregate => "aggregate",
        }
    }

    /// Parse a step name as written in a persisted report
    pub fn parse(name: &str) -> Option<Self> {
        [
            StepKind::Fetch,
            StepKind::Index,
            StepKind::StaticAnalysis,
            StepKind::DependencyGraph,
            StepKind::DynamicAnalysis,
            StepKind::Aggregate,
        ]
        .into_iter()
        .find(|k| k.as_str() == name)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Skipped,
}

impl StepStatus {
    /// Succeeded, failed, timed out and skipped are final for a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Succeeded | StepStatus::Failed | StepStatus::TimedOut | StepStatus::Skipped
        )
    }

    /// Transitions only move forward; nothing returns to `Pending` and a
    /// terminal state is never left.
    pub fn can_transition_to(&self, next: StepStatus) -> bool {
        match self {
            StepStatus::Pending => next != StepStatus::Pending && next != StepStatus::Succeeded,
            StepStatus::Running => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::TimedOut => "timed_out",
            StepStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Classification of why an external tool invocation did not fully succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Binary unavailable; the step is skipped
    ToolMissing,
    /// Nonzero exit before tests could run
    BuildFailed,
    /// Terminated after exceeding its time budget
    Timeout,
    /// Structured output was malformed; raw text was kept instead
    ParseError,
    /// Unexpected nonzero exit with no structured signal
    Crashed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::ToolMissing => "tool_missing",
            FailureKind::BuildFailed => "build_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::ParseError => "parse_error",
            FailureKind::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

/// Finding severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
    Optimization,
}

impl Severity {
    /// Map an analyzer impact label; unknown labels are informational
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "optimization" => Severity::Optimization,
            _ => Severity::Informational,
        }
    }

    pub fn is_high_or_critical(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }
}

/// One finding reported by an analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Detector / check identifier
    pub check: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
}

/// Outcome of one sub-phase inside a step (build, test, fuzz, coverage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Succeeded,
    Failed,
    TimedOut,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub phase: String,
    pub status: PhaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PhaseOutcome {
    /// A phase that never ran
    pub fn skipped(phase: &str, reason: impl Into<String>) -> Self {
        Self {
            phase: phase.to_string(),
            status: PhaseStatus::Skipped,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 0,
            message: Some(reason.into()),
        }
    }
}

/// Pass/fail counts parsed from a test run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

/// The recorded outcome of one pipeline step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStep {
    pub kind: StepKind,
    pub status: StepStatus,
    /// Raw tool output (or a textual description for in-process steps)
    #[serde(default)]
    pub output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSummary>,
}

impl AnalysisStep {
    /// A new pending step
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            status: StepStatus::Pending,
            output: String::new(),
            findings: Vec::new(),
            started_at: None,
            ended_at: None,
            duration_ms: 0,
            failure: None,
            message: None,
            phases: Vec::new(),
            tests: None,
        }
    }

    /// Move to `next`, stamping start/end times.
    ///
    /// Returns `false` (leaving the step untouched) when the transition would
    /// move backwards or leave a terminal state.
    pub fn transition(&mut self, next: StepStatus) -> bool {
        if !self.status.can_transition_to(next) {
            log::warn!(
                "Ignoring {} transition {} -> {}",
                self.kind,
                self.status,
                next
            );
            return false;
        }

        let now = Utc::now();
        if next == StepStatus::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.ended_at = Some(now);
            if let Some(started) = self.started_at {
                self.duration_ms = (now - started).num_milliseconds().max(0) as u64;
            }
        }
        self.status = next;
        true
    }

    /// Terminate the step with a message
    pub fn finish(&mut self, status: StepStatus, message: impl Into<String>) -> bool {
        let changed = self.transition(status);
        if changed {
            self.message = Some(message.into());
        }
        changed
    }
}

#[cfg(test)]
#[path = "step_test.rs"]
mod tests;
