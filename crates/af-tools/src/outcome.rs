//! Classified result of one adapter invocation

use crate::adapter::ToolKind;
use af_core::step::{
    AnalysisStep, FailureKind, Finding, PhaseOutcome, PhaseStatus, StepStatus, TestSummary,
};
use std::time::Duration;

/// What an adapter invocation produced.
///
/// Always returned, whatever happened to the foreign process; `failure`
/// classifies anything short of a clean run.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub tool: ToolKind,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub findings: Vec<Finding>,
    pub duration: Duration,
    pub failure: Option<FailureKind>,
    pub message: Option<String>,
    pub phases: Vec<PhaseOutcome>,
    pub tests: Option<TestSummary>,
}

impl ToolOutcome {
    pub(crate) fn new(tool: ToolKind) -> Self {
        Self {
            tool,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            findings: Vec::new(),
            duration: Duration::ZERO,
            failure: None,
            message: None,
            phases: Vec::new(),
            tests: None,
        }
    }

    pub(crate) fn failed(tool: ToolKind, failure: FailureKind, message: impl Into<String>) -> Self {
        Self {
            failure: Some(failure),
            message: Some(message.into()),
            ..Self::new(tool)
        }
    }

    /// The step status this outcome maps to.
    ///
    /// A missing binary skips the step; a parse error keeps the step
    /// successful with raw output preserved; a failed sub-phase fails it.
    pub fn step_status(&self) -> StepStatus {
        match self.failure {
            Some(FailureKind::ToolMissing) => StepStatus::Skipped,
            Some(FailureKind::Timeout) => StepStatus::TimedOut,
            Some(FailureKind::BuildFailed) | Some(FailureKind::Crashed) => StepStatus::Failed,
            Some(FailureKind::ParseError) | None => {
                if self.phases.iter().any(|p| p.status == PhaseStatus::Failed) {
                    StepStatus::Failed
                } else {
                    StepStatus::Succeeded
                }
            }
        }
    }

    /// Copy this outcome onto a running step and terminate it
    pub fn apply_to(self, step: &mut AnalysisStep) {
        let status = self.step_status();
        step.output = if self.stderr.is_empty() {
            self.stdout
        } else if self.stdout.is_empty() {
            self.stderr
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        };
        step.findings = self.findings;
        step.failure = self.failure;
        step.phases = self.phases;
        step.tests = self.tests;
        step.message = self.message;
        step.transition(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::step::StepKind;

    #[test]
    fn test_missing_tool_maps_to_skipped() {
        let outcome = ToolOutcome::failed(
            ToolKind::StaticAnalyzer,
            FailureKind::ToolMissing,
            "slither: not found",
        );
        assert_eq!(outcome.step_status(), StepStatus::Skipped);
    }

    #[test]
    fn test_parse_error_keeps_step_successful() {
        let mut outcome = ToolOutcome::new(ToolKind::StaticAnalyzer);
        outcome.failure = Some(FailureKind::ParseError);
        outcome.stdout = "not json".to_string();

        let mut step = AnalysisStep::new(StepKind::StaticAnalysis);
        step.transition(StepStatus::Running);
        outcome.apply_to(&mut step);

        assert_eq!(step.status, StepStatus::Succeeded);
        assert_eq!(step.failure, Some(FailureKind::ParseError));
        assert_eq!(step.output, "not json");
    }

    #[test]
    fn test_failed_phase_fails_step() {
        let mut outcome = ToolOutcome::new(ToolKind::DynamicTester);
        outcome.phases.push(PhaseOutcome {
            phase: "test".to_string(),
            status: PhaseStatus::Failed,
            exit_code: Some(1),
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: 5,
            message: None,
        });
        assert_eq!(outcome.step_status(), StepStatus::Failed);
    }

    #[test]
    fn test_timeout_maps_to_timed_out() {
        let outcome =
            ToolOutcome::failed(ToolKind::DynamicTester, FailureKind::Timeout, "too slow");
        assert_eq!(outcome.step_status(), StepStatus::TimedOut);
    }
}
