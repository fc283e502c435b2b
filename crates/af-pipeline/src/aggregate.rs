//! Report aggregation
//!
//! Recommendations come from a fixed template set. Which templates apply
//! depends only on which steps ran, how they ended, and aggregate counts,
//! never on the text of individual findings.

use crate::context::PipelineContext;
use crate::report::{AuditReport, ReportStatus, ReportSummary};
use af_core::{AnalysisStep, FailureKind, Severity, StepKind, StepStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const REC_REVIEW_HIGH: &str =
    "Review static analysis findings, prioritizing critical and high severity issues";
pub const REC_TRIAGE_FINDINGS: &str =
    "Triage remaining medium, low and informational findings for false positives";
pub const REC_INSTALL_ANALYZER: &str =
    "Static analyzer was unavailable; install it and re-run to cover known vulnerability patterns";
pub const REC_RERUN_ANALYZER: &str =
    "Static analysis did not complete; inspect its output and re-run";
pub const REC_FIX_BUILD: &str =
    "Fix the build so tests, fuzzing and coverage can run";
pub const REC_FAILING_TESTS: &str =
    "Investigate failing tests before relying on fuzzing or coverage results";
pub const REC_INSTALL_TESTER: &str =
    "Build/test engine was unavailable; install it to run tests, fuzzing and coverage";
pub const REC_DYNAMIC_TIMEOUT: &str =
    "Dynamic analysis timed out; raise the phase budgets or lower the fuzz run count";
pub const REC_COVERAGE: &str = "Analyze test coverage and add missing test cases";
pub const REC_BREAK_CYCLES: &str =
    "Break circular imports; cyclic dependencies complicate reasoning about initialization and upgrades";
pub const REC_EXTERNAL_DEPS: &str =
    "Pin and review external dependencies that could not be resolved inside the project";
pub const REC_ACCESS_CONTROL: &str = "Check for missing access controls and input validation";
pub const REC_UPGRADES: &str = "Review upgrade patterns and proxy implementations";
pub const REC_FIX_INDEX: &str =
    "Index generation failed, so no analysis ran; fix the project sources and re-run the audit";

const SEVERITIES: [Severity; 6] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
    Severity::Informational,
    Severity::Optimization,
];

/// Merges recorded steps into an [`AuditReport`]
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    report_path: PathBuf,
}

impl ReportAggregator {
    pub fn new(report_path: PathBuf) -> Self {
        Self { report_path }
    }

    /// Overall status and, when failed, the stage responsible
    pub fn status(steps: &[AnalysisStep]) -> (ReportStatus, Option<StepKind>) {
        let index_ok = steps
            .iter()
            .any(|s| s.kind == StepKind::Index && s.status == StepStatus::Succeeded);
        if !index_ok {
            return (ReportStatus::Failed, Some(StepKind::Index));
        }

        let degraded = steps.iter().any(|s| {
            s.kind != StepKind::Aggregate
                && matches!(
                    s.status,
                    StepStatus::Failed | StepStatus::TimedOut | StepStatus::Skipped
                )
        });
        if degraded {
            (ReportStatus::Partial, None)
        } else {
            (ReportStatus::Completed, None)
        }
    }

    /// Derive the summary from a context
    pub fn summarize(ctx: &PipelineContext) -> ReportSummary {
        let mut counts: BTreeMap<Severity, usize> = SEVERITIES.iter().map(|&s| (s, 0)).collect();
        for finding in ctx.steps().iter().flat_map(|s| s.findings.iter()) {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        let total_findings: usize = counts.values().sum();

        let dynamic = ctx.step(StepKind::DynamicAnalysis);
        let tests = dynamic.and_then(|s| s.tests);
        let tests_passed = dynamic.is_some_and(|s| {
            s.status == StepStatus::Succeeded
                && s
                    .phases
                    .iter()
                    .any(|p| p.phase == "test" && p.status == af_core::PhaseStatus::Succeeded)
        });

        let (cycles_found, external_dependency_count) = ctx
            .dependency_graph
            .as_ref()
            .map(|g| (g.cycles.len(), g.external_dependencies.len()))
            .unwrap_or((0, 0));

        let mut summary = ReportSummary {
            finding_counts_by_severity: counts,
            total_findings,
            tests_passed,
            tests,
            cycles_found,
            external_dependency_count,
            index_token_count: ctx.index.as_ref().map(|i| i.token_count).unwrap_or(0),
            recommendations: Vec::new(),
        };
        summary.recommendations = Self::recommendations(ctx, &summary);
        summary
    }

    /// Select recommendation templates
    pub fn recommendations(ctx: &PipelineContext, summary: &ReportSummary) -> Vec<String> {
        if ctx.status(StepKind::Index) != Some(StepStatus::Succeeded) {
            return vec![REC_FIX_INDEX.to_string()];
        }

        let mut recs: Vec<&str> = Vec::new();
        let high_or_critical: usize = summary
            .finding_counts_by_severity
            .iter()
            .filter(|(severity, _)| severity.is_high_or_critical())
            .map(|(_, n)| n)
            .sum();

        match ctx.status(StepKind::StaticAnalysis) {
            Some(StepStatus::Succeeded) => {
                if high_or_critical > 0 {
                    recs.push(REC_REVIEW_HIGH);
                }
                if summary.total_findings > high_or_critical {
                    recs.push(REC_TRIAGE_FINDINGS);
                }
            }
            Some(StepStatus::Skipped) => recs.push(REC_INSTALL_ANALYZER),
            Some(StepStatus::Failed) | Some(StepStatus::TimedOut) => recs.push(REC_RERUN_ANALYZER),
            _ => {}
        }

        if let Some(step) = ctx.step(StepKind::DynamicAnalysis) {
            match (step.status, step.failure) {
                (StepStatus::Succeeded, _) => recs.push(REC_COVERAGE),
                (StepStatus::Failed, Some(FailureKind::BuildFailed)) => recs.push(REC_FIX_BUILD),
                (StepStatus::Failed, _) => recs.push(REC_FAILING_TESTS),
                (StepStatus::Skipped, Some(FailureKind::ToolMissing)) => {
                    recs.push(REC_INSTALL_TESTER)
                }
                (StepStatus::TimedOut, _) => recs.push(REC_DYNAMIC_TIMEOUT),
                _ => {}
            }
        }

        if ctx.status(StepKind::DependencyGraph) == Some(StepStatus::Succeeded) {
            if summary.cycles_found > 0 {
                recs.push(REC_BREAK_CYCLES);
            }
            if summary.external_dependency_count > 0 {
                recs.push(REC_EXTERNAL_DEPS);
            }
        }

        recs.push(REC_ACCESS_CONTROL);
        recs.push(REC_UPGRADES);
        recs.into_iter().map(str::to_string).collect()
    }

    /// Finish the aggregate step and build the report
    pub fn aggregate(&self, ctx: &mut PipelineContext, started_at: DateTime<Utc>) -> AuditReport {
        ctx.begin(StepKind::Aggregate);
        let summary = Self::summarize(ctx);
        ctx.complete(
            StepKind::Aggregate,
            StepStatus::Succeeded,
            format!(
                "{} findings, {} cycles, {} external dependencies",
                summary.total_findings, summary.cycles_found, summary.external_dependency_count
            ),
            format!("{} recommendations", summary.recommendations.len()),
        );

        let (status, failed_stage) = Self::status(ctx.steps());
        AuditReport {
            started_at,
            completed_at: Utc::now(),
            status,
            failed_stage,
            project_root: ctx.project_root.clone(),
            source_root: ctx.source_root.clone(),
            steps: ctx.steps().to_vec(),
            index: ctx.index.clone(),
            dependency_graph: ctx.dependency_graph.clone(),
            fetch: ctx.fetch.clone(),
            summary,
            report_path: self.report_path.clone(),
        }
    }

    /// Persist atomically; a write failure is noted on the aggregate step
    pub fn persist(&self, report: &mut AuditReport) {
        if let Err(e) = report.save() {
            log::error!("Failed to write report {}: {}", report.report_path.display(), e);
            if let Some(step) = report.steps.iter_mut().find(|s| s.kind == StepKind::Aggregate) {
                step.message = Some(format!("report not persisted: {}", e));
            }
        } else {
            log::info!("Audit report written to {}", report.report_path.display());
        }
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
