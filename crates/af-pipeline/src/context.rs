//! Pipeline context shared between concurrently running steps

use crate::report::{FetchSummary, IndexSummary};
use af_core::{AnalysisStep, DependencyReport, FailureKind, StepKind, StepStatus};
use af_tools::ToolOutcome;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Context handle passed to each step
pub type SharedContext = Arc<Mutex<PipelineContext>>;

/// Lock the context, recovering from a poisoned mutex
pub(crate) fn lock(ctx: &SharedContext) -> MutexGuard<'_, PipelineContext> {
    ctx.lock().unwrap_or_else(|p| p.into_inner())
}

/// Accumulating state of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    steps: Vec<AnalysisStep>,
    pub project_root: PathBuf,
    pub source_root: PathBuf,
    pub index: Option<IndexSummary>,
    pub dependency_graph: Option<DependencyReport>,
    pub fetch: Option<FetchSummary>,
}

impl PipelineContext {
    /// A context with every planned step pending
    pub fn new(plan: &[StepKind], project_root: PathBuf) -> Self {
        Self {
            steps: plan.iter().map(|&kind| AnalysisStep::new(kind)).collect(),
            source_root: project_root.clone(),
            project_root,
            index: None,
            dependency_graph: None,
            fetch: None,
        }
    }

    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn step(&self, kind: StepKind) -> Option<&AnalysisStep> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    pub fn step_mut(&mut self, kind: StepKind) -> Option<&mut AnalysisStep> {
        self.steps.iter_mut().find(|s| s.kind == kind)
    }

    pub fn status(&self, kind: StepKind) -> Option<StepStatus> {
        self.step(kind).map(|s| s.status)
    }

    /// Mark a step running
    pub fn begin(&mut self, kind: StepKind) {
        log::info!("Starting {}", kind);
        if let Some(step) = self.step_mut(kind) {
            step.transition(StepStatus::Running);
        }
    }

    /// Terminate a step with its textual output and a message
    pub fn complete(
        &mut self,
        kind: StepKind,
        status: StepStatus,
        output: impl Into<String>,
        message: impl Into<String>,
    ) {
        let message = message.into();
        log::info!("{} {}: {}", kind, status, message);
        if let Some(step) = self.step_mut(kind) {
            step.output = output.into();
            step.finish(status, message);
        }
    }

    /// Record a tool adapter's outcome onto its step
    pub fn record_outcome(&mut self, kind: StepKind, outcome: ToolOutcome) {
        let Some(step) = self.step_mut(kind) else {
            return;
        };
        outcome.apply_to(step);
        match step.status {
            StepStatus::Succeeded => log::info!("{} succeeded", kind),
            status => log::warn!(
                "{} {}: {}",
                kind,
                status,
                step.message.as_deref().unwrap_or("no details")
            ),
        }
    }

    /// Skip every step that has not started, except `keep`
    pub fn skip_pending(&mut self, keep: StepKind, reason: &str) {
        for step in self.steps.iter_mut() {
            if step.kind != keep && step.status == StepStatus::Pending {
                step.finish(StepStatus::Skipped, reason);
            }
        }
    }

    /// Pipeline deadline reached: running steps time out, pending ones are
    /// skipped. `keep` stays pending so it can still run.
    pub fn interrupt(&mut self, keep: StepKind, reason: &str) {
        for step in self.steps.iter_mut() {
            match step.status {
                StepStatus::Running => {
                    step.failure = Some(FailureKind::Timeout);
                    step.finish(StepStatus::TimedOut, reason);
                }
                StepStatus::Pending if step.kind != keep => {
                    step.finish(StepStatus::Skipped, reason);
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
