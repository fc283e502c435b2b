//! The audit pipeline orchestrator
//!
//! Step order: `fetch` (optional) -> `index` -> {`static_analysis` ||
//! `dependency_graph`} -> `dynamic_analysis` -> `aggregate`. Only index
//! failure halts the run; every other failure is recorded and the run moves
//! on. The whole run is bounded by the configured pipeline timeout.

use crate::aggregate::ReportAggregator;
use crate::context::{lock, PipelineContext, SharedContext};
use crate::error::{PipelineError, PipelineResult};
use crate::index::{DefaultIndexGenerator, IndexGenerator, IndexRequest};
use crate::report::{AuditReport, FetchSummary, IndexSummary};
use crate::request::{AuditRequest, FetchRequest};
use crate::tokens::{default_counter, TokenCounter};
use af_cache::{normalize_address, ChainDataProvider, ContractCache, EtherscanProvider};
use af_core::{
    write_atomic, Config, ContractProject, DependencyGraph, ExclusionSet, StepKind, StepStatus,
};
use af_tools::{DynamicTester, InvokeOptions, ProcessRunner, StaticAnalyzer, ToolAdapter};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Validated inputs for one run
#[derive(Debug)]
struct RunPlan {
    project_root: PathBuf,
    exclusions: ExclusionSet,
    options: InvokeOptions,
    fetch: Option<FetchRequest>,
}

/// Runs audits with one configuration and set of collaborators
pub struct Pipeline {
    config: Config,
    static_analyzer: ToolAdapter,
    dynamic_tester: ToolAdapter,
    index_generator: Arc<dyn IndexGenerator>,
    token_counter: Arc<dyn TokenCounter>,
    provider: Option<Arc<dyn ChainDataProvider>>,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration
    pub fn new(config: Config) -> PipelineResult<Self> {
        config.validate()?;
        let runner = ProcessRunner::new(config.max_concurrent_tools);
        Ok(Self {
            static_analyzer: ToolAdapter::StaticAnalyzer(StaticAnalyzer::new(
                config.tools.static_analyzer.clone(),
                runner.clone(),
            )),
            dynamic_tester: ToolAdapter::DynamicTester(DynamicTester::new(
                config.tools.dynamic_tester.clone(),
                runner.clone(),
            )),
            index_generator: Arc::new(DefaultIndexGenerator::from_config(&config.index, &runner)),
            token_counter: default_counter(),
            provider: None,
            config,
        })
    }

    pub fn with_index_generator(mut self, generator: Arc<dyn IndexGenerator>) -> Self {
        self.index_generator = generator;
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    /// Use `provider` instead of building the Etherscan client from config
    pub fn with_provider(mut self, provider: Arc<dyn ChainDataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one audit.
    ///
    /// Returns `Err` only for configuration problems detected before any step
    /// runs. Otherwise a report is always returned and persisted, even when
    /// index generation failed or the deadline expired.
    pub async fn run(&self, request: AuditRequest) -> PipelineResult<AuditReport> {
        let started_at = Utc::now();
        let plan = self.plan(request)?;
        log::info!("Auditing {}", plan.project_root.display());

        let mut steps = Vec::new();
        if plan.fetch.is_some() {
            steps.push(StepKind::Fetch);
        }
        steps.extend([
            StepKind::Index,
            StepKind::StaticAnalysis,
            StepKind::DependencyGraph,
            StepKind::DynamicAnalysis,
            StepKind::Aggregate,
        ]);
        let ctx = PipelineContext::new(&steps, plan.project_root.clone()).into_shared();

        let budget = self.config.pipeline_timeout();
        let deadline = tokio::time::Instant::now() + budget;
        if tokio::time::timeout_at(deadline, self.execute(&plan, &ctx))
            .await
            .is_err()
        {
            log::warn!("Pipeline exceeded its {}s budget", budget.as_secs());
            lock(&ctx).interrupt(
                StepKind::Aggregate,
                &format!("pipeline timeout of {}s exceeded", budget.as_secs()),
            );
        }

        let aggregator = ReportAggregator::new(self.config.report_path(&plan.project_root));
        let mut report = aggregator.aggregate(&mut lock(&ctx), started_at);
        aggregator.persist(&mut report);
        Ok(report)
    }

    /// Validate the request against the configuration
    fn plan(&self, request: AuditRequest) -> PipelineResult<RunPlan> {
        if !request.project_root.is_dir() {
            return Err(PipelineError::ProjectNotFound {
                path: request.project_root,
            });
        }
        let project_root = request
            .project_root
            .canonicalize()
            .unwrap_or(request.project_root);

        let exclusions = self.config.audit_exclusions(request.exclude.as_deref())?;

        if let Some(fetch) = &request.fetch {
            normalize_address(&fetch.address).map_err(|e| PipelineError::InvalidFetchRequest {
                message: e.to_string(),
            })?;
        }

        Ok(RunPlan {
            project_root,
            exclusions,
            options: InvokeOptions {
                fuzz_runs: request.fuzz_runs.unwrap_or(self.config.fuzz_runs),
            },
            fetch: request.fetch,
        })
    }

    async fn execute(&self, plan: &RunPlan, ctx: &SharedContext) {
        let source_root = match &plan.fetch {
            Some(fetch) => self
                .fetch_step(fetch, &plan.project_root, ctx)
                .await
                .unwrap_or_else(|| plan.project_root.clone()),
            None => plan.project_root.clone(),
        };
        lock(ctx).source_root = source_root.clone();

        let Some(project) = self.index_step(&source_root, plan, ctx).await else {
            lock(ctx).skip_pending(StepKind::Aggregate, "index generation failed");
            return;
        };

        tokio::join!(
            self.tool_step(StepKind::StaticAnalysis, &self.static_analyzer, &source_root, plan, ctx),
            self.graph_step(project, plan.exclusions.clone(), ctx),
        );

        self.tool_step(
            StepKind::DynamicAnalysis,
            &self.dynamic_tester,
            &source_root,
            plan,
            ctx,
        )
        .await;
    }

    /// Fetch verified source; returns the cached source tree on success
    async fn fetch_step(
        &self,
        fetch: &FetchRequest,
        project_root: &Path,
        ctx: &SharedContext,
    ) -> Option<PathBuf> {
        lock(ctx).begin(StepKind::Fetch);

        let provider = match &self.provider {
            Some(provider) => Arc::clone(provider),
            None => match EtherscanProvider::from_config(&self.config.chain) {
                Ok(provider) => Arc::new(provider),
                Err(e) => {
                    lock(ctx).complete(StepKind::Fetch, StepStatus::Failed, "", e.to_string());
                    return None;
                }
            },
        };

        let cache = ContractCache::new(self.config.cache_dir_absolute(project_root), provider);
        match cache.fetch(fetch.network, &fetch.address).await {
            Ok(entry) => {
                let meta = entry.metadata();
                let summary = FetchSummary {
                    network: meta.network,
                    address: meta.address.clone(),
                    contract_name: meta.contract_name.clone(),
                    compiler_version: meta.compiler_version.clone(),
                    cache_entry: entry.dir().to_path_buf(),
                    file_count: meta.files.len(),
                };
                let mut guard = lock(ctx);
                guard.complete(
                    StepKind::Fetch,
                    StepStatus::Succeeded,
                    meta.files.join("\n"),
                    format!(
                        "{} ({} files) from {}",
                        meta.contract_name,
                        meta.files.len(),
                        meta.network
                    ),
                );
                guard.fetch = Some(summary);
                Some(entry.sources_dir())
            }
            Err(e) => {
                lock(ctx).complete(StepKind::Fetch, StepStatus::Failed, "", e.to_string());
                None
            }
        }
    }

    /// Load sources and write the index. `None` means the run must halt.
    async fn index_step(
        &self,
        source_root: &Path,
        plan: &RunPlan,
        ctx: &SharedContext,
    ) -> Option<ContractProject> {
        lock(ctx).begin(StepKind::Index);

        let root = source_root.to_path_buf();
        let exclusions = plan.exclusions.clone();
        let extensions = self.config.source_extensions.clone();
        let loaded =
            tokio::task::spawn_blocking(move || ContractProject::load(&root, &exclusions, &extensions))
                .await;
        let project = match loaded {
            Ok(Ok(project)) => project,
            Ok(Err(e)) => {
                lock(ctx).complete(StepKind::Index, StepStatus::Failed, "", e.to_string());
                return None;
            }
            Err(e) => {
                let message = format!("source discovery aborted: {}", e);
                lock(ctx).complete(StepKind::Index, StepStatus::Failed, "", message);
                return None;
            }
        };

        let request = IndexRequest {
            source_root: source_root.to_path_buf(),
            index_file: self.config.index_file.clone(),
        };
        let index = match self.index_generator.generate(&project, &request).await {
            Ok(index) => index,
            Err(e) => {
                lock(ctx).complete(StepKind::Index, StepStatus::Failed, "", e.to_string());
                return None;
            }
        };

        let path = self.config.index_path(&plan.project_root);
        if let Err(e) = write_atomic(&path, index.content.as_bytes()) {
            lock(ctx).complete(StepKind::Index, StepStatus::Failed, "", e.to_string());
            return None;
        }

        let summary = IndexSummary {
            path: path.clone(),
            method: index.method,
            file_count: project.len(),
            token_count: self.token_counter.count(&index.content),
            token_counter: self.token_counter.name().to_string(),
            fallback_reason: index.fallback_reason,
        };
        let message = format!(
            "{} files indexed, {} tokens, written to {}",
            summary.file_count,
            summary.token_count,
            path.display()
        );

        let mut guard = lock(ctx);
        guard.complete(StepKind::Index, StepStatus::Succeeded, project.paths().join("\n"), message);
        guard.index = Some(summary);
        drop(guard);
        Some(project)
    }

    async fn tool_step(
        &self,
        kind: StepKind,
        adapter: &ToolAdapter,
        source_root: &Path,
        plan: &RunPlan,
        ctx: &SharedContext,
    ) {
        lock(ctx).begin(kind);
        let outcome = adapter.invoke(source_root, &plan.options).await;
        lock(ctx).record_outcome(kind, outcome);
    }

    /// Build the dependency graph on the blocking pool
    async fn graph_step(&self, project: ContractProject, exclusions: ExclusionSet, ctx: &SharedContext) {
        lock(ctx).begin(StepKind::DependencyGraph);

        let built = tokio::task::spawn_blocking(move || {
            DependencyGraph::build(&project, &exclusions).report()
        })
        .await;

        let mut guard = lock(ctx);
        match built {
            Ok(report) => {
                let output = serde_json::to_string_pretty(&report).unwrap_or_default();
                let message = format!(
                    "{} files, {} edges, {} cycles, {} external dependencies",
                    report.nodes.len(),
                    report.edges.len(),
                    report.cycles.len(),
                    report.external_dependencies.len()
                );
                guard.complete(StepKind::DependencyGraph, StepStatus::Succeeded, output, message);
                guard.dependency_graph = Some(report);
            }
            Err(e) => {
                guard.complete(
                    StepKind::DependencyGraph,
                    StepStatus::Failed,
                    "",
                    format!("graph construction aborted: {}", e),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
