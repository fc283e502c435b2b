//! Audit command implementation

use af_core::StepStatus;
use af_pipeline::{AuditReport, AuditRequest, Pipeline, ReportStatus};
use anyhow::{Context, Result};

use crate::cli::{AuditArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{load_config, parse_network, project_dir, ExitCode};

/// Execute the audit command
pub async fn execute(args: &AuditArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    let mut request = AuditRequest::new(project_dir(global));
    if !args.exclude.is_empty() {
        request = request.with_exclude(args.exclude.clone());
    }
    if let Some(runs) = args.fuzz_runs {
        request = request.with_fuzz_runs(runs);
    }
    if let Some(address) = &args.address {
        request = request.with_fetch(parse_network(&args.network)?, address.clone());
    }

    log::debug!("Audit request: {:?}", request);
    let report = pipeline.run(request).await.context("Audit failed to start")?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&report, global.verbose),
    }

    if report.status == ReportStatus::Failed {
        return Err(ExitCode(2).into());
    }
    Ok(())
}

fn status_marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Succeeded => "ok",
        StepStatus::Skipped => "skip",
        StepStatus::TimedOut => "timeout",
        StepStatus::Failed => "FAIL",
        StepStatus::Pending | StepStatus::Running => "?",
    }
}

fn print_report(report: &AuditReport, verbose: bool) {
    println!("Audit of {}", report.project_root.display());
    if report.source_root != report.project_root {
        println!("  sources: {}", report.source_root.display());
    }
    println!();

    for step in &report.steps {
        println!(
            "  [{:>7}] {:<17} {:>6}ms  {}",
            status_marker(step.status),
            step.kind.as_str(),
            step.duration_ms,
            step.message.as_deref().unwrap_or("")
        );
        if verbose {
            for phase in &step.phases {
                println!(
                    "            {:<8} {:?}{}",
                    phase.phase,
                    phase.status,
                    phase
                        .message
                        .as_deref()
                        .map(|m| format!(" ({})", m))
                        .unwrap_or_default()
                );
            }
        }
    }

    let summary = &report.summary;
    println!();
    println!("Findings: {}", summary.total_findings);
    for (severity, count) in &summary.finding_counts_by_severity {
        if *count > 0 {
            println!("  {:?}: {}", severity, count);
        }
    }
    match summary.tests {
        Some(tests) => println!(
            "Tests: {} passed, {} failed, {} skipped",
            tests.passed, tests.failed, tests.skipped
        ),
        None => println!("Tests: not run"),
    }
    println!(
        "Dependency graph: {} cycles, {} external dependencies",
        summary.cycles_found, summary.external_dependency_count
    );
    if let Some(index) = &report.index {
        println!(
            "Index: {} ({} files, {} tokens)",
            index.path.display(),
            index.file_count,
            index.token_count
        );
    }

    println!();
    println!("Recommendations:");
    for rec in &summary.recommendations {
        println!("  - {}", rec);
    }

    println!();
    let status = match report.status {
        ReportStatus::Completed => "completed",
        ReportStatus::Partial => "partial",
        ReportStatus::Failed => "failed",
    };
    println!("Status: {}", status);
    println!("Report: {}", report.report_path.display());
}
