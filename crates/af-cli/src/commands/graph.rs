//! Graph command implementation

use af_core::{ContractProject, DependencyGraph};
use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, GraphArgs};
use crate::commands::common::{load_config, project_dir};

/// Execute the graph command
pub async fn execute(args: &GraphArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let overrides = (!args.exclude.is_empty()).then_some(args.exclude.as_slice());
    let exclusions = config
        .audit_exclusions(overrides)
        .context("Invalid exclusion pattern")?;

    let root = project_dir(global);
    let project = ContractProject::load(&root, &exclusions, &config.source_extensions)
        .context("Failed to load project sources")?;
    if global.verbose {
        eprintln!("Loaded {} source files from {}", project.len(), root.display());
    }

    let report = DependencyGraph::build(&project, &exclusions).report();
    let json = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("Failed to encode dependency report")?;
    println!("{}", json);

    if global.verbose {
        for pair in &report.cycles {
            eprintln!("cycle: {} <-> {}", pair.0, pair.1);
        }
    }
    Ok(())
}
