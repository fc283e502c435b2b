//! Check-tools command implementation

use af_tools::{ProcessRunner, ToolAdapter};
use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::common::{load_config, ExitCode};

/// Execute the check-tools command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let runner = ProcessRunner::new(config.max_concurrent_tools);

    let mut missing = 0;
    for adapter in ToolAdapter::all(&config.tools, &runner) {
        let availability = adapter.check_available().await;
        if availability.is_available() {
            println!(
                "  ok       {:<16} {} ({})",
                availability.tool.as_str(),
                availability.binary,
                availability.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            missing += 1;
            println!(
                "  missing  {:<16} {}: {}",
                availability.tool.as_str(),
                availability.binary,
                availability.error.as_deref().unwrap_or("unavailable")
            );
        }
    }

    if missing > 0 {
        if global.verbose {
            eprintln!("Steps backed by a missing tool are recorded as skipped during an audit");
        }
        return Err(ExitCode(1).into());
    }
    Ok(())
}
