//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Auditflow - smart contract audit pipeline
#[derive(Parser, Debug)]
#[command(name = "af")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full audit pipeline over a project
    Audit(AuditArgs),

    /// Fetch verified source for a deployed contract into the cache
    Fetch(FetchArgs),

    /// Print the import dependency report as JSON
    Graph(GraphArgs),

    /// Report whether the external analyzers are installed
    CheckTools,
}

/// Output formats for the audit command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// The full report as JSON
    Json,
}

/// Arguments for the audit command
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Exclusion glob (repeatable; replaces the configured globs)
    #[arg(short, long = "exclude")]
    pub exclude: Vec<String>,

    /// Fuzz runs for the dynamic analysis phase
    #[arg(long)]
    pub fuzz_runs: Option<u32>,

    /// Fetch and audit the verified source at this address
    #[arg(short, long)]
    pub address: Option<String>,

    /// Network the address lives on
    #[arg(short, long, default_value = "mainnet")]
    pub network: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Contract address (0x followed by 40 hex digits)
    #[arg(required_unless_present = "list")]
    pub address: Option<String>,

    /// Network the address lives on
    #[arg(short, long, default_value = "mainnet")]
    pub network: String,

    /// List cached entries instead of fetching
    #[arg(short, long, conflicts_with = "address")]
    pub list: bool,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Exclusion glob (repeatable; replaces the configured globs)
    #[arg(short, long = "exclude")]
    pub exclude: Vec<String>,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
