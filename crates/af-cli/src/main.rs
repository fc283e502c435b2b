//! Auditflow CLI - smart contract audit pipeline

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::common::ExitCode;
use commands::{audit, check_tools, fetch, graph};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match &cli.command {
        cli::Commands::Audit(args) => audit::execute(args, &cli.global).await,
        cli::Commands::Fetch(args) => fetch::execute(args, &cli.global).await,
        cli::Commands::Graph(args) => graph::execute(args, &cli.global).await,
        cli::Commands::CheckTools => check_tools::execute(&cli.global).await,
    };

    match result {
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::exit(*code),
            None => Err(err),
        },
        Ok(()) => Ok(()),
    }
}
