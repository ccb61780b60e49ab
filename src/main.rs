//! Sngate - unified CLI entrypoint.
//!
//! Usage:
//!   sngate check --config config/sngate.toml
//!   sngate aliases --config config/sngate.toml

use anyhow::Result;
use clap::Parser;
use sngate::cli::commands::{run_aliases, run_check};
use sngate::cli::{Cli, Commands};
use sngate::telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_handle = telemetry::init_tracing(std::env::var("SNGATE_LOG").ok().as_deref())?;

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Aliases(args) => run_aliases(args),
    }
}
