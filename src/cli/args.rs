//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Sngate - MQTT-SN edge gateway adaptation core.
#[derive(Parser)]
#[command(name = "sngate")]
#[command(version)]
#[command(about = "MQTT-SN gateway configuration and alias diagnostics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a gateway configuration file
    Check(CheckArgs),

    /// Print the provisioned predefined alias table
    Aliases(AliasesArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the gateway configuration (TOML or JSON)
    #[arg(long, default_value = "config/sngate.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct AliasesArgs {
    /// Path to the gateway configuration (TOML or JSON)
    #[arg(long, default_value = "config/sngate.toml")]
    pub config: PathBuf,
}
