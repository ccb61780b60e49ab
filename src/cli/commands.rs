//! Diagnostic command implementations.

use crate::cli::args::{AliasesArgs, CheckArgs};
use crate::core::config::GatewayConfig;
use crate::mqttsn::registry::PredefinedAliasTable;
use anyhow::{Context, Result};

pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = GatewayConfig::load(&args.config)?;
    config.validate()?;
    let table = PredefinedAliasTable::from_entries(config.predefined_entries())
        .context("predefined alias table rejected")?;
    println!(
        "config ok: gateway id {}, {} predefined aliases",
        config.gateway.gateway_id,
        table.len()
    );
    Ok(())
}

pub fn run_aliases(args: AliasesArgs) -> Result<()> {
    let config = GatewayConfig::load(&args.config)?;
    config.validate()?;
    let table = PredefinedAliasTable::from_entries(config.predefined_entries())
        .context("predefined alias table rejected")?;
    if table.is_empty() {
        println!("no predefined aliases provisioned");
        return Ok(());
    }
    let mut rows: Vec<_> = table.iter().collect();
    rows.sort_by_key(|alias| alias.alias_id());
    for alias in rows {
        println!("{:>5}  {}", alias.alias_id(), alias.topic_name());
    }
    Ok(())
}
