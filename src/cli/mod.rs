//! Command-line interface for gateway diagnostics.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
