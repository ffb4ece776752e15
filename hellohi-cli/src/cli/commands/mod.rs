//! Subcommand arguments and handlers

pub mod entity;
pub mod files;
pub mod import;

use anyhow::{Context, Result};
use serde::Serialize;

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
