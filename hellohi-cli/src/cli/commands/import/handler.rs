//! Customer import command handler

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::time::Duration;

use super::ImportArgs;
use hellohi_cli::import::{self, ImportOptions};

pub async fn handle_import(args: ImportArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let content = fs::read(&args.csv)
        .with_context(|| format!("Failed to read import file: {}", args.csv.display()))?;

    let options = ImportOptions {
        employee_role_id: args.employee_role,
        skip: args.skip,
        delay: Duration::from_millis(args.delay_ms),
    };

    println!(
        "Importing {} (skipping {} lines)",
        args.csv.display().to_string().cyan(),
        options.skip
    );
    let summary = import::run(&session, &content, &options).await;

    for (line, error) in &summary.failed {
        println!("  {} line {}: {}", "✗".red(), line, error);
    }
    println!(
        "{} {} imported, {} failed, {} skipped",
        "Done:".bold(),
        summary.imported.len().to_string().green(),
        summary.failed.len().to_string().red(),
        summary.skipped
    );
    Ok(())
}
