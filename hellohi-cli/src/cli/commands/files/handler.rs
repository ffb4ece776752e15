//! Dossier file command handlers

use anyhow::{Context, Result};
use colored::*;

use super::{DownloadArgs, UploadArgs};
use crate::cli::commands::print_json;
use hellohi_cli::api::{DossierItemUpload, FileUpload};

pub async fn handle_upload(args: UploadArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    if !args.file.is_file() {
        anyhow::bail!("File does not exist: {}", args.file.display());
    }
    let file = FileUpload::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let name = args.name.unwrap_or_else(|| file.file_name.clone());
    let upload = DossierItemUpload {
        customer_id: args.customer_id,
        directory_id: args.directory_id,
        name: name.clone(),
        status: args.status,
        original_filename: Some(file.file_name.clone()),
        file,
        year: args.year,
        period: args.period,
        created_at: None,
    };

    let response = session
        .upload_dossier_item(upload)
        .await
        .context("Failed to upload dossier item")?;

    print_json(&response)?;
    eprintln!("{} Uploaded {}", "✓".green(), name.bold());
    Ok(())
}

pub async fn handle_download(args: DownloadArgs) -> Result<()> {
    let session = crate::client_manager().session()?;

    let bytes = session
        .download_dossier_item(&args.dossier_item_id)
        .await
        .with_context(|| format!("Failed to download dossier item {}", args.dossier_item_id))?;

    tokio::fs::write(&args.out_file, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", args.out_file.display()))?;

    eprintln!(
        "{} Saved {} bytes to {}",
        "✓".green(),
        bytes.len(),
        args.out_file.display().to_string().cyan()
    );
    Ok(())
}
