//! Dossier file commands: upload, download

pub mod handler;

use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub customer_id: String,

    /// Dossier directory to store the file in
    pub directory_id: String,

    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Display name (defaults to the file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Dossier item status
    #[arg(long)]
    pub status: String,

    /// Fiscal year the document belongs to
    #[arg(long)]
    pub year: Option<i32>,

    /// Period within the year, e.g. `Q1`
    #[arg(long)]
    pub period: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    pub dossier_item_id: String,

    /// Where to write the file
    #[arg(value_hint = ValueHint::FilePath)]
    pub out_file: PathBuf,
}
