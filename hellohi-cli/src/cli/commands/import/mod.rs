//! Customer import command

pub mod handler;

use clap::{Args, ValueHint};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Semicolon separated export with a header line
    #[arg(value_hint = ValueHint::FilePath)]
    pub csv: PathBuf,

    /// Role id given to each person on the customer's employee list
    #[arg(long)]
    pub employee_role: String,

    /// Data lines to skip after the header, to resume an earlier run
    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    /// Pause between lines in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,
}
