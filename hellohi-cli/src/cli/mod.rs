//! Command line interface

pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::entity::{CreateArgs, DeleteArgs, GetArgs, ListArgs, SearchArgs, UpdateArgs};
use commands::files::{DownloadArgs, UploadArgs};
use commands::import::ImportArgs;

#[derive(Parser)]
#[command(name = "hellohi-cli")]
#[command(version, about = "Work with HelloHi tenant data from the command line", long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/hellohi/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one record
    Get(GetArgs),
    /// List a page of records
    List(ListArgs),
    /// Search records by attribute
    Search(SearchArgs),
    /// Create a record from a JSON object
    Create(CreateArgs),
    /// Update a record with a JSON object
    Update(UpdateArgs),
    /// Delete a record
    Delete(DeleteArgs),
    /// Upload a file to a customer's dossier
    Upload(UploadArgs),
    /// Download a dossier item
    Download(DownloadArgs),
    /// Import customers and persons from a semicolon separated export
    Import(ImportArgs),
}

pub async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Get(args) => commands::entity::handler::handle_get(args).await,
        Commands::List(args) => commands::entity::handler::handle_list(args).await,
        Commands::Search(args) => commands::entity::handler::handle_search(args).await,
        Commands::Create(args) => commands::entity::handler::handle_create(args).await,
        Commands::Update(args) => commands::entity::handler::handle_update(args).await,
        Commands::Delete(args) => commands::entity::handler::handle_delete(args).await,
        Commands::Upload(args) => commands::files::handler::handle_upload(args).await,
        Commands::Download(args) => commands::files::handler::handle_download(args).await,
        Commands::Import(args) => commands::import::handler::handle_import(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "hellohi-cli",
            "-vv",
            "search",
            "customers",
            "name=Acme",
            "city=Utrecht",
            "--include",
            "persons,tags",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.endpoint, "customers");
                assert_eq!(
                    args.params,
                    vec![
                        ("name".to_string(), "Acme".to_string()),
                        ("city".to_string(), "Utrecht".to_string())
                    ]
                );
                assert_eq!(args.page.include, vec!["persons", "tags"]);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_rejects_malformed_search_param() {
        assert!(Cli::try_parse_from(["hellohi-cli", "search", "customers", "name"]).is_err());
    }
}
