use anyhow::{Context, Result};
use clap::Parser;
use once_cell::sync::Lazy;

use hellohi_cli::api::ClientManager;
use hellohi_cli::config::Config;

mod cli;

static CLIENT_MANAGER: Lazy<ClientManager> = Lazy::new(ClientManager::new);

/// The process-wide session holder used by command handlers
pub fn client_manager() -> &'static ClientManager {
    &CLIENT_MANAGER
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let session_config = config
        .session_config()
        .context("Invalid connection settings")?;
    let session = client_manager()
        .open(session_config)
        .context("Failed to open HelloHi session")?;
    log::info!("Connected to {}", session.base_url());
    drop(session);

    let result = cli::run(cli.command).await;
    client_manager().close().await;
    result
}

/// `RUST_LOG` wins; otherwise warn, -v info, -vv debug
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
