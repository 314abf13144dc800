mod cli;
mod commands;
mod config;

use clap::Parser;
use hondana_storage::FilesystemStorage;

use crate::cli::Commands;
use crate::commands::{handle_download_command, handle_library_command};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let root = cli.root.unwrap_or_else(config::default_storage_root);
    let storage = FilesystemStorage::new(&root);
    tracing::debug!(root = %root.display(), "using storage root");

    match cli.command {
        Commands::Download { manifest } => {
            handle_download_command(&manifest, storage).await?;
        }
        Commands::Library { command } => {
            handle_library_command(command, &storage).await?;
        }
    }

    Ok(())
}
