mod block;
mod config;
mod fact;
mod message;
mod record;
mod show;
mod utils;

use anyhow::Result;
use moodmem_core::Storage;

use crate::cli::Commands;
use crate::config::CliConfig;
use crate::output::OutputFormat;

pub async fn run(
    storage: &Storage,
    config: &CliConfig,
    command: Commands,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Commands::Record { input } => record::run(storage, &input, format).await,
        Commands::Message { command } => message::run(storage, command, format),
        Commands::Fact { command } => fact::run(storage, command, format),
        Commands::Block(args) => block::run(storage, config, args, format).await,
        Commands::Show { command } => show::run(storage, config, command, format).await,
        Commands::Config { command } => config::run(storage, command, format),
        // Handled before storage is opened
        Commands::Completions { .. } => Ok(()),
    }
}
