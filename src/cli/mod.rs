pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "restaurant-api")]
#[command(about = "Restaurant and daily menu API")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: AppConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    #[command(about = "Run the API and diagnostics listeners (default)")]
    Serve,

    #[command(about = "Create the database tables")]
    Migrate,

    #[command(about = "Insert development users, a restaurant and a menu")]
    Seed,
}

pub async fn run(cli: Cli, build: &str) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve::handle(cli.config, build).await,
        Command::Migrate => commands::migrate::handle(cli.config).await,
        Command::Seed => commands::seed::handle(cli.config).await,
    }
}
