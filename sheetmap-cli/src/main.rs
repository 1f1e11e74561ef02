use anyhow::{Context, Result};
use clap::Parser;

mod cli;

use cli::{Cli, Commands};
use sheetmap::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load().context("Failed to load configuration")?;
    log::debug!("Staging uploads in {}", config.staging_root.display());

    match cli.command {
        Commands::Preview(args) => {
            cli::commands::preview::handle_preview_command(args, &config).await
        }
        Commands::Apply(args) => cli::commands::apply::handle_apply_command(args, &config).await,
    }
}
