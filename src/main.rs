mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use iconbox::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match cli.config.clone() {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Sync(args) => commands::sync(config, &args).await?,
        Commands::Check => commands::check(&config).await?,
        Commands::List => commands::list(config).await?,
    }

    Ok(())
}
