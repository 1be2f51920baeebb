use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "iconbox")]
#[command(about = "Figma icon sync CLI", long_about = None)]
pub struct Cli {
    /// Configuration file (default: config/iconbox.toml or $ICONBOX_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize the configured catalog into the local assets tree
    Sync(SyncArgs),
    /// Report catalog icons missing from the local assets tree
    Check,
    /// List the components found under each configured frame
    List,
}

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Only synchronize the given category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,
}
