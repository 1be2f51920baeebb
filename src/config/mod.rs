//! Configuration management for iconbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use iconbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Assets root: {}", config.assets.root.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `ICONBOX__<section>__<key>`
//!
//! Examples:
//! - `ICONBOX__FIGMA__FILE_KEY=pHrUcun54WaijaCoojHoYi`
//! - `ICONBOX__SYNC__BATCH_SIZE=3`
//! - `ICONBOX__ASSETS__ROOT=out/icons`
//!
//! The API credential is the exception: it comes only from
//! `FIGMA_API_KEY` (or `FIGMA_TOKEN`), optionally via a `.env` file,
//! and is never read from TOML.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/iconbox.toml`.
//! This can be overridden using the `ICONBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteCount;
pub use models::{
    AssetsConfig, CatalogConfig, Config, ExportConfig, FigmaConfig, FrameEntry, IconEntry,
    SyncConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("FIGMA_API_KEY is not set; add it to the environment or a .env file")]
    MissingToken,
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`ICONBOX__*`)
    /// 2. TOML file (default: `config/iconbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails (empty catalog, colliding destinations, etc.)
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files. The token
    /// is still picked up from the environment.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        if config.figma.token.is_none() {
            config.figma.token = std::env::var("FIGMA_API_KEY")
                .ok()
                .filter(|token| !token.trim().is_empty());
        }
        validation::validate(&config)?;
        Ok(config)
    }

    /// The remote credential; absence is a fatal startup condition.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.figma
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)
    }
}
