use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "ICONBOX_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/iconbox.toml";
const ENV_PREFIX: &str = "ICONBOX";
const ENV_SEPARATOR: &str = "__";

const TOKEN_ENV_VAR: &str = "FIGMA_API_KEY";
const TOKEN_ENV_VAR_ALT: &str = "FIGMA_TOKEN";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;
    load_secrets(&mut config);

    Ok(config)
}

/// Load the API credential from the environment into config.
/// The token is never stored in TOML files, only in the environment.
fn load_secrets(config: &mut Config) {
    let token = env::var(TOKEN_ENV_VAR)
        .or_else(|_| env::var(TOKEN_ENV_VAR_ALT))
        .ok()
        .filter(|token| !token.trim().is_empty());

    config.figma.token = token;
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Environment variable overrides
    // ICONBOX__SYNC__BATCH_SIZE -> sync.batch_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
