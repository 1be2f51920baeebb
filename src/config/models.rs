use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::figma::{ClientConfig, ExportFormat, NodeId};
use crate::humanize::ByteCount;
use crate::scheduler::BatchOptions;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub figma: FigmaConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Remote API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FigmaConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Design file to synchronize from
    #[serde(default)]
    pub file_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub export: ExportConfig,
    /// Personal access token (loaded from environment, never from TOML)
    #[serde(skip)]
    pub token: Option<String>,
}

/// Export rendering options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Keep element ids in SVG exports
    #[serde(default)]
    pub svg_include_ids: bool,
    /// Render with the node's absolute bounding box
    #[serde(default)]
    pub use_absolute_bounds: bool,
}

/// Scheduler and download settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_max_asset_size")]
    pub max_asset_size: ByteCount,
}

/// Local output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
    #[serde(default = "default_assets_root")]
    pub root: PathBuf,
}

/// Declarative listing of what to synchronize.
///
/// One structure passed explicitly through the run; replaces the
/// per-script hardcoded id tables of older tooling.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Individually pinned icons
    #[serde(default)]
    pub icons: Vec<IconEntry>,
    /// Frames whose component children are synchronized wholesale
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IconEntry {
    pub node_id: NodeId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FrameEntry {
    pub node_id: NodeId,
    pub category: String,
}

impl Default for FigmaConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            file_key: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            export: ExportConfig::default(),
            token: None,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            scale: default_scale(),
            svg_include_ids: false,
            use_absolute_bounds: false,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            max_asset_size: default_max_asset_size(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_assets_root(),
        }
    }
}

impl FigmaConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base.clone(),
            file_key: self.file_key.clone(),
            request_timeout: self.request_timeout(),
            svg_include_ids: self.export.svg_include_ids,
            use_absolute_bounds: self.export.use_absolute_bounds,
        }
    }
}

impl SyncConfig {
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            batch_size: self.batch_size,
            inter_batch_delay: Duration::from_millis(self.inter_batch_delay_ms),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}

fn default_api_base() -> String {
    "https://api.figma.com/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_scale() -> f32 {
    1.0
}

fn default_batch_size() -> usize {
    5
}

fn default_inter_batch_delay_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_max_asset_size() -> ByteCount {
    ByteCount(4 * 1024 * 1024) // 4 MB
}

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets/icons")
}
