//! Icon synchronization pipeline
//!
//! Drives the full run: assemble the work list from the configured
//! catalog and frames, deduplicate destinations, schedule per-item
//! workers (existence check, export-URL resolution, download,
//! minimization) in rate-limited batches, then hand the aggregated
//! outcomes to the index writer.
//!
//! Per-item failures are converted into outcome records at the worker
//! boundary; only setup failures (missing credential, unusable assets
//! root, unreachable frame listing) abort a run.

mod report;
mod types;

pub use report::SyncReport;
pub use types::{FALLBACK_CATEGORY, Outcome, OutcomeStatus, WorkItem, slugify};

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::fetch::{self, FetchError};
use crate::figma::{ExportFormat, FigmaClient, FigmaError, NodeSource};
use crate::humanize::ByteCount;
use crate::manifest::{self, Manifest, ManifestError};
use crate::optimize;
use crate::scheduler;

/// Errors that abort a whole run. Everything per-item is caught by the
/// worker and recorded as an outcome instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot prepare assets root {path}: {source}")]
    AssetsRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote listing failed: {0}")]
    Remote(#[from] FigmaError),

    #[error("cannot build download client: {0}")]
    DownloadClient(#[from] FetchError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Per-item worker failure; retried by the scheduler, then recorded.
#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Figma(#[from] FigmaError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot probe {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-invocation selection; the catalog itself comes from config.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Restrict the run to these categories; empty selects everything.
    /// Unselected items are recorded as skipped, not dropped.
    pub categories: Vec<String>,
}

impl SyncOptions {
    fn selects(&self, category: &str) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|selected| slugify(selected) == category)
    }
}

/// One run of the pipeline over one configuration.
pub struct SyncEngine<S> {
    source: S,
    download: reqwest::Client,
    config: Config,
    run_id: Uuid,
}

impl SyncEngine<FigmaClient> {
    /// Build the engine against the real remote API. Fails fast when
    /// the credential is missing.
    pub fn from_config(config: Config) -> Result<Self, SyncError> {
        let token = config.require_token()?.to_string();
        let source = FigmaClient::new(config.figma.client_config(), &token)?;
        Self::with_source(config, source)
    }
}

impl<S: NodeSource> SyncEngine<S> {
    pub fn with_source(config: Config, source: S) -> Result<Self, SyncError> {
        let download = fetch::download_client(config.figma.request_timeout())?;
        Ok(Self {
            source,
            download,
            config,
            run_id: Uuid::new_v4(),
        })
    }

    /// Execute one synchronization run to completion.
    ///
    /// Always produces one outcome per work item and writes the
    /// manifest, even when individual items fail.
    pub async fn run(&self, options: &SyncOptions) -> Result<(SyncReport, Manifest), SyncError> {
        let started_at = chrono::Utc::now();
        let assets_root = self.config.assets.root.clone();

        info!(
            run_id = %self.run_id,
            assets_root = %assets_root.display(),
            "starting icon sync"
        );

        fetch::ensure_dir(&assets_root)
            .await
            .map_err(|source| SyncError::AssetsRoot {
                path: assets_root.clone(),
                source,
            })?;

        let (items, duplicates_dropped) = self.collect_items().await?;
        info!(
            items = items.len(),
            duplicates_dropped, "work list assembled"
        );

        let format = self.config.figma.export.format;
        let (selected, unselected): (Vec<WorkItem>, Vec<WorkItem>) = items
            .into_iter()
            .partition(|item| options.selects(&item.category));

        let skipped: Vec<Outcome> = unselected
            .into_iter()
            .map(|item| {
                let path = item.relative_path(format);
                Outcome::skipped(item, path)
            })
            .collect();

        let batch_options = self.config.sync.batch_options();
        let scheduled = selected.clone();
        let results =
            scheduler::run_batches(selected, |item| self.process_item(item), &batch_options).await;

        let mut outcomes: Vec<Outcome> = scheduled
            .into_iter()
            .zip(results)
            .map(|(item, result)| match result {
                Ok(outcome) => outcome,
                Err(error) => {
                    let path = item.relative_path(format);
                    Outcome::failed(item, path, error.to_string())
                }
            })
            .collect();
        outcomes.extend(skipped);

        let report = SyncReport {
            run_id: self.run_id,
            outcomes,
            duplicates_dropped,
            started_at,
            finished_at: chrono::Utc::now(),
        };

        let manifest = manifest::build_manifest(&report.outcomes, report.finished_at);
        manifest::write_manifest(&assets_root, &manifest).await?;
        manifest::write_failures(&assets_root, &report.failure_records()).await?;

        report.log_summary();

        Ok((report, manifest))
    }

    /// Assemble the work list: pinned catalog icons plus the component
    /// children of every configured frame. Destinations are unique by
    /// construction afterwards, so no two concurrent workers can ever
    /// target the same path.
    async fn collect_items(&self) -> Result<(Vec<WorkItem>, usize), SyncError> {
        let mut items: Vec<WorkItem> = Vec::new();

        for entry in &self.config.catalog.icons {
            items.push(WorkItem::new(
                entry.node_id.clone(),
                &entry.name,
                entry.category.as_deref().unwrap_or(""),
            ));
        }

        for frame in &self.config.catalog.frames {
            // a dead frame means the catalog is wrong, not one icon:
            // treat like any other unreachable root listing
            let components = self.source.list_frame_components(&frame.node_id).await?;
            debug!(
                frame = %frame.node_id,
                category = %frame.category,
                found = components.len(),
                "frame listed"
            );

            for component in components {
                items.push(WorkItem::new(component.id, &component.name, &frame.category));
            }
        }

        let mut seen_nodes: HashSet<_> = HashSet::new();
        let mut seen_destinations: HashSet<(String, String)> = HashSet::new();
        let mut dropped = 0usize;

        items.retain(|item| {
            let fresh_node = seen_nodes.insert(item.node_id.clone());
            let fresh_destination =
                seen_destinations.insert((item.category.clone(), item.name.clone()));

            if fresh_node && fresh_destination {
                true
            } else {
                warn!(
                    node_id = %item.node_id,
                    name = %item.name,
                    category = %item.category,
                    "duplicate work item dropped"
                );
                dropped += 1;
                false
            }
        });

        Ok((items, dropped))
    }

    /// The per-item worker: skip present files, otherwise resolve the
    /// export URL, download, and minimize. Runs inside the scheduler's
    /// retry loop, so every error returned here is retryable.
    async fn process_item(&self, item: WorkItem) -> Result<Outcome, ItemError> {
        let export = &self.config.figma.export;
        let relative = item.relative_path(export.format);
        let dest = self.config.assets.root.join(&relative);

        let present = tokio::fs::try_exists(&dest)
            .await
            .map_err(|source| ItemError::Probe {
                path: dest.clone(),
                source,
            })?;
        if present {
            debug!(path = %relative, "already satisfied");
            return Ok(Outcome::exists(item, relative));
        }

        let url = self
            .source
            .resolve_export_url(&item.node_id, export.format, export.scale)
            .await?;

        let bytes_written = fetch::fetch_to_file(
            &self.download,
            &url,
            &dest,
            self.config.sync.max_asset_size,
        )
        .await?;

        if export.format == ExportFormat::Svg {
            self.minimize_in_place(&dest).await;
        }

        info!(
            name = %item.name,
            category = %item.category,
            size = %ByteCount(bytes_written),
            "icon downloaded"
        );

        Ok(Outcome::downloaded(item, relative, bytes_written))
    }

    /// Rewrite a downloaded SVG in its canonical minimized form.
    /// Never fails the item: on any trouble the raw content stays.
    async fn minimize_in_place(&self, dest: &std::path::Path) {
        let raw = match tokio::fs::read_to_string(dest).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(path = %dest.display(), %error, "cannot read back download, keeping raw content");
                return;
            }
        };

        match optimize::optimize(&raw) {
            Ok(minimized) if minimized != raw => {
                match tokio::fs::write(dest, &minimized).await {
                    Ok(()) => debug!(
                        path = %dest.display(),
                        before = raw.len(),
                        after = minimized.len(),
                        "svg minimized"
                    ),
                    Err(error) => {
                        warn!(path = %dest.display(), %error, "cannot persist minimized svg, keeping raw content");
                    }
                }
            }
            Ok(_) => {}
            Err(error) => {
                warn!(path = %dest.display(), %error, "optimization failed, keeping raw content");
            }
        }
    }
}
