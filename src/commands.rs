//! Subcommand implementations for the iconbox binary

use tracing::{info, warn};

use iconbox::config::Config;
use iconbox::figma::{FigmaClient, NodeId, NodeSource};
use iconbox::sync::{SyncEngine, SyncOptions, WorkItem};

use crate::cli::SyncArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One-shot synchronization run.
///
/// Per-item failures are reported in the summary and the manifest;
/// only setup failures propagate and turn into a non-zero exit.
pub async fn sync(config: Config, args: &SyncArgs) -> Result<(), AnyError> {
    let engine = SyncEngine::from_config(config)?;
    let options = SyncOptions {
        categories: args.categories.clone(),
    };

    let (report, _manifest) = engine.run(&options).await?;

    if report.has_failures() {
        warn!(
            failed = report.failure_records().len(),
            "run completed with failures; rerun to pick up missing items"
        );
    }

    Ok(())
}

/// Offline check of the pinned catalog against the assets tree.
pub async fn check(config: &Config) -> Result<(), AnyError> {
    let format = config.figma.export.format;
    let mut present = 0usize;
    let mut missing = 0usize;

    for entry in &config.catalog.icons {
        let item = WorkItem::new(
            entry.node_id.clone(),
            &entry.name,
            entry.category.as_deref().unwrap_or(""),
        );
        let relative = item.relative_path(format);

        if tokio::fs::try_exists(config.assets.root.join(&relative)).await? {
            present += 1;
        } else {
            missing += 1;
            warn!(path = %relative, node_id = %item.node_id, "icon missing locally");
        }
    }

    if !config.catalog.frames.is_empty() {
        info!(
            frames = config.catalog.frames.len(),
            "frame-sourced icons are not checked offline; run `iconbox sync` to resolve them"
        );
    }

    info!(present, missing, "catalog check finished");
    Ok(())
}

/// List the remote contents of the configured catalog: metadata for
/// every pinned icon, components for every frame.
pub async fn list(config: Config) -> Result<(), AnyError> {
    let token = config.require_token()?.to_string();
    let client = FigmaClient::new(config.figma.client_config(), &token)?;

    if !config.catalog.icons.is_empty() {
        let ids: Vec<NodeId> = config
            .catalog
            .icons
            .iter()
            .map(|entry| entry.node_id.clone())
            .collect();

        for node in client.resolve_nodes(&ids).await? {
            info!(
                node_id = %node.id,
                name = %node.name,
                kind = %node.kind,
                description = %node.description,
                "pinned icon"
            );
        }
    }

    for frame in &config.catalog.frames {
        let components = client.list_frame_components(&frame.node_id).await?;
        info!(
            frame = %frame.node_id,
            category = %frame.category,
            count = components.len(),
            "frame contents"
        );

        for component in components {
            info!(
                node_id = %component.id,
                name = %component.name,
                kind = %component.kind,
                "component"
            );
        }
    }

    Ok(())
}
