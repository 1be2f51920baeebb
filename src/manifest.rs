//! Index writer: the persisted summary of a completed run
//!
//! `index.json` at the assets root is the single artifact downstream
//! code generators read. Each run's manifest is authoritative and
//! self-contained; it fully overwrites the previous one. Output bytes
//! are deterministic for a given outcome set so manifests diff cleanly
//! in version control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::sync::{Outcome, OutcomeStatus};

pub const MANIFEST_FILE: &str = "index.json";
pub const FAILURES_FILE: &str = "errors.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub category: String,
    /// Relative to the assets root
    pub path: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub total_count: usize,
    pub categories: BTreeMap<String, usize>,
    pub entries: Vec<ManifestEntry>,
}

/// Entry persisted to the failure sidecar when a run has errors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub name: String,
    pub category: String,
    pub node_id: String,
    pub error: String,
}

/// Aggregate outcomes into a manifest.
///
/// Error outcomes are excluded; entries are unique per
/// (category, name) and sorted by (category, name), so the result is
/// identical for any arrival order of the same outcome set.
pub fn build_manifest(outcomes: &[Outcome], generated_at: DateTime<Utc>) -> Manifest {
    let mut entries: Vec<ManifestEntry> = outcomes
        .iter()
        .filter(|outcome| !outcome.is_error())
        .map(|outcome| ManifestEntry {
            name: outcome.item.name.clone(),
            category: outcome.item.category.clone(),
            path: outcome.path.clone(),
            // an asset satisfied by a previous run reads the same as a
            // fresh download, keeping rerun manifests byte-identical
            status: match outcome.status {
                OutcomeStatus::Exists => OutcomeStatus::Downloaded,
                other => other,
            },
        })
        .collect();

    // stable sort: among duplicate (category, name) pairs the earliest
    // produced outcome survives the dedup below
    entries.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
    entries.dedup_by(|next, kept| next.category == kept.category && next.name == kept.name);

    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &entries {
        *categories.entry(entry.category.clone()).or_default() += 1;
    }

    Manifest {
        generated_at,
        total_count: entries.len(),
        categories,
        entries,
    }
}

/// Persist the manifest at the assets root, replacing any previous one.
pub async fn write_manifest(assets_root: &Path, manifest: &Manifest) -> Result<PathBuf> {
    let path = assets_root.join(MANIFEST_FILE);
    write_json(&path, manifest).await?;

    info!(
        path = %path.display(),
        total = manifest.total_count,
        categories = manifest.categories.len(),
        "manifest written"
    );

    Ok(path)
}

/// Persist the failure listing next to the manifest; removed when the
/// run had no failures so a stale listing never outlives its run.
pub async fn write_failures(assets_root: &Path, failures: &[FailureRecord]) -> Result<Option<PathBuf>> {
    let path = assets_root.join(FAILURES_FILE);

    if failures.is_empty() {
        let _ = tokio::fs::remove_file(&path).await;
        return Ok(None);
    }

    write_json(&path, failures).await?;
    info!(path = %path.display(), count = failures.len(), "failure listing written");

    Ok(Some(path))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');

    tokio::fs::write(path, body)
        .await
        .map_err(|source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        })
}
