use serde::{Deserialize, Serialize};

use crate::figma::{ExportFormat, NodeId};

pub const FALLBACK_CATEGORY: &str = "uncategorized";

/// One unit of synchronization work, immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub node_id: NodeId,
    /// Slugged filename stem
    pub name: String,
    pub category: String,
}

impl WorkItem {
    pub fn new(node_id: NodeId, name: &str, category: &str) -> Self {
        let category = slugify(category);
        Self {
            node_id,
            name: slugify(name),
            category: if category.is_empty() {
                FALLBACK_CATEGORY.to_string()
            } else {
                category
            },
        }
    }

    /// Destination path relative to the assets root, forward slashes.
    pub fn relative_path(&self, format: ExportFormat) -> String {
        format!("{}/{}.{}", self.category, self.name, format.extension())
    }
}

/// Convert a remote display name into a filename stem: lowercase,
/// non-alphanumeric runs collapsed to `-`, no leading/trailing dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Terminal state of one work item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Downloaded,
    Exists,
    Error,
    Skipped,
}

/// Result of attempting to materialize one work item.
///
/// Exactly one outcome is produced per item per run; the set is handed
/// to the index writer and then discarded.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub item: WorkItem,
    pub status: OutcomeStatus,
    /// Relative to the assets root
    pub path: String,
    pub error: Option<String>,
    pub bytes_written: u64,
}

impl Outcome {
    pub fn downloaded(item: WorkItem, path: String, bytes_written: u64) -> Self {
        Self {
            item,
            status: OutcomeStatus::Downloaded,
            path,
            error: None,
            bytes_written,
        }
    }

    pub fn exists(item: WorkItem, path: String) -> Self {
        Self {
            item,
            status: OutcomeStatus::Exists,
            path,
            error: None,
            bytes_written: 0,
        }
    }

    pub fn skipped(item: WorkItem, path: String) -> Self {
        Self {
            item,
            status: OutcomeStatus::Skipped,
            path,
            error: None,
            bytes_written: 0,
        }
    }

    pub fn failed(item: WorkItem, path: String, error: String) -> Self {
        Self {
            item,
            status: OutcomeStatus::Error,
            path,
            error: Some(error),
            bytes_written: 0,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }
}
