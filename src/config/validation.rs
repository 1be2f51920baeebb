use super::models::Config;
use crate::sync::slugify;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("figma.file_key is required")]
    MissingFileKey,

    #[error("catalog is empty: declare at least one icon or frame")]
    EmptyCatalog,

    #[error("sync.batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("figma.export.scale must be between 0.01 and 4")]
    InvalidScale,

    #[error("duplicate catalog entry for {category}/{name}")]
    DuplicateCatalogEntry { category: String, name: String },

    #[error("duplicate catalog node id {node_id}")]
    DuplicateNodeId { node_id: String },
}

/// Reject configurations the sync run could not execute safely.
///
/// Duplicate (category, name) pairs are refused here rather than
/// merged: two writers racing on one destination path is the one
/// invariant violation the scheduler cannot recover from, and a static
/// catalog typo is operator-fixable.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.figma.file_key.trim().is_empty() {
        return Err(ValidationError::MissingFileKey);
    }

    if config.catalog.icons.is_empty() && config.catalog.frames.is_empty() {
        return Err(ValidationError::EmptyCatalog);
    }

    if config.sync.batch_size == 0 {
        return Err(ValidationError::ZeroBatchSize);
    }

    let scale = config.figma.export.scale;
    if !(0.01..=4.0).contains(&scale) {
        return Err(ValidationError::InvalidScale);
    }

    let mut node_ids = HashSet::new();
    let mut destinations = HashSet::new();

    for entry in &config.catalog.icons {
        if !node_ids.insert(entry.node_id.clone()) {
            return Err(ValidationError::DuplicateNodeId {
                node_id: entry.node_id.to_string(),
            });
        }

        let category = entry
            .category
            .as_deref()
            .map(slugify)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| crate::sync::FALLBACK_CATEGORY.to_string());
        let name = slugify(&entry.name);

        if !destinations.insert((category.clone(), name.clone())) {
            return Err(ValidationError::DuplicateCatalogEntry { category, name });
        }
    }

    for frame in &config.catalog.frames {
        if !node_ids.insert(frame.node_id.clone()) {
            return Err(ValidationError::DuplicateNodeId {
                node_id: frame.node_id.to_string(),
            });
        }
    }

    Ok(())
}
