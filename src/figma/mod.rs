//! Remote metadata client for the Figma REST API
//!
//! Resolves design-file nodes into names and export URLs via two read
//! endpoints: node lookup (`/files/{key}/nodes`) and image rendering
//! (`/images/{key}`). Both can report a missing resource inside a 200
//! body, which this module surfaces as typed errors.

mod client;
mod models;

pub use client::{ClientConfig, FigmaClient};
pub use models::{
    DocumentNode, ExportFormat, ImagesResponse, NodeId, NodeIdError, NodeMetadata, NodesResponse,
};

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FigmaError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("no export produced for node {0}")]
    ExportUnavailable(NodeId),

    #[error("figma api unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("connection timeout")]
    Timeout,

    #[error("credential is not a valid header value")]
    InvalidToken,
}

pub type Result<T> = std::result::Result<T, FigmaError>;

/// Read-only source of node metadata and export URLs.
///
/// Implemented by [`FigmaClient`]; the seam lets the sync engine run
/// against a fake source in tests.
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// Resolve ids into metadata; a missing node is an error.
    async fn resolve_nodes(&self, ids: &[NodeId]) -> Result<Vec<NodeMetadata>>;

    /// Resolve ids into rendered export URLs; a missing or null URL
    /// for any requested id is an error.
    async fn resolve_export_urls(
        &self,
        ids: &[NodeId],
        format: ExportFormat,
        scale: f32,
    ) -> Result<BTreeMap<NodeId, String>>;

    /// List the component children of a frame node.
    async fn list_frame_components(&self, frame: &NodeId) -> Result<Vec<NodeMetadata>>;

    /// Resolve a single node's export URL.
    async fn resolve_export_url(
        &self,
        id: &NodeId,
        format: ExportFormat,
        scale: f32,
    ) -> Result<String> {
        let ids = std::slice::from_ref(id);
        let mut urls = self.resolve_export_urls(ids, format, scale).await?;
        urls.remove(id)
            .ok_or_else(|| FigmaError::ExportUnavailable(id.clone()))
    }
}
