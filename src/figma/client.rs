//! HTTP client for the Figma REST API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use super::models::{
    DocumentNode, ExportFormat, ImagesResponse, NodeId, NodeMetadata, NodesResponse,
};
use super::{FigmaError, NodeSource, Result};

const TOKEN_HEADER: &str = "X-Figma-Token";
const USER_AGENT: &str = concat!("iconbox/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub file_key: String,
    pub request_timeout: Duration,
    /// Ask the renderer to keep element ids in SVG exports
    pub svg_include_ids: bool,
    /// Render with the node's absolute bounding box
    pub use_absolute_bounds: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.figma.com/v1".to_string(),
            file_key: String::new(),
            request_timeout: Duration::from_secs(30),
            svg_include_ids: false,
            use_absolute_bounds: false,
        }
    }
}

/// Read-only client for node metadata and export URLs.
///
/// Carries no retry logic; transient failures surface to the caller
/// and are retried by the batch scheduler.
pub struct FigmaClient {
    http: reqwest::Client,
    api_base: String,
    file_key: String,
    svg_include_ids: bool,
    use_absolute_bounds: bool,
}

impl FigmaClient {
    pub fn new(config: ClientConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut token_value = HeaderValue::from_str(token)
            .map_err(|_| FigmaError::InvalidToken)?;
        token_value.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FigmaError::RemoteUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            file_key: config.file_key,
            svg_include_ids: config.svg_include_ids,
            use_absolute_bounds: config.use_absolute_bounds,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.api_base, path_and_query);
        debug!(%url, "figma api request");

        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FigmaError::Timeout
            } else {
                FigmaError::RemoteUnavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FigmaError::RemoteUnavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FigmaError::RemoteUnavailable(format!("invalid response body: {}", e)))
    }

    fn joined_ids(ids: &[NodeId]) -> String {
        ids.iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn metadata_from(node: &DocumentNode) -> Option<NodeMetadata> {
        let id: NodeId = node.id.parse().ok()?;
        Some(NodeMetadata {
            id,
            name: node.name.clone(),
            kind: node.kind.clone(),
            description: node.description.clone(),
        })
    }
}

#[async_trait]
impl NodeSource for FigmaClient {
    async fn resolve_nodes(&self, ids: &[NodeId]) -> Result<Vec<NodeMetadata>> {
        let path = format!("/files/{}/nodes?ids={}", self.file_key, Self::joined_ids(ids));
        let body: NodesResponse = self.get_json(&path).await?;

        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            // 200 with a null node body means the registry has no such node
            let wrapper = body
                .nodes
                .get(id.as_str())
                .and_then(Option::as_ref)
                .ok_or_else(|| FigmaError::NodeNotFound(id.clone()))?;

            resolved.push(NodeMetadata {
                id: id.clone(),
                name: wrapper.document.name.clone(),
                kind: wrapper.document.kind.clone(),
                description: wrapper.document.description.clone(),
            });
        }

        Ok(resolved)
    }

    async fn resolve_export_urls(
        &self,
        ids: &[NodeId],
        format: ExportFormat,
        scale: f32,
    ) -> Result<BTreeMap<NodeId, String>> {
        let mut path = format!(
            "/images/{}?ids={}&format={}&scale={}",
            self.file_key,
            Self::joined_ids(ids),
            format.as_str(),
            scale,
        );
        if self.svg_include_ids && format == ExportFormat::Svg {
            path.push_str("&svg_include_id=true");
        }
        if self.use_absolute_bounds {
            path.push_str("&use_absolute_bounds=true");
        }
        let body: ImagesResponse = self.get_json(&path).await?;

        if let Some(err) = body.err {
            return Err(FigmaError::RemoteUnavailable(format!("render error: {}", err)));
        }

        let mut urls = BTreeMap::new();
        for id in ids {
            // The render service reports silent failures as null/missing
            // URLs under a 200 status; that is an error, not an empty result.
            let url = body
                .images
                .get(id.as_str())
                .and_then(Option::as_ref)
                .filter(|url| !url.is_empty())
                .ok_or_else(|| FigmaError::ExportUnavailable(id.clone()))?;

            urls.insert(id.clone(), url.clone());
        }

        Ok(urls)
    }

    async fn list_frame_components(&self, frame: &NodeId) -> Result<Vec<NodeMetadata>> {
        let path = format!("/files/{}/nodes?ids={}", self.file_key, frame.as_str());
        let body: NodesResponse = self.get_json(&path).await?;

        let wrapper = body
            .nodes
            .get(frame.as_str())
            .and_then(Option::as_ref)
            .ok_or_else(|| FigmaError::NodeNotFound(frame.clone()))?;

        let components: Vec<NodeMetadata> = wrapper
            .document
            .children
            .iter()
            .filter_map(Self::metadata_from)
            .filter(NodeMetadata::is_component)
            .collect();

        debug!(
            frame = %frame,
            found = components.len(),
            "listed frame components"
        );

        Ok(components)
    }
}
