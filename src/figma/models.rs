use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid node id {0:?}, expected <int>:<int>")]
pub struct NodeIdError(String);

/// Identifier of an addressable node in a design file.
///
/// Figma node ids are a pair of integers separated by a colon
/// (e.g. `59:3129`); both the node-lookup and the image-export
/// responses are keyed by this string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = matches!(
            s.split(':').collect::<Vec<_>>().as_slice(),
            [major, minor]
                if !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
        );

        if valid {
            Ok(NodeId(s.to_string()))
        } else {
            Err(NodeIdError(s.to_string()))
        }
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Export format accepted by the image-render endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Png,
    Jpg,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// File extension for exported assets
    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Svg
    }
}

/// Resolved metadata for one remote node
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub id: NodeId,
    pub name: String,
    pub kind: String,
    pub description: String,
}

impl NodeMetadata {
    /// Only components and their instances are exportable icons;
    /// frames, groups and guides inside a category frame are not.
    pub fn is_component(&self) -> bool {
        self.kind == "COMPONENT" || self.kind == "INSTANCE"
    }
}

/// Body of `GET /files/{file_key}/nodes`
///
/// Missing nodes are reported as `null` entries under a 200 status,
/// never as a non-2xx response.
#[derive(Debug, Deserialize)]
pub struct NodesResponse {
    #[serde(default)]
    pub nodes: HashMap<String, Option<NodeWrapper>>,
}

#[derive(Debug, Deserialize)]
pub struct NodeWrapper {
    pub document: DocumentNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

/// Body of `GET /images/{file_key}`
///
/// A node that could not be rendered is reported as a `null` URL
/// under a 200 status; callers must not treat that as success.
#[derive(Debug, Deserialize)]
pub struct ImagesResponse {
    #[serde(default)]
    pub err: Option<String>,
    #[serde(default)]
    pub images: HashMap<String, Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_accepts_pair_of_integers() {
        let id: NodeId = "59:3129".parse().unwrap();
        assert_eq!(id.as_str(), "59:3129");
        assert_eq!(id.to_string(), "59:3129");
    }

    #[test]
    fn node_id_rejects_other_shapes() {
        assert!("59".parse::<NodeId>().is_err());
        assert!("59:".parse::<NodeId>().is_err());
        assert!(":3129".parse::<NodeId>().is_err());
        assert!("59:31:29".parse::<NodeId>().is_err());
        assert!("59-3129".parse::<NodeId>().is_err());
        assert!("a:b".parse::<NodeId>().is_err());
    }

    #[test]
    fn node_id_roundtrips_through_serde() {
        let id: NodeId = serde_json::from_str("\"12:34\"").unwrap();
        assert_eq!(id.as_str(), "12:34");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12:34\"");
        assert!(serde_json::from_str::<NodeId>("\"12-34\"").is_err());
    }

    #[test]
    fn images_response_parses_null_urls() {
        let body = r#"{"err": null, "images": {"123:45": null, "1:2": "https://cdn/x.svg"}}"#;
        let parsed: ImagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.images["123:45"], None);
        assert_eq!(parsed.images["1:2"].as_deref(), Some("https://cdn/x.svg"));
    }

    #[test]
    fn nodes_response_parses_missing_node() {
        let body = r#"{"nodes": {"9:9": null}}"#;
        let parsed: NodesResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.nodes["9:9"].is_none());
    }
}
