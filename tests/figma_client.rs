//! Remote metadata client tests against a mock HTTP server

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use iconbox::figma::{
    ClientConfig, ExportFormat, FigmaClient, FigmaError, NodeId, NodeSource,
};

const FILE_KEY: &str = "testfilekey";
const TOKEN: &str = "figd_test_token";

fn client_for(server: &MockServer) -> FigmaClient {
    let config = ClientConfig {
        api_base: server.uri(),
        file_key: FILE_KEY.to_string(),
        request_timeout: std::time::Duration::from_secs(5),
        ..Default::default()
    };
    FigmaClient::new(config, TOKEN).unwrap()
}

fn id(s: &str) -> NodeId {
    s.parse().unwrap()
}

#[tokio::test]
async fn resolves_node_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{}/nodes", FILE_KEY)))
        .and(query_param("ids", "59:3135"))
        .and(header("X-Figma-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": {
                "59:3135": {
                    "document": {
                        "id": "59:3135",
                        "name": "Bank",
                        "type": "COMPONENT",
                        "description": "finance icon"
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let nodes = client.resolve_nodes(&[id("59:3135")]).await.unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "Bank");
    assert_eq!(nodes[0].kind, "COMPONENT");
    assert_eq!(nodes[0].description, "finance icon");
}

#[tokio::test]
async fn missing_node_is_not_found() {
    let server = MockServer::start().await;

    // 200 with a null node body, the API's way of saying "no such node"
    Mock::given(method("GET"))
        .and(path(format!("/files/{}/nodes", FILE_KEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": { "9:9": null }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.resolve_nodes(&[id("9:9")]).await.unwrap_err();

    assert!(matches!(err, FigmaError::NodeNotFound(node) if node.as_str() == "9:9"));
}

#[tokio::test]
async fn null_export_url_is_an_error() {
    let server = MockServer::start().await;

    // render failures are reported silently as null URLs under a 200
    Mock::given(method("GET"))
        .and(path(format!("/images/{}", FILE_KEY)))
        .and(query_param("ids", "123:45"))
        .and(query_param("format", "svg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": { "123:45": null }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .resolve_export_url(&id("123:45"), ExportFormat::Svg, 1.0)
        .await
        .unwrap_err();

    assert!(matches!(err, FigmaError::ExportUnavailable(node) if node.as_str() == "123:45"));
}

#[tokio::test]
async fn resolves_export_urls_in_bulk() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/images/{}", FILE_KEY)))
        .and(query_param("ids", "1:1,2:2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "err": null,
            "images": {
                "1:1": "https://cdn.example/a.svg",
                "2:2": "https://cdn.example/b.svg"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let urls = client
        .resolve_export_urls(&[id("1:1"), id("2:2")], ExportFormat::Svg, 1.0)
        .await
        .unwrap();

    assert_eq!(urls[&id("1:1")], "https://cdn.example/a.svg");
    assert_eq!(urls[&id("2:2")], "https://cdn.example/b.svg");
}

#[tokio::test]
async fn http_failure_is_remote_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.resolve_nodes(&[id("1:1")]).await.unwrap_err();

    assert!(matches!(err, FigmaError::RemoteUnavailable(message) if message.contains("500")));
}

#[tokio::test]
async fn lists_only_component_children() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/files/{}/nodes", FILE_KEY)))
        .and(query_param("ids", "59:3133"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": {
                "59:3133": {
                    "document": {
                        "id": "59:3133",
                        "name": "Social",
                        "type": "FRAME",
                        "children": [
                            {"id": "60:1", "name": "Facebook", "type": "COMPONENT"},
                            {"id": "60:2", "name": "guides", "type": "GROUP"},
                            {"id": "60:3", "name": "X", "type": "INSTANCE"}
                        ]
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let components = client.list_frame_components(&id("59:3133")).await.unwrap();

    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Facebook", "X"]);
}
