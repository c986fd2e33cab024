//! Tests for the transports: in-memory store behaviour over raw JSON, and
//! WebSocket endpoint handling.

use kbmirror::sync::{ChannelConnector, InMemoryGraph};
use serde_json::{Value, json};

async fn exchange(graph: &InMemoryGraph, request: Value) -> Value {
    let mut channel = graph.connect().await.unwrap();
    channel.send(request.to_string()).await.unwrap();
    let reply = channel.receive().await.unwrap();
    channel.close().await.unwrap();
    serde_json::from_str(&reply).unwrap()
}

#[tokio::test]
async fn test_memory_store_speaks_the_wire_protocol() {
    let graph = InMemoryGraph::new();
    let login = graph.add_keynode("nrel_login");

    let reply = exchange(
        &graph,
        json!({"id": 7, "type": "keynodes", "payload": [
            {"command": "find", "idtf": "nrel_login"},
            {"command": "find", "idtf": "missing"}
        ]}),
    )
    .await;
    assert_eq!(reply["id"], 7);
    assert_eq!(reply["status"], true);
    assert_eq!(reply["payload"], json!([login.value(), 0]));
}

#[tokio::test]
async fn test_memory_store_content_lookup() {
    let graph = InMemoryGraph::new();
    let a = graph.add_link("same");
    let b = graph.add_link("same");
    graph.add_link("other");

    let reply = exchange(
        &graph,
        json!({"id": 1, "type": "content", "payload": [
            {"command": "find", "data": "same"},
            {"command": "find", "data": "none"}
        ]}),
    )
    .await;
    assert_eq!(reply["payload"], json!([[a.value(), b.value()], []]));
}

#[tokio::test]
async fn test_memory_store_rejects_garbage() {
    let graph = InMemoryGraph::new();
    let mut channel = graph.connect().await.unwrap();
    assert!(channel.send("{\"id\": 1}".to_string()).await.is_err());
}

#[cfg(feature = "websocket")]
#[test]
fn test_websocket_connector_from_config() {
    use kbmirror::{config::MirrorConfig, sync::AccountMirror};

    let mirror = AccountMirror::from_config(&MirrorConfig::default()).unwrap();
    assert_eq!(mirror.connector().transport_type(), "websocket");
    assert_eq!(mirror.connector().address(), "ws://localhost:8090/ws_json");
}
