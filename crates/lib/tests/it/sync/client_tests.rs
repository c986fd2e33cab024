//! Tests for the protocol client against a scripted store.

use kbmirror::{
    graph::{ElementType, GraphAddr, GraphError},
    sync::{GraphClient, SyncError, protocol::Command},
    template::{CreationSpec, Template, TemplateItem},
};
use serde_json::json;

use crate::helpers::{Reply, ScriptedStore, setup_graph};

fn sync_error(err: kbmirror::Error) -> SyncError {
    match err {
        kbmirror::Error::Sync(e) => e,
        other => panic!("expected a sync error, got {other}"),
    }
}

#[tokio::test]
async fn test_response_id_mismatch_is_tolerated() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 99, "payload": [[5, 6]]}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let hits = client.find_links("bob").await.unwrap();
    assert_eq!(hits, vec![GraphAddr::new(5), GraphAddr::new(6)]);
    assert_eq!(store.requests()[0].id, 1);
}

#[tokio::test]
async fn test_short_keynode_answer_is_unresolved() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "payload": [10]}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let err = client.keynodes(&["nrel_login", "ui_user"]).await.unwrap_err();
    assert_eq!(
        sync_error(err),
        SyncError::UnresolvedKeynode {
            name: "ui_user".to_string()
        }
    );
}

#[tokio::test]
async fn test_all_cached_keynodes_send_nothing() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "payload": [10, 20]}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    client.keynodes(&["nrel_login", "ui_user"]).await.unwrap();
    let again = client.keynodes(&["ui_user", "nrel_login"]).await.unwrap();
    assert_eq!(again["nrel_login"], GraphAddr::new(10));
    assert_eq!(again["ui_user"], GraphAddr::new(20));
    assert_eq!(store.requests().len(), 1);
}

#[tokio::test]
async fn test_wrong_payload_shape_is_a_protocol_violation() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "payload": {"oops": 1}}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let err = sync_error(client.find_links("bob").await.unwrap_err());
    assert!(matches!(
        err,
        SyncError::ProtocolViolation {
            command: "content.find",
            ..
        }
    ));
}

#[tokio::test]
async fn test_non_json_reply_is_a_protocol_violation() {
    let store = ScriptedStore::new([Reply::Text("<html>502</html>".to_string())]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let err = sync_error(client.resolve_keynodes(&["x"]).await.unwrap_err());
    assert!(err.is_protocol_error());
}

#[tokio::test]
async fn test_dropped_connection_is_a_channel_failure() {
    let store = ScriptedStore::new([Reply::Drop]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let err = client
        .delete_elements(&[GraphAddr::new(1)])
        .await
        .unwrap_err();
    assert!(err.is_network_error());
    assert!(matches!(sync_error(err), SyncError::ChannelFailure(_)));
}

#[tokio::test]
async fn test_partial_creation_is_a_protocol_violation() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "payload": [100, 101]}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let mut spec = CreationSpec::new();
    let a = spec.node(ElementType::NodeConst);
    let b = spec.node(ElementType::NodeConst);
    spec.edge(ElementType::EdgeDCommonConst, a, b).unwrap();

    let err = sync_error(client.create_elements(&spec).await.unwrap_err());
    assert!(matches!(
        err,
        SyncError::ProtocolViolation {
            command: "create_elements",
            ..
        }
    ));
}

#[tokio::test]
async fn test_null_created_address_is_rejected() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "payload": [100, 0]}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let mut spec = CreationSpec::new();
    spec.node(ElementType::NodeConst);
    spec.node(ElementType::NodeConst);

    let err = client.create_elements(&spec).await.unwrap_err();
    assert!(err.is_protocol_error());
    assert!(matches!(err, kbmirror::Error::Graph(GraphError::NullAddress)));
}

#[tokio::test]
async fn test_search_failure_status_is_empty_result() {
    let store = ScriptedStore::new([Reply::json(
        json!({"id": 1, "event": false, "status": false, "payload": null}),
    )]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let template = Template::builder()
        .triple(
            TemplateItem::addr(GraphAddr::new(1)),
            TemplateItem::typed(ElementType::EdgeAccessVarPosPerm, "_e"),
            TemplateItem::typed(ElementType::NodeVar, "_n"),
        )
        .unwrap()
        .build()
        .unwrap();
    assert!(client.search_template(&template).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_status_on_mutation_is_rejected() {
    let store = ScriptedStore::new([Reply::json(json!({"id": 1, "status": false}))]);
    let mut client = GraphClient::connect(&store).await.unwrap();

    let err = sync_error(
        client
            .set_link_content(GraphAddr::new(3), "x")
            .await
            .unwrap_err(),
    );
    assert_eq!(
        err,
        SyncError::Rejected {
            command: "content.set"
        }
    );
}

#[tokio::test]
async fn test_unbound_alias_never_reaches_the_wire() {
    let graph = setup_graph();
    let _client = GraphClient::connect(&graph).await.unwrap();

    let built = Template::builder()
        .triple(
            TemplateItem::addr(GraphAddr::new(10)),
            TemplateItem::typed(ElementType::EdgeAccessVarPosPerm, "_edge"),
            TemplateItem::alias("_node"),
        )
        .and_then(|b| b.build());
    assert!(built.is_err());
    assert!(graph.requests().is_empty());
}

#[tokio::test]
async fn test_requests_are_strictly_sequential() {
    let graph = setup_graph();
    let mut client = GraphClient::connect(&graph).await.unwrap();

    client.find_links_by_content(&["a", "b"]).await.unwrap();
    client.keynodes(&["nrel_login"]).await.unwrap();
    client.delete_elements(&[]).await.unwrap();
    client.close().await.unwrap();

    let requests = graph.requests();
    assert_eq!(
        requests.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(
        requests[0].command,
        Command::FindLinks(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(graph.overlapping_sends(), 0);
}
