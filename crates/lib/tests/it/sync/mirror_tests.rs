//! Tests for the exists/create/delete/rename account operations.

use kbmirror::{
    graph::GraphAddr,
    sync::protocol::Command,
    template::{CreateInstruction, Endpoint},
};

use crate::helpers::{LOGIN_ADDR, UI_ADDR, created_specs, deleted_batches, setup_mirror};

#[tokio::test]
async fn test_create_then_exists() {
    let (_graph, mirror) = setup_mirror();
    for username in ["alice", "bob.smith", "c", "user_42"] {
        mirror.create(username).await.unwrap();
        assert!(mirror.exists(username).await.unwrap(), "{username} should exist");
    }
}

#[tokio::test]
async fn test_create_delete_exists() {
    let (graph, mirror) = setup_mirror();
    let before = graph.element_count();

    mirror.create("alice").await.unwrap();
    assert_eq!(mirror.delete("alice").await.unwrap(), 1);
    assert!(!mirror.exists("alice").await.unwrap());
    assert_eq!(graph.element_count(), before);
}

#[tokio::test]
async fn test_create_uses_resolved_keynodes() {
    let (graph, mirror) = setup_mirror();
    mirror.create("alice").await.unwrap();

    let specs = created_specs(&graph);
    assert_eq!(specs.len(), 1);
    let instructions = specs[0].instructions();

    let ends: Vec<(Endpoint, Endpoint)> = instructions[2..]
        .iter()
        .map(|i| match i {
            CreateInstruction::Edge { src, trg, .. } => (*src, *trg),
            other => panic!("expected an edge, got {other:?}"),
        })
        .collect();
    assert_eq!(
        ends,
        vec![
            (Endpoint::Ref(1), Endpoint::Ref(0)),
            (Endpoint::Addr(LOGIN_ADDR), Endpoint::Ref(2)),
            (Endpoint::Addr(UI_ADDR), Endpoint::Ref(1)),
        ]
    );
}

#[tokio::test]
async fn test_create_runs_informational_exists_first() {
    let (graph, mirror) = setup_mirror();
    mirror.create("alice").await.unwrap();
    mirror.create("alice").await.unwrap();

    // Creation is not deduplicated: both subgraphs exist side by side.
    assert_eq!(created_specs(&graph).len(), 2);
    assert_eq!(graph.links_with_content("alice").len(), 2);

    let names: Vec<&str> = graph
        .requests()
        .iter()
        .map(|r| r.command.name())
        .collect();
    // First create: nothing found, so no search; second create finds the first.
    assert_eq!(
        names,
        vec![
            "content.find",
            "keynodes",
            "create_elements",
            "content.find",
            "keynodes",
            "search_template",
            "create_elements",
        ]
    );
}

#[tokio::test]
async fn test_keynodes_resolved_once_per_operation() {
    let (graph, mirror) = setup_mirror();
    mirror.create("alice").await.unwrap();
    graph.clear_requests();

    // exists() inside create() resolves them; creation reuses the session cache.
    mirror.create("alice").await.unwrap();
    assert_eq!(graph.requests_named("keynodes").len(), 1);

    // A new operation is a new session and resolves again.
    mirror.exists("alice").await.unwrap();
    assert_eq!(graph.requests_named("keynodes").len(), 2);
}

#[tokio::test]
async fn test_rename_keeps_structure() {
    let (graph, mirror) = setup_mirror();
    let created = mirror.create("alice").await.unwrap();
    let (link, user, user_link, login_edge, ui_edge) =
        (created[0], created[1], created[2], created[3], created[4]);

    assert_eq!(mirror.rename("alice", "alicia").await.unwrap(), 1);

    assert_eq!(graph.link_content(link).as_deref(), Some("alicia"));
    assert_eq!(graph.edge_ends(user_link), Some((user, link)));
    assert_eq!(graph.edge_ends(login_edge), Some((LOGIN_ADDR, user_link)));
    assert_eq!(graph.edge_ends(ui_edge), Some((UI_ADDR, user)));
    assert!(mirror.exists("alicia").await.unwrap());
    assert!(!mirror.exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_delete_without_hits_is_a_noop() {
    let (graph, mirror) = setup_mirror();
    let before = graph.element_count();

    assert_eq!(mirror.delete("ghost").await.unwrap(), 0);
    assert_eq!(mirror.rename("ghost", "spirit").await.unwrap(), 0);
    assert_eq!(graph.element_count(), before);
    assert!(deleted_batches(&graph).is_empty());
    assert!(graph.requests_named("content.set").is_empty());
}

#[tokio::test]
async fn test_delete_two_hits_issues_one_batch_each() {
    let (graph, mirror) = setup_mirror();
    let first = mirror.create("bob").await.unwrap();
    let second = mirror.create("bob").await.unwrap();

    assert_eq!(mirror.delete("bob").await.unwrap(), 2);

    let mut batches = deleted_batches(&graph);
    assert_eq!(batches.len(), 2);
    for batch in &mut batches {
        batch.sort();
    }
    let mut expected: Vec<Vec<GraphAddr>> = vec![first, second];
    for addrs in &mut expected {
        addrs.sort();
    }
    batches.sort();
    expected.sort();
    assert_eq!(batches, expected);

    for batch in deleted_batches(&graph) {
        assert!(!batch.contains(&LOGIN_ADDR));
        assert!(!batch.contains(&UI_ADDR));
    }
}

#[tokio::test]
async fn test_orphan_link_is_skipped_and_others_processed() {
    let (graph, mirror) = setup_mirror();
    let orphan = graph.add_link("carol");
    let created = mirror.create("carol").await.unwrap();

    assert!(mirror.exists("carol").await.unwrap());
    assert_eq!(mirror.rename("carol", "caroline").await.unwrap(), 1);
    assert_eq!(graph.link_content(orphan).as_deref(), Some("carol"));
    assert_eq!(graph.link_content(created[0]).as_deref(), Some("caroline"));

    let sets: Vec<Command> = graph
        .requests_named("content.set")
        .into_iter()
        .map(|r| r.command)
        .collect();
    assert_eq!(
        sets,
        vec![Command::SetLinkContent {
            addr: created[0],
            content: "caroline".to_string()
        }]
    );
}

#[tokio::test]
async fn test_unprovisioned_store_fails_create() {
    let graph = kbmirror::sync::InMemoryGraph::new();
    let mirror = kbmirror::sync::AccountMirror::new(
        std::sync::Arc::new(graph.clone()),
        kbmirror::config::KeynodeNames::default(),
    );
    let err = mirror.create("dave").await.unwrap_err();
    assert!(err.is_keynode_error());
    assert!(created_specs(&graph).is_empty());
}

#[tokio::test]
async fn test_custom_keynode_names() {
    let graph = kbmirror::sync::InMemoryGraph::new();
    let login = graph.add_keynode("nrel_user_login");
    let ui = graph.add_keynode("concept_ui_user");
    let names = kbmirror::config::KeynodeNames {
        login_relation: "nrel_user_login".to_string(),
        ui_user: "concept_ui_user".to_string(),
    };
    let mirror = kbmirror::sync::AccountMirror::new(std::sync::Arc::new(graph.clone()), names);

    let created = mirror.create("erin").await.unwrap();
    assert_eq!(graph.edge_ends(created[3]).map(|(src, _)| src), Some(login));
    assert_eq!(graph.edge_ends(created[4]).map(|(src, _)| src), Some(ui));
    assert!(mirror.exists("erin").await.unwrap());
}
