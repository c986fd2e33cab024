//! Tests for the background runner.

use std::sync::Arc;

use kbmirror::{
    config::KeynodeNames,
    sync::{AccountMirror, SyncOperation, SyncOutcome, SyncRunner, SyncStatus},
};

use crate::helpers::{setup_graph, setup_mirror};

fn create(username: &str) -> SyncOperation {
    SyncOperation::Create {
        username: username.to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_units_for_different_usernames() {
    let (graph, mirror) = setup_mirror();
    let runner = SyncRunner::new(mirror.clone()).unwrap();

    let usernames: Vec<String> = (0..8).map(|i| format!("user{i}")).collect();
    let handles: Vec<_> = usernames.iter().map(|u| runner.submit(create(u))).collect();

    for handle in &handles {
        assert!(handle.wait().await.is_success(), "{handle:?}");
    }
    assert_eq!(graph.overlapping_sends(), 0);

    for username in &usernames {
        assert!(mirror.exists(username).await.unwrap());
    }
}

#[tokio::test]
async fn test_handles_have_distinct_ids() {
    let (_graph, mirror) = setup_mirror();
    let runner = SyncRunner::new(mirror).unwrap();

    let a = runner.submit(create("a"));
    let b = runner.submit(create("a"));
    assert_ne!(a.id(), b.id());
    a.wait().await;
    b.wait().await;
}

#[tokio::test]
async fn test_submit_does_not_wait() {
    let (_graph, mirror) = setup_mirror();
    let runner = SyncRunner::new(mirror).unwrap();

    // On a current-thread runtime the task cannot start before we yield.
    let handle = runner.submit(create("frank"));
    assert_eq!(handle.status(), SyncStatus::Pending);
    assert!(!handle.is_finished());
    assert_eq!(runner.in_flight(), 1);

    let status = handle.wait().await;
    assert!(matches!(
        status,
        SyncStatus::Succeeded {
            outcome: SyncOutcome::Created { .. }
        }
    ));
    assert_eq!(handle.status(), status);
}

#[tokio::test]
async fn test_channel_failure_is_recorded() {
    let graph = setup_graph();
    let mirror = AccountMirror::new(Arc::new(graph.clone()), KeynodeNames::default());
    let runner = SyncRunner::new(mirror).unwrap();

    graph.disconnect_after(1);
    let handle = runner.submit(create("gina"));
    match handle.wait().await {
        SyncStatus::Failed { error } => assert!(error.contains("Channel failure"), "{error}"),
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(runner.in_flight(), 0);
    assert!(graph.requests_named("create_elements").is_empty());
}

#[tokio::test]
async fn test_delete_and_rename_outcomes() {
    let (_graph, mirror) = setup_mirror();
    mirror.create("hank").await.unwrap();
    mirror.create("hank").await.unwrap();
    let runner = SyncRunner::new(mirror).unwrap();

    let renamed = runner.submit(SyncOperation::Rename {
        username: "hank".to_string(),
        new_username: "henry".to_string(),
    });
    assert_eq!(
        renamed.wait().await,
        SyncStatus::Succeeded {
            outcome: SyncOutcome::Renamed { count: 2 }
        }
    );

    let deleted = runner.submit(SyncOperation::Delete {
        username: "henry".to_string(),
    });
    assert_eq!(
        deleted.wait().await,
        SyncStatus::Succeeded {
            outcome: SyncOutcome::Deleted { count: 2 }
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_runner_reports_every_handle_finished() {
    let (_graph, mirror) = setup_mirror();
    let runner = SyncRunner::new(mirror).unwrap();

    let handles: Vec<_> = (0..32)
        .map(|i| runner.submit(create(&format!("idle{i}"))))
        .collect();
    while runner.in_flight() > 0 {
        tokio::task::yield_now().await;
    }
    for handle in &handles {
        assert!(handle.is_finished(), "{handle:?}");
    }
}
