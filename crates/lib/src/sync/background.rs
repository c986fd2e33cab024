//! Background execution of account sync operations.
//!
//! Lifecycle events must never wait on the graph store. The [`SyncRunner`]
//! spawns each submitted operation as its own tokio task and hands back a
//! [`SyncHandle`] that can be polled or awaited. Operations are not retried,
//! timed out or cancelled; a failure is logged and recorded in the handle.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tokio::{runtime::Handle, sync::watch};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use super::{error::SyncError, mirror::AccountMirror};
use crate::{Result, graph::GraphAddr};

/// A unit of work for the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncOperation {
    Create { username: String },
    Delete { username: String },
    Rename { username: String, new_username: String },
}

impl SyncOperation {
    pub fn name(&self) -> &'static str {
        match self {
            SyncOperation::Create { .. } => "create",
            SyncOperation::Delete { .. } => "delete",
            SyncOperation::Rename { .. } => "rename",
        }
    }

    /// The username the operation looks up in the store.
    pub fn username(&self) -> &str {
        match self {
            SyncOperation::Create { username }
            | SyncOperation::Delete { username }
            | SyncOperation::Rename { username, .. } => username,
        }
    }

    /// Run the operation to completion on the calling task.
    pub async fn run(&self, mirror: &AccountMirror) -> Result<SyncOutcome> {
        Ok(match self {
            SyncOperation::Create { username } => SyncOutcome::Created {
                addrs: mirror.create(username).await?,
            },
            SyncOperation::Delete { username } => SyncOutcome::Deleted {
                count: mirror.delete(username).await?,
            },
            SyncOperation::Rename {
                username,
                new_username,
            } => SyncOutcome::Renamed {
                count: mirror.rename(username, new_username).await?,
            },
        })
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::Rename {
                username,
                new_username,
            } => write!(f, "rename {username} -> {new_username}"),
            other => write!(f, "{} {}", other.name(), other.username()),
        }
    }
}

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Addresses of the new identity subgraph, in creation order.
    Created { addrs: Vec<GraphAddr> },
    /// Number of identity subgraphs removed.
    Deleted { count: usize },
    /// Number of login links rewritten.
    Renamed { count: usize },
}

/// Progress of a submitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Running,
    Succeeded { outcome: SyncOutcome },
    Failed { error: String },
}

impl SyncStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, SyncStatus::Succeeded { .. } | SyncStatus::Failed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncStatus::Succeeded { .. })
    }
}

/// Observes one submitted operation.
#[derive(Clone)]
pub struct SyncHandle {
    id: Uuid,
    operation: Arc<SyncOperation>,
    status: watch::Receiver<SyncStatus>,
}

impl fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncHandle")
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("status", &*self.status.borrow())
            .finish()
    }
}

impl SyncHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn operation(&self) -> &SyncOperation {
        &self.operation
    }

    /// Current status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.status.borrow().is_finished()
    }

    /// Wait until the operation finishes and return its final status.
    pub async fn wait(&self) -> SyncStatus {
        let mut status = self.status.clone();
        let finished = match status.wait_for(SyncStatus::is_finished).await {
            Ok(finished) => (*finished).clone(),
            // The task went away without reporting, which only happens if it panicked.
            Err(_) => SyncStatus::Failed {
                error: "sync task ended without reporting a result".to_string(),
            },
        };
        finished
    }
}

/// Decrements the in-flight counter when a task ends, including by panic.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs account sync operations in the background.
#[derive(Clone)]
pub struct SyncRunner {
    mirror: AccountMirror,
    runtime: Handle,
    in_flight: Arc<AtomicUsize>,
}

impl fmt::Debug for SyncRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRunner")
            .field("mirror", &self.mirror)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl SyncRunner {
    /// Create a runner on the current tokio runtime.
    ///
    /// Fails with [`SyncError::RuntimeUnavailable`] outside a runtime.
    pub fn new(mirror: AccountMirror) -> Result<Self> {
        let runtime =
            Handle::try_current().map_err(|e| SyncError::RuntimeUnavailable(e.to_string()))?;
        Ok(Self::with_runtime(mirror, runtime))
    }

    /// Create a runner spawning onto a specific runtime.
    pub fn with_runtime(mirror: AccountMirror, runtime: Handle) -> Self {
        Self {
            mirror,
            runtime,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn mirror(&self) -> &AccountMirror {
        &self.mirror
    }

    /// Number of submitted operations that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start `operation` in the background and return immediately.
    pub fn submit(&self, operation: SyncOperation) -> SyncHandle {
        let id = Uuid::new_v4();
        let operation = Arc::new(operation);
        let (tx, rx) = watch::channel(SyncStatus::Pending);
        let guard = InFlight::enter(&self.in_flight);

        let mirror = self.mirror.clone();
        let task_operation = Arc::clone(&operation);
        let span = info_span!("sync_unit", %id, operation = operation.name());
        self.runtime.spawn(
            async move {
                tx.send_replace(SyncStatus::Running);
                let status = match task_operation.run(&mirror).await {
                    Ok(outcome) => {
                        info!("Sync operation succeeded");
                        SyncStatus::Succeeded { outcome }
                    }
                    Err(e) => {
                        error!(error = %e, operation = %task_operation, "Sync operation failed");
                        SyncStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                };
                tx.send_replace(status);
                drop(guard);
            }
            .instrument(span),
        );

        SyncHandle {
            id,
            operation,
            status: rx,
        }
    }
}
