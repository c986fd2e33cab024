//! Account lifecycle hooks.
//!
//! The account directory reports lifecycle events to an
//! [`AccountHookCollection`]. The [`MirrorHook`] turns each event into a
//! background sync operation so the directory never waits on the graph store.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    background::{SyncHandle, SyncOperation, SyncRunner},
    error::SyncError,
};
use crate::Result;

/// Longest username accepted by [`SyntaxCheck`].
pub const MAX_USERNAME_LEN: usize = 64;

/// An account lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccountEvent {
    /// A new account was registered.
    Created { username: String },
    /// An account was removed.
    Deleted { username: String },
    /// An account changed its username.
    Renamed { old: String, new: String },
}

impl AccountEvent {
    /// The sync operation mirroring this event.
    pub fn operation(&self) -> SyncOperation {
        match self {
            AccountEvent::Created { username } => SyncOperation::Create {
                username: username.clone(),
            },
            AccountEvent::Deleted { username } => SyncOperation::Delete {
                username: username.clone(),
            },
            AccountEvent::Renamed { old, new } => SyncOperation::Rename {
                username: old.clone(),
                new_username: new.clone(),
            },
        }
    }

    /// Every username the event mentions.
    pub fn usernames(&self) -> Vec<&str> {
        match self {
            AccountEvent::Created { username } | AccountEvent::Deleted { username } => {
                vec![username.as_str()]
            }
            AccountEvent::Renamed { old, new } => vec![old.as_str(), new.as_str()],
        }
    }
}

/// Decides which usernames the account directory considers valid.
pub trait UsernameLookup: Send + Sync {
    fn is_valid_username(&self, username: &str) -> bool;
}

/// Syntactic username check.
///
/// Accepts 1 to [`MAX_USERNAME_LEN`] ASCII alphanumerics, `_`, `-` and `.`,
/// starting with an alphanumeric.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxCheck;

impl UsernameLookup for SyntaxCheck {
    fn is_valid_username(&self, username: &str) -> bool {
        let mut chars = username.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        username.len() <= MAX_USERNAME_LEN
            && first.is_ascii_alphanumeric()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }
}

/// Check every username in `event` against `lookup`.
pub fn verify_usernames(lookup: &dyn UsernameLookup, event: &AccountEvent) -> Result<()> {
    match event
        .usernames()
        .into_iter()
        .find(|u| !lookup.is_valid_username(u))
    {
        Some(username) => Err(SyncError::InvalidUsername {
            username: username.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Called for every account lifecycle event.
pub trait AccountHook: Send + Sync {
    /// Handle one event. Must not block on the graph store.
    fn on_account_event(&self, event: &AccountEvent) -> Result<()>;
}

/// Hooks executed together for each event.
#[derive(Default)]
pub struct AccountHookCollection {
    hooks: Vec<Arc<dyn AccountHook>>,
}

impl AccountHookCollection {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn AccountHook>) {
        self.hooks.push(hook);
    }

    /// Execute all hooks in order.
    ///
    /// A failing hook does not stop the rest; the first error is returned
    /// once every hook has run.
    pub fn execute_hooks(&self, event: &AccountEvent) -> Result<()> {
        let mut first_error = None;

        for hook in &self.hooks {
            if let Err(e) = hook.on_account_event(event) {
                tracing::error!("Account hook failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Hook mirroring lifecycle events into the graph store.
pub struct MirrorHook {
    runner: SyncRunner,
    lookup: Arc<dyn UsernameLookup>,
    handles: Mutex<Vec<SyncHandle>>,
}

impl MirrorHook {
    /// Hook validating usernames with [`SyntaxCheck`].
    pub fn new(runner: SyncRunner) -> Self {
        Self::with_lookup(runner, Arc::new(SyntaxCheck))
    }

    pub fn with_lookup(runner: SyncRunner, lookup: Arc<dyn UsernameLookup>) -> Self {
        Self {
            runner,
            lookup,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn runner(&self) -> &SyncRunner {
        &self.runner
    }

    /// Validate `event` and submit its operation to the runner.
    ///
    /// Handles of operations that have already finished are dropped before the
    /// new one is recorded.
    pub fn submit(&self, event: &AccountEvent) -> Result<SyncHandle> {
        verify_usernames(self.lookup.as_ref(), event)?;

        let handle = self.runner.submit(event.operation());
        debug!(id = %handle.id(), operation = %handle.operation(), "Submitted sync operation");
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle.clone());
        Ok(handle)
    }

    /// Handles of operations not known to be finished, oldest first.
    pub fn handles(&self) -> Vec<SyncHandle> {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop handles of finished operations.
    pub fn prune_finished(&self) {
        self.handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|h| !h.is_finished());
    }
}

impl AccountHook for MirrorHook {
    fn on_account_event(&self, event: &AccountEvent) -> Result<()> {
        self.submit(event).map(|_| ())
    }
}
