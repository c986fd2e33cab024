//! Error types for the synchronization module.

use thiserror::Error;

/// Errors that can occur while mirroring an account into the graph store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The store has no element for a keynode the mirror depends on.
    #[error("Keynode '{name}' could not be resolved")]
    UnresolvedKeynode { name: String },

    /// Client connection error.
    #[error("Failed to connect to {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    /// The channel failed before a full response was received.
    #[error("Channel failure: {0}")]
    ChannelFailure(String),

    /// A response did not have the shape expected for its command.
    #[error("Protocol violation in '{command}' response: {reason}")]
    ProtocolViolation {
        command: &'static str,
        reason: String,
    },

    /// The store answered with `status: false`.
    #[error("Graph store rejected '{command}' request")]
    Rejected { command: &'static str },

    /// A lifecycle event named a username the account directory does not accept.
    #[error("Invalid username: {username:?}")]
    InvalidUsername { username: String },

    /// Background work was submitted outside a tokio runtime.
    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SyncError {
    /// Check if this is a network/connection error.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            SyncError::ChannelFailure(_) | SyncError::ConnectionFailed { .. }
        )
    }

    /// Check if this is a protocol error (unexpected response).
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            SyncError::ProtocolViolation { .. } | SyncError::Rejected { .. }
        )
    }

    /// Check if the keynode graph is mis-provisioned.
    pub fn is_keynode_error(&self) -> bool {
        matches!(self, SyncError::UnresolvedKeynode { .. })
    }

    /// Check if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, SyncError::InvalidUsername { .. })
    }

    pub(crate) fn violation(command: &'static str, reason: impl Into<String>) -> Self {
        SyncError::ProtocolViolation {
            command,
            reason: reason.into(),
        }
    }
}

impl From<SyncError> for crate::Error {
    fn from(err: SyncError) -> Self {
        crate::Error::Sync(err)
    }
}
