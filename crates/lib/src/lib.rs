//!
//! kbmirror: keeps account identities mirrored in a semantic graph store.
//!
//! Whenever an account is created, deleted or renamed, the matching identity
//! subgraph in the store (a user node joined to a login link holding the
//! username) is created, deleted or rewritten.
//!
//! ## Core Concepts
//!
//! * **Graph elements (`graph`)**: Addresses and typed nodes, links and edges as the store sees them.
//! * **Templates (`template`)**: Search patterns over triples with named aliases, and ordered creation batches.
//! * **Keynodes (`sync::keynodes`)**: Well-known elements the store identifies by name, resolved once per session.
//! * **Client (`sync::client`)**: A strictly sequential request/response session over one connection.
//! * **Mirror (`sync::mirror`)**: The exists, create, delete and rename operations on identity subgraphs.
//! * **Runner and hooks (`sync::background`, `sync::hooks`)**: Lifecycle events submitted as background work with observable handles.
//!
//! ```
//! use kbmirror::{config::KeynodeNames, sync::{AccountMirror, InMemoryGraph}};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let graph = InMemoryGraph::new();
//! graph.add_keynode("nrel_login");
//! graph.add_keynode("ui_user");
//!
//! let mirror = AccountMirror::new(Arc::new(graph), KeynodeNames::default());
//! mirror.create("alice").await.unwrap();
//! assert!(mirror.exists("alice").await.unwrap());
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod graph;
pub mod sync;
pub mod template;

/// Result type used throughout the kbmirror library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the kbmirror library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured graph model errors from the graph module
    #[error(transparent)]
    Graph(graph::GraphError),

    /// Structured template errors from the template module
    #[error(transparent)]
    Template(template::TemplateError),

    /// Structured synchronization errors from the sync module
    #[error(transparent)]
    Sync(sync::SyncError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Graph(_) => "graph",
            Error::Template(_) => "template",
            Error::Sync(_) => "sync",
            Error::Config(_) => "config",
        }
    }

    /// Check if this error came from the connection to the graph store.
    pub fn is_network_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_network_error(),
            _ => false,
        }
    }

    /// Check if the graph store answered in a way the client could not use.
    pub fn is_protocol_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_protocol_error(),
            Error::Graph(graph_err) => graph_err.is_decode_error(),
            _ => false,
        }
    }

    /// Check if a template or creation spec was malformed.
    pub fn is_template_error(&self) -> bool {
        matches!(self, Error::Template(_))
    }

    /// Check if the store is missing a keynode the mirror depends on.
    pub fn is_keynode_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_keynode_error(),
            _ => false,
        }
    }

    /// Check if this error is input validation related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Sync(sync_err) => sync_err.is_validation_error(),
            Error::Config(config_err) => !config_err.is_file_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Config(config_err) => config_err.is_file_error(),
            _ => false,
        }
    }
}
