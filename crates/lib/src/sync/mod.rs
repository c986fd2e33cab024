//! Synchronization of account identities with the graph store.
//!
//! Layers, bottom up:
//!
//! - [`transports`]: duplex channels to a store (WebSocket or in-memory)
//! - [`protocol`]: the JSON request/response envelopes
//! - [`client`]: one strictly sequential session over a channel
//! - [`keynodes`]: per-session keynode resolution
//! - [`mirror`]: the exists/create/delete/rename operations
//! - [`background`]: fire-and-forget execution with observable handles
//! - [`hooks`]: account lifecycle events feeding the background runner

pub mod background;
pub mod client;
pub mod error;
pub mod hooks;
pub mod keynodes;
pub mod mirror;
pub mod protocol;
pub mod transports;

pub use background::{SyncHandle, SyncOperation, SyncOutcome, SyncRunner, SyncStatus};
pub use client::GraphClient;
pub use error::SyncError;
pub use hooks::{
    AccountEvent, AccountHook, AccountHookCollection, MirrorHook, SyntaxCheck, UsernameLookup,
};
pub use keynodes::KeynodeCache;
pub use mirror::AccountMirror;
pub use transports::{ChannelConnector, GraphChannel, memory::InMemoryGraph};
#[cfg(feature = "websocket")]
pub use transports::websocket::WebSocketConnector;
