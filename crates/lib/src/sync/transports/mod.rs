//! Transport abstractions for graph store communication.
//!
//! The protocol client only needs a message-oriented duplex channel: send a
//! text frame, receive a text frame. [`GraphChannel`] is that channel and
//! [`ChannelConnector`] opens a fresh one per synchronization operation, so
//! tests can substitute an in-process store for the real one.

use async_trait::async_trait;

use crate::Result;

pub mod memory;
pub mod shared;
#[cfg(feature = "websocket")]
pub mod websocket;

/// An open duplex connection to the graph store.
///
/// Implementations deliver whole messages; framing is the transport's job.
#[async_trait]
pub trait GraphChannel: Send {
    /// Send one message.
    async fn send(&mut self, message: String) -> Result<()>;

    /// Wait for the next message.
    ///
    /// Fails with [`SyncError::ChannelFailure`](crate::sync::SyncError::ChannelFailure)
    /// if the connection is lost before a message arrives.
    async fn receive(&mut self) -> Result<String>;

    /// Close the connection. Closing an already closed channel is not an error.
    async fn close(&mut self) -> Result<()>;
}

/// Opens connections to a graph store.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Get the transport type identifier (e.g. "websocket", "memory").
    fn transport_type(&self) -> &'static str;

    /// Human-readable address of the store, for logs.
    fn address(&self) -> String;

    /// Open a new connection.
    async fn connect(&self) -> Result<Box<dyn GraphChannel>>;
}
