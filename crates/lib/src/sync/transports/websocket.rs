//! WebSocket transport to a live graph store.
//!
//! The store's JSON endpoint speaks one JSON object per text frame. Ping and
//! pong frames are handled by tungstenite; close frames and stream errors
//! surface as channel failures.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
};
use tracing::{debug, trace};
use url::Url;

use super::{ChannelConnector, GraphChannel};
use crate::{Result, sync::error::SyncError};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a graph store's WebSocket JSON endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
}

impl WebSocketConnector {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse and validate a `ws://` or `wss://` endpoint.
    pub fn from_endpoint(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint).map_err(|e| SyncError::ConnectionFailed {
            address: endpoint.to_string(),
            reason: format!("Invalid URL: {e}"),
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self { url }),
            other => Err(SyncError::ConnectionFailed {
                address: endpoint.to_string(),
                reason: format!("Unsupported scheme '{other}'"),
            }
            .into()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl ChannelConnector for WebSocketConnector {
    fn transport_type(&self) -> &'static str {
        "websocket"
    }

    fn address(&self) -> String {
        self.url.to_string()
    }

    async fn connect(&self) -> Result<Box<dyn GraphChannel>> {
        let (stream, _response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| SyncError::ConnectionFailed {
                    address: self.url.to_string(),
                    reason: e.to_string(),
                })?;
        debug!(url = %self.url, "Connected to graph store");
        Ok(Box::new(WebSocketChannel {
            stream,
            closed: false,
        }))
    }
}

/// One open WebSocket connection.
pub struct WebSocketChannel {
    stream: Stream,
    closed: bool,
}

#[async_trait]
impl GraphChannel for WebSocketChannel {
    async fn send(&mut self, message: String) -> Result<()> {
        if self.closed {
            return Err(SyncError::ChannelFailure("channel already closed".to_string()).into());
        }
        self.stream
            .send(WsMessage::Text(message.into()))
            .await
            .map_err(|e| SyncError::ChannelFailure(format!("send failed: {e}")).into())
    }

    async fn receive(&mut self) -> Result<String> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => return Ok(text.as_str().to_owned()),
                Ok(WsMessage::Binary(bytes)) => {
                    return String::from_utf8(bytes.to_vec()).map_err(|e| {
                        SyncError::ChannelFailure(format!("non UTF-8 binary frame: {e}")).into()
                    });
                }
                Ok(WsMessage::Close(frame)) => {
                    self.closed = true;
                    let reason = frame
                        .map(|f| format!("{} {}", u16::from(f.code), f.reason.as_str()))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Err(
                        SyncError::ChannelFailure(format!("closed by store: {reason}")).into(),
                    );
                }
                Ok(other) => trace!(?other, "Ignoring control frame"),
                Err(e) => {
                    return Err(SyncError::ChannelFailure(format!("receive failed: {e}")).into());
                }
            }
        }
        self.closed = true;
        Err(SyncError::ChannelFailure("connection ended".to_string()).into())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The store may already have dropped the socket; nothing left to clean up then.
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Ignoring error while closing graph store connection");
        }
        Ok(())
    }
}
