//! Request/response client over one graph store connection.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    error::SyncError,
    keynodes::KeynodeCache,
    protocol::{Command, Request},
    transports::{ChannelConnector, GraphChannel, shared::JsonHandler},
};
use crate::{
    Result,
    graph::{GraphAddr, GraphError},
    template::{CreationSpec, SearchResult, Template},
};

/// A session with the graph store.
///
/// Requests are strictly sequential: every method takes `&mut self` and
/// waits for the matching response before returning, so at most one request
/// is ever outstanding on the channel.
pub struct GraphClient {
    channel: Box<dyn GraphChannel>,
    next_id: u64,
    keynodes: KeynodeCache,
}

impl GraphClient {
    /// Open a new session through `connector`.
    pub async fn connect(connector: &dyn ChannelConnector) -> Result<Self> {
        debug!(
            transport = connector.transport_type(),
            address = %connector.address(),
            "Opening graph store session"
        );
        let channel = connector.connect().await?;
        Ok(Self::new(channel))
    }

    /// Wrap an already open channel.
    pub fn new(channel: Box<dyn GraphChannel>) -> Self {
        Self {
            channel,
            next_id: 1,
            keynodes: KeynodeCache::new(),
        }
    }

    async fn request<T: DeserializeOwned>(&mut self, command: Command) -> Result<Option<T>> {
        let name = command.name();
        let id = self.next_id;
        self.next_id += 1;

        let text = JsonHandler::serialize_request(&Request::new(id, command))?;
        debug!(id, command = name, "Sending request");
        self.channel.send(text).await?;

        let reply = self.channel.receive().await?;
        let response = JsonHandler::deserialize_response(&reply, name)?;
        if response.id != id {
            warn!(
                expected = id,
                received = response.id,
                command = name,
                "Response id does not match request"
            );
        }
        debug!(id, command = name, status = response.status, "Received response");

        if !response.status {
            return Ok(None);
        }
        Ok(Some(response.decode(name)?))
    }

    /// Like `request`, but a `status: false` answer is an error.
    async fn require<T: DeserializeOwned>(&mut self, command: Command) -> Result<T> {
        let name = command.name();
        match self.request(command).await? {
            Some(value) => Ok(value),
            None => Err(SyncError::Rejected { command: name }.into()),
        }
    }

    /// Resolve identifiers to addresses in one round trip.
    ///
    /// The result has one entry per name, in order, with [`GraphAddr::EMPTY`]
    /// for names the store does not know. Most callers want
    /// [`GraphClient::keynodes`] instead.
    pub async fn resolve_keynodes(&mut self, names: &[&str]) -> Result<Vec<GraphAddr>> {
        let names = names.iter().map(|n| n.to_string()).collect();
        self.require(Command::ResolveKeynodes(names)).await
    }

    /// Resolve keynodes through this session's cache.
    ///
    /// See [`KeynodeCache::resolve`].
    pub async fn keynodes(&mut self, names: &[&str]) -> Result<HashMap<String, GraphAddr>> {
        let mut cache = std::mem::take(&mut self.keynodes);
        let result = cache.resolve(self, names).await;
        self.keynodes = cache;
        result
    }

    /// Find the links whose content equals each of `texts`.
    pub async fn find_links_by_content(&mut self, texts: &[&str]) -> Result<Vec<Vec<GraphAddr>>> {
        let texts = texts.iter().map(|t| t.to_string()).collect();
        let hits: Vec<Vec<GraphAddr>> = self.require(Command::FindLinks(texts)).await?;
        Ok(hits)
    }

    /// Links whose content equals `text`.
    pub async fn find_links(&mut self, text: &str) -> Result<Vec<GraphAddr>> {
        let mut hits = self.find_links_by_content(&[text]).await?;
        match hits.len() {
            1 => Ok(hits.remove(0)),
            n => Err(SyncError::violation(
                "content.find",
                format!("expected one hit list, got {n}"),
            )
            .into()),
        }
    }

    /// Run a template search.
    ///
    /// A store that reports failure, or finds nothing, yields an empty result.
    pub async fn search_template(&mut self, template: &Template) -> Result<SearchResult> {
        let result: Option<SearchResult> = self
            .request(Command::SearchTemplate(template.clone()))
            .await?;
        Ok(result.unwrap_or_default())
    }

    /// Create elements. Returns one address per instruction, in order.
    ///
    /// A null address in the answer fails with [`GraphError::NullAddress`].
    pub async fn create_elements(&mut self, spec: &CreationSpec) -> Result<Vec<GraphAddr>> {
        let addrs: Vec<GraphAddr> = self.require(Command::CreateElements(spec.clone())).await?;
        if addrs.len() != spec.len() {
            return Err(SyncError::violation(
                "create_elements",
                format!("expected {} addresses, got {}", spec.len(), addrs.len()),
            )
            .into());
        }
        let addrs = addrs
            .into_iter()
            .map(GraphAddr::require_valid)
            .collect::<std::result::Result<Vec<_>, GraphError>>()?;
        Ok(addrs)
    }

    pub async fn delete_elements(&mut self, addrs: &[GraphAddr]) -> Result<()> {
        let _: serde_json::Value = self
            .require(Command::DeleteElements(addrs.to_vec()))
            .await?;
        Ok(())
    }

    /// Replace the content of a link.
    pub async fn set_link_content(&mut self, addr: GraphAddr, content: &str) -> Result<()> {
        let applied: Vec<bool> = self
            .require(Command::SetLinkContent {
                addr,
                content: content.to_string(),
            })
            .await?;
        if applied.iter().all(|ok| *ok) && !applied.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Rejected {
                command: "content.set",
            }
            .into())
        }
    }

    /// Close the session.
    pub async fn close(mut self) -> Result<()> {
        self.channel.close().await
    }
}
