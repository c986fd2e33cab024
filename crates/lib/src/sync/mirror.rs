//! Account mirroring operations.
//!
//! Each operation opens its own session, runs its request sequence in order
//! and closes the session before returning, whatever the outcome.

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use super::{
    client::GraphClient,
    keynodes::resolve_identity,
    transports::ChannelConnector,
};
use crate::{
    Result,
    config::KeynodeNames,
    graph::GraphAddr,
    template::{
        SearchResult,
        identity::{IdentityKeynodes, LINK_ALIAS, user_creation_spec, user_lookup_template},
    },
};

/// Mirrors account identities into a graph store.
#[derive(Clone)]
pub struct AccountMirror {
    connector: Arc<dyn ChannelConnector>,
    names: KeynodeNames,
}

impl std::fmt::Debug for AccountMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountMirror")
            .field("transport", &self.connector.transport_type())
            .field("address", &self.connector.address())
            .field("names", &self.names)
            .finish()
    }
}

/// A login link together with the identity search run for it.
struct Hit {
    link: GraphAddr,
    result: SearchResult,
}

impl AccountMirror {
    pub fn new(connector: Arc<dyn ChannelConnector>, names: KeynodeNames) -> Self {
        Self { connector, names }
    }

    /// Mirror talking to the WebSocket endpoint named in `config`.
    #[cfg(feature = "websocket")]
    pub fn from_config(config: &crate::config::MirrorConfig) -> Result<Self> {
        use super::transports::websocket::WebSocketConnector;

        let connector = WebSocketConnector::new(config.endpoint_url()?);
        Ok(Self::new(Arc::new(connector), config.keynodes.clone()))
    }

    pub fn keynode_names(&self) -> &KeynodeNames {
        &self.names
    }

    pub fn connector(&self) -> &Arc<dyn ChannelConnector> {
        &self.connector
    }

    /// Whether `username` has at least one complete identity subgraph.
    pub async fn exists(&self, username: &str) -> Result<bool> {
        let span = info_span!("account_sync", operation = "exists", username);
        async {
            let mut client = self.open().await?;
            let result = self.exists_in(&mut client, username).await;
            let found = close(client, result).await?;
            info!(found, "Checked account");
            Ok(found)
        }
        .instrument(span)
        .await
    }

    /// Create the identity subgraph for `username`.
    ///
    /// Returns the created addresses in instruction order. An existing
    /// subgraph for the same username does not prevent creation.
    pub async fn create(&self, username: &str) -> Result<Vec<GraphAddr>> {
        let span = info_span!("account_sync", operation = "create", username);
        async {
            let mut client = self.open().await?;
            let result = self.create_in(&mut client, username).await;
            let created = close(client, result).await?;
            info!(elements = created.len(), "Created account");
            Ok(created)
        }
        .instrument(span)
        .await
    }

    /// Delete every identity subgraph for `username`.
    ///
    /// Returns the number of subgraphs deleted.
    pub async fn delete(&self, username: &str) -> Result<usize> {
        let span = info_span!("account_sync", operation = "delete", username);
        async {
            let mut client = self.open().await?;
            let result = self.delete_in(&mut client, username).await;
            let deleted = close(client, result).await?;
            info!(deleted, "Deleted account");
            Ok(deleted)
        }
        .instrument(span)
        .await
    }

    /// Replace `username` with `new_username` in every matching login link.
    ///
    /// Returns the number of links renamed.
    pub async fn rename(&self, username: &str, new_username: &str) -> Result<usize> {
        let span = info_span!("account_sync", operation = "rename", username, new_username);
        async {
            let mut client = self.open().await?;
            let result = self.rename_in(&mut client, username, new_username).await;
            let renamed = close(client, result).await?;
            info!(renamed, "Renamed account");
            Ok(renamed)
        }
        .instrument(span)
        .await
    }

    async fn open(&self) -> Result<GraphClient> {
        GraphClient::connect(self.connector.as_ref()).await
    }

    async fn exists_in(&self, client: &mut GraphClient, username: &str) -> Result<bool> {
        let hits = self.search_hits(client, username).await?;
        Ok(hits.iter().any(|hit| !hit.result.is_empty()))
    }

    async fn create_in(&self, client: &mut GraphClient, username: &str) -> Result<Vec<GraphAddr>> {
        let existing = self.exists_in(client, username).await?;
        debug!(existing, "Existing identity before create");

        let keynodes = resolve_identity(client, &self.names).await?;
        let spec = user_creation_spec(&keynodes, username)?;
        client.create_elements(&spec).await
    }

    async fn delete_in(&self, client: &mut GraphClient, username: &str) -> Result<usize> {
        let mut deleted = 0;
        for hit in self.search_hits(client, username).await? {
            if hit.result.is_empty() {
                warn!(link = %hit.link, "Login link has no identity subgraph, skipping");
                continue;
            }
            let addrs = hit.result.row_addrs(0);
            debug!(link = %hit.link, elements = addrs.len(), "Deleting identity subgraph");
            client.delete_elements(&addrs).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn rename_in(
        &self,
        client: &mut GraphClient,
        username: &str,
        new_username: &str,
    ) -> Result<usize> {
        let mut renamed = 0;
        for hit in self.search_hits(client, username).await? {
            let Some(link) = hit.result.get(0, LINK_ALIAS) else {
                warn!(link = %hit.link, "Login link has no identity subgraph, skipping");
                continue;
            };
            client.set_link_content(link, new_username).await?;
            renamed += 1;
        }
        Ok(renamed)
    }

    /// Find the login links holding `username` and run the identity search for each.
    ///
    /// Keynodes are only resolved when at least one link is found.
    async fn search_hits(&self, client: &mut GraphClient, username: &str) -> Result<Vec<Hit>> {
        let links = client.find_links(username).await?;
        if links.is_empty() {
            debug!("No login links found");
            return Ok(Vec::new());
        }

        let keynodes: IdentityKeynodes = resolve_identity(client, &self.names).await?;
        let mut hits = Vec::with_capacity(links.len());
        for link in links {
            let template = user_lookup_template(&keynodes, link)?;
            let result = client.search_template(&template).await?;
            hits.push(Hit { link, result });
        }
        Ok(hits)
    }
}

/// Close the session, then hand back the operation's own result.
async fn close<T>(client: GraphClient, result: Result<T>) -> Result<T> {
    if let Err(e) = client.close().await {
        debug!(error = %e, "Ignoring error while closing session");
    }
    result
}
