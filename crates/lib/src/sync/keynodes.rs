//! Keynode resolution.
//!
//! Keynodes are the well-known elements the store provisions up front and
//! identifies by name. Their addresses do not change while a session is
//! open, so each session resolves a name at most once.

use std::collections::HashMap;

use tracing::debug;

use super::{client::GraphClient, error::SyncError};
use crate::{Result, config::KeynodeNames, graph::GraphAddr, template::identity::IdentityKeynodes};

/// Per-session cache of resolved keynode addresses.
#[derive(Debug, Default, Clone)]
pub struct KeynodeCache {
    resolved: HashMap<String, GraphAddr>,
}

impl KeynodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached address for `name`, if already resolved.
    pub fn get(&self, name: &str) -> Option<GraphAddr> {
        self.resolved.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Resolve `names` to addresses.
    ///
    /// Names not yet cached are sent in a single batch, each name once. When
    /// every name is cached no request is made. Fails with
    /// [`SyncError::UnresolvedKeynode`] if the store answers with fewer
    /// addresses than requested or with the null address for any name; in
    /// that case nothing from the batch is cached.
    pub async fn resolve(
        &mut self,
        client: &mut GraphClient,
        names: &[&str],
    ) -> Result<HashMap<String, GraphAddr>> {
        let mut missing: Vec<&str> = Vec::new();
        for name in names {
            if !self.resolved.contains_key(*name) && !missing.contains(name) {
                missing.push(*name);
            }
        }

        if !missing.is_empty() {
            debug!(names = ?missing, "Resolving keynodes");
            let addrs = client.resolve_keynodes(&missing).await?;
            let mut fresh = Vec::with_capacity(missing.len());
            for (index, name) in missing.iter().enumerate() {
                match addrs.get(index) {
                    Some(addr) if addr.is_valid() => fresh.push((name.to_string(), *addr)),
                    _ => {
                        return Err(SyncError::UnresolvedKeynode {
                            name: name.to_string(),
                        }
                        .into());
                    }
                }
            }
            self.resolved.extend(fresh);
        }

        Ok(names
            .iter()
            .filter_map(|name| self.get(name).map(|addr| (name.to_string(), addr)))
            .collect())
    }
}

/// Resolve the two keynodes anchoring identity subgraphs.
pub async fn resolve_identity(
    client: &mut GraphClient,
    names: &KeynodeNames,
) -> Result<IdentityKeynodes> {
    let resolved = client
        .keynodes(&[names.login_relation.as_str(), names.ui_user.as_str()])
        .await?;
    let lookup = |name: &str| {
        resolved
            .get(name)
            .copied()
            .ok_or_else(|| SyncError::UnresolvedKeynode {
                name: name.to_string(),
            })
    };
    Ok(IdentityKeynodes {
        login_relation: lookup(&names.login_relation)?,
        ui_user: lookup(&names.ui_user)?,
    })
}
