//! Graph store selection from CLI arguments and config.

use std::sync::Arc;

use kbmirror::{
    config::MirrorConfig,
    sync::{AccountMirror, InMemoryGraph},
};

use crate::cli::StoreArgs;

/// The mirror a command runs against.
pub struct Store {
    pub mirror: AccountMirror,
    /// Set for dry runs, to report what would have been sent.
    pub memory: Option<InMemoryGraph>,
}

impl Store {
    /// Label for logs and human output.
    pub fn label(&self) -> String {
        self.mirror.connector().address()
    }

    /// Number of requests a dry run received.
    pub fn dry_run_requests(&self) -> Option<usize> {
        self.memory.as_ref().map(|graph| graph.requests().len())
    }
}

/// Load config from file, then apply endpoint overrides.
pub fn load_config(args: &StoreArgs) -> Result<MirrorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            MirrorConfig::load(path)?
        }
        None => MirrorConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone())?;
    }
    Ok(config)
}

/// Create the mirror described by the arguments.
///
/// With `--in-memory` the mirror talks to an empty in-process store that has
/// only the configured keynodes provisioned.
pub fn open_store(args: &StoreArgs) -> Result<Store, Box<dyn std::error::Error>> {
    let config = load_config(args)?;

    if args.in_memory {
        let graph = InMemoryGraph::new();
        graph.add_keynode(config.keynodes.login_relation.clone());
        graph.add_keynode(config.keynodes.ui_user.clone());
        tracing::info!("Using in-memory graph store (dry run)");
        let mirror = AccountMirror::new(Arc::new(graph.clone()), config.keynodes);
        return Ok(Store {
            mirror,
            memory: Some(graph),
        });
    }

    let mirror = AccountMirror::from_config(&config)?;
    tracing::info!("Using graph store at {}", config.endpoint);
    Ok(Store {
        mirror,
        memory: None,
    })
}
