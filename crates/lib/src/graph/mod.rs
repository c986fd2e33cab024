//! Graph element model.
//!
//! Addresses and element types as the graph store sees them. Nothing in this
//! module talks to the store; these are plain values that flow through the
//! template builders and the protocol client.

use std::fmt;

use serde::{Deserialize, Serialize};

mod errors;
mod types;

pub use errors::GraphError;
pub use types::{AccessPolarity, EdgeSemantics, ElementKind, ElementType, Permanence};

/// Address of an element already materialized in the graph store.
///
/// Addresses are owned by the store. The client only ever copies them out of
/// one response and into the next request. `0` is the store's null address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphAddr(u64);

impl GraphAddr {
    /// The null address returned by the store for missing elements.
    pub const EMPTY: GraphAddr = GraphAddr(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw wire value.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns false for the null address.
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Return this address, or [`GraphError::NullAddress`] if it is the null sentinel.
    pub fn require_valid(self) -> Result<Self, GraphError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(GraphError::NullAddress)
        }
    }
}

impl fmt::Display for GraphAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for GraphAddr {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<GraphAddr> for u64 {
    fn from(addr: GraphAddr) -> Self {
        addr.0
    }
}
