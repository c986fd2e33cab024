//! Error types for template and creation-spec construction.
//!
//! All of these are raised while a template is being built, before anything
//! is sent to the graph store.

use thiserror::Error;

use crate::graph::GraphAddr;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateError {
    /// An alias was referenced before any earlier item introduced it.
    #[error("Alias '{alias}' referenced in triple {triple} before it is bound")]
    UnboundAlias { alias: String, triple: usize },

    /// An alias was introduced twice.
    #[error("Alias '{alias}' is already bound")]
    DuplicateAlias { alias: String },

    /// One address was bound under two different aliases.
    #[error("Address {addr} is already bound as '{existing}', cannot rebind as '{alias}'")]
    ConflictingAddrAlias {
        addr: GraphAddr,
        existing: String,
        alias: String,
    },

    /// A template must contain at least one triple.
    #[error("Template has no triples")]
    EmptyTemplate,

    /// A creation instruction referenced a later instruction.
    #[error("Instruction {at} references instruction {target}, which does not precede it")]
    ForwardRef { at: usize, target: usize },

    /// A creation instruction referenced itself.
    #[error("Instruction {at} references itself")]
    SelfRef { at: usize },
}

impl TemplateError {
    /// Check if this error concerns alias binding order.
    pub fn is_alias_error(&self) -> bool {
        matches!(
            self,
            TemplateError::UnboundAlias { .. }
                | TemplateError::DuplicateAlias { .. }
                | TemplateError::ConflictingAddrAlias { .. }
        )
    }

    /// Check if this error concerns creation-spec references.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            TemplateError::ForwardRef { .. } | TemplateError::SelfRef { .. }
        )
    }
}

impl From<TemplateError> for crate::Error {
    fn from(err: TemplateError) -> Self {
        crate::Error::Template(err)
    }
}
