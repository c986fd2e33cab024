//! Error types for the graph element model.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphError {
    /// The store sent an element type code outside the known set.
    #[error("Unknown element type code: {code:#x}")]
    UnknownElementType { code: u16 },

    /// An address was required but the null sentinel was found.
    #[error("Null graph address")]
    NullAddress,
}

impl GraphError {
    /// Check if this error came from decoding store data.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            GraphError::UnknownElementType { .. } | GraphError::NullAddress
        )
    }
}

impl From<GraphError> for crate::Error {
    fn from(err: GraphError) -> Self {
        crate::Error::Graph(err)
    }
}
