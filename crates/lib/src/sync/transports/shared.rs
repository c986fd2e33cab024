//! Shared utilities for transport implementations.
//!
//! Both ends of a channel encode and decode the same JSON envelopes; these
//! helpers keep the error mapping consistent between them.

use crate::sync::{
    error::SyncError,
    protocol::{Request, Response},
};

/// Utilities for handling JSON serialization/deserialization in transports.
pub struct JsonHandler;

impl JsonHandler {
    /// Serialize a Request to JSON text.
    pub fn serialize_request(request: &Request) -> Result<String, SyncError> {
        serde_json::to_string(request)
            .map_err(|e| SyncError::SerializationError(format!("Failed to serialize request: {e}")))
    }

    /// Serialize a Response to JSON text.
    pub fn serialize_response(response: &Response) -> Result<String, SyncError> {
        serde_json::to_string(response).map_err(|e| {
            SyncError::SerializationError(format!("Failed to serialize response: {e}"))
        })
    }

    /// Deserialize JSON text to a Request.
    pub fn deserialize_request(text: &str) -> Result<Request, SyncError> {
        serde_json::from_str(text).map_err(|e| {
            SyncError::SerializationError(format!("Failed to deserialize request: {e}"))
        })
    }

    /// Deserialize JSON text to a Response.
    ///
    /// A message that is not a response envelope at all is a protocol
    /// violation of whatever command was outstanding.
    pub fn deserialize_response(text: &str, command: &'static str) -> Result<Response, SyncError> {
        serde_json::from_str(text)
            .map_err(|e| SyncError::violation(command, format!("malformed response: {e}")))
    }
}
