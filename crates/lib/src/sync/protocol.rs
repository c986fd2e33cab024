//! Protocol definitions for graph store communication.
//!
//! Every request is one JSON object `{"id", "type", "payload"}`. The six
//! operations the mirror needs are modelled as [`Command`] variants; the
//! mapping onto the five wire `type`s (find and set both travel as
//! `"content"`) happens in one place, the private `WirePayload`.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    graph::GraphAddr,
    sync::error::SyncError,
    template::{CreationSpec, Template},
};

/// A command sent to the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WirePayload", try_from = "WirePayload")]
pub enum Command {
    /// Resolve symbolic identifiers to addresses. Answered with one address
    /// per name, `0` for unknown names.
    ResolveKeynodes(Vec<String>),
    /// Find links whose content equals each text. Answered with one address
    /// list per text.
    FindLinks(Vec<String>),
    /// Search for subgraphs matching a template.
    SearchTemplate(Template),
    /// Create a batch of elements. Answered with one address per instruction.
    CreateElements(CreationSpec),
    /// Delete elements.
    DeleteElements(Vec<GraphAddr>),
    /// Replace the string content of a link.
    SetLinkContent { addr: GraphAddr, content: String },
}

impl Command {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResolveKeynodes(_) => "keynodes",
            Command::FindLinks(_) => "content.find",
            Command::SearchTemplate(_) => "search_template",
            Command::CreateElements(_) => "create_elements",
            Command::DeleteElements(_) => "delete_elements",
            Command::SetLinkContent { .. } => "content.set",
        }
    }
}

/// Request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation id. Used for diagnostics only; responses are never reordered.
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    pub fn new(id: u64, command: Command) -> Self {
        Self { id, command }
    }
}

/// Response envelope.
///
/// The payload is kept untyped until the client knows which command it
/// answers; see [`Response::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(default)]
    pub event: bool,
    #[serde(default = "status_ok")]
    pub status: bool,
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn status_ok() -> bool {
    true
}

impl Response {
    /// Successful response carrying `payload`.
    pub fn ok(id: u64, payload: impl Serialize) -> Result<Self, SyncError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| SyncError::SerializationError(e.to_string()))?;
        Ok(Self {
            id,
            event: false,
            status: true,
            payload,
        })
    }

    /// Response reporting that the store could not carry out the request.
    pub fn failed(id: u64) -> Self {
        Self {
            id,
            event: false,
            status: false,
            payload: serde_json::Value::Null,
        }
    }

    /// Decode the payload as the shape expected for `command`.
    pub fn decode<T: DeserializeOwned>(self, command: &'static str) -> Result<T, SyncError> {
        serde_json::from_value(self.payload).map_err(|e| SyncError::violation(command, e.to_string()))
    }
}

/// Sub-command of a `"keynodes"` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum KeynodeQuery {
    Find { idtf: String },
}

/// Link content encoding. Only strings are mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ContentType {
    String,
}

/// Sub-command of a `"content"` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum ContentOp {
    Find {
        data: String,
    },
    Set {
        addr: GraphAddr,
        #[serde(rename = "type")]
        content_type: ContentType,
        data: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
enum WirePayload {
    Keynodes(Vec<KeynodeQuery>),
    Content(Vec<ContentOp>),
    SearchTemplate(Template),
    CreateElements(CreationSpec),
    DeleteElements(Vec<GraphAddr>),
}

impl From<Command> for WirePayload {
    fn from(command: Command) -> Self {
        match command {
            Command::ResolveKeynodes(names) => WirePayload::Keynodes(
                names
                    .into_iter()
                    .map(|idtf| KeynodeQuery::Find { idtf })
                    .collect(),
            ),
            Command::FindLinks(texts) => WirePayload::Content(
                texts
                    .into_iter()
                    .map(|data| ContentOp::Find { data })
                    .collect(),
            ),
            Command::SearchTemplate(template) => WirePayload::SearchTemplate(template),
            Command::CreateElements(spec) => WirePayload::CreateElements(spec),
            Command::DeleteElements(addrs) => WirePayload::DeleteElements(addrs),
            Command::SetLinkContent { addr, content } => {
                WirePayload::Content(vec![ContentOp::Set {
                    addr,
                    content_type: ContentType::String,
                    data: content,
                }])
            }
        }
    }
}

impl TryFrom<WirePayload> for Command {
    type Error = String;

    fn try_from(payload: WirePayload) -> Result<Self, Self::Error> {
        Ok(match payload {
            WirePayload::Keynodes(queries) => Command::ResolveKeynodes(
                queries
                    .into_iter()
                    .map(|KeynodeQuery::Find { idtf }| idtf)
                    .collect(),
            ),
            WirePayload::Content(ops) => {
                if let [ContentOp::Set { addr, data, .. }] = ops.as_slice() {
                    return Ok(Command::SetLinkContent {
                        addr: *addr,
                        content: data.clone(),
                    });
                }
                Command::FindLinks(
                    ops.into_iter()
                        .map(|op| match op {
                            ContentOp::Find { data } => Ok(data),
                            ContentOp::Set { .. } => {
                                Err("content set must be the only sub-command".to_string())
                            }
                        })
                        .collect::<Result<_, _>>()?,
                )
            }
            WirePayload::SearchTemplate(template) => Command::SearchTemplate(template),
            WirePayload::CreateElements(spec) => Command::CreateElements(spec),
            WirePayload::DeleteElements(addrs) => Command::DeleteElements(addrs),
        })
    }
}
