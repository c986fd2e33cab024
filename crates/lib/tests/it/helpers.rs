use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use kbmirror::{
    Result,
    config::KeynodeNames,
    graph::GraphAddr,
    sync::{
        AccountMirror, ChannelConnector, GraphChannel, InMemoryGraph, SyncError,
        protocol::{Command, Request},
    },
    template::CreationSpec,
};

/// Address of the login relation keynode in test stores.
pub const LOGIN_ADDR: GraphAddr = GraphAddr::new(10);
/// Address of the ui-user keynode in test stores.
pub const UI_ADDR: GraphAddr = GraphAddr::new(20);

// ==========================
// STORE FACTORIES
// ==========================

/// An in-memory store with both identity keynodes provisioned at fixed addresses.
pub fn setup_graph() -> InMemoryGraph {
    let graph = InMemoryGraph::new();
    graph
        .insert_keynode("nrel_login", LOGIN_ADDR)
        .expect("Failed to insert login keynode");
    graph
        .insert_keynode("ui_user", UI_ADDR)
        .expect("Failed to insert ui_user keynode");
    graph
}

/// A provisioned store and a mirror talking to it.
pub fn setup_mirror() -> (InMemoryGraph, AccountMirror) {
    let graph = setup_graph();
    let mirror = AccountMirror::new(Arc::new(graph.clone()), KeynodeNames::default());
    (graph, mirror)
}

/// Creation specs the store received, in order.
pub fn created_specs(graph: &InMemoryGraph) -> Vec<CreationSpec> {
    graph
        .requests_named("create_elements")
        .into_iter()
        .filter_map(|r| match r.command {
            Command::CreateElements(spec) => Some(spec),
            _ => None,
        })
        .collect()
}

/// Address lists of every delete request the store received, in order.
pub fn deleted_batches(graph: &InMemoryGraph) -> Vec<Vec<GraphAddr>> {
    graph
        .requests_named("delete_elements")
        .into_iter()
        .filter_map(|r| match r.command {
            Command::DeleteElements(addrs) => Some(addrs),
            _ => None,
        })
        .collect()
}

// ==========================
// SCRIPTED STORE
// ==========================

/// One scripted answer: a raw reply, or a dropped connection.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Drop,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Reply::Text(value.to_string())
    }
}

/// A fake store that answers with canned replies regardless of the request.
///
/// Every message the client sends is recorded.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedStore {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            sent: Arc::default(),
        }
    }

    /// Requests sent so far, decoded.
    pub fn requests(&self) -> Vec<Request> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| serde_json::from_str(text).expect("client sent an invalid request"))
            .collect()
    }
}

struct ScriptedChannel {
    store: ScriptedStore,
}

#[async_trait]
impl GraphChannel for ScriptedChannel {
    async fn send(&mut self, message: String) -> Result<()> {
        self.store.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        match self.store.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Drop) | None => {
                Err(SyncError::ChannelFailure("scripted store hung up".to_string()).into())
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ChannelConnector for ScriptedStore {
    fn transport_type(&self) -> &'static str {
        "scripted"
    }

    fn address(&self) -> String {
        "scripted://test".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn GraphChannel>> {
        Ok(Box::new(ScriptedChannel {
            store: self.clone(),
        }))
    }
}
