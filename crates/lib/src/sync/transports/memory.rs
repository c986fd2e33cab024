//! In-process graph store.
//!
//! `InMemoryGraph` answers the same JSON protocol as a real graph store,
//! backed by an element table held in memory. It exists so the mirror can be
//! exercised without a running store: integration tests script it, and the
//! CLI uses it for dry runs.
//!
//! Every request it receives is recorded and can be inspected afterwards.
//! Faults can be injected to simulate a dropped connection or a store that
//! rejects a command.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tracing::trace;

use super::{ChannelConnector, GraphChannel, shared::JsonHandler};
use crate::{
    Result,
    graph::{ElementType, GraphAddr},
    sync::{
        error::SyncError,
        protocol::{Command, Request, Response},
    },
    template::{CreateInstruction, CreationSpec, Endpoint, SearchResult, Template, TemplateItem},
};

/// First address handed out to elements created through the protocol.
const FIRST_DYNAMIC_ADDR: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Node,
    Link(String),
    Edge { src: GraphAddr, trg: GraphAddr },
}

#[derive(Debug, Clone)]
struct Element {
    ty: ElementType,
    body: Body,
}

#[derive(Debug)]
struct GraphState {
    elements: BTreeMap<GraphAddr, Element>,
    keynodes: HashMap<String, GraphAddr>,
    next_addr: u64,
    requests: Vec<Request>,
    /// Number of further requests to answer before dropping connections.
    disconnect_after: Option<usize>,
    rejected: BTreeSet<&'static str>,
    overlapping_sends: usize,
}

impl Default for GraphState {
    fn default() -> Self {
        Self {
            elements: BTreeMap::new(),
            keynodes: HashMap::new(),
            next_addr: FIRST_DYNAMIC_ADDR,
            requests: Vec::new(),
            disconnect_after: None,
            rejected: BTreeSet::new(),
            overlapping_sends: 0,
        }
    }
}

/// An in-memory graph store shared by every channel it opens.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraph {
    state: Arc<Mutex<GraphState>>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a keynode backed by a fresh constant node.
    pub fn add_keynode(&self, name: impl Into<String>) -> GraphAddr {
        let mut state = self.state();
        let addr = state.allocate();
        state.elements.insert(
            addr,
            Element {
                ty: ElementType::NodeConst,
                body: Body::Node,
            },
        );
        state.keynodes.insert(name.into(), addr);
        addr
    }

    /// Register a keynode at a fixed address.
    ///
    /// Fixed addresses must stay below the dynamic range so they can never
    /// collide with elements created later.
    pub fn insert_keynode(&self, name: impl Into<String>, addr: GraphAddr) -> Result<()> {
        if !addr.is_valid() || addr.value() >= FIRST_DYNAMIC_ADDR {
            return Err(SyncError::UnresolvedKeynode { name: name.into() }.into());
        }
        let mut state = self.state();
        state.elements.insert(
            addr,
            Element {
                ty: ElementType::NodeConst,
                body: Body::Node,
            },
        );
        state.keynodes.insert(name.into(), addr);
        Ok(())
    }

    /// Store a bare constant link, unattached to anything.
    pub fn add_link(&self, content: impl Into<String>) -> GraphAddr {
        let mut state = self.state();
        let addr = state.allocate();
        state.elements.insert(
            addr,
            Element {
                ty: ElementType::LinkConst,
                body: Body::Link(content.into()),
            },
        );
        addr
    }

    /// All requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.state().requests.clone()
    }

    /// Requests whose command has the given [`Command::name`].
    pub fn requests_named(&self, name: &str) -> Vec<Request> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.command.name() == name)
            .cloned()
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state().requests.clear();
    }

    /// Answer `n` more requests, then fail every open and future channel.
    pub fn disconnect_after(&self, n: usize) {
        self.state().disconnect_after = Some(n);
    }

    /// Answer every request with the given [`Command::name`] with `status: false`.
    pub fn reject(&self, command: &'static str) {
        self.state().rejected.insert(command);
    }

    /// Number of times a request was sent while another was still unanswered.
    pub fn overlapping_sends(&self) -> usize {
        self.state().overlapping_sends
    }

    pub fn contains(&self, addr: GraphAddr) -> bool {
        self.state().elements.contains_key(&addr)
    }

    pub fn element_count(&self) -> usize {
        self.state().elements.len()
    }

    pub fn link_content(&self, addr: GraphAddr) -> Option<String> {
        match &self.state().elements.get(&addr)?.body {
            Body::Link(content) => Some(content.clone()),
            _ => None,
        }
    }

    /// Source and target of an edge.
    pub fn edge_ends(&self, addr: GraphAddr) -> Option<(GraphAddr, GraphAddr)> {
        match self.state().elements.get(&addr)?.body {
            Body::Edge { src, trg } => Some((src, trg)),
            _ => None,
        }
    }

    /// Links whose content equals `content`.
    pub fn links_with_content(&self, content: &str) -> Vec<GraphAddr> {
        self.state().find_links(content)
    }

    /// Process one raw request and produce the raw response, or `None` if the
    /// connection should drop instead of answering.
    fn process(&self, text: &str) -> Result<Option<String>> {
        let request = JsonHandler::deserialize_request(text)?;
        let mut state = self.state();
        state.requests.push(request.clone());

        if let Some(remaining) = state.disconnect_after.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }

        let response = if state.rejected.contains(request.command.name()) {
            Response::failed(request.id)
        } else {
            state.handle(request.id, request.command)?
        };
        Ok(Some(JsonHandler::serialize_response(&response)?))
    }
}

impl GraphState {
    fn allocate(&mut self) -> GraphAddr {
        let addr = GraphAddr::new(self.next_addr);
        self.next_addr += 1;
        addr
    }

    fn handle(&mut self, id: u64, command: Command) -> std::result::Result<Response, SyncError> {
        match command {
            Command::ResolveKeynodes(names) => {
                let addrs: Vec<GraphAddr> = names
                    .iter()
                    .map(|n| self.keynodes.get(n).copied().unwrap_or(GraphAddr::EMPTY))
                    .collect();
                Response::ok(id, addrs)
            }
            Command::FindLinks(texts) => {
                let hits: Vec<Vec<GraphAddr>> = texts.iter().map(|t| self.find_links(t)).collect();
                Response::ok(id, hits)
            }
            Command::SearchTemplate(template) => Response::ok(id, self.search(&template)),
            Command::CreateElements(spec) => match self.create(&spec) {
                Some(addrs) => Response::ok(id, addrs),
                None => Ok(Response::failed(id)),
            },
            Command::DeleteElements(addrs) => {
                self.delete_cascade(&addrs);
                Response::ok(id, true)
            }
            Command::SetLinkContent { addr, content } => {
                let updated = match self.elements.get_mut(&addr) {
                    Some(Element {
                        body: Body::Link(current),
                        ..
                    }) => {
                        *current = content;
                        true
                    }
                    _ => false,
                };
                Response::ok(id, vec![updated])
            }
        }
    }

    fn find_links(&self, content: &str) -> Vec<GraphAddr> {
        self.elements
            .iter()
            .filter(|(_, e)| matches!(&e.body, Body::Link(c) if c == content))
            .map(|(addr, _)| *addr)
            .collect()
    }

    /// Create every instruction or nothing.
    fn create(&mut self, spec: &CreationSpec) -> Option<Vec<GraphAddr>> {
        let base = self.next_addr;
        let resolve = |endpoint: &Endpoint, elements: &BTreeMap<GraphAddr, Element>| match endpoint {
            Endpoint::Addr(addr) => elements.contains_key(addr).then_some(*addr),
            Endpoint::Ref(index) => Some(GraphAddr::new(base + *index as u64)),
        };

        let mut staged = Vec::with_capacity(spec.len());
        for instruction in spec.instructions() {
            let ty = instruction.element_type();
            let body = match instruction {
                CreateInstruction::Link { content, .. } if ty.is_link() => {
                    Body::Link(content.clone())
                }
                CreateInstruction::Node { .. } if ty.is_node() => Body::Node,
                CreateInstruction::Edge { src, trg, .. } if ty.is_edge() => Body::Edge {
                    src: resolve(src, &self.elements)?,
                    trg: resolve(trg, &self.elements)?,
                },
                _ => return None,
            };
            if ty.is_var() {
                return None;
            }
            staged.push(Element { ty, body });
        }

        let addrs = staged
            .into_iter()
            .map(|element| {
                let addr = self.allocate();
                self.elements.insert(addr, element);
                addr
            })
            .collect();
        Some(addrs)
    }

    /// Remove elements and, transitively, every edge incident to a removed element.
    fn delete_cascade(&mut self, roots: &[GraphAddr]) {
        let mut doomed: BTreeSet<GraphAddr> = roots
            .iter()
            .copied()
            .filter(|a| self.elements.contains_key(a))
            .collect();
        loop {
            let incident: Vec<GraphAddr> = self
                .elements
                .iter()
                .filter(|(addr, _)| !doomed.contains(addr))
                .filter(|(_, e)| {
                    matches!(e.body, Body::Edge { src, trg } if doomed.contains(&src) || doomed.contains(&trg))
                })
                .map(|(addr, _)| *addr)
                .collect();
            if incident.is_empty() {
                break;
            }
            doomed.extend(incident);
        }
        for addr in &doomed {
            self.elements.remove(addr);
        }
        self.keynodes.retain(|_, addr| !doomed.contains(addr));
    }

    fn search(&self, template: &Template) -> SearchResult {
        let aliases: HashMap<String, usize> = template
            .aliases()
            .iter()
            .enumerate()
            .map(|(column, alias)| (alias.clone(), column))
            .collect();
        let mut rows = Vec::new();
        let mut bindings = HashMap::new();
        self.match_from(template.triples(), &mut bindings, &mut |bound| {
            rows.push(
                template
                    .aliases()
                    .iter()
                    .map(|alias| bound.get(alias.as_str()).copied().unwrap_or(GraphAddr::EMPTY))
                    .collect(),
            );
        });
        SearchResult { aliases, rows }
    }

    /// Depth-first match of `triples` against every edge, extending `bindings`.
    fn match_from<'t>(
        &self,
        triples: &'t [[TemplateItem; 3]],
        bindings: &mut HashMap<&'t str, GraphAddr>,
        emit: &mut dyn FnMut(&HashMap<&'t str, GraphAddr>),
    ) {
        let Some(([source, edge, target], rest)) = triples.split_first() else {
            emit(bindings);
            return;
        };

        for (addr, element) in &self.elements {
            let Body::Edge { src, trg } = element.body else {
                continue;
            };
            let mut added = Vec::new();
            if self.bind(source, src, bindings, &mut added)
                && self.bind(edge, *addr, bindings, &mut added)
                && self.bind(target, trg, bindings, &mut added)
            {
                self.match_from(rest, bindings, emit);
            }
            for alias in added {
                bindings.remove(alias);
            }
        }
    }

    fn bind<'t>(
        &self,
        item: &'t TemplateItem,
        actual: GraphAddr,
        bindings: &mut HashMap<&'t str, GraphAddr>,
        added: &mut Vec<&'t str>,
    ) -> bool {
        let alias = match item {
            TemplateItem::Addr { value, alias } => {
                if *value != actual {
                    return false;
                }
                alias.as_deref()
            }
            TemplateItem::Type { value, alias } => {
                let Some(element) = self.elements.get(&actual) else {
                    return false;
                };
                if !value.matches(element.ty) {
                    return false;
                }
                Some(alias.as_str())
            }
            TemplateItem::Alias { value } => {
                return bindings.get(value.as_str()) == Some(&actual);
            }
        };
        match alias {
            Some(alias) => match bindings.get(alias) {
                Some(existing) => *existing == actual,
                None => {
                    bindings.insert(alias, actual);
                    added.push(alias);
                    true
                }
            },
            None => true,
        }
    }
}

#[async_trait]
impl ChannelConnector for InMemoryGraph {
    fn transport_type(&self) -> &'static str {
        "memory"
    }

    fn address(&self) -> String {
        "memory://local".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn GraphChannel>> {
        if self.state().disconnect_after == Some(0) {
            return Err(SyncError::ConnectionFailed {
                address: self.address(),
                reason: "store unavailable".to_string(),
            }
            .into());
        }
        Ok(Box::new(MemoryChannel {
            graph: self.clone(),
            pending: VecDeque::new(),
            dropped: false,
            closed: false,
        }))
    }
}

/// One connection to an [`InMemoryGraph`].
pub struct MemoryChannel {
    graph: InMemoryGraph,
    pending: VecDeque<String>,
    dropped: bool,
    closed: bool,
}

#[async_trait]
impl GraphChannel for MemoryChannel {
    async fn send(&mut self, message: String) -> Result<()> {
        if self.closed || self.dropped {
            return Err(SyncError::ChannelFailure("connection is not open".to_string()).into());
        }
        if !self.pending.is_empty() {
            self.graph.state().overlapping_sends += 1;
        }
        trace!(%message, "memory store received");
        match self.graph.process(&message)? {
            Some(response) => self.pending.push_back(response),
            None => self.dropped = true,
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        if let Some(response) = self.pending.pop_front() {
            return Ok(response);
        }
        let reason = if self.dropped {
            "connection dropped by store"
        } else {
            "no response pending"
        };
        Err(SyncError::ChannelFailure(reason.to_string()).into())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.pending.clear();
        Ok(())
    }
}
