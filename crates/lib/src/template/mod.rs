//! Triple-pattern templates and creation specs.
//!
//! A [`Template`] describes a subgraph to search for: an ordered list of
//! `(source, edge, target)` triples whose positions are either bound
//! addresses, element types that introduce a new alias, or references to an
//! alias introduced earlier. A [`CreationSpec`] describes a subgraph to create
//! in a single call, wiring new elements together by instruction index.
//!
//! Both are only constructible through checked builders, so an alias used
//! before it is bound or a reference to a later instruction is rejected
//! before any request reaches the store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::{ElementType, GraphAddr};

mod creation;
mod errors;
pub mod identity;

pub use creation::{CreateInstruction, CreationSpec, ElementRef, Endpoint};
pub use errors::TemplateError;

/// One position of a template triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateItem {
    /// A known address, optionally given an alias so later triples can refer to it.
    Addr {
        value: GraphAddr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    /// Any element of the given type; the match is bound to `alias`.
    Type { value: ElementType, alias: String },
    /// The element already bound to this alias.
    Alias { value: String },
}

impl TemplateItem {
    pub fn addr(addr: GraphAddr) -> Self {
        TemplateItem::Addr {
            value: addr,
            alias: None,
        }
    }

    pub fn addr_as(addr: GraphAddr, alias: impl Into<String>) -> Self {
        TemplateItem::Addr {
            value: addr,
            alias: Some(alias.into()),
        }
    }

    pub fn typed(ty: ElementType, alias: impl Into<String>) -> Self {
        TemplateItem::Type {
            value: ty,
            alias: alias.into(),
        }
    }

    pub fn alias(name: impl Into<String>) -> Self {
        TemplateItem::Alias { value: name.into() }
    }

    /// The alias this item introduces, if any.
    pub fn introduces(&self) -> Option<&str> {
        match self {
            TemplateItem::Addr { alias, .. } => alias.as_deref(),
            TemplateItem::Type { alias, .. } => Some(alias),
            TemplateItem::Alias { .. } => None,
        }
    }
}

/// A search pattern over the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<[TemplateItem; 3]>", try_from = "Vec<[TemplateItem; 3]>")]
pub struct Template {
    triples: Vec<[TemplateItem; 3]>,
    aliases: Vec<String>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::new()
    }

    pub fn triples(&self) -> &[[TemplateItem; 3]] {
        &self.triples
    }

    /// Aliases in the order they are introduced.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl From<Template> for Vec<[TemplateItem; 3]> {
    fn from(template: Template) -> Self {
        template.triples
    }
}

impl TryFrom<Vec<[TemplateItem; 3]>> for Template {
    type Error = TemplateError;

    fn try_from(triples: Vec<[TemplateItem; 3]>) -> Result<Self, Self::Error> {
        triples
            .into_iter()
            .try_fold(TemplateBuilder::new(), |builder, [s, p, o]| {
                builder.triple(s, p, o)
            })?
            .build()
    }
}

/// Builds a [`Template`], checking alias order as each triple is added.
///
/// Items within a triple are checked left to right, so the target of a
/// triple may refer to an alias introduced by its source.
///
/// ```
/// use kbmirror::graph::{ElementType, GraphAddr};
/// use kbmirror::template::{Template, TemplateItem};
///
/// let template = Template::builder()
///     .triple(
///         TemplateItem::addr(GraphAddr::new(10)),
///         TemplateItem::typed(ElementType::EdgeAccessVarPosPerm, "_edge"),
///         TemplateItem::typed(ElementType::NodeVar, "_node"),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
/// assert_eq!(template.aliases(), ["_edge", "_node"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    triples: Vec<[TemplateItem; 3]>,
    aliases: Vec<String>,
    addr_aliases: HashMap<GraphAddr, String>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a triple, rejecting it if it breaks alias binding order.
    pub fn triple(
        mut self,
        source: TemplateItem,
        edge: TemplateItem,
        target: TemplateItem,
    ) -> Result<Self, TemplateError> {
        self.triple_mut(source, edge, target)?;
        Ok(self)
    }

    /// Mutable reference version of [`TemplateBuilder::triple`].
    ///
    /// On error the builder is left unchanged.
    pub fn triple_mut(
        &mut self,
        source: TemplateItem,
        edge: TemplateItem,
        target: TemplateItem,
    ) -> Result<&mut Self, TemplateError> {
        let index = self.triples.len();
        let mut introduced: Vec<&str> = Vec::new();
        let mut addr_bindings: Vec<(GraphAddr, &str)> = Vec::new();

        for item in [&source, &edge, &target] {
            match item {
                TemplateItem::Alias { value } => {
                    let bound = self.aliases.iter().any(|a| a == value)
                        || introduced.contains(&value.as_str());
                    if !bound {
                        return Err(TemplateError::UnboundAlias {
                            alias: value.clone(),
                            triple: index,
                        });
                    }
                }
                TemplateItem::Type { alias, .. } => {
                    self.check_new_alias(alias, &introduced)?;
                    introduced.push(alias.as_str());
                }
                TemplateItem::Addr {
                    value,
                    alias: Some(alias),
                } => {
                    self.check_new_alias(alias, &introduced)?;
                    let existing = self
                        .addr_aliases
                        .get(value)
                        .map(String::as_str)
                        .or_else(|| {
                            addr_bindings
                                .iter()
                                .find(|(addr, _)| addr == value)
                                .map(|(_, a)| *a)
                        });
                    if let Some(existing) = existing {
                        return Err(TemplateError::ConflictingAddrAlias {
                            addr: *value,
                            existing: existing.to_string(),
                            alias: alias.clone(),
                        });
                    }
                    introduced.push(alias.as_str());
                    addr_bindings.push((*value, alias.as_str()));
                }
                TemplateItem::Addr { alias: None, .. } => {}
            }
        }

        let introduced: Vec<String> = introduced.into_iter().map(str::to_string).collect();
        let addr_bindings: Vec<(GraphAddr, String)> = addr_bindings
            .into_iter()
            .map(|(addr, alias)| (addr, alias.to_string()))
            .collect();

        self.aliases.extend(introduced);
        self.addr_aliases.extend(addr_bindings);
        self.triples.push([source, edge, target]);
        Ok(self)
    }

    fn check_new_alias(&self, alias: &str, introduced: &[&str]) -> Result<(), TemplateError> {
        if self.aliases.iter().any(|a| a == alias) || introduced.contains(&alias) {
            return Err(TemplateError::DuplicateAlias {
                alias: alias.to_string(),
            });
        }
        Ok(())
    }

    pub fn build(self) -> Result<Template, TemplateError> {
        if self.triples.is_empty() {
            return Err(TemplateError::EmptyTemplate);
        }
        Ok(Template {
            triples: self.triples,
            aliases: self.aliases,
        })
    }
}

/// Matches produced by running a [`Template`] against the store.
///
/// `aliases` maps each alias to a column; every row in `rows` is one
/// independent match. No rows means nothing matched, which is a normal
/// outcome rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub aliases: HashMap<String, usize>,
    #[serde(rename = "addrs")]
    pub rows: Vec<Vec<GraphAddr>>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Address bound to `alias` in match `row`.
    pub fn get(&self, row: usize, alias: &str) -> Option<GraphAddr> {
        let column = *self.aliases.get(alias)?;
        self.rows.get(row)?.get(column).copied()
    }

    /// Every aliased address of match `row`, in column order, without duplicates.
    pub fn row_addrs(&self, row: usize) -> Vec<GraphAddr> {
        let Some(values) = self.rows.get(row) else {
            return Vec::new();
        };
        let mut columns: Vec<usize> = self.aliases.values().copied().collect();
        columns.sort_unstable();
        columns.dedup();

        let mut addrs = Vec::with_capacity(columns.len());
        for column in columns {
            if let Some(addr) = values.get(column)
                && !addrs.contains(addr)
            {
                addrs.push(*addr);
            }
        }
        addrs
    }
}
