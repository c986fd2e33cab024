//! Element type vocabulary.
//!
//! Every element in the graph store carries a type code built from a small
//! set of bit flags. Only the combinations listed in [`ElementType`] are used
//! by this crate; anything else coming off the wire is rejected.

use serde::{Deserialize, Serialize};

use super::GraphError;

mod bits {
    pub const NODE: u16 = 0x1;
    pub const LINK: u16 = 0x2;
    pub const EDGE_UCOMMON: u16 = 0x4;
    pub const EDGE_DCOMMON: u16 = 0x8;
    pub const EDGE_ACCESS: u16 = 0x10;
    pub const CONST: u16 = 0x20;
    pub const VAR: u16 = 0x40;
    pub const POS: u16 = 0x80;
    pub const NEG: u16 = 0x100;
    pub const FUZ: u16 = 0x200;
    pub const TEMP: u16 = 0x400;
    pub const PERM: u16 = 0x800;

    pub const PERMANENCE_MASK: u16 = CONST | VAR;
}

use bits::*;

/// Structural kind of a graph element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Link,
    Edge,
}

/// Whether an element denotes a fixed fact or a pattern variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permanence {
    Const,
    Var,
}

/// Membership polarity of an access edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessPolarity {
    Positive,
    Negative,
    Fuzzy,
}

/// What an edge means, independent of its permanence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSemantics {
    CommonUndirected,
    CommonDirected,
    Access {
        polarity: AccessPolarity,
        permanent: bool,
    },
}

/// The closed set of element types used in templates and creation specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ElementType {
    NodeConst,
    NodeVar,
    LinkConst,
    LinkVar,
    EdgeUCommonConst,
    EdgeUCommonVar,
    EdgeDCommonConst,
    EdgeDCommonVar,
    EdgeAccessConstPosPerm,
    EdgeAccessVarPosPerm,
    EdgeAccessConstNegPerm,
    EdgeAccessVarNegPerm,
    EdgeAccessConstFuzPerm,
    EdgeAccessVarFuzPerm,
    EdgeAccessConstPosTemp,
    EdgeAccessVarPosTemp,
    EdgeAccessConstNegTemp,
    EdgeAccessVarNegTemp,
}

impl ElementType {
    /// Every known type, in declaration order.
    pub const ALL: [ElementType; 18] = [
        ElementType::NodeConst,
        ElementType::NodeVar,
        ElementType::LinkConst,
        ElementType::LinkVar,
        ElementType::EdgeUCommonConst,
        ElementType::EdgeUCommonVar,
        ElementType::EdgeDCommonConst,
        ElementType::EdgeDCommonVar,
        ElementType::EdgeAccessConstPosPerm,
        ElementType::EdgeAccessVarPosPerm,
        ElementType::EdgeAccessConstNegPerm,
        ElementType::EdgeAccessVarNegPerm,
        ElementType::EdgeAccessConstFuzPerm,
        ElementType::EdgeAccessVarFuzPerm,
        ElementType::EdgeAccessConstPosTemp,
        ElementType::EdgeAccessVarPosTemp,
        ElementType::EdgeAccessConstNegTemp,
        ElementType::EdgeAccessVarNegTemp,
    ];

    /// Wire-level integer code expected by the graph store.
    pub const fn code(self) -> u16 {
        match self {
            ElementType::NodeConst => NODE | CONST,
            ElementType::NodeVar => NODE | VAR,
            ElementType::LinkConst => LINK | CONST,
            ElementType::LinkVar => LINK | VAR,
            ElementType::EdgeUCommonConst => EDGE_UCOMMON | CONST,
            ElementType::EdgeUCommonVar => EDGE_UCOMMON | VAR,
            ElementType::EdgeDCommonConst => EDGE_DCOMMON | CONST,
            ElementType::EdgeDCommonVar => EDGE_DCOMMON | VAR,
            ElementType::EdgeAccessConstPosPerm => EDGE_ACCESS | CONST | POS | PERM,
            ElementType::EdgeAccessVarPosPerm => EDGE_ACCESS | VAR | POS | PERM,
            ElementType::EdgeAccessConstNegPerm => EDGE_ACCESS | CONST | NEG | PERM,
            ElementType::EdgeAccessVarNegPerm => EDGE_ACCESS | VAR | NEG | PERM,
            ElementType::EdgeAccessConstFuzPerm => EDGE_ACCESS | CONST | FUZ | PERM,
            ElementType::EdgeAccessVarFuzPerm => EDGE_ACCESS | VAR | FUZ | PERM,
            ElementType::EdgeAccessConstPosTemp => EDGE_ACCESS | CONST | POS | TEMP,
            ElementType::EdgeAccessVarPosTemp => EDGE_ACCESS | VAR | POS | TEMP,
            ElementType::EdgeAccessConstNegTemp => EDGE_ACCESS | CONST | NEG | TEMP,
            ElementType::EdgeAccessVarNegTemp => EDGE_ACCESS | VAR | NEG | TEMP,
        }
    }

    /// Decode a wire code, failing on anything outside the known set.
    pub fn from_code(code: u16) -> Result<Self, GraphError> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.code() == code)
            .ok_or(GraphError::UnknownElementType { code })
    }

    pub const fn kind(self) -> ElementKind {
        let code = self.code();
        if code & NODE != 0 {
            ElementKind::Node
        } else if code & LINK != 0 {
            ElementKind::Link
        } else {
            ElementKind::Edge
        }
    }

    pub const fn permanence(self) -> Permanence {
        if self.code() & VAR != 0 {
            Permanence::Var
        } else {
            Permanence::Const
        }
    }

    /// Edge semantics, or `None` for nodes and links.
    pub const fn edge_semantics(self) -> Option<EdgeSemantics> {
        let code = self.code();
        if code & EDGE_UCOMMON != 0 {
            Some(EdgeSemantics::CommonUndirected)
        } else if code & EDGE_DCOMMON != 0 {
            Some(EdgeSemantics::CommonDirected)
        } else if code & EDGE_ACCESS != 0 {
            let polarity = if code & NEG != 0 {
                AccessPolarity::Negative
            } else if code & FUZ != 0 {
                AccessPolarity::Fuzzy
            } else {
                AccessPolarity::Positive
            };
            Some(EdgeSemantics::Access {
                polarity,
                permanent: code & PERM != 0,
            })
        } else {
            None
        }
    }

    pub const fn is_node(self) -> bool {
        matches!(self.kind(), ElementKind::Node)
    }

    pub const fn is_link(self) -> bool {
        matches!(self.kind(), ElementKind::Link)
    }

    pub const fn is_edge(self) -> bool {
        matches!(self.kind(), ElementKind::Edge)
    }

    pub const fn is_const(self) -> bool {
        matches!(self.permanence(), Permanence::Const)
    }

    pub const fn is_var(self) -> bool {
        matches!(self.permanence(), Permanence::Var)
    }

    /// Check whether an element of type `actual` satisfies this type used as
    /// a template pattern.
    ///
    /// The structural bits must agree exactly. A variable pattern accepts
    /// both constant and variable elements; a constant pattern accepts only
    /// constants.
    pub fn matches(self, actual: ElementType) -> bool {
        let shape = |ty: ElementType| ty.code() & !PERMANENCE_MASK;
        if shape(self) != shape(actual) {
            return false;
        }
        self.is_var() || actual.is_const()
    }
}

impl From<ElementType> for u16 {
    fn from(ty: ElementType) -> Self {
        ty.code()
    }
}

impl TryFrom<u16> for ElementType {
    type Error = GraphError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        ElementType::from_code(code)
    }
}
