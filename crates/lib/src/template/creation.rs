//! Creation specs: a batch of new elements created in one store call.

use serde::{Deserialize, Serialize};

use super::TemplateError;
use crate::graph::{ElementType, GraphAddr};

/// Position of an instruction inside a [`CreationSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef(usize);

impl ElementRef {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Source or target of a new edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Endpoint {
    /// An element that already exists in the store.
    Addr(GraphAddr),
    /// An element created by an earlier instruction of the same spec.
    Ref(usize),
}

impl From<GraphAddr> for Endpoint {
    fn from(addr: GraphAddr) -> Self {
        Endpoint::Addr(addr)
    }
}

impl From<ElementRef> for Endpoint {
    fn from(element: ElementRef) -> Self {
        Endpoint::Ref(element.0)
    }
}

/// A single element-creation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "el", rename_all = "snake_case")]
pub enum CreateInstruction {
    Link {
        #[serde(rename = "type")]
        ty: ElementType,
        content: String,
    },
    Node {
        #[serde(rename = "type")]
        ty: ElementType,
    },
    Edge {
        #[serde(rename = "type")]
        ty: ElementType,
        src: Endpoint,
        trg: Endpoint,
    },
}

impl CreateInstruction {
    pub fn element_type(&self) -> ElementType {
        match self {
            CreateInstruction::Link { ty, .. }
            | CreateInstruction::Node { ty }
            | CreateInstruction::Edge { ty, .. } => *ty,
        }
    }
}

/// An ordered list of creation instructions.
///
/// Edges may point at elements created earlier in the same spec through
/// [`Endpoint::Ref`]. The store answers with one address per instruction,
/// in instruction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<CreateInstruction>", try_from = "Vec<CreateInstruction>")]
pub struct CreationSpec {
    instructions: Vec<CreateInstruction>,
}

impl CreationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[CreateInstruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Add a link carrying literal text content.
    pub fn link(&mut self, ty: ElementType, content: impl Into<String>) -> ElementRef {
        self.push(CreateInstruction::Link {
            ty,
            content: content.into(),
        })
    }

    pub fn node(&mut self, ty: ElementType) -> ElementRef {
        self.push(CreateInstruction::Node { ty })
    }

    /// Add an edge. Both endpoints must be existing addresses or refs to
    /// instructions already in the spec.
    pub fn edge(
        &mut self,
        ty: ElementType,
        src: impl Into<Endpoint>,
        trg: impl Into<Endpoint>,
    ) -> Result<ElementRef, TemplateError> {
        let (src, trg) = (src.into(), trg.into());
        let at = self.instructions.len();
        check_endpoint(at, src)?;
        check_endpoint(at, trg)?;
        Ok(self.push(CreateInstruction::Edge { ty, src, trg }))
    }

    fn push(&mut self, instruction: CreateInstruction) -> ElementRef {
        self.instructions.push(instruction);
        ElementRef(self.instructions.len() - 1)
    }
}

fn check_endpoint(at: usize, endpoint: Endpoint) -> Result<(), TemplateError> {
    match endpoint {
        Endpoint::Ref(target) if target == at => Err(TemplateError::SelfRef { at }),
        Endpoint::Ref(target) if target > at => Err(TemplateError::ForwardRef { at, target }),
        _ => Ok(()),
    }
}

impl From<CreationSpec> for Vec<CreateInstruction> {
    fn from(spec: CreationSpec) -> Self {
        spec.instructions
    }
}

impl TryFrom<Vec<CreateInstruction>> for CreationSpec {
    type Error = TemplateError;

    fn try_from(instructions: Vec<CreateInstruction>) -> Result<Self, Self::Error> {
        for (at, instruction) in instructions.iter().enumerate() {
            if let CreateInstruction::Edge { src, trg, .. } = instruction {
                check_endpoint(at, *src)?;
                check_endpoint(at, *trg)?;
            }
        }
        Ok(Self { instructions })
    }
}
