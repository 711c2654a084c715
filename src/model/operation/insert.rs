use super::{graveyard_start, next_version, MoveOperation, Operation, OperationKind};
use crate::error::{ModelError, Result};
use crate::model::document::Document;
use crate::model::node::NodeSpec;
use crate::model::position::{Position, Stickiness};
use serde::{Deserialize, Serialize};

/// Insert nodes at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOperation {
    pub position: Position,
    pub nodes: Vec<NodeSpec>,
    pub base_version: Option<u64>,
}

impl InsertOperation {
    pub fn new(position: Position, nodes: Vec<NodeSpec>, base_version: Option<u64>) -> Self {
        Self {
            position: position.sticking(Stickiness::ToNone),
            nodes,
            base_version,
        }
    }

    /// Offsets taken by the inserted nodes.
    pub fn how_many(&self) -> usize {
        self.nodes.iter().map(NodeSpec::offset_size).sum()
    }

    /// Removal of the inserted nodes.
    pub fn reversed(&self) -> Operation {
        Operation::Move(MoveOperation::new(
            self.position.clone(),
            self.how_many(),
            graveyard_start(),
            next_version(self.base_version),
        ))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<()> {
        let invalid = || ModelError::invalid(OperationKind::Insert, "insertion position is invalid");

        let parent = self.position.parent(doc).map_err(|_| invalid())?;
        if doc.max_offset(parent)? < self.position.offset() {
            return Err(invalid());
        }

        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        let nodes = self.nodes.iter().map(|spec| doc.create_from_spec(spec)).collect();
        doc.insert_nodes(&self.position, nodes)
    }
}
