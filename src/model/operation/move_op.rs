use super::{next_version, Operation, OperationKind};
use crate::error::{ModelError, Result};
use crate::model::document::Document;
use crate::model::node::NodeId;
use crate::model::path::{compare_paths, PathRelation};
use crate::model::position::{Position, Stickiness};
use serde::{Deserialize, Serialize};

/// Move nodes to another place
///
/// Removal is a move into the graveyard root, reinsertion a move out of it.
/// `target_position` is expressed in the tree before the move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOperation {
    pub source_position: Position,
    pub how_many: usize,
    pub target_position: Position,
    pub base_version: Option<u64>,
}

impl MoveOperation {
    pub fn new(
        source_position: Position,
        how_many: usize,
        target_position: Position,
        base_version: Option<u64>,
    ) -> Self {
        Self {
            source_position: source_position.sticking(Stickiness::ToNext),
            how_many,
            target_position: target_position.sticking(Stickiness::ToNone),
            base_version,
        }
    }

    /// `Remove` into the graveyard, `Reinsert` out of it, `Move` otherwise.
    pub fn kind(&self) -> OperationKind {
        if self.target_position.root() == NodeId::GRAVEYARD {
            OperationKind::Remove
        } else if self.source_position.root() == NodeId::GRAVEYARD {
            OperationKind::Reinsert
        } else {
            OperationKind::Move
        }
    }

    /// Where the moved nodes start after the move.
    pub fn moved_range_start(&self) -> Position {
        self.target_position
            .get_transformed_by_deletion(&self.source_position, self.how_many)
            .unwrap_or_else(|| self.target_position.clone())
    }

    /// Move of the same nodes back to where they came from.
    pub fn reversed(&self) -> Operation {
        let target = self
            .source_position
            .get_transformed_by_insertion(&self.target_position, self.how_many);

        Operation::Move(MoveOperation::new(
            self.moved_range_start(),
            self.how_many,
            target,
            next_version(self.base_version),
        ))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<()> {
        let kind = self.kind();

        let source_parent = self
            .source_position
            .parent(doc)
            .map_err(|_| ModelError::invalid(kind, "source position is invalid"))?;
        let target_parent = self
            .target_position
            .parent(doc)
            .map_err(|_| ModelError::invalid(kind, "target position is invalid"))?;

        let source_offset = self.source_position.offset();
        let target_offset = self.target_position.offset();
        let source_end = source_offset + self.how_many;

        if source_end > doc.max_offset(source_parent)? {
            return Err(ModelError::invalid(kind, "nodes do not exist"));
        }

        if target_offset > doc.max_offset(target_parent)? {
            return Err(ModelError::invalid(kind, "target position is invalid"));
        }

        if source_parent == target_parent && source_offset < target_offset && target_offset < source_end {
            return Err(ModelError::invalid(kind, "range moved into itself"));
        }

        if self.source_position.root() == self.target_position.root()
            && compare_paths(
                self.source_position.get_parent_path(),
                self.target_position.get_parent_path(),
            ) == PathRelation::Prefix
        {
            let i = self.source_position.path().len() - 1;
            let entry = self.target_position.path()[i];
            if entry >= source_offset && entry < source_end {
                return Err(ModelError::invalid(kind, "node moved into itself"));
            }
        }

        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        doc.move_nodes(&self.source_position, self.how_many, &self.target_position)
    }
}
