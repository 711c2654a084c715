use super::{graveyard_start, next_version, MergeOperation, Operation, OperationKind};
use crate::error::{ModelError, Result};
use crate::model::document::Document;
use crate::model::position::{Position, Stickiness};
use crate::model::range::Range;
use serde::{Deserialize, Serialize};

/// Split an element in two
///
/// Everything after `split_position` moves into a new sibling placed at
/// `insertion_position`. The sibling is either a fresh copy of the split
/// element or, when `graveyard_position` is set, an element taken back from
/// the graveyard (which is how an undone merge is redone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitOperation {
    pub split_position: Position,
    pub how_many: usize,
    pub insertion_position: Position,
    pub graveyard_position: Option<Position>,
    pub base_version: Option<u64>,
}

impl SplitOperation {
    pub fn new(
        split_position: Position,
        how_many: usize,
        insertion_position: Position,
        graveyard_position: Option<Position>,
        base_version: Option<u64>,
    ) -> Self {
        Self {
            split_position: split_position.sticking(Stickiness::ToNext),
            how_many,
            insertion_position,
            graveyard_position: graveyard_position.map(|position| position.sticking(Stickiness::ToNext)),
            base_version,
        }
    }

    /// Position right after the element containing `split_position`.
    pub fn get_insertion_position(split_position: &Position) -> Position {
        let mut path = split_position.get_parent_path().to_vec();
        if let Some(last) = path.last_mut() {
            *last += 1;
        }

        // A split in a root has no valid insertion position; validation rejects it.
        if path.is_empty() {
            path.push(0);
        }

        Position::from_parts(split_position.root(), path, Stickiness::ToPrevious)
    }

    /// Start of the new element's content.
    pub fn move_target_position(&self) -> Position {
        let mut path = self.insertion_position.path().to_vec();
        path.push(0);
        Position::from_parts(self.insertion_position.root(), path, Stickiness::ToNone)
    }

    /// Everything from `split_position` to the end of its parent.
    pub fn moved_range(&self) -> Range {
        let mut end = self.split_position.clone();
        end.set_offset(usize::MAX);
        Range::new(self.split_position.clone(), end)
    }

    /// Merge of the new element back into the split one.
    pub fn reversed(&self) -> Operation {
        Operation::Merge(MergeOperation::new(
            self.move_target_position(),
            self.how_many,
            self.split_position.clone(),
            graveyard_start(),
            next_version(self.base_version),
        ))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<()> {
        let invalid = |reason| ModelError::invalid(OperationKind::Split, reason);

        let element = self
            .split_position
            .parent(doc)
            .map_err(|_| invalid("split position is invalid"))?;
        let max_offset = doc.max_offset(element)?;

        if max_offset < self.split_position.offset() {
            return Err(invalid("split position is invalid"));
        }

        if doc.parent(element)?.is_none() {
            return Err(invalid("split in root"));
        }

        if self.how_many != max_offset - self.split_position.offset() {
            return Err(invalid("how many is invalid"));
        }

        if let Some(graveyard_position) = &self.graveyard_position {
            let has_element = graveyard_position
                .node_after(doc)
                .ok()
                .flatten()
                .and_then(|node| doc.node(node).ok())
                .is_some_and(|node| node.is_element());
            if !has_element {
                return Err(invalid("graveyard position is invalid"));
            }
        }

        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        let element = self.split_position.parent(doc)?;

        match &self.graveyard_position {
            Some(graveyard_position) => doc.move_nodes(graveyard_position, 1, &self.insertion_position)?,
            None => {
                let copy = doc.clone_element(element)?;
                doc.insert_nodes(&self.insertion_position, vec![copy])?;
            }
        }

        let source = Position::create_at(doc, element, self.split_position.offset())?;
        let how_many = doc.max_offset(element)? - source.offset();
        doc.move_nodes(&source, how_many, &self.move_target_position())
    }
}
