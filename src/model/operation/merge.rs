use super::{next_version, Operation, OperationKind, SplitOperation};
use crate::error::{ModelError, Result};
use crate::model::document::Document;
use crate::model::position::{Position, Stickiness};
use crate::model::range::Range;
use serde::{Deserialize, Serialize};

/// Merge an element into another one
///
/// The content starting at `source_position` (the whole content of the
/// merged element) is appended at `target_position`, then the emptied
/// element is moved to `graveyard_position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOperation {
    pub source_position: Position,
    pub how_many: usize,
    pub target_position: Position,
    pub graveyard_position: Position,
    pub base_version: Option<u64>,
}

impl MergeOperation {
    pub fn new(
        source_position: Position,
        how_many: usize,
        target_position: Position,
        graveyard_position: Position,
        base_version: Option<u64>,
    ) -> Self {
        Self {
            source_position: source_position.sticking(Stickiness::ToPrevious),
            how_many,
            target_position: target_position.sticking(Stickiness::ToNext),
            graveyard_position,
            base_version,
        }
    }

    /// Position of the merged element, before it is removed.
    pub fn deletion_position(&self) -> Position {
        let mut path = self.source_position.get_parent_path().to_vec();
        if path.is_empty() {
            path.push(0);
        }
        Position::from_parts(self.source_position.root(), path, Stickiness::ToNone)
    }

    /// Everything from `source_position` to the end of the merged element.
    pub fn moved_range(&self) -> Range {
        let mut end = self.source_position.clone();
        end.set_offset(usize::MAX);
        Range::new(self.source_position.clone(), end)
    }

    /// Split that brings the merged element back from the graveyard.
    ///
    /// The positions are rebased by this merge, since the split applies to
    /// the tree after it.
    pub fn reversed(&self) -> Operation {
        let split_position = self.target_position.get_transformed_by_merge_operation(self);
        let insertion_position = self.deletion_position().get_transformed_by_merge_operation(self);

        Operation::Split(SplitOperation::new(
            split_position,
            self.how_many,
            insertion_position,
            Some(self.graveyard_position.clone()),
            next_version(self.base_version),
        ))
    }

    pub(crate) fn validate(&self, doc: &Document) -> Result<()> {
        let invalid = |reason| ModelError::invalid(OperationKind::Merge, reason);

        let source_element = self
            .source_position
            .parent(doc)
            .map_err(|_| invalid("source position is invalid"))?;
        if doc.parent(source_element)?.is_none() {
            return Err(invalid("source position is invalid"));
        }

        let target_element = self
            .target_position
            .parent(doc)
            .map_err(|_| invalid("target position is invalid"))?;
        if doc.parent(target_element)?.is_none() {
            return Err(invalid("target position is invalid"));
        }

        if self.how_many != doc.max_offset(source_element)? {
            return Err(invalid("how many is invalid"));
        }

        Ok(())
    }

    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        let merged = self.source_position.parent(doc)?;

        let content = Range::create_in(doc, merged)?;
        let how_many = content.end().offset();
        doc.move_nodes(content.start(), how_many, &self.target_position)?;

        let on_merged = Position::create_before(doc, merged)?;
        doc.move_nodes(&on_merged, 1, &self.graveyard_position)
    }
}
