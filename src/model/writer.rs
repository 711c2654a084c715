//! Writer: high-level edits expressed as operations
//!
//! Every call turns into one or more operations built against the current
//! document version and applied in order, so each edit lands in the history
//! and can be transformed or reversed like any other operation.

use super::document::Document;
use super::node::{Attributes, NodeSpec};
use super::operation::{
    graveyard_start, AttributeOperation, InsertOperation, MergeOperation, MoveOperation, Operation, OperationKind,
    SplitOperation,
};
use super::position::Position;
use super::range::Range;
use super::walker::{TreeWalker, TreeWalkerOptions};
use crate::error::{ModelError, Result};

/// Applies edits to a borrowed document
pub struct Writer<'a> {
    doc: &'a mut Document,
}

impl<'a> Writer<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    fn apply(&mut self, operation: impl Into<Operation>) -> Result<()> {
        self.doc.apply_operation(operation.into())
    }

    fn base_version(&self) -> Option<u64> {
        Some(self.doc.version())
    }

    /// Insert nodes at `position`.
    pub fn insert(&mut self, nodes: Vec<NodeSpec>, position: &Position) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        let operation = InsertOperation::new(position.clone(), nodes, self.base_version());
        self.apply(operation)
    }

    pub fn insert_text(&mut self, text: &str, attributes: Attributes, position: &Position) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let spec = NodeSpec::Text {
            data: text.to_string(),
            attributes,
        };
        self.insert(vec![spec], position)
    }

    pub fn insert_element(&mut self, name: &str, attributes: Attributes, position: &Position) -> Result<()> {
        let spec = NodeSpec::Element {
            name: name.to_string(),
            attributes,
            children: Vec::new(),
        };
        self.insert(vec![spec], position)
    }

    /// Move everything in `range` to the graveyard.
    ///
    /// The range is cut into flat pieces, removed last to first so earlier
    /// pieces keep their positions.
    pub fn remove(&mut self, range: &Range) -> Result<()> {
        let pieces = range.get_minimal_flat_ranges(self.doc)?;

        for piece in pieces.into_iter().rev() {
            let how_many = piece.end().offset() - piece.start().offset();
            let operation = MoveOperation::new(piece.start().clone(), how_many, graveyard_start(), self.base_version());
            self.apply(operation)?;
        }

        Ok(())
    }

    /// Move a flat range to `target`, expressed in the tree before the move.
    pub fn move_range(&mut self, range: &Range, target: &Position) -> Result<()> {
        if !range.is_flat() {
            return Err(ModelError::invalid(OperationKind::Move, "range is not flat"));
        }
        if range.is_collapsed() {
            return Ok(());
        }

        let how_many = range.end().offset() - range.start().offset();
        let operation = MoveOperation::new(range.start().clone(), how_many, target.clone(), self.base_version());
        self.apply(operation)
    }

    /// Split the element containing `position`.
    ///
    /// Returns the position between the two halves.
    pub fn split(&mut self, position: &Position) -> Result<Position> {
        let element = position.parent(self.doc)?;
        let max_offset = self.doc.max_offset(element)?;
        let how_many = max_offset.saturating_sub(position.offset());

        let insertion_position = SplitOperation::get_insertion_position(position);
        let operation = SplitOperation::new(
            position.clone(),
            how_many,
            insertion_position.clone(),
            None,
            self.base_version(),
        );
        self.apply(operation)?;

        Position::new(insertion_position.root(), insertion_position.path().to_vec())
    }

    /// Merge the elements on both sides of `position`.
    ///
    /// The content of the element after the position is appended to the one
    /// before it and the emptied element goes to the graveyard.
    pub fn merge(&mut self, position: &Position) -> Result<()> {
        let invalid = || ModelError::invalid(OperationKind::Merge, "no elements to merge at position");

        let before = position.node_before(self.doc)?.ok_or_else(invalid)?;
        let after = position.node_after(self.doc)?.ok_or_else(invalid)?;
        if !self.doc.node(before)?.is_element() || !self.doc.node(after)?.is_element() {
            return Err(invalid());
        }

        let operation = MergeOperation::new(
            Position::create_at(self.doc, after, 0)?,
            self.doc.max_offset(after)?,
            Position::create_at_end(self.doc, before)?,
            graveyard_start(),
            self.base_version(),
        );
        self.apply(operation)
    }

    /// Set `key` on every item in `range`.
    pub fn set_attribute(&mut self, key: &str, value: serde_json::Value, range: &Range) -> Result<()> {
        self.change_attribute(key, Some(value), range)
    }

    /// Remove `key` from every item in `range`.
    pub fn remove_attribute(&mut self, key: &str, range: &Range) -> Result<()> {
        self.change_attribute(key, None, range)
    }

    fn change_attribute(&mut self, key: &str, value: Option<serde_json::Value>, range: &Range) -> Result<()> {
        let mut changes = Vec::new();

        for flat in range.get_minimal_flat_ranges(self.doc)? {
            let options = TreeWalkerOptions::builder().boundaries(flat).shallow(true).build()?;

            // Consecutive items sharing the same current value.
            let mut group: Option<(Position, Position, Option<serde_json::Value>)> = None;

            for step in TreeWalker::new(self.doc, options)? {
                let step = step?;
                let current = self.doc.node(step.item.node())?.attribute(key).cloned();

                let extends = matches!(&group, Some((_, _, old)) if *old == current);
                if extends {
                    if let Some((_, end, _)) = group.as_mut() {
                        *end = step.next_position;
                    }
                } else {
                    changes.extend(group.take());
                    group = Some((step.previous_position, step.next_position, current));
                }
            }

            changes.extend(group);
        }

        for (start, end, old_value) in changes {
            if old_value == value {
                continue;
            }
            let operation = AttributeOperation::new(
                Range::new(start, end),
                key,
                old_value,
                value.clone(),
                self.base_version(),
            );
            self.apply(operation)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use serde_json::json;

    fn paragraphs(texts: &[&str]) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        for text in texts {
            doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text(*text)]))
                .unwrap();
        }
        (doc, root)
    }

    fn at(root: NodeId, path: &[usize]) -> Position {
        Position::new(root, path.to_vec()).unwrap()
    }

    fn range(root: NodeId, start: &[usize], end: &[usize]) -> Range {
        Range::new(at(root, start), at(root, end))
    }

    #[test]
    fn test_insert_text_and_element() {
        let (mut doc, root) = paragraphs(&["ac"]);
        let mut writer = Writer::new(&mut doc);

        writer.insert_text("b", Attributes::new(), &at(root, &[0, 1])).unwrap();
        writer.insert_element("image", Attributes::new(), &at(root, &[0, 3])).unwrap();
        writer.insert_text("", Attributes::new(), &at(root, &[0, 0])).unwrap();

        assert_eq!(
            writer.document().stringify(root).unwrap(),
            "<paragraph>abc<image></image></paragraph>"
        );
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_remove_across_elements() {
        let (mut doc, root) = paragraphs(&["foo", "bar"]);
        Writer::new(&mut doc).remove(&range(root, &[0, 1], &[1, 2])).unwrap();

        assert_eq!(
            doc.stringify(root).unwrap(),
            "<paragraph>f</paragraph><paragraph>r</paragraph>"
        );
        assert_eq!(doc.version(), 2);
        assert!(doc.history().iter().all(|op| op.kind() == OperationKind::Remove));
    }

    #[test]
    fn test_move_range() {
        let (mut doc, root) = paragraphs(&["one", "two", "three"]);
        let mut writer = Writer::new(&mut doc);

        let err = writer.move_range(&range(root, &[0, 1], &[1]), &at(root, &[3])).unwrap_err();
        assert_eq!(err, ModelError::invalid(OperationKind::Move, "range is not flat"));

        writer.move_range(&range(root, &[0], &[1]), &at(root, &[3])).unwrap();
        assert_eq!(
            doc.stringify(root).unwrap(),
            "<paragraph>two</paragraph><paragraph>three</paragraph><paragraph>one</paragraph>"
        );
    }

    #[test]
    fn test_split_then_merge() {
        let (mut doc, root) = paragraphs(&["foobar"]);
        let mut writer = Writer::new(&mut doc);

        let between = writer.split(&at(root, &[0, 3])).unwrap();
        assert_eq!(between.path(), &[1]);
        assert_eq!(
            writer.document().stringify(root).unwrap(),
            "<paragraph>foo</paragraph><paragraph>bar</paragraph>"
        );

        writer.merge(&between).unwrap();
        assert_eq!(doc.stringify(root).unwrap(), "<paragraph>foobar</paragraph>");
        assert_eq!(doc.stringify(doc.graveyard()).unwrap(), "<paragraph></paragraph>");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_merge_needs_two_elements() {
        let (mut doc, root) = paragraphs(&["foo", "bar"]);
        let mut writer = Writer::new(&mut doc);

        assert_eq!(
            writer.merge(&at(root, &[0])),
            Err(ModelError::invalid(OperationKind::Merge, "no elements to merge at position"))
        );
        assert!(writer.merge(&at(root, &[0, 1])).is_err());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_set_and_remove_attribute() {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        doc.append_spec(
            root,
            &NodeSpec::element(
                "paragraph",
                vec![
                    NodeSpec::text("ab"),
                    NodeSpec::text("cd").with_attribute("bold", json!(true)),
                ],
            ),
        )
        .unwrap();

        let mut writer = Writer::new(&mut doc);
        writer.set_attribute("bold", json!(true), &range(root, &[0, 0], &[0, 4])).unwrap();
        assert_eq!(
            writer.document().stringify(root).unwrap(),
            "<paragraph><$text bold=true>abcd</$text></paragraph>"
        );
        assert_eq!(writer.document().version(), 1);

        writer.remove_attribute("bold", &range(root, &[0, 1], &[0, 4])).unwrap();
        assert_eq!(
            doc.stringify(root).unwrap(),
            "<paragraph><$text bold=true>a</$text>bcd</paragraph>"
        );
    }

    #[test]
    fn test_set_attribute_on_elements() {
        let (mut doc, root) = paragraphs(&["foo", "bar"]);
        Writer::new(&mut doc)
            .set_attribute("alignment", json!("left"), &range(root, &[0], &[2]))
            .unwrap();

        assert_eq!(
            doc.stringify(root).unwrap(),
            "<paragraph alignment=\"left\">foo</paragraph><paragraph alignment=\"left\">bar</paragraph>"
        );
        assert_eq!(doc.version(), 1);
    }
}
