//! Position: an addressable location in the document tree
//!
//! A position is a root handle plus a path of offsets. Every path entry but
//! the last selects a child element by its offset; the last entry is the
//! offset inside the parent element:
//!
//! ```text
//! <$root>
//!   <paragraph>fo|o</paragraph>      [0, 2]
//!   |<paragraph>bar</paragraph>      [1]
//! </$root>
//! ```
//!
//! Positions are values. Comparison, shifting and every transform return new
//! positions; in-place path edits are reserved for this crate.
//!
//! # Stickiness
//!
//! Stickiness decides what happens when content is inserted (or moved away)
//! exactly at the position's offset:
//! - `ToNext` sticks to the node after it, so it moves with that node
//! - `ToPrevious` sticks to the node before it and stays put on insertion
//! - `ToNone` has no preference and is pushed forward on insertion

use super::document::Document;
use super::item::Item;
use super::node::NodeId;
use super::operation::{MergeOperation, Operation, SplitOperation};
use super::path::{compare_paths, PathRelation};
use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a position reacts to changes exactly at its offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stickiness {
    #[default]
    ToNone,
    ToNext,
    ToPrevious,
}

/// Result of comparing two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionRelation {
    Before,
    After,
    Same,
    /// The positions are in different roots.
    Different,
}

/// A location in the document tree
///
/// Equality and ordering look at the root and the path only; stickiness is a
/// transform policy, not part of the location. Positions in different roots
/// are unordered (`partial_cmp` returns `None`).
///
/// # Example
///
/// ```rust
/// use docmodel_core::model::{Document, Position};
///
/// let mut doc = Document::new();
/// let root = doc.create_root("main").unwrap();
///
/// let a = Position::new(root, vec![1, 2]).unwrap();
/// let b = Position::new(root, vec![1, 2, 0]).unwrap();
///
/// assert!(a.is_before(&b));
/// assert_eq!(a.get_shifted_by(3).path(), &[1, 5]);
/// assert_eq!(a.get_common_path(&b), vec![1, 2]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct Position {
    root: NodeId,
    path: Vec<usize>,
    stickiness: Stickiness,
}

#[derive(Deserialize)]
struct RawPosition {
    root: NodeId,
    path: Vec<usize>,
    #[serde(default)]
    stickiness: Stickiness,
}

impl TryFrom<RawPosition> for Position {
    type Error = ModelError;

    fn try_from(raw: RawPosition) -> Result<Self> {
        Position::with_stickiness(raw.root, raw.path, raw.stickiness)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path
    }
}

impl Eq for Position {}

impl std::hash::Hash for Position {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.root.hash(state);
        self.path.hash(state);
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.compare_with(other) {
            PositionRelation::Before => Some(Ordering::Less),
            PositionRelation::After => Some(Ordering::Greater),
            PositionRelation::Same => Some(Ordering::Equal),
            PositionRelation::Different => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:?}", self.root, self.path)
    }
}

impl Position {
    /// Create a position with `ToNone` stickiness.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::EmptyPath` if `path` is empty.
    pub fn new(root: NodeId, path: Vec<usize>) -> Result<Self> {
        Self::with_stickiness(root, path, Stickiness::ToNone)
    }

    pub fn with_stickiness(root: NodeId, path: Vec<usize>, stickiness: Stickiness) -> Result<Self> {
        if path.is_empty() {
            return Err(ModelError::EmptyPath);
        }

        Ok(Self {
            root,
            path,
            stickiness,
        })
    }

    /// Crate-internal constructor; callers guarantee a non-empty path.
    pub(crate) fn from_parts(root: NodeId, path: Vec<usize>, stickiness: Stickiness) -> Self {
        debug_assert!(!path.is_empty());
        Self {
            root,
            path,
            stickiness,
        }
    }

    /// Same location, different stickiness.
    pub fn sticking(mut self, stickiness: Stickiness) -> Self {
        self.stickiness = stickiness;
        self
    }

    // ------------------------------------------------------------
    // Tree-based factories
    // ------------------------------------------------------------

    /// Position at `offset` inside `parent`.
    ///
    /// # Errors
    ///
    /// - `ModelError::NotAnElement` if `parent` is a text node
    /// - `ModelError::InvalidPath` if `offset` is past the element's end
    pub fn create_at(doc: &Document, parent: NodeId, offset: usize) -> Result<Self> {
        if !doc.node(parent)?.is_element() {
            return Err(ModelError::NotAnElement(parent));
        }

        let mut path = doc.path_of(parent)?;
        path.push(offset);

        if offset > doc.max_offset(parent)? {
            return Err(ModelError::InvalidPath { path });
        }

        Ok(Self::from_parts(doc.root_of(parent)?, path, Stickiness::ToNone))
    }

    /// Position at the end of `parent`.
    pub fn create_at_end(doc: &Document, parent: NodeId) -> Result<Self> {
        Self::create_at(doc, parent, doc.max_offset(parent)?)
    }

    /// Position right before an item.
    pub fn create_before(doc: &Document, item: impl Into<Item>) -> Result<Self> {
        let item = item.into();
        let parent = doc
            .parent(item.node())?
            .ok_or(ModelError::DetachedNode(item.node()))?;
        Self::create_at(doc, parent, item.start_offset(doc)?)
    }

    /// Position right after an item.
    pub fn create_after(doc: &Document, item: impl Into<Item>) -> Result<Self> {
        let item = item.into();
        let parent = doc
            .parent(item.node())?
            .ok_or(ModelError::DetachedNode(item.node()))?;
        Self::create_at(doc, parent, item.start_offset(doc)? + item.offset_size(doc)?)
    }

    // ------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn stickiness(&self) -> Stickiness {
        self.stickiness
    }

    /// Offset inside the parent (the last path entry).
    pub fn offset(&self) -> usize {
        self.path[self.path.len() - 1]
    }

    /// Path of the parent element (all but the last entry).
    pub fn get_parent_path(&self) -> &[usize] {
        &self.path[..self.path.len() - 1]
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        let last = self.path.len() - 1;
        self.path[last] = offset;
    }

    pub(crate) fn set_stickiness(&mut self, stickiness: Stickiness) {
        self.stickiness = stickiness;
    }

    pub(crate) fn path_mut(&mut self) -> &mut Vec<usize> {
        &mut self.path
    }

    // ------------------------------------------------------------
    // Comparison and arithmetic
    // ------------------------------------------------------------

    /// Compare two positions; positions in different roots are `Different`.
    pub fn compare_with(&self, other: &Position) -> PositionRelation {
        if self.root != other.root {
            return PositionRelation::Different;
        }

        match compare_paths(&self.path, &other.path) {
            PathRelation::Same => PositionRelation::Same,
            PathRelation::Prefix => PositionRelation::Before,
            PathRelation::Extension => PositionRelation::After,
            PathRelation::DiffersAt(i) => {
                if self.path[i] < other.path[i] {
                    PositionRelation::Before
                } else {
                    PositionRelation::After
                }
            }
        }
    }

    pub fn is_before(&self, other: &Position) -> bool {
        self.compare_with(other) == PositionRelation::Before
    }

    pub fn is_after(&self, other: &Position) -> bool {
        self.compare_with(other) == PositionRelation::After
    }

    pub fn is_equal(&self, other: &Position) -> bool {
        self.compare_with(other) == PositionRelation::Same
    }

    /// New position with the offset moved by `shift` (clamped at 0).
    ///
    /// The result is not checked against the tree.
    pub fn get_shifted_by(&self, shift: isize) -> Position {
        let mut shifted = self.clone();
        let offset = self.offset() as isize + shift;
        shifted.set_offset(offset.max(0) as usize);
        shifted
    }

    /// Longest path prefix shared with `other` (empty for different roots).
    pub fn get_common_path(&self, other: &Position) -> Vec<usize> {
        if self.root != other.root {
            return Vec::new();
        }

        let diff_at = match compare_paths(&self.path, &other.path) {
            PathRelation::DiffersAt(i) => i,
            _ => self.path.len().min(other.path.len()),
        };

        self.path[..diff_at].to_vec()
    }

    pub fn has_same_parent_as(&self, other: &Position) -> bool {
        self.root == other.root
            && compare_paths(self.get_parent_path(), other.get_parent_path()) == PathRelation::Same
    }

    pub fn is_at_start(&self) -> bool {
        self.offset() == 0
    }

    // ------------------------------------------------------------
    // Tree queries
    // ------------------------------------------------------------

    /// Element containing this position.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidPath` if the path does not lead to an
    /// element (for example, it goes through a text node).
    pub fn parent(&self, doc: &Document) -> Result<NodeId> {
        doc.element_at_path(self.root, self.get_parent_path())
            .map_err(|_| ModelError::InvalidPath {
                path: self.path.clone(),
            })
    }

    /// Index of the child at or after this position.
    pub fn index(&self, doc: &Document) -> Result<usize> {
        let parent = self.parent(doc)?;
        doc.offset_to_index(parent, self.offset())
            .map_err(|_| ModelError::InvalidPath {
                path: self.path.clone(),
            })
    }

    /// Text node this position is strictly inside of, if any.
    pub fn text_node(&self, doc: &Document) -> Result<Option<NodeId>> {
        let parent = self.parent(doc)?;
        let index = self.index(doc)?;

        match doc.child(parent, index)? {
            Some(child) if doc.node(child)?.is_text() && doc.start_offset(child)? < self.offset() => {
                Ok(Some(child))
            }
            _ => Ok(None),
        }
    }

    /// Node starting right at this position (`None` inside a text node).
    pub fn node_after(&self, doc: &Document) -> Result<Option<NodeId>> {
        if self.text_node(doc)?.is_some() {
            return Ok(None);
        }
        doc.child(self.parent(doc)?, self.index(doc)?)
    }

    /// Node ending right at this position (`None` inside a text node).
    pub fn node_before(&self, doc: &Document) -> Result<Option<NodeId>> {
        if self.text_node(doc)?.is_some() {
            return Ok(None);
        }

        let index = self.index(doc)?;
        if index == 0 {
            return Ok(None);
        }
        doc.child(self.parent(doc)?, index - 1)
    }

    pub fn is_at_end(&self, doc: &Document) -> Result<bool> {
        Ok(self.offset() == doc.max_offset(self.parent(doc)?)?)
    }

    /// Whether the path still addresses a place in the tree.
    pub fn is_valid(&self, doc: &Document) -> bool {
        match self.parent(doc) {
            Ok(parent) => doc
                .max_offset(parent)
                .map(|max| self.offset() <= max)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Ancestors of the position: the parent and its ancestors, topmost first.
    pub fn get_ancestors(&self, doc: &Document) -> Result<Vec<NodeId>> {
        doc.ancestors(self.parent(doc)?, true)
    }

    /// Deepest element containing both positions.
    pub fn get_common_ancestor(&self, doc: &Document, other: &Position) -> Result<Option<NodeId>> {
        let ours = self.get_ancestors(doc)?;
        let theirs = other.get_ancestors(doc)?;

        let shared = ours
            .iter()
            .zip(theirs.iter())
            .take_while(|(a, b)| a == b)
            .count();

        Ok(if shared == 0 { None } else { Some(ours[shared - 1]) })
    }

    /// Whether no content lies between the two positions.
    ///
    /// Element boundaries do not count as content, so the end of one
    /// paragraph touches the start of the next one:
    ///
    /// ```text
    /// <p>foo|</p><p>|bar</p>
    /// ```
    pub fn is_touching(&self, doc: &Document, other: &Position) -> Result<bool> {
        let (mut left, mut right) = match self.compare_with(other) {
            PositionRelation::Same => return Ok(true),
            PositionRelation::Before => (self.clone(), other.clone()),
            PositionRelation::After => (other.clone(), self.clone()),
            PositionRelation::Different => return Ok(false),
        };

        let mut left_parent = left.parent(doc)?;

        loop {
            if left.path == right.path {
                return Ok(true);
            }

            if left.path.len() > right.path.len() {
                if left.offset() != doc.max_offset(left_parent)? {
                    return Ok(false);
                }

                left.path.pop();
                if left.path.is_empty() {
                    return Ok(false);
                }
                left_parent = doc
                    .parent(left_parent)?
                    .ok_or(ModelError::DetachedNode(left_parent))?;
                left.set_offset(left.offset() + 1);
            } else {
                if right.offset() != 0 {
                    return Ok(false);
                }

                right.path.pop();
                if right.path.is_empty() {
                    return Ok(false);
                }
            }
        }
    }

    // ------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------

    /// Rebase this position across one operation.
    pub fn get_transformed_by_operation(&self, operation: &Operation) -> Position {
        match operation {
            Operation::Insert(op) => self.get_transformed_by_insertion(&op.position, op.how_many()),
            Operation::Move(op) => {
                self.get_transformed_by_move(&op.source_position, &op.target_position, op.how_many)
            }
            Operation::Split(op) => self.get_transformed_by_split_operation(op),
            Operation::Merge(op) => self.get_transformed_by_merge_operation(op),
            Operation::Attribute(_) => self.clone(),
        }
    }

    /// Rebase across `how_many` offsets inserted at `insert_position`.
    pub fn get_transformed_by_insertion(&self, insert_position: &Position, how_many: usize) -> Position {
        let mut transformed = self.clone();

        if self.root != insert_position.root {
            return transformed;
        }

        match compare_paths(insert_position.get_parent_path(), self.get_parent_path()) {
            PathRelation::Same => {
                let offset = self.offset();
                let insert_offset = insert_position.offset();
                if insert_offset < offset
                    || (insert_offset == offset && self.stickiness != Stickiness::ToPrevious)
                {
                    transformed.set_offset(offset + how_many);
                }
            }
            PathRelation::Prefix => {
                // Insertion in an ancestor: push the path entry at that depth.
                let i = insert_position.path.len() - 1;
                if insert_position.offset() <= self.path[i] {
                    transformed.path[i] += how_many;
                }
            }
            _ => {}
        }

        transformed
    }

    /// Rebase across `how_many` offsets removed at `delete_position`.
    ///
    /// Returns `None` when the position was inside the removed content.
    pub fn get_transformed_by_deletion(&self, delete_position: &Position, how_many: usize) -> Option<Position> {
        let mut transformed = self.clone();

        if self.root != delete_position.root {
            return Some(transformed);
        }

        match compare_paths(delete_position.get_parent_path(), self.get_parent_path()) {
            PathRelation::Same => {
                let offset = self.offset();
                let delete_offset = delete_position.offset();
                if delete_offset < offset {
                    if delete_offset + how_many > offset {
                        return None;
                    }
                    transformed.set_offset(offset - how_many);
                }
            }
            PathRelation::Prefix => {
                let i = delete_position.path.len() - 1;
                let delete_offset = delete_position.offset();
                if delete_offset <= self.path[i] {
                    // An ancestor of this position got removed.
                    if delete_offset + how_many > self.path[i] {
                        return None;
                    }
                    transformed.path[i] -= how_many;
                }
            }
            _ => {}
        }

        Some(transformed)
    }

    /// Rebase across `how_many` offsets moved from `source` to `target`.
    ///
    /// `target` is expressed before the move, as in a move operation.
    pub fn get_transformed_by_move(&self, source: &Position, target: &Position, how_many: usize) -> Position {
        let target = target
            .get_transformed_by_deletion(source, how_many)
            .unwrap_or_else(|| target.clone());

        if source.is_equal(&target) {
            return self.clone();
        }

        let transformed = self.get_transformed_by_deletion(source, how_many);

        let sticks_to_moved = (source.is_equal(self) && self.stickiness == Stickiness::ToNext)
            || (source.get_shifted_by(how_many as isize).is_equal(self)
                && self.stickiness == Stickiness::ToPrevious);

        match transformed {
            Some(transformed) if !sticks_to_moved => {
                transformed.get_transformed_by_insertion(&target, how_many)
            }
            _ => self.get_combined(source, &target),
        }
    }

    /// Rebase across a split operation.
    pub fn get_transformed_by_split_operation(&self, operation: &SplitOperation) -> Position {
        let moved_range = operation.moved_range();

        let is_contained = moved_range.contains_position(self)
            || (moved_range.start().is_equal(self) && self.stickiness == Stickiness::ToNext);

        if is_contained {
            self.get_combined(&operation.split_position, &operation.move_target_position())
        } else if let Some(graveyard_position) = &operation.graveyard_position {
            self.get_transformed_by_move(graveyard_position, &operation.insertion_position, 1)
        } else {
            self.get_transformed_by_insertion(&operation.insertion_position, 1)
        }
    }

    /// Rebase across a merge operation.
    pub fn get_transformed_by_merge_operation(&self, operation: &MergeOperation) -> Position {
        let moved_range = operation.moved_range();
        let deletion_position = operation.deletion_position();

        let is_contained =
            moved_range.contains_position(self) || moved_range.start().is_equal(self);

        if is_contained {
            let combined = self.get_combined(&operation.source_position, &operation.target_position);

            if operation.source_position.is_before(&operation.target_position) {
                // Happens when the merged element was moved before its merge target.
                return combined
                    .get_transformed_by_deletion(&deletion_position, 1)
                    .unwrap_or(combined);
            }
            combined
        } else if self.is_equal(&deletion_position) {
            deletion_position
        } else {
            self.get_transformed_by_move(&deletion_position, &operation.graveyard_position, 1)
        }
    }

    /// Translate a position from inside moved content to the move target.
    ///
    /// `source` is where the moved content started, `target` where it starts
    /// after the move.
    pub(crate) fn get_combined(&self, source: &Position, target: &Position) -> Position {
        let i = source.path.len() - 1;
        let own = self.path.get(i).copied().unwrap_or(source.offset());

        let mut combined = target.clone();
        combined.stickiness = self.stickiness;
        combined.set_offset((combined.offset() + own).saturating_sub(source.offset()));

        if self.path.len() > i + 1 {
            combined.path.extend_from_slice(&self.path[i + 1..]);
        }

        combined
    }
}
