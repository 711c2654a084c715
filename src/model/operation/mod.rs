//! Operations: atomic structural changes of a document
//!
//! Every change to a [`Document`] is one of five operations. They are plain
//! data: the same value can be applied to a document, used to rebase
//! positions and ranges, serialized, and reversed for undo.
//!
//! | Kind | Effect |
//! |---|---|
//! | insert | nodes appear at a position |
//! | move (remove, reinsert) | nodes relocate; the graveyard root stands in for deletion |
//! | split | an element is divided in two at a position |
//! | merge | an element's content is appended to its previous sibling, the empty element goes to the graveyard |
//! | attribute | an attribute changes on a flat range; no positional effect |
//!
//! # Example
//!
//! ```rust
//! use docmodel_core::model::{Document, InsertOperation, NodeSpec, Operation, Position};
//!
//! let mut doc = Document::new();
//! let root = doc.create_root("main").unwrap();
//!
//! let insert = Operation::Insert(InsertOperation::new(
//!     Position::new(root, vec![0]).unwrap(),
//!     vec![NodeSpec::element("paragraph", vec![NodeSpec::text("Hi")])],
//!     Some(doc.version()),
//! ));
//! doc.apply_operation(insert.clone()).unwrap();
//! assert_eq!(doc.stringify(root).unwrap(), "<paragraph>Hi</paragraph>");
//!
//! doc.apply_operation(insert.reversed()).unwrap();
//! assert_eq!(doc.stringify(root).unwrap(), "");
//! ```

mod attribute;
mod insert;
mod merge;
mod move_op;
mod split;

pub use attribute::AttributeOperation;
pub use insert::InsertOperation;
pub use merge::MergeOperation;
pub use move_op::MoveOperation;
pub use split::SplitOperation;

use super::document::Document;
use super::node::NodeId;
use super::position::Position;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Kind of an operation, as reported in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Move,
    Remove,
    Reinsert,
    Split,
    Merge,
    Attribute,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Insert => "insert",
            OperationKind::Move => "move",
            OperationKind::Remove => "remove",
            OperationKind::Reinsert => "reinsert",
            OperationKind::Split => "split",
            OperationKind::Merge => "merge",
            OperationKind::Attribute => "attribute",
        };
        f.write_str(name)
    }
}

/// One atomic change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Insert(InsertOperation),
    Move(MoveOperation),
    Split(SplitOperation),
    Merge(MergeOperation),
    Attribute(AttributeOperation),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert(_) => OperationKind::Insert,
            Operation::Move(op) => op.kind(),
            Operation::Split(_) => OperationKind::Split,
            Operation::Merge(_) => OperationKind::Merge,
            Operation::Attribute(_) => OperationKind::Attribute,
        }
    }

    /// Document version the operation was built against (`None` for
    /// operations that are only used for transforming).
    pub fn base_version(&self) -> Option<u64> {
        match self {
            Operation::Insert(op) => op.base_version,
            Operation::Move(op) => op.base_version,
            Operation::Split(op) => op.base_version,
            Operation::Merge(op) => op.base_version,
            Operation::Attribute(op) => op.base_version,
        }
    }

    pub fn set_base_version(&mut self, version: Option<u64>) {
        match self {
            Operation::Insert(op) => op.base_version = version,
            Operation::Move(op) => op.base_version = version,
            Operation::Split(op) => op.base_version = version,
            Operation::Merge(op) => op.base_version = version,
            Operation::Attribute(op) => op.base_version = version,
        }
    }

    /// Check that the operation fits the current tree.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidOperation` naming the broken rule.
    pub fn validate(&self, doc: &Document) -> Result<()> {
        match self {
            Operation::Insert(op) => op.validate(doc),
            Operation::Move(op) => op.validate(doc),
            Operation::Split(op) => op.validate(doc),
            Operation::Merge(op) => op.validate(doc),
            Operation::Attribute(op) => op.validate(doc),
        }
    }

    /// Change the tree; callers validate first.
    pub(crate) fn execute(&self, doc: &mut Document) -> Result<()> {
        match self {
            Operation::Insert(op) => op.execute(doc),
            Operation::Move(op) => op.execute(doc),
            Operation::Split(op) => op.execute(doc),
            Operation::Merge(op) => op.execute(doc),
            Operation::Attribute(op) => op.execute(doc),
        }
    }

    /// Operation that undoes this one when applied right after it.
    pub fn reversed(&self) -> Operation {
        match self {
            Operation::Insert(op) => op.reversed(),
            Operation::Move(op) => op.reversed(),
            Operation::Split(op) => op.reversed(),
            Operation::Merge(op) => op.reversed(),
            Operation::Attribute(op) => op.reversed(),
        }
    }
}

impl From<InsertOperation> for Operation {
    fn from(op: InsertOperation) -> Self {
        Operation::Insert(op)
    }
}

impl From<MoveOperation> for Operation {
    fn from(op: MoveOperation) -> Self {
        Operation::Move(op)
    }
}

impl From<SplitOperation> for Operation {
    fn from(op: SplitOperation) -> Self {
        Operation::Split(op)
    }
}

impl From<MergeOperation> for Operation {
    fn from(op: MergeOperation) -> Self {
        Operation::Merge(op)
    }
}

impl From<AttributeOperation> for Operation {
    fn from(op: AttributeOperation) -> Self {
        Operation::Attribute(op)
    }
}

/// Start of the graveyard, where removed content is put.
pub(crate) fn graveyard_start() -> Position {
    Position::from_parts(NodeId::GRAVEYARD, vec![0], Default::default())
}

/// Version of an operation that follows one built against `base_version`.
pub(crate) fn next_version(base_version: Option<u64>) -> Option<u64> {
    base_version.map(|version| version + 1)
}
