//! Tree document model
//!
//! Content lives in a [`Document`] arena of elements and text nodes under
//! named roots. [`Position`]s and [`Range`]s address that tree by offset
//! paths and stay meaningful while [`Operation`]s change it: every position
//! and range can be rebased by an operation, giving the place the same
//! content occupies afterwards.
//!
//! # Layout
//!
//! - **Paths:** offset paths and their ordering
//! - **Nodes / Document:** the arena, roots and the graveyard
//! - **Position / Range:** addresses, set algebra and transforms
//! - **Walker:** iteration over the content of a range
//! - **Operations:** insert, move, split, merge and attribute changes
//! - **Writer / Markers:** editing helpers built on operations

pub mod document;
pub mod item;
pub mod markers;
pub mod node;
pub mod operation;
pub mod path;
pub mod position;
pub mod range;
mod transform;
pub mod walker;
pub mod writer;

pub use document::{Document, GRAVEYARD_NAME, ROOT_ELEMENT_NAME};
pub use item::{Item, TextProxy};
pub use markers::{MarkerChange, MarkerCollection};
pub use node::{Attributes, Node, NodeId, NodeKind, NodeSpec};
pub use operation::{
    AttributeOperation, InsertOperation, MergeOperation, MoveOperation, Operation, OperationKind, SplitOperation,
};
pub use path::{compare_paths, PathRelation};
pub use position::{Position, PositionRelation, Stickiness};
pub use range::Range;
pub use walker::{Direction, TreeWalker, TreeWalkerOptions, TreeWalkerOptionsBuilder, WalkerValue, WalkerValueKind};
pub use writer::Writer;
