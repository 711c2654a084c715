//! DocModel Core - position and range consistency for tree documents
//!
//! This crate keeps addresses into a rich-text document tree valid while the
//! tree changes. It implements:
//! - A document arena with named roots and a graveyard for removed content
//! - Positions and ranges addressed by offset paths
//! - Transforms of positions and ranges by insert, move, split and merge
//! - A tree walker, a writer and a marker collection on top of operations
//!
//! # Examples
//!
//! ```rust
//! use docmodel_core::model::{InsertOperation, NodeSpec, Position, Range};
//! use docmodel_core::Document;
//!
//! let mut doc = Document::new();
//! let root = doc.create_root("main").unwrap();
//! doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text("world")]))
//!     .unwrap();
//!
//! let selection = Range::new(
//!     Position::new(root, vec![0, 0]).unwrap(),
//!     Position::new(root, vec![0, 5]).unwrap(),
//! );
//!
//! let insert = InsertOperation::new(
//!     Position::new(root, vec![0, 0]).unwrap(),
//!     vec![NodeSpec::text("hello ")],
//!     Some(doc.version()),
//! );
//! let operation = insert.into();
//! let rebased = selection.get_transformed_by_operation(&operation);
//! doc.apply_operation(operation).unwrap();
//!
//! assert_eq!(rebased[0].start().path(), &[0, 6]);
//! assert_eq!(doc.stringify(root).unwrap(), "<paragraph>hello world</paragraph>");
//! ```

pub mod error;
pub mod model;

// Re-exports for convenience
pub use error::{ModelError, Result};
pub use model::{Document, Operation, Position, Range};
