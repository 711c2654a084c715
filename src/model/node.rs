//! Nodes of the document tree
//!
//! Nodes live in the [`Document`](super::Document) arena and are addressed by
//! [`NodeId`] handles. A node never owns its parent; it only records the
//! parent's handle, so the tree has no ownership cycles.
//!
//! Two kinds of nodes exist:
//! - **Element**: a named container with children (occupies one offset)
//! - **Text**: a run of characters (occupies one offset per character)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of a node.
///
/// A `BTreeMap` keeps attribute order deterministic, which makes attribute
/// equality (used when merging text nodes) a plain `==`.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Stable handle of a node in a document arena
///
/// Handles are never reused within a document, so a handle taken before an
/// operation still names the same node afterwards (even if that node moved to
/// the graveyard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Handle of the graveyard root. Every document allocates it first.
    pub const GRAVEYARD: NodeId = NodeId(0);

    /// Raw arena index of this handle.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element { name: String, children: Vec<NodeId> },
    Text { data: String },
}

/// A node stored in the document arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) attributes: Attributes,
    pub(crate) kind: NodeKind,
    /// Set only on root elements.
    pub(crate) root_name: Option<String>,
}

impl Node {
    pub(crate) fn element(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            parent: None,
            attributes,
            kind: NodeKind::Element {
                name: name.into(),
                children: Vec::new(),
            },
            root_name: None,
        }
    }

    pub(crate) fn text(data: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            parent: None,
            attributes,
            kind: NodeKind::Text { data: data.into() },
            root_name: None,
        }
    }

    /// Parent element, `None` for roots and detached nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text { .. })
    }

    pub fn is_root(&self) -> bool {
        self.root_name.is_some()
    }

    /// Root name, for root elements only.
    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    /// Element name, `None` for text nodes.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text { .. } => None,
        }
    }

    /// Text data, `None` for elements.
    pub fn data(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { data } => Some(data),
            NodeKind::Element { .. } => None,
        }
    }

    /// Children of an element (empty for text nodes).
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Element { children, .. } => children,
            NodeKind::Text { .. } => &[],
        }
    }

    /// Number of offsets this node occupies in its parent.
    pub fn offset_size(&self) -> usize {
        match &self.kind {
            NodeKind::Element { .. } => 1,
            NodeKind::Text { data } => data.chars().count(),
        }
    }
}

/// Detached description of a subtree, as carried by insert operations
///
/// # Example
///
/// ```rust
/// use docmodel_core::model::NodeSpec;
///
/// let paragraph = NodeSpec::element("paragraph", vec![NodeSpec::text("Hello")]);
/// assert_eq!(paragraph.offset_size(), 1);
/// assert_eq!(NodeSpec::text("Hello").offset_size(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeSpec {
    Element {
        name: String,
        #[serde(default)]
        attributes: Attributes,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Text {
        data: String,
        #[serde(default)]
        attributes: Attributes,
    },
}

impl NodeSpec {
    pub fn element(name: impl Into<String>, children: Vec<NodeSpec>) -> Self {
        NodeSpec::Element {
            name: name.into(),
            attributes: Attributes::new(),
            children,
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        NodeSpec::Text {
            data: data.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        match &mut self {
            NodeSpec::Element { attributes, .. } | NodeSpec::Text { attributes, .. } => {
                attributes.insert(key.into(), value);
            }
        }
        self
    }

    pub fn offset_size(&self) -> usize {
        match self {
            NodeSpec::Element { .. } => 1,
            NodeSpec::Text { data, .. } => data.chars().count(),
        }
    }
}
