//! Document: the node arena
//!
//! The document owns every node ever created for it. Roots (including the
//! graveyard) are elements without a parent and with a root name. Nodes are
//! never freed: removing content means moving it to the graveyard, so a
//! [`NodeId`] stays meaningful for the lifetime of the document.
//!
//! # Offsets
//!
//! Positions address the tree by offsets, not by child indices. An element
//! occupies one offset in its parent, a text node one offset per character:
//!
//! ```text
//! <paragraph>ab<image/>c</paragraph>
//!   offsets:  0 1 2     3 4
//!   indices:  [ "ab"=0, image=1, "c"=2 ]
//! ```
//!
//! # Example
//!
//! ```rust
//! use docmodel_core::model::{Document, NodeSpec};
//!
//! let mut doc = Document::new();
//! let root = doc.create_root("main").unwrap();
//! doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text("foo")]))
//!     .unwrap();
//!
//! assert_eq!(doc.stringify(root).unwrap(), "<paragraph>foo</paragraph>");
//! ```

use super::node::{Attributes, Node, NodeId, NodeKind, NodeSpec};
use super::operation::Operation;
use super::position::Position;
use super::range::Range;
use crate::error::{ModelError, Result};
use std::collections::BTreeMap;

/// Name of the element every root is represented by.
pub const ROOT_ELEMENT_NAME: &str = "$root";

/// Root name of the graveyard.
pub const GRAVEYARD_NAME: &str = "$graveyard";

/// A tree-shaped document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    roots: BTreeMap<String, NodeId>,
    version: u64,
    history: Vec<Operation>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the graveyard root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            roots: BTreeMap::new(),
            version: 0,
            history: Vec::new(),
        };

        let graveyard = doc.alloc(Node::element(ROOT_ELEMENT_NAME, Attributes::new()));
        doc.nodes[graveyard.index()].root_name = Some(GRAVEYARD_NAME.to_string());
        doc.roots.insert(GRAVEYARD_NAME.to_string(), graveyard);
        debug_assert_eq!(graveyard, NodeId::GRAVEYARD);

        doc
    }

    /// Add a named root.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateRoot` if a root with that name exists.
    pub fn create_root(&mut self, name: &str) -> Result<NodeId> {
        if self.roots.contains_key(name) {
            return Err(ModelError::DuplicateRoot(name.to_string()));
        }

        let id = self.alloc(Node::element(ROOT_ELEMENT_NAME, Attributes::new()));
        self.nodes[id.index()].root_name = Some(name.to_string());
        self.roots.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn root(&self, name: &str) -> Result<NodeId> {
        self.roots
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::RootNotFound(name.to_string()))
    }

    /// Names of all roots (the graveyard included).
    pub fn root_names(&self) -> impl Iterator<Item = &str> {
        self.roots.keys().map(String::as_str)
    }

    pub fn graveyard(&self) -> NodeId {
        NodeId::GRAVEYARD
    }

    /// Number of operations applied so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Every applied operation, oldest first.
    pub fn history(&self) -> &[Operation] {
        &self.history
    }

    /// Operations applied since the given version.
    pub fn operations_since(&self, version: u64) -> &[Operation] {
        let from = (version as usize).min(self.history.len());
        &self.history[from..]
    }

    // ------------------------------------------------------------
    // Node access
    // ------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(ModelError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(ModelError::NodeNotFound(id))
    }

    fn children_mut(&mut self, id: NodeId) -> Result<&mut Vec<NodeId>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { children, .. } => Ok(children),
            NodeKind::Text { .. } => Err(ModelError::NotAnElement(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Children of an element.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::NotAnElement` for text nodes.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        match &self.node(id)?.kind {
            NodeKind::Element { children, .. } => Ok(children),
            NodeKind::Text { .. } => Err(ModelError::NotAnElement(id)),
        }
    }

    pub fn child(&self, element: NodeId, index: usize) -> Result<Option<NodeId>> {
        Ok(self.children(element)?.get(index).copied())
    }

    pub fn text_data(&self, id: NodeId) -> Result<&str> {
        self.node(id)?.data().ok_or(ModelError::NodeNotFound(id))
    }

    pub fn offset_size(&self, id: NodeId) -> Result<usize> {
        Ok(self.node(id)?.offset_size())
    }

    /// Sum of the offset sizes of an element's children.
    pub fn max_offset(&self, element: NodeId) -> Result<usize> {
        self.children(element)?
            .iter()
            .map(|child| self.offset_size(*child))
            .sum()
    }

    /// Index of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Result<usize> {
        let parent = self.parent(id)?.ok_or(ModelError::DetachedNode(id))?;
        self.children(parent)?
            .iter()
            .position(|child| *child == id)
            .ok_or(ModelError::DetachedNode(id))
    }

    /// Offset at which a node starts in its parent (0 for roots and detached nodes).
    pub fn start_offset(&self, id: NodeId) -> Result<usize> {
        let Some(parent) = self.parent(id)? else {
            return Ok(0);
        };

        let mut offset = 0;
        for child in self.children(parent)? {
            if *child == id {
                return Ok(offset);
            }
            offset += self.offset_size(*child)?;
        }

        Err(ModelError::DetachedNode(id))
    }

    pub fn end_offset(&self, id: NodeId) -> Result<usize> {
        Ok(self.start_offset(id)? + self.offset_size(id)?)
    }

    /// Index of the child that contains the given offset.
    ///
    /// Returns the child count when the offset equals the element's
    /// `max_offset`.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidPath` if the offset is past the end.
    pub fn offset_to_index(&self, element: NodeId, offset: usize) -> Result<usize> {
        let mut total = 0;
        let children = self.children(element)?;

        for (index, child) in children.iter().enumerate() {
            let size = self.offset_size(*child)?;
            if offset >= total && offset < total + size {
                return Ok(index);
            }
            total += size;
        }

        if offset == total {
            Ok(children.len())
        } else {
            Err(ModelError::InvalidPath { path: vec![offset] })
        }
    }

    /// Topmost ancestor of a node (the node itself when detached or a root).
    pub fn root_of(&self, id: NodeId) -> Result<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current)? {
            current = parent;
        }
        Ok(current)
    }

    /// Offset path of a node from its root.
    pub fn path_of(&self, id: NodeId) -> Result<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent(current)? {
            path.push(self.start_offset(current)?);
            current = parent;
        }

        path.reverse();
        Ok(path)
    }

    /// Ancestors of a node, topmost first.
    pub fn ancestors(&self, id: NodeId, include_self: bool) -> Result<Vec<NodeId>> {
        let mut ancestors = Vec::new();
        if include_self {
            ancestors.push(id);
        }

        let mut current = id;
        while let Some(parent) = self.parent(current)? {
            ancestors.push(parent);
            current = parent;
        }

        ancestors.reverse();
        Ok(ancestors)
    }

    /// Resolve a path of element offsets (a position's parent path) to the element it names.
    pub fn element_at_path(&self, root: NodeId, path: &[usize]) -> Result<NodeId> {
        let invalid = || ModelError::InvalidPath {
            path: path.to_vec(),
        };

        let mut element = root;
        if !self.node(element)?.is_element() {
            return Err(invalid());
        }

        for offset in path {
            let index = self.offset_to_index(element, *offset).map_err(|_| invalid())?;
            let child = self.child(element, index)?.ok_or_else(invalid)?;
            if !self.node(child)?.is_element() {
                return Err(invalid());
            }
            element = child;
        }

        Ok(element)
    }

    // ------------------------------------------------------------
    // Construction (outside of operations)
    // ------------------------------------------------------------

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: &str, attributes: Attributes) -> NodeId {
        self.alloc(Node::element(name, attributes))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str, attributes: Attributes) -> NodeId {
        self.alloc(Node::text(data, attributes))
    }

    /// Materialize a detached subtree from its description.
    pub fn create_from_spec(&mut self, spec: &NodeSpec) -> NodeId {
        match spec {
            NodeSpec::Text { data, attributes } => self.create_text(data, attributes.clone()),
            NodeSpec::Element {
                name,
                attributes,
                children,
            } => {
                let element = self.create_element(name, attributes.clone());
                let child_ids: Vec<NodeId> = children
                    .iter()
                    .map(|child| self.create_from_spec(child))
                    .collect();
                for child in &child_ids {
                    self.nodes[child.index()].parent = Some(element);
                }
                if let NodeKind::Element { children, .. } = &mut self.nodes[element.index()].kind {
                    *children = child_ids;
                }
                element
            }
        }
    }

    /// Append a subtree to an element without going through an operation.
    ///
    /// Meant for building initial content. The document version is not
    /// touched, so positions created before the call are not rebased.
    pub fn append_spec(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId> {
        let id = self.create_from_spec(spec);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a detached node to an element.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child)?.is_some() {
            return Err(ModelError::AlreadyAttached(child));
        }

        let children = self.children_mut(parent)?;
        children.push(child);
        let index = children.len() - 1;
        self.node_mut(child)?.parent = Some(parent);
        self.merge_text_at(parent, index)?;
        Ok(())
    }

    /// Serialize an element's content to a compact markup string.
    ///
    /// Elements render as `<name key=value>…</name>`; text with attributes
    /// renders as `<$text key=value>…</$text>`.
    pub fn stringify(&self, element: NodeId) -> Result<String> {
        let mut out = String::new();
        for child in self.children(element)? {
            self.stringify_node(*child, &mut out)?;
        }
        Ok(out)
    }

    fn stringify_node(&self, id: NodeId, out: &mut String) -> Result<()> {
        let node = self.node(id)?;
        let write_attributes = |out: &mut String| {
            for (key, value) in &node.attributes {
                out.push_str(&format!(" {}={}", key, value));
            }
        };

        match &node.kind {
            NodeKind::Text { data } if node.attributes.is_empty() => out.push_str(data),
            NodeKind::Text { data } => {
                out.push_str("<$text");
                write_attributes(out);
                out.push('>');
                out.push_str(data);
                out.push_str("</$text>");
            }
            NodeKind::Element { name, children } => {
                out.push('<');
                out.push_str(name);
                write_attributes(out);
                out.push('>');
                for child in children {
                    self.stringify_node(*child, out)?;
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------
    // Mutation primitives used by operations
    // ------------------------------------------------------------

    /// Make sure no text node straddles `offset`; returns the child index at `offset`.
    fn split_text_at(&mut self, parent: NodeId, offset: usize) -> Result<usize> {
        let index = self.offset_to_index(parent, offset)?;
        let Some(child) = self.child(parent, index)? else {
            return Ok(index);
        };

        let start = self.start_offset(child)?;
        let node = self.node(child)?;
        let Some(data) = node.data() else {
            return Ok(index);
        };
        if start == offset {
            return Ok(index);
        }

        let cut = offset - start;
        let left: String = data.chars().take(cut).collect();
        let right: String = data.chars().skip(cut).collect();
        let attributes = node.attributes.clone();

        if let NodeKind::Text { data } = &mut self.node_mut(child)?.kind {
            *data = left;
        }
        let tail = self.create_text(&right, attributes);
        self.node_mut(tail)?.parent = Some(parent);
        self.children_mut(parent)?.insert(index + 1, tail);

        Ok(index + 1)
    }

    /// Merge the text nodes on both sides of `index` if they share attributes.
    fn merge_text_at(&mut self, parent: NodeId, index: usize) -> Result<()> {
        if index == 0 {
            return Ok(());
        }

        let children = self.children(parent)?;
        let (Some(&previous), Some(&current)) = (children.get(index - 1), children.get(index)) else {
            return Ok(());
        };

        let (previous_node, current_node) = (self.node(previous)?, self.node(current)?);
        let (Some(_), Some(tail)) = (previous_node.data(), current_node.data()) else {
            return Ok(());
        };
        if previous_node.attributes != current_node.attributes {
            return Ok(());
        }

        let tail = tail.to_string();
        if let NodeKind::Text { data } = &mut self.node_mut(previous)?.kind {
            data.push_str(&tail);
        }
        self.children_mut(parent)?.remove(index);
        self.node_mut(current)?.parent = None;

        Ok(())
    }

    /// Insert detached nodes at a position.
    pub(crate) fn insert_nodes(&mut self, position: &Position, nodes: Vec<NodeId>) -> Result<()> {
        let parent = position.parent(self)?;
        let index = self.split_text_at(parent, position.offset())?;
        let count = nodes.len();

        for node in &nodes {
            self.node_mut(*node)?.parent = Some(parent);
        }
        self.children_mut(parent)?.splice(index..index, nodes);

        self.merge_text_at(parent, index + count)?;
        self.merge_text_at(parent, index)?;
        Ok(())
    }

    /// Detach `how_many` offsets worth of nodes starting at a position.
    pub(crate) fn remove_nodes(&mut self, position: &Position, how_many: usize) -> Result<Vec<NodeId>> {
        let parent = position.parent(self)?;
        if position.offset() + how_many > self.max_offset(parent)? {
            return Err(ModelError::InvalidPath {
                path: position.path().to_vec(),
            });
        }

        let start = self.split_text_at(parent, position.offset())?;
        let end = self.split_text_at(parent, position.offset() + how_many)?;

        let removed: Vec<NodeId> = self.children_mut(parent)?.drain(start..end).collect();
        for node in &removed {
            self.node_mut(*node)?.parent = None;
        }

        self.merge_text_at(parent, start)?;
        Ok(removed)
    }

    /// Move nodes; `target` is expressed before the nodes are removed.
    ///
    /// The target is resolved before anything is detached, so a failed move
    /// leaves the tree untouched.
    pub(crate) fn move_nodes(&mut self, source: &Position, how_many: usize, target: &Position) -> Result<()> {
        let invalid_target = || ModelError::InvalidPath {
            path: target.path().to_vec(),
        };

        let target_parent = target.parent(self)?;
        if target.offset() > self.max_offset(target_parent)? {
            return Err(invalid_target());
        }
        let rebased = target
            .get_transformed_by_deletion(source, how_many)
            .ok_or_else(invalid_target)?;

        let nodes = self.remove_nodes(source, how_many)?;
        self.insert_nodes(&rebased, nodes)
    }

    /// Set (or remove, when `value` is `None`) an attribute on every node in a flat range.
    pub(crate) fn set_attribute_in(
        &mut self,
        range: &Range,
        key: &str,
        value: Option<&serde_json::Value>,
    ) -> Result<()> {
        let parent = range.start().parent(self)?;
        let start = self.split_text_at(parent, range.start().offset())?;
        let end = self.split_text_at(parent, range.end().offset())?;

        let targets: Vec<NodeId> = self.children(parent)?[start..end].to_vec();
        for node in targets {
            let attributes = &mut self.node_mut(node)?.attributes;
            match value {
                Some(value) => {
                    attributes.insert(key.to_string(), value.clone());
                }
                None => {
                    attributes.remove(key);
                }
            }
        }

        // Right to left so earlier indices stay valid.
        for index in (start..=end).rev() {
            self.merge_text_at(parent, index)?;
        }
        Ok(())
    }

    /// Detached copy of an element without its children.
    pub(crate) fn clone_element(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        let name = node.name().ok_or(ModelError::NotAnElement(id))?.to_string();
        let attributes = node.attributes.clone();
        Ok(self.create_element(&name, attributes))
    }

    // ------------------------------------------------------------
    // Operation application
    // ------------------------------------------------------------

    /// Validate and execute an operation, then record it in the history.
    ///
    /// # Errors
    ///
    /// - `ModelError::VersionMismatch` if the operation's base version is not
    ///   the document version
    /// - `ModelError::InvalidOperation` if the operation does not fit the tree
    pub fn apply_operation(&mut self, operation: Operation) -> Result<()> {
        if operation.base_version() != Some(self.version) {
            tracing::debug!(
                target: "docmodel::document",
                kind = %operation.kind(),
                expected = self.version,
                actual = ?operation.base_version(),
                "operation rejected: version mismatch"
            );
            return Err(ModelError::VersionMismatch {
                expected: self.version,
                actual: operation.base_version(),
            });
        }

        if let Err(err) = operation.validate(self) {
            tracing::debug!(target: "docmodel::document", error = %err, "operation rejected");
            return Err(err);
        }

        operation.execute(self)?;
        self.version += 1;

        tracing::debug!(
            target: "docmodel::document",
            kind = %operation.kind(),
            version = self.version,
            "operation applied"
        );

        self.history.push(operation);
        Ok(())
    }
}
