//! Items: what a range or a tree walker hands out.

use super::document::Document;
use super::node::NodeId;
use crate::error::Result;

/// A part of a text node.
///
/// Walkers clip text nodes at range boundaries, so a text item is described
/// by the text node, the character offset in it, and the character count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextProxy {
    pub text_node: NodeId,
    pub offset_in_text: usize,
    pub len: usize,
}

impl TextProxy {
    pub fn new(text_node: NodeId, offset_in_text: usize, len: usize) -> Self {
        Self {
            text_node,
            offset_in_text,
            len,
        }
    }

    /// Characters covered by this proxy.
    pub fn data(&self, doc: &Document) -> Result<String> {
        let data = doc.text_data(self.text_node)?;
        Ok(data
            .chars()
            .skip(self.offset_in_text)
            .take(self.len)
            .collect())
    }

    /// Whether the proxy spans the whole text node.
    pub fn is_partial(&self, doc: &Document) -> Result<bool> {
        Ok(self.offset_in_text != 0 || self.len != doc.offset_size(self.text_node)?)
    }
}

/// A node or a part of a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Node(NodeId),
    TextProxy(TextProxy),
}

impl Item {
    /// Underlying node (the text node for text proxies).
    pub fn node(&self) -> NodeId {
        match self {
            Item::Node(id) => *id,
            Item::TextProxy(proxy) => proxy.text_node,
        }
    }

    /// Number of offsets this item occupies.
    pub fn offset_size(&self, doc: &Document) -> Result<usize> {
        match self {
            Item::Node(id) => doc.offset_size(*id),
            Item::TextProxy(proxy) => Ok(proxy.len),
        }
    }

    /// Offset of the item start in its parent.
    pub fn start_offset(&self, doc: &Document) -> Result<usize> {
        match self {
            Item::Node(id) => doc.start_offset(*id),
            Item::TextProxy(proxy) => Ok(doc.start_offset(proxy.text_node)? + proxy.offset_in_text),
        }
    }

    /// Whether the item is an element (text proxies never are).
    pub fn is_element(&self, doc: &Document) -> bool {
        match self {
            Item::Node(id) => doc.node(*id).map(|node| node.is_element()).unwrap_or(false),
            Item::TextProxy(_) => false,
        }
    }
}

impl From<NodeId> for Item {
    fn from(id: NodeId) -> Self {
        Item::Node(id)
    }
}

impl From<TextProxy> for Item {
    fn from(proxy: TextProxy) -> Self {
        Item::TextProxy(proxy)
    }
}
