//! Tree walker
//!
//! Iterates over the document tree from a position, in either direction,
//! optionally bounded by a range. Elements are reported when entered and
//! when left; text is reported as [`TextProxy`] chunks, either whole runs
//! (clipped at the boundaries) or single characters.
//!
//! ```text
//! <p>ab<img/></p>   forward, not shallow:
//!   ElementStart(p) Text("ab") ElementStart(img) ElementEnd(img) ElementEnd(p)
//! ```

use super::document::Document;
use super::item::{Item, TextProxy};
use super::node::NodeId;
use super::position::{Position, Stickiness};
use super::range::Range;
use crate::error::{ModelError, Result};
use std::str::FromStr;

/// Walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl FromStr for Direction {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            other => Err(ModelError::UnknownWalkerDirection {
                direction: other.to_string(),
            }),
        }
    }
}

/// Kind of step the walker made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerValueKind {
    ElementStart,
    ElementEnd,
    Text,
}

/// One step of a walk
#[derive(Debug, Clone, PartialEq)]
pub struct WalkerValue {
    pub kind: WalkerValueKind,
    pub item: Item,
    /// Walker position before the step.
    pub previous_position: Position,
    /// Walker position after the step.
    pub next_position: Position,
    /// Offsets covered by the step (`0` for element ends).
    pub length: usize,
}

/// Fully constructed walker configuration
///
/// Built by [`TreeWalkerOptions::builder`]; the walker never changes it.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeWalkerOptions {
    direction: Direction,
    boundaries: Option<Range>,
    start_position: Option<Position>,
    single_characters: bool,
    shallow: bool,
    ignore_element_end: bool,
}

impl TreeWalkerOptions {
    pub fn builder() -> TreeWalkerOptionsBuilder {
        TreeWalkerOptionsBuilder::default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn boundaries(&self) -> Option<&Range> {
        self.boundaries.as_ref()
    }

    /// Same options, bounded by `range`.
    pub(crate) fn with_boundaries(mut self, range: Range) -> Self {
        self.boundaries = Some(range);
        self
    }

    /// Position the walk starts at.
    fn initial_position(&self) -> Result<Position> {
        if let Some(position) = &self.start_position {
            return Ok(position.clone());
        }

        match (&self.boundaries, self.direction) {
            (Some(range), Direction::Forward) => Ok(range.start().clone()),
            (Some(range), Direction::Backward) => Ok(range.end().clone()),
            (None, _) => Err(ModelError::WalkerStartMissing),
        }
    }
}

/// Builder for [`TreeWalkerOptions`]
///
/// # Example
///
/// ```rust
/// use docmodel_core::model::{Direction, NodeId, Position, TreeWalkerOptions};
///
/// let start = Position::new(NodeId::GRAVEYARD, vec![0]).unwrap();
/// let options = TreeWalkerOptions::builder()
///     .start_position(start)
///     .direction("backward".parse::<Direction>().unwrap())
///     .shallow(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(options.direction(), Direction::Backward);
/// assert!(TreeWalkerOptions::builder().build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeWalkerOptionsBuilder {
    direction: Direction,
    boundaries: Option<Range>,
    start_position: Option<Position>,
    single_characters: bool,
    shallow: bool,
    ignore_element_end: bool,
}

impl TreeWalkerOptionsBuilder {
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn boundaries(mut self, boundaries: Range) -> Self {
        self.boundaries = Some(boundaries);
        self
    }

    pub fn start_position(mut self, position: Position) -> Self {
        self.start_position = Some(position);
        self
    }

    /// Report text one character at a time.
    pub fn single_characters(mut self, value: bool) -> Self {
        self.single_characters = value;
        self
    }

    /// Step over elements instead of entering them.
    pub fn shallow(mut self, value: bool) -> Self {
        self.shallow = value;
        self
    }

    /// Do not report leaving an element.
    pub fn ignore_element_end(mut self, value: bool) -> Self {
        self.ignore_element_end = value;
        self
    }

    /// # Errors
    ///
    /// Returns `ModelError::WalkerStartMissing` when neither boundaries nor a
    /// start position were given.
    pub fn build(self) -> Result<TreeWalkerOptions> {
        if self.boundaries.is_none() && self.start_position.is_none() {
            return Err(ModelError::WalkerStartMissing);
        }

        Ok(TreeWalkerOptions {
            direction: self.direction,
            boundaries: self.boundaries,
            start_position: self.start_position,
            single_characters: self.single_characters,
            shallow: self.shallow,
            ignore_element_end: self.ignore_element_end,
        })
    }
}

/// Iterator over the tree
///
/// Yields `Result` items; lookups only fail when the start position does not
/// fit the document, and the walk ends after the first error.
pub struct TreeWalker<'a> {
    doc: &'a Document,
    options: TreeWalkerOptions,
    position: Position,
    visited_parent: NodeId,
    boundary_start_parent: Option<NodeId>,
    boundary_end_parent: Option<NodeId>,
    failed: bool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(doc: &'a Document, options: TreeWalkerOptions) -> Result<Self> {
        let position = options.initial_position()?.sticking(Stickiness::ToNone);
        let visited_parent = position.parent(doc)?;

        let (boundary_start_parent, boundary_end_parent) = match &options.boundaries {
            Some(range) => (Some(range.start().parent(doc)?), Some(range.end().parent(doc)?)),
            None => (None, None),
        };

        Ok(Self {
            doc,
            options,
            position,
            visited_parent,
            boundary_start_parent,
            boundary_end_parent,
            failed: false,
        })
    }

    /// Current walker position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn options(&self) -> &TreeWalkerOptions {
        &self.options
    }

    /// Advance while `predicate` holds.
    ///
    /// The walker stops before the first value the predicate rejects, so the
    /// next call to `next` returns that value.
    pub fn skip_while_value<F>(&mut self, mut predicate: F) -> Result<()>
    where
        F: FnMut(&WalkerValue) -> bool,
    {
        loop {
            let previous_position = self.position.clone();
            let previous_parent = self.visited_parent;

            match self.step()? {
                Some(value) if predicate(&value) => continue,
                Some(_) => {
                    self.position = previous_position;
                    self.visited_parent = previous_parent;
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    fn step(&mut self) -> Result<Option<WalkerValue>> {
        match self.options.direction {
            Direction::Forward => self.step_forward(),
            Direction::Backward => self.step_backward(),
        }
    }

    fn step_forward(&mut self) -> Result<Option<WalkerValue>> {
        let doc = self.doc;

        loop {
            let previous_position = self.position.clone();
            let mut position = self.position.clone();
            let parent = self.visited_parent;
            let parent_node = doc.node(parent)?;

            // End of a root.
            if parent_node.parent().is_none() && position.offset() == doc.max_offset(parent)? {
                return Ok(None);
            }

            if let (Some(end_parent), Some(range)) = (self.boundary_end_parent, &self.options.boundaries) {
                if end_parent == parent && position.offset() == range.end().offset() {
                    return Ok(None);
                }
            }

            let index = doc.offset_to_index(parent, position.offset())?;
            let Some(node) = doc.child(parent, index)? else {
                // End of the visited parent.
                position.path_mut().pop();
                position.set_offset(position.offset() + 1);
                self.position = position;
                self.visited_parent = parent_node.parent().ok_or(ModelError::DetachedNode(parent))?;

                if self.options.ignore_element_end {
                    continue;
                }

                return Ok(Some(WalkerValue {
                    kind: WalkerValueKind::ElementEnd,
                    item: Item::Node(parent),
                    previous_position,
                    next_position: self.position.clone(),
                    length: 0,
                }));
            };

            if doc.node(node)?.is_element() {
                if self.options.shallow {
                    position.set_offset(position.offset() + 1);
                } else {
                    position.path_mut().push(0);
                    self.visited_parent = node;
                }
                self.position = position;

                return Ok(Some(WalkerValue {
                    kind: WalkerValueKind::ElementStart,
                    item: Item::Node(node),
                    previous_position,
                    next_position: self.position.clone(),
                    length: 1,
                }));
            }

            let node_start = doc.start_offset(node)?;
            let count = if self.options.single_characters {
                1
            } else {
                let mut end = node_start + doc.offset_size(node)?;
                if let (Some(end_parent), Some(range)) = (self.boundary_end_parent, &self.options.boundaries) {
                    if end_parent == parent && range.end().offset() < end {
                        end = range.end().offset();
                    }
                }
                end - position.offset()
            };

            let item = TextProxy::new(node, position.offset() - node_start, count);
            position.set_offset(position.offset() + count);
            self.position = position;

            return Ok(Some(WalkerValue {
                kind: WalkerValueKind::Text,
                item: Item::TextProxy(item),
                previous_position,
                next_position: self.position.clone(),
                length: count,
            }));
        }
    }

    fn step_backward(&mut self) -> Result<Option<WalkerValue>> {
        let doc = self.doc;

        loop {
            let previous_position = self.position.clone();
            let mut position = self.position.clone();
            let parent = self.visited_parent;
            let parent_node = doc.node(parent)?;

            // Start of a root.
            if parent_node.parent().is_none() && position.offset() == 0 {
                return Ok(None);
            }

            if let (Some(start_parent), Some(range)) = (self.boundary_start_parent, &self.options.boundaries) {
                if start_parent == parent && position.offset() == range.start().offset() {
                    return Ok(None);
                }
            }

            let node = if position.offset() == 0 {
                None
            } else {
                let index = doc.offset_to_index(parent, position.offset() - 1)?;
                doc.child(parent, index)?
            };

            let Some(node) = node else {
                // Start of the visited parent.
                position.path_mut().pop();
                self.position = position;
                self.visited_parent = parent_node.parent().ok_or(ModelError::DetachedNode(parent))?;

                return Ok(Some(WalkerValue {
                    kind: WalkerValueKind::ElementStart,
                    item: Item::Node(parent),
                    previous_position,
                    next_position: self.position.clone(),
                    length: 1,
                }));
            };

            if doc.node(node)?.is_element() {
                position.set_offset(position.offset() - 1);

                if self.options.shallow {
                    self.position = position;
                    return Ok(Some(WalkerValue {
                        kind: WalkerValueKind::ElementStart,
                        item: Item::Node(node),
                        previous_position,
                        next_position: self.position.clone(),
                        length: 1,
                    }));
                }

                position.path_mut().push(doc.max_offset(node)?);
                self.position = position;
                self.visited_parent = node;

                if self.options.ignore_element_end {
                    continue;
                }

                return Ok(Some(WalkerValue {
                    kind: WalkerValueKind::ElementEnd,
                    item: Item::Node(node),
                    previous_position,
                    next_position: self.position.clone(),
                    length: 0,
                }));
            }

            let node_start = doc.start_offset(node)?;
            let count = if self.options.single_characters {
                1
            } else {
                let mut start = node_start;
                if let (Some(start_parent), Some(range)) = (self.boundary_start_parent, &self.options.boundaries) {
                    if start_parent == parent && range.start().offset() > start {
                        start = range.start().offset();
                    }
                }
                position.offset() - start
            };

            let offset_in_text = position.offset() - node_start - count;
            let item = TextProxy::new(node, offset_in_text, count);
            position.set_offset(position.offset() - count);
            self.position = position;

            return Ok(Some(WalkerValue {
                kind: WalkerValueKind::Text,
                item: Item::TextProxy(item),
                previous_position,
                next_position: self.position.clone(),
                length: count,
            }));
        }
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Result<WalkerValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.step() {
            Ok(value) => value.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
