//! Range: an ordered pair of positions
//!
//! Ranges are values. Their boundaries are normalized on construction
//! (`start` is never after `end`) and their stickiness is derived from
//! collapsed-ness, so two ranges with the same boundaries always behave the
//! same under transforms.
//!
//! This module holds the core API, the set algebra and the tree queries.
//! Transforms across operations live in [`transform`](super::transform).

use super::document::Document;
use super::item::Item;
use super::node::NodeId;
use super::position::{Position, Stickiness};
use super::walker::{TreeWalker, TreeWalkerOptions};
use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// A span of content between two positions
///
/// # Example
///
/// ```rust
/// use docmodel_core::model::{NodeId, Position, Range};
///
/// let root = NodeId::GRAVEYARD;
/// let range = Range::new(
///     Position::new(root, vec![2, 7]).unwrap(),
///     Position::new(root, vec![4, 0, 1]).unwrap(),
/// );
/// let other = Range::new(
///     Position::new(root, vec![3]).unwrap(),
///     Position::new(root, vec![4]).unwrap(),
/// );
///
/// let difference = range.get_difference(&other);
/// assert_eq!(difference.len(), 2);
/// assert_eq!(difference[0].end().path(), &[3]);
/// assert_eq!(difference[1].start().path(), &[4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawRange")]
pub struct Range {
    start: Position,
    end: Position,
}

#[derive(Deserialize)]
struct RawRange {
    start: Position,
    end: Position,
}

impl From<RawRange> for Range {
    fn from(raw: RawRange) -> Self {
        Range::new(raw.start, raw.end)
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl Range {
    /// Create a range; inverted boundaries are swapped.
    pub fn new(start: Position, end: Position) -> Self {
        let (mut start, mut end) = if start.is_after(&end) {
            (end, start)
        } else {
            (start, end)
        };

        if start.is_equal(&end) {
            start.set_stickiness(Stickiness::ToNone);
            end.set_stickiness(Stickiness::ToNone);
        } else {
            start.set_stickiness(Stickiness::ToNext);
            end.set_stickiness(Stickiness::ToPrevious);
        }

        Self { start, end }
    }

    /// Collapsed range at a position.
    pub fn collapsed(position: Position) -> Self {
        Self::new(position.clone(), position)
    }

    /// Range from a position over `shift` offsets (negative spans backwards).
    pub fn create_from_position_and_shift(position: &Position, shift: isize) -> Self {
        Self::new(position.clone(), position.get_shifted_by(shift))
    }

    /// Range over the whole content of an element.
    pub fn create_in(doc: &Document, element: NodeId) -> Result<Self> {
        Ok(Self::new(
            Position::create_at(doc, element, 0)?,
            Position::create_at_end(doc, element)?,
        ))
    }

    /// Range over a single item.
    pub fn create_on(doc: &Document, item: impl Into<Item>) -> Result<Self> {
        let item = item.into();
        let start = Position::create_before(doc, item)?;
        let size = item.offset_size(doc)? as isize;
        Ok(Self::create_from_position_and_shift(&start, size))
    }

    /// Combine disjoint ranges into one range.
    ///
    /// The first range is the reference. After sorting by start, the
    /// reference grows backwards and forwards over ranges that touch it
    /// exactly; growth stops at the first gap.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::EmptyInput` for an empty slice.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docmodel_core::model::{NodeId, Position, Range};
    ///
    /// let at = |offset| Position::new(NodeId::GRAVEYARD, vec![offset]).unwrap();
    /// let ranges = vec![
    ///     Range::new(at(2), at(4)),
    ///     Range::new(at(0), at(2)),
    ///     Range::new(at(4), at(5)),
    /// ];
    ///
    /// let combined = Range::create_from_ranges(&ranges).unwrap();
    /// assert_eq!(combined, Range::new(at(0), at(5)));
    /// ```
    pub fn create_from_ranges(ranges: &[Range]) -> Result<Range> {
        let Some(reference) = ranges.first() else {
            return Err(ModelError::EmptyInput);
        };

        if ranges.len() == 1 {
            return Ok(reference.clone());
        }

        let mut sorted: Vec<(usize, &Range)> = ranges.iter().enumerate().collect();
        sorted.sort_by(|(_, a), (_, b)| {
            a.start
                .root()
                .cmp(&b.start.root())
                .then_with(|| a.start.path().cmp(b.start.path()))
        });

        let reference_index = sorted
            .iter()
            .position(|(original, _)| *original == 0)
            .unwrap_or(0);

        let mut start = reference.start.clone();
        let mut end = reference.end.clone();

        for (_, range) in sorted[..reference_index].iter().rev() {
            if range.end.is_equal(&start) {
                start = range.start.clone();
            } else {
                break;
            }
        }

        for (_, range) in &sorted[reference_index + 1..] {
            if range.start.is_equal(&end) {
                end = range.end.clone();
            } else {
                break;
            }
        }

        Ok(Range::new(start, end))
    }

    // ------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------

    pub fn start(&self) -> &Position {
        &self.start
    }

    pub fn end(&self) -> &Position {
        &self.end
    }

    pub fn root(&self) -> NodeId {
        self.start.root()
    }

    pub fn is_collapsed(&self) -> bool {
        self.start.is_equal(&self.end)
    }

    /// Whether both boundaries share a parent.
    pub fn is_flat(&self) -> bool {
        self.start.has_same_parent_as(&self.end)
    }

    // ------------------------------------------------------------
    // Set algebra
    // ------------------------------------------------------------

    /// Whether `position` lies strictly between the boundaries.
    pub fn contains_position(&self, position: &Position) -> bool {
        position.is_after(&self.start) && position.is_before(&self.end)
    }

    /// Whether `other` lies inside this range.
    ///
    /// With `loose`, equal boundaries count as inside. A collapsed `other`
    /// is always checked strictly.
    pub fn contains_range(&self, other: &Range, loose: bool) -> bool {
        let loose = loose && !other.is_collapsed();

        let contains_start =
            self.contains_position(&other.start) || (loose && self.start.is_equal(&other.start));
        let contains_end =
            self.contains_position(&other.end) || (loose && self.end.is_equal(&other.end));

        contains_start && contains_end
    }

    /// Whether the item starts inside the range (or at its start).
    pub fn contains_item(&self, doc: &Document, item: impl Into<Item>) -> Result<bool> {
        let position = Position::create_before(doc, item)?;
        Ok(self.contains_position(&position) || self.start.is_equal(&position))
    }

    /// Whether the ranges share content; touching ranges do not intersect.
    pub fn is_intersecting(&self, other: &Range) -> bool {
        self.start.is_before(&other.end) && self.end.is_after(&other.start)
    }

    /// `self - other` as 0, 1 or 2 ranges.
    pub fn get_difference(&self, other: &Range) -> Vec<Range> {
        if !self.is_intersecting(other) {
            return vec![self.clone()];
        }

        let mut ranges = Vec::with_capacity(2);

        if self.contains_position(&other.start) {
            ranges.push(Range::new(self.start.clone(), other.start.clone()));
        }

        if self.contains_position(&other.end) {
            ranges.push(Range::new(other.end.clone(), self.end.clone()));
        }

        ranges
    }

    /// Shared part of both ranges, if they intersect.
    pub fn get_intersection(&self, other: &Range) -> Option<Range> {
        if !self.is_intersecting(other) {
            return None;
        }

        let start = if self.contains_position(&other.start) {
            other.start.clone()
        } else {
            self.start.clone()
        };

        let end = if self.contains_position(&other.end) {
            other.end.clone()
        } else {
            self.end.clone()
        };

        Some(Range::new(start, end))
    }

    /// Union of intersecting or exactly adjacent ranges.
    pub fn get_joined(&self, other: &Range) -> Option<Range> {
        let should_join = self.is_intersecting(other)
            || if self.start.is_before(&other.start) {
                self.end.is_equal(&other.start)
            } else {
                other.end.is_equal(&self.start)
            };

        should_join.then(|| self.joined_with(other))
    }

    /// Union of intersecting or touching ranges.
    ///
    /// Touching allows element boundaries between the ranges, see
    /// [`Position::is_touching`].
    pub fn get_joined_loose(&self, doc: &Document, other: &Range) -> Result<Option<Range>> {
        let should_join = self.is_intersecting(other)
            || if self.start.is_before(&other.start) {
                self.end.is_touching(doc, &other.start)?
            } else {
                other.end.is_touching(doc, &self.start)?
            };

        Ok(should_join.then(|| self.joined_with(other)))
    }

    fn joined_with(&self, other: &Range) -> Range {
        let start = if other.start.is_before(&self.start) {
            &other.start
        } else {
            &self.start
        };
        let end = if other.end.is_after(&self.end) {
            &other.end
        } else {
            &self.end
        };

        Range::new(start.clone(), end.clone())
    }

    /// Smallest ordered set of flat ranges covering the same content.
    ///
    /// Walks up from `start` to the depth below the common path, emitting the
    /// rest of each level, then down towards `end`. Empty pieces are skipped.
    ///
    /// ```text
    /// <div><p>fo[o</p><p>bar</p></div><p>ba]z</p>
    ///   -> "o", <p>bar</p>, "ba"
    /// ```
    pub fn get_minimal_flat_ranges(&self, doc: &Document) -> Result<Vec<Range>> {
        let mut ranges = Vec::new();
        let diff_at = self.start.get_common_path(&self.end).len();

        let mut position = self.start.clone();
        let mut parent = position.parent(doc)?;

        // Up.
        while position.path().len() > diff_at + 1 {
            let how_many = doc.max_offset(parent)?.saturating_sub(position.offset());
            if how_many != 0 {
                ranges.push(Range::new(
                    position.clone(),
                    position.get_shifted_by(how_many as isize),
                ));
            }

            position.path_mut().pop();
            position.set_offset(position.offset() + 1);
            parent = doc.parent(parent)?.ok_or(ModelError::DetachedNode(parent))?;
        }

        // Down.
        while position.path().len() <= self.end.path().len() {
            let offset = self.end.path()[position.path().len() - 1];
            let how_many = offset.saturating_sub(position.offset());
            if how_many != 0 {
                ranges.push(Range::new(
                    position.clone(),
                    position.get_shifted_by(how_many as isize),
                ));
            }

            position.set_offset(offset);
            position.path_mut().push(0);
        }

        Ok(ranges)
    }

    // ------------------------------------------------------------
    // Tree queries
    // ------------------------------------------------------------

    /// Walker over this range, configured by `options` (boundaries are set
    /// to this range).
    pub fn get_walker<'a>(&self, doc: &'a Document, options: TreeWalkerOptions) -> Result<TreeWalker<'a>> {
        TreeWalker::new(doc, options.with_boundaries(self.clone()))
    }

    /// Items in the range, in document order.
    ///
    /// Elements are reported once (entering), text is clipped at the
    /// boundaries.
    pub fn get_items(&self, doc: &Document) -> Result<Vec<Item>> {
        let options = TreeWalkerOptions::builder()
            .boundaries(self.clone())
            .ignore_element_end(true)
            .build()?;

        TreeWalker::new(doc, options)?
            .map(|value| value.map(|value| value.item))
            .collect()
    }

    /// Every position in the range, from start to end.
    pub fn get_positions(&self, doc: &Document) -> Result<Vec<Position>> {
        let options = TreeWalkerOptions::builder()
            .boundaries(self.clone())
            .single_characters(true)
            .build()?;

        let walker = TreeWalker::new(doc, options)?;
        let mut positions = vec![walker.position().clone()];
        for value in walker {
            positions.push(value?.next_position);
        }
        Ok(positions)
    }

    /// Deepest element containing the whole range.
    pub fn get_common_ancestor(&self, doc: &Document) -> Result<Option<NodeId>> {
        self.start.get_common_ancestor(doc, &self.end)
    }

    /// The single element that is the whole content of the range, if any.
    pub fn get_contained_element(&self, doc: &Document) -> Result<Option<NodeId>> {
        if self.is_collapsed() {
            return Ok(None);
        }

        let after_start = self.start.node_after(doc)?;
        let before_end = self.end.node_before(doc)?;

        match (after_start, before_end) {
            (Some(after), Some(before)) if after == before && doc.node(after)?.is_element() => Ok(Some(after)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeSpec;
    use proptest::prelude::*;

    fn root() -> NodeId {
        NodeId(1)
    }

    fn pos(path: &[usize]) -> Position {
        Position::new(root(), path.to_vec()).unwrap()
    }

    fn range(start: &[usize], end: &[usize]) -> Range {
        Range::new(pos(start), pos(end))
    }

    #[test]
    fn test_construction_normalizes() {
        let inverted = range(&[3], &[1]);
        assert_eq!(inverted.start().path(), &[1]);
        assert_eq!(inverted.end().path(), &[3]);
        assert_eq!(inverted.start().stickiness(), Stickiness::ToNext);
        assert_eq!(inverted.end().stickiness(), Stickiness::ToPrevious);

        let collapsed = Range::collapsed(pos(&[2]).sticking(Stickiness::ToNext));
        assert!(collapsed.is_collapsed());
        assert_eq!(collapsed.start().stickiness(), Stickiness::ToNone);
        assert_eq!(collapsed.end().stickiness(), Stickiness::ToNone);
    }

    #[test]
    fn test_flatness() {
        assert!(range(&[1, 2], &[1, 5]).is_flat());
        assert!(!range(&[1, 2], &[2, 0]).is_flat());
        assert_eq!(range(&[1, 2], &[1, 5]).root(), root());
    }

    #[test]
    fn test_contains_position_is_strict() {
        let r = range(&[1], &[3]);
        assert!(r.contains_position(&pos(&[2])));
        assert!(r.contains_position(&pos(&[1, 0])));
        assert!(!r.contains_position(&pos(&[1])));
        assert!(!r.contains_position(&pos(&[3])));
    }

    #[test]
    fn test_contains_range() {
        let r = range(&[1], &[5]);
        assert!(r.contains_range(&range(&[2], &[3]), false));
        assert!(!r.contains_range(&range(&[1], &[3]), false));
        assert!(r.contains_range(&range(&[1], &[3]), true));
        assert!(r.contains_range(&range(&[1], &[5]), true));

        // A collapsed range on the boundary is not contained even loosely.
        assert!(!r.contains_range(&range(&[1], &[1]), true));
        assert!(r.contains_range(&range(&[2], &[2]), true));
    }

    #[test]
    fn test_intersecting() {
        let r = range(&[1], &[3]);
        assert!(r.is_intersecting(&range(&[2], &[4])));
        assert!(r.is_intersecting(&range(&[0], &[5])));
        assert!(!r.is_intersecting(&range(&[3], &[4])));
        assert!(!r.is_intersecting(&range(&[0], &[1])));
    }

    #[test]
    fn test_difference_when_contained() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert!(r.get_difference(&range(&[1], &[5])).is_empty());
    }

    #[test]
    fn test_difference_one_sided() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(r.get_difference(&range(&[1], &[3])), vec![range(&[3], &[4, 0, 1])]);
        assert_eq!(r.get_difference(&range(&[4], &[6])), vec![range(&[2, 7], &[4])]);
    }

    #[test]
    fn test_difference_splits_around_interior() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(
            r.get_difference(&range(&[3], &[4])),
            vec![range(&[2, 7], &[3]), range(&[4], &[4, 0, 1])]
        );
    }

    #[test]
    fn test_difference_without_overlap() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(r.get_difference(&range(&[5], &[6])), vec![r.clone()]);
        // Touching is not overlapping.
        assert_eq!(r.get_difference(&range(&[4, 0, 1], &[6])), vec![r.clone()]);
    }

    #[test]
    fn test_intersection() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(r.get_intersection(&range(&[1], &[3])), Some(range(&[2, 7], &[3])));
        assert_eq!(r.get_intersection(&range(&[3], &[4])), Some(range(&[3], &[4])));
        assert_eq!(r.get_intersection(&range(&[1], &[5])), Some(r.clone()));
        assert_eq!(r.get_intersection(&range(&[5], &[6])), None);
    }

    #[test]
    fn test_joined() {
        let r = range(&[1], &[3]);
        assert_eq!(r.get_joined(&range(&[3], &[5])), Some(range(&[1], &[5])));
        assert_eq!(range(&[3], &[5]).get_joined(&r), Some(range(&[1], &[5])));
        assert_eq!(r.get_joined(&range(&[2], &[5])), Some(range(&[1], &[5])));
        assert_eq!(r.get_joined(&range(&[4], &[5])), None);
    }

    #[test]
    fn test_joined_loose_across_element_boundaries() {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text("foo")]))
            .unwrap();
        doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text("bar")]))
            .unwrap();

        let first = Range::new(
            Position::new(root, vec![0, 1]).unwrap(),
            Position::new(root, vec![0, 3]).unwrap(),
        );
        let second = Range::new(
            Position::new(root, vec![1, 0]).unwrap(),
            Position::new(root, vec![1, 2]).unwrap(),
        );

        assert_eq!(first.get_joined(&second), None);
        let joined = first.get_joined_loose(&doc, &second).unwrap().unwrap();
        assert_eq!(joined.start().path(), &[0, 1]);
        assert_eq!(joined.end().path(), &[1, 2]);
    }

    #[test]
    fn test_create_from_ranges_empty() {
        assert_eq!(Range::create_from_ranges(&[]), Err(ModelError::EmptyInput));
    }

    #[test]
    fn test_create_from_ranges_regardless_of_order() {
        let a = range(&[0], &[1]);
        let b = range(&[1], &[2]);
        let c = range(&[2], &[3]);

        for ranges in [
            vec![a.clone(), b.clone(), c.clone()],
            vec![b.clone(), c.clone(), a.clone()],
            vec![c.clone(), a.clone(), b.clone()],
        ] {
            assert_eq!(Range::create_from_ranges(&ranges).unwrap(), range(&[0], &[3]));
        }
    }

    #[test]
    fn test_create_from_ranges_stops_at_gap() {
        let reference = range(&[2], &[3]);
        let ranges = vec![
            reference.clone(),
            range(&[0], &[1]),
            range(&[3], &[4]),
            range(&[5], &[6]),
        ];

        assert_eq!(Range::create_from_ranges(&ranges).unwrap(), range(&[2], &[4]));
    }

    /// `[0] div(p"foo", p"test", p"lorem")`, `[1] p"ipsum"`, `[2] p"dolor"`,
    /// `[3] div(p"sed")`
    fn nested_doc() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        let p = |text: &str| NodeSpec::element("paragraph", vec![NodeSpec::text(text)]);

        doc.append_spec(root, &NodeSpec::element("div", vec![p("foo"), p("test"), p("lorem")]))
            .unwrap();
        doc.append_spec(root, &p("ipsum")).unwrap();
        doc.append_spec(root, &p("dolor")).unwrap();
        doc.append_spec(root, &NodeSpec::element("div", vec![p("sed")])).unwrap();
        (doc, root)
    }

    fn at(root: NodeId, path: &[usize]) -> Position {
        Position::new(root, path.to_vec()).unwrap()
    }

    #[test]
    fn test_minimal_flat_ranges() {
        let (doc, root) = nested_doc();
        let r = Range::new(at(root, &[0, 1, 2]), at(root, &[3, 0, 2]));

        let flat = r.get_minimal_flat_ranges(&doc).unwrap();
        assert_eq!(
            flat,
            vec![
                Range::new(at(root, &[0, 1, 2]), at(root, &[0, 1, 4])),
                Range::new(at(root, &[0, 2]), at(root, &[0, 3])),
                Range::new(at(root, &[1]), at(root, &[3])),
                Range::new(at(root, &[3, 0, 0]), at(root, &[3, 0, 2])),
            ]
        );
        assert!(flat.iter().all(|range| range.is_flat() && !range.is_collapsed()));
    }

    #[test]
    fn test_minimal_flat_ranges_of_flat_range() {
        let (doc, root) = nested_doc();
        let r = Range::new(at(root, &[1, 1]), at(root, &[1, 4]));
        assert_eq!(r.get_minimal_flat_ranges(&doc).unwrap(), vec![r.clone()]);

        let collapsed = Range::collapsed(at(root, &[1, 1]));
        assert!(collapsed.get_minimal_flat_ranges(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_minimal_flat_ranges_from_middle_of_text_to_nested_end() {
        let mut doc = Document::new();
        let root = doc.create_root("main").unwrap();
        let p = |text: &str| NodeSpec::element("paragraph", vec![NodeSpec::text(text)]);
        doc.append_spec(root, &p("a")).unwrap();
        doc.append_spec(root, &p("b")).unwrap();
        doc.append_spec(root, &p("loremipsum")).unwrap();
        doc.append_spec(root, &p("c")).unwrap();
        doc.append_spec(root, &NodeSpec::element("div", vec![p("se")])).unwrap();

        let r = Range::new(at(root, &[2, 7]), at(root, &[4, 0, 1]));
        assert_eq!(
            r.get_minimal_flat_ranges(&doc).unwrap(),
            vec![
                Range::new(at(root, &[2, 7]), at(root, &[2, 10])),
                Range::new(at(root, &[3]), at(root, &[4])),
                Range::new(at(root, &[4, 0, 0]), at(root, &[4, 0, 1])),
            ]
        );
    }

    #[test]
    fn test_items_and_positions() {
        let (doc, root) = nested_doc();
        let r = Range::new(at(root, &[0, 2, 3]), at(root, &[1, 2]));

        let items = r.get_items(&doc).unwrap();
        let lorem = doc.children(doc.children(doc.children(root).unwrap()[0]).unwrap()[2]).unwrap()[0];
        let ipsum_paragraph = doc.children(root).unwrap()[1];
        let ipsum = doc.children(ipsum_paragraph).unwrap()[0];

        assert_eq!(
            items,
            vec![
                Item::TextProxy(crate::model::TextProxy::new(lorem, 3, 2)),
                Item::Node(ipsum_paragraph),
                Item::TextProxy(crate::model::TextProxy::new(ipsum, 0, 2)),
            ]
        );

        let flat = Range::new(at(root, &[1, 1]), at(root, &[1, 3]));
        let positions: Vec<Vec<usize>> = flat
            .get_positions(&doc)
            .unwrap()
            .iter()
            .map(|position| position.path().to_vec())
            .collect();
        assert_eq!(positions, vec![vec![1, 1], vec![1, 2], vec![1, 3]]);
    }

    #[test]
    fn test_factories_and_contained_element() {
        let (doc, root) = nested_doc();
        let ipsum_paragraph = doc.children(root).unwrap()[1];

        let on = Range::create_on(&doc, ipsum_paragraph).unwrap();
        assert_eq!(on, Range::new(at(root, &[1]), at(root, &[2])));
        assert_eq!(on.get_contained_element(&doc).unwrap(), Some(ipsum_paragraph));

        let inside = Range::create_in(&doc, ipsum_paragraph).unwrap();
        assert_eq!(inside, Range::new(at(root, &[1, 0]), at(root, &[1, 5])));
        assert_eq!(inside.get_contained_element(&doc).unwrap(), None);

        let two = Range::new(at(root, &[1]), at(root, &[3]));
        assert_eq!(two.get_contained_element(&doc).unwrap(), None);
        assert_eq!(Range::collapsed(at(root, &[1])).get_contained_element(&doc).unwrap(), None);

        assert!(two.contains_item(&doc, ipsum_paragraph).unwrap());
        assert!(!inside.contains_item(&doc, ipsum_paragraph).unwrap());
    }

    #[test]
    fn test_common_ancestor() {
        let (doc, root) = nested_doc();
        let div = doc.children(root).unwrap()[0];

        let inside_div = Range::new(at(root, &[0, 0, 1]), at(root, &[0, 2, 1]));
        assert_eq!(inside_div.get_common_ancestor(&doc).unwrap(), Some(div));

        let across = Range::new(at(root, &[0, 0, 1]), at(root, &[3, 0]));
        assert_eq!(across.get_common_ancestor(&doc).unwrap(), Some(root));
    }

    #[test]
    fn test_serialization_renormalizes() {
        let json = r#"{"start":{"root":1,"path":[4]},"end":{"root":1,"path":[2]}}"#;
        let decoded: Range = serde_json::from_str(json).unwrap();
        assert_eq!(decoded, range(&[2], &[4]));
        assert_eq!(decoded.start().stickiness(), Stickiness::ToNext);

        let encoded = serde_json::to_string(&decoded).unwrap();
        let again: Range = serde_json::from_str(&encoded).unwrap();
        assert_eq!(again, decoded);
    }

    /// Characters of text covered by the items of `range`.
    fn text_length(doc: &Document, range: &Range) -> usize {
        range
            .get_items(doc)
            .unwrap()
            .iter()
            .map(|item| match item {
                Item::TextProxy(proxy) => proxy.len,
                Item::Node(_) => 0,
            })
            .sum()
    }

    proptest! {
        #[test]
        fn prop_minimal_flat_ranges_cover_the_range(
            lengths in prop::collection::vec(1usize..6, 1..6),
            a in 0usize..6,
            b in 0usize..6,
            start_offset in 0usize..6,
            end_offset in 0usize..6,
        ) {
            let mut doc = Document::new();
            let root = doc.create_root("main").unwrap();
            for length in &lengths {
                let text = "x".repeat(*length);
                doc.append_spec(root, &NodeSpec::element("paragraph", vec![NodeSpec::text(text)]))
                    .unwrap();
            }

            let (a, b) = (a % lengths.len(), b % lengths.len());
            let (a, b) = (a.min(b), a.max(b));
            let start = at(root, &[a, start_offset.min(lengths[a])]);
            let end = at(root, &[b, end_offset.min(lengths[b])]);
            let r = Range::new(start, end);

            let pieces = r.get_minimal_flat_ranges(&doc).unwrap();
            for piece in &pieces {
                prop_assert!(piece.is_flat());
                prop_assert!(!piece.is_collapsed());
                prop_assert!(r.contains_range(piece, true));
            }

            let covered: usize = pieces.iter().map(|piece| text_length(&doc, piece)).sum();
            prop_assert_eq!(covered, text_length(&doc, &r));
        }
    }
}
