//! Range transforms
//!
//! Rebase a [`Range`] across one operation, or across a sequence of them.
//! A single operation can turn one range into zero to three ranges:
//!
//! ```text
//! insert (spread) inside the range     [ab|cd]  -> [ab] XX [cd]
//! move out of the middle of the range  [a(bc)d] -> [ad] ... [bc]
//! ```
//!
//! All functions here are pure; the range and the operation are untouched.

use super::operation::{MergeOperation, Operation, SplitOperation};
use super::position::Position;
use super::range::Range;

impl Range {
    /// Rebase across one operation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docmodel_core::model::{InsertOperation, NodeId, NodeSpec, Operation, Position, Range};
    ///
    /// let root = NodeId::GRAVEYARD;
    /// let range = Range::new(
    ///     Position::new(root, vec![2, 7]).unwrap(),
    ///     Position::new(root, vec![4, 0, 1]).unwrap(),
    /// );
    /// let insert = Operation::Insert(InsertOperation::new(
    ///     Position::new(root, vec![1]).unwrap(),
    ///     vec![NodeSpec::element("paragraph", vec![]), NodeSpec::element("paragraph", vec![])],
    ///     Some(0),
    /// ));
    ///
    /// let transformed = range.get_transformed_by_operation(&insert);
    /// assert_eq!(transformed[0].start().path(), &[4, 7]);
    /// assert_eq!(transformed[0].end().path(), &[6, 0, 1]);
    /// ```
    pub fn get_transformed_by_operation(&self, operation: &Operation) -> Vec<Range> {
        match operation {
            Operation::Insert(op) => self.get_transformed_by_insertion(&op.position, op.how_many(), false),
            Operation::Move(op) => self.get_transformed_by_move(
                &op.source_position,
                &op.target_position,
                op.how_many,
                false,
            ),
            Operation::Split(op) => vec![self.get_transformed_by_split_operation(op)],
            Operation::Merge(op) => vec![self.get_transformed_by_merge_operation(op)],
            Operation::Attribute(_) => vec![self.clone()],
        }
    }

    /// Rebase across a sequence of operations.
    ///
    /// Pieces that end up equal to, or loosely inside, another piece are
    /// dropped; the containing piece is kept.
    pub fn get_transformed_by_operations<'a, I>(&self, operations: I) -> Vec<Range>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut ranges = vec![self.clone()];

        for operation in operations {
            ranges = ranges
                .iter()
                .flat_map(|range| range.get_transformed_by_operation(operation))
                .collect();
        }

        let mut i = 0;
        while i < ranges.len() {
            let mut j = i + 1;
            let mut dropped_current = false;

            while j < ranges.len() {
                if ranges[i] == ranges[j] || ranges[i].contains_range(&ranges[j], true) {
                    tracing::trace!(target: "docmodel::transform", dropped = %ranges[j], "pruned covered piece");
                    ranges.remove(j);
                } else if ranges[j].contains_range(&ranges[i], true) {
                    tracing::trace!(target: "docmodel::transform", dropped = %ranges[i], "pruned covered piece");
                    ranges.remove(i);
                    dropped_current = true;
                    break;
                } else {
                    j += 1;
                }
            }

            if !dropped_current {
                i += 1;
            }
        }

        ranges
    }

    /// Rebase across `how_many` offsets inserted at `insert_position`.
    ///
    /// With `spread`, an insertion strictly inside the range splits it in
    /// two around the inserted content. Otherwise both boundaries are rebased
    /// on their own.
    pub fn get_transformed_by_insertion(
        &self,
        insert_position: &Position,
        how_many: usize,
        spread: bool,
    ) -> Vec<Range> {
        if spread && self.contains_position(insert_position) {
            return vec![
                Range::new(self.start().clone(), insert_position.clone()),
                Range::new(
                    insert_position.get_shifted_by(how_many as isize),
                    self.end().get_transformed_by_insertion(insert_position, how_many),
                ),
            ];
        }

        vec![Range::new(
            self.start().get_transformed_by_insertion(insert_position, how_many),
            self.end().get_transformed_by_insertion(insert_position, how_many),
        )]
    }

    /// Rebase across `how_many` offsets moved from `source` to `target`.
    ///
    /// The result holds 0 to 3 ranges in document order: the parts of the
    /// range that stayed, with the moved part spliced in between them.
    pub fn get_transformed_by_move(
        &self,
        source: &Position,
        target: &Position,
        how_many: usize,
        spread: bool,
    ) -> Vec<Range> {
        if self.is_collapsed() {
            let moved = self.start().get_transformed_by_move(source, target, how_many);
            return vec![Range::collapsed(moved)];
        }

        let move_range = Range::create_from_position_and_shift(source, how_many as isize);
        let insert_position = target
            .get_transformed_by_deletion(source, how_many)
            .unwrap_or_else(|| target.clone());

        // Moving part of the range into the range itself: rebase the
        // boundaries directly so no empty piece is left at the seam.
        if self.contains_position(target)
            && !spread
            && (move_range.contains_position(self.start()) || move_range.contains_position(self.end()))
        {
            tracing::trace!(target: "docmodel::transform", range = %self, "move into self");
            return vec![Range::new(
                self.start().get_transformed_by_move(source, target, how_many),
                self.end().get_transformed_by_move(source, target, how_many),
            )];
        }

        let difference_set = self.get_difference(&move_range);
        let common = self.get_intersection(&move_range);

        let rebase = |position: &Position| {
            position
                .get_transformed_by_deletion(source, how_many)
                .unwrap_or_else(|| source.clone())
        };

        let difference = match difference_set.as_slice() {
            [piece] => Some(Range::new(rebase(piece.start()), rebase(piece.end()))),
            [_, _] => Some(Range::new(self.start().clone(), rebase(self.end()))),
            _ => None,
        };

        let mut result = match difference {
            Some(difference) => {
                difference.get_transformed_by_insertion(&insert_position, how_many, common.is_some() || spread)
            }
            None => Vec::new(),
        };

        if let Some(common) = common {
            let moved = Range::new(
                common.start().get_combined(move_range.start(), &insert_position),
                common.end().get_combined(move_range.start(), &insert_position),
            );

            if result.len() == 2 {
                result.insert(1, moved);
            } else {
                result.push(moved);
            }
        }

        result
    }

    /// Rebase across a split operation.
    pub fn get_transformed_by_split_operation(&self, operation: &SplitOperation) -> Range {
        let start = self.start().get_transformed_by_split_operation(operation);
        let mut end = self.end().get_transformed_by_split_operation(operation);

        // The split puts an element boundary right at the end.
        if self.end().is_equal(&operation.insertion_position) {
            end = self.end().get_shifted_by(1);
        }

        // End pulled into the graveyard by a reinsertion.
        if start.root() != end.root() {
            end = self.end().get_shifted_by(-1);
        }

        Range::new(start, end)
    }

    /// Rebase across a merge operation.
    ///
    /// Merging can leave the rebased boundaries inverted; the three ways of
    /// resolving that are tried in a fixed order and the result may cover
    /// one extra character instead of losing content.
    pub fn get_transformed_by_merge_operation(&self, operation: &MergeOperation) -> Range {
        let deletion_position = operation.deletion_position();

        // The range covers exactly the seam that disappears.
        if self.start().is_equal(&operation.target_position) && self.end().is_equal(&deletion_position) {
            return Range::collapsed(self.start().clone());
        }

        let mut start = self.start().get_transformed_by_merge_operation(operation);
        let mut end = self.end().get_transformed_by_merge_operation(operation);

        if start.root() != end.root() {
            end = self.end().get_shifted_by(-1);
        }

        if start.is_after(&end) {
            if operation.source_position.is_before(&operation.target_position) {
                tracing::trace!(target: "docmodel::transform", range = %self, "merge inversion: source before target");
                let mut collapsed_start = end.clone();
                collapsed_start.set_offset(0);
                start = collapsed_start;
            } else {
                tracing::trace!(target: "docmodel::transform", range = %self, "merge inversion: start moved to target");
                if !deletion_position.is_equal(&start) {
                    end = deletion_position;
                }
                start = operation.target_position.clone();
            }
        }

        Range::new(start, end)
    }

    /// Rebase across `how_many` offsets removed at `delete_position`.
    ///
    /// Returns `None` when the whole range was removed; a single removed
    /// boundary collapses onto `delete_position`.
    pub fn get_transformed_by_deletion(&self, delete_position: &Position, how_many: usize) -> Option<Range> {
        let start = self.start().get_transformed_by_deletion(delete_position, how_many);
        let end = self.end().get_transformed_by_deletion(delete_position, how_many);

        match (start, end) {
            (None, None) => None,
            (start, end) => Some(Range::new(
                start.unwrap_or_else(|| delete_position.clone()),
                end.unwrap_or_else(|| delete_position.clone()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeOperation, InsertOperation, MoveOperation, NodeId, NodeSpec};
    use proptest::prelude::*;

    fn root() -> NodeId {
        NodeId(1)
    }

    fn pos(path: &[usize]) -> Position {
        Position::new(root(), path.to_vec()).unwrap()
    }

    fn graveyard(path: &[usize]) -> Position {
        Position::new(NodeId::GRAVEYARD, path.to_vec()).unwrap()
    }

    fn range(start: &[usize], end: &[usize]) -> Range {
        Range::new(pos(start), pos(end))
    }

    fn insert(path: &[usize], how_many: usize) -> Operation {
        let nodes = (0..how_many).map(|_| NodeSpec::element("paragraph", vec![])).collect();
        Operation::Insert(InsertOperation::new(pos(path), nodes, Some(0)))
    }

    fn move_op(source: Position, how_many: usize, target: Position) -> Operation {
        Operation::Move(MoveOperation::new(source, how_many, target, Some(0)))
    }

    fn split(path: &[usize], how_many: usize) -> SplitOperation {
        let split_position = pos(path);
        let insertion_position = SplitOperation::get_insertion_position(&split_position);
        SplitOperation::new(split_position, how_many, insertion_position, None, Some(0))
    }

    fn merge(source: &[usize], how_many: usize, target: &[usize]) -> MergeOperation {
        MergeOperation::new(pos(source), how_many, pos(target), graveyard(&[0]), Some(0))
    }

    #[test]
    fn test_insertion_inside_nested_end() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(
            r.get_transformed_by_insertion(&pos(&[4, 0, 0]), 4, false),
            vec![range(&[2, 7], &[4, 0, 5])]
        );
    }

    #[test]
    fn test_insertion_without_spread_keeps_range() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(r.get_transformed_by_insertion(&pos(&[3, 2]), 4, false), vec![r.clone()]);
    }

    #[test]
    fn test_insertion_with_spread_splits_range() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(
            r.get_transformed_by_insertion(&pos(&[3, 2]), 4, true),
            vec![range(&[2, 7], &[3, 2]), range(&[3, 6], &[4, 0, 1])]
        );
    }

    #[test]
    fn test_insertion_before_range_shifts_it() {
        let r = range(&[2, 7], &[4, 0, 1]);
        assert_eq!(
            r.get_transformed_by_operation(&insert(&[1], 2)),
            vec![range(&[4, 7], &[6, 0, 1])]
        );
    }

    #[test]
    fn test_insertion_at_boundaries() {
        let r = range(&[1, 2], &[1, 4]);
        // At the start the range does not grow, at the end neither.
        assert_eq!(
            r.get_transformed_by_insertion(&pos(&[1, 2]), 3, false),
            vec![range(&[1, 5], &[1, 7])]
        );
        assert_eq!(r.get_transformed_by_insertion(&pos(&[1, 4]), 3, false), vec![r.clone()]);

        // A collapsed range is pushed forward.
        let collapsed = Range::collapsed(pos(&[1, 2]));
        assert_eq!(
            collapsed.get_transformed_by_insertion(&pos(&[1, 2]), 3, false),
            vec![Range::collapsed(pos(&[1, 5]))]
        );
    }

    #[test]
    fn test_reinsert_from_graveyard() {
        let r = range(&[2, 7], &[4, 0, 1]);
        let reinsert = move_op(graveyard(&[0]), 2, pos(&[1]));
        assert_eq!(r.get_transformed_by_operation(&reinsert), vec![range(&[4, 7], &[6, 0, 1])]);
    }

    #[test]
    fn test_move_of_range_start_forward() {
        let r = range(&[2, 7], &[4, 0, 1]);
        let moved = r.get_transformed_by_operation(&move_op(pos(&[1]), 2, pos(&[5])));
        assert_eq!(moved, vec![range(&[1], &[2, 0, 1]), range(&[4, 7], &[5])]);
    }

    #[test]
    fn test_move_of_collapsed_range() {
        let collapsed = Range::collapsed(pos(&[1, 1]));
        let moved = collapsed.get_transformed_by_move(&pos(&[1]), &pos(&[3]), 1, false);
        assert_eq!(moved, vec![Range::collapsed(pos(&[2, 1]))]);
    }

    #[test]
    fn test_move_into_self_keeps_single_range() {
        let r = range(&[1, 0], &[2, 1]);
        let moved = r.get_transformed_by_move(&pos(&[2, 0]), &pos(&[1, 1]), 2, false);
        assert_eq!(moved, vec![range(&[1, 0], &[1, 2])]);
    }

    #[test]
    fn test_move_out_of_middle() {
        let r = range(&[1], &[4]);
        let moved = r.get_transformed_by_move(&pos(&[2]), &graveyard(&[0]), 1, false);
        assert_eq!(
            moved,
            vec![
                range(&[1], &[3]),
                Range::new(graveyard(&[0]), graveyard(&[1])),
            ]
        );
    }

    #[test]
    fn test_move_out_of_middle_to_same_root() {
        let r = range(&[1], &[4]);
        let moved = r.get_transformed_by_move(&pos(&[2]), &pos(&[6]), 1, false);
        assert_eq!(moved, vec![range(&[1], &[3]), range(&[5], &[6])]);
    }

    #[test]
    fn test_move_inside_range_to_its_middle() {
        // The moved part lands back inside the rest of the range and is
        // spliced between the two halves.
        let r = range(&[1], &[6]);
        let moved = r.get_transformed_by_move(&pos(&[2]), &pos(&[5]), 1, false);
        assert_eq!(moved, vec![range(&[1], &[4]), range(&[4], &[5]), range(&[5], &[6])]);
    }

    #[test]
    fn test_remove_whole_range() {
        let r = range(&[1, 1], &[1, 3]);
        let moved = r.get_transformed_by_move(&pos(&[1]), &graveyard(&[0]), 1, false);
        assert_eq!(moved, vec![Range::new(graveyard(&[0, 1]), graveyard(&[0, 3]))]);
    }

    #[test]
    fn test_spread_move_splits_range_around_target() {
        let r = range(&[1], &[5]);
        let moved = r.get_transformed_by_move(&pos(&[7]), &pos(&[3]), 1, true);
        assert_eq!(moved, vec![range(&[1], &[3]), range(&[4], &[6])]);
    }

    #[test]
    fn test_split_moves_end_into_new_element() {
        let op = split(&[1, 3], 3);
        let r = range(&[1, 1], &[1, 5]);
        assert_eq!(r.get_transformed_by_split_operation(&op), range(&[1, 1], &[2, 2]));
    }

    #[test]
    fn test_split_at_range_boundaries() {
        let op = split(&[1, 3], 3);
        assert_eq!(
            range(&[1, 1], &[1, 3]).get_transformed_by_split_operation(&op),
            range(&[1, 1], &[1, 3])
        );
        assert_eq!(
            range(&[1, 3], &[1, 5]).get_transformed_by_split_operation(&op),
            range(&[2, 0], &[2, 2])
        );
    }

    #[test]
    fn test_split_with_end_at_insertion_position() {
        let op = split(&[1, 3], 3);
        assert_eq!(range(&[0], &[2]).get_transformed_by_split_operation(&op), range(&[0], &[3]));
    }

    #[test]
    fn test_split_with_graveyard_element() {
        let split_position = pos(&[1, 3]);
        let insertion_position = SplitOperation::get_insertion_position(&split_position);
        let op = SplitOperation::new(split_position, 3, insertion_position, Some(graveyard(&[0])), Some(0));

        // Something that sat in the graveyard after the reused element.
        let buried = Range::new(graveyard(&[1]), graveyard(&[2]));
        assert_eq!(
            buried.get_transformed_by_split_operation(&op),
            Range::new(graveyard(&[0]), graveyard(&[1]))
        );

        assert_eq!(
            range(&[3], &[4]).get_transformed_by_split_operation(&op),
            range(&[4], &[5])
        );
    }

    #[test]
    fn test_merge_back_after_split() {
        let op = merge(&[2, 0], 3, &[1, 3]);
        assert_eq!(
            range(&[1, 1], &[2, 2]).get_transformed_by_merge_operation(&op),
            range(&[1, 1], &[1, 5])
        );
    }

    #[test]
    fn test_merge_collapses_range_on_seam() {
        let op = merge(&[2, 0], 3, &[1, 3]);
        assert_eq!(
            range(&[1, 3], &[2]).get_transformed_by_merge_operation(&op),
            Range::collapsed(pos(&[1, 3]))
        );
    }

    #[test]
    fn test_merge_end_after_merged_element() {
        let op = merge(&[2, 0], 3, &[1, 3]);
        assert_eq!(
            range(&[1, 1], &[3]).get_transformed_by_merge_operation(&op),
            range(&[1, 1], &[2])
        );
    }

    #[test]
    fn test_merge_inversion_start_moves_to_target() {
        let op = merge(&[1, 0], 2, &[0, 3]);
        assert_eq!(
            range(&[1], &[1, 1]).get_transformed_by_merge_operation(&op),
            range(&[0, 3], &[0, 4])
        );
    }

    #[test]
    fn test_merge_inversion_source_before_target() {
        let op = merge(&[0, 0], 2, &[1, 2]);
        assert_eq!(
            range(&[0, 1], &[1, 1]).get_transformed_by_merge_operation(&op),
            range(&[0, 0], &[0, 1])
        );
    }

    #[test]
    fn test_deletion() {
        let r = range(&[1], &[4]);
        assert_eq!(r.get_transformed_by_deletion(&pos(&[0]), 1), Some(range(&[0], &[3])));
        assert_eq!(r.get_transformed_by_deletion(&pos(&[0]), 2), Some(range(&[0], &[2])));
        assert_eq!(r.get_transformed_by_deletion(&pos(&[3]), 3), Some(range(&[1], &[3])));

        let inner = range(&[1, 1], &[1, 2]);
        assert_eq!(inner.get_transformed_by_deletion(&pos(&[1]), 1), None);
    }

    #[test]
    fn test_attribute_is_positionally_inert() {
        let r = range(&[1], &[4]);
        let op = Operation::Attribute(AttributeOperation::new(
            range(&[0, 0], &[0, 2]),
            "bold",
            None,
            Some(serde_json::json!(true)),
            Some(0),
        ));
        assert_eq!(r.get_transformed_by_operation(&op), vec![r.clone()]);
    }

    #[test]
    fn test_sequence_prunes_covered_pieces() {
        let r = range(&[1], &[6]);
        let operations = vec![
            // Splits the range in three: [1,5], [7,8] ...
            move_op(pos(&[2]), 1, pos(&[8])),
            // ... then moves the detached piece back into the first one.
            move_op(pos(&[7]), 1, pos(&[3])),
        ];

        let result = r.get_transformed_by_operations(&operations);
        assert_eq!(result, vec![range(&[1], &[6])]);
    }

    #[test]
    fn test_sequence_of_nothing_is_identity() {
        let r = range(&[1], &[6]);
        assert_eq!(r.get_transformed_by_operations(&[]), vec![r.clone()]);
    }

    fn arb_path() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(0usize..6, 1..4)
    }

    fn arb_range() -> impl Strategy<Value = Range> {
        (arb_path(), arb_path()).prop_map(|(a, b)| range(&a, &b))
    }

    proptest! {
        #[test]
        fn prop_insert_in_other_root_is_noop(r in arb_range(), offset in 0usize..6, how_many in 1usize..4) {
            let elsewhere = Position::new(NodeId(9), vec![offset]).unwrap();
            prop_assert_eq!(r.get_transformed_by_insertion(&elsewhere, how_many, false), vec![r.clone()]);
            prop_assert_eq!(
                r.get_transformed_by_move(&elsewhere, &Position::new(NodeId(9), vec![9]).unwrap(), 1, false),
                vec![r.clone()]
            );
        }

        #[test]
        fn prop_insert_after_range_is_noop(r in arb_range(), how_many in 1usize..4) {
            let after = Position::new(root(), vec![r.end().path()[0] + 1]).unwrap();
            prop_assert_eq!(r.get_transformed_by_insertion(&after, how_many, false), vec![r.clone()]);
        }

        #[test]
        fn prop_containment_survives_insertion(
            boundaries in prop::collection::btree_set(arb_path(), 4),
            share_start in any::<bool>(),
            share_end in any::<bool>(),
            at in arb_path(),
            how_many in 1usize..4,
        ) {
            // Sorted paths are in document order.
            let paths: Vec<Vec<usize>> = boundaries.into_iter().collect();
            let outer = range(&paths[0], &paths[3]);
            let inner = range(
                if share_start { &paths[0] } else { &paths[1] },
                if share_end { &paths[3] } else { &paths[2] },
            );
            prop_assert!(outer.contains_range(&inner, true));
            let insert_position = pos(&at);

            let outer_after = outer.get_transformed_by_insertion(&insert_position, how_many, false);
            let inner_after = inner.get_transformed_by_insertion(&insert_position, how_many, false);

            for piece in &inner_after {
                prop_assert!(
                    outer_after.iter().any(|o| o.contains_range(piece, true) || o == piece),
                    "{} escaped {:?}", piece, outer_after
                );
            }
        }

        #[test]
        fn prop_split_then_merge_round_trips(
            parent in 0usize..4,
            split_at in 1usize..8,
            extra in 1usize..6,
            a in 0usize..14,
            b in 0usize..14,
        ) {
            let len = split_at + extra;
            let (a, b) = (a % (len + 1), b % (len + 1));
            // Boundaries sitting on the seam are ambiguous.
            prop_assume!(a != split_at && b != split_at);

            let original = range(&[parent, a], &[parent, b]);
            let split_op = split(&[parent, split_at], extra);
            let merge_op = merge(&[parent + 1, 0], extra, &[parent, split_at]);

            let split_range = original.get_transformed_by_split_operation(&split_op);
            let merged = split_range.get_transformed_by_merge_operation(&merge_op);
            prop_assert_eq!(merged, original);
        }

        #[test]
        fn prop_difference_and_intersection_recombine(a in arb_range(), b in arb_range()) {
            prop_assume!(a.is_intersecting(&b));

            let mut pieces = a.get_difference(&b);
            if let Some(common) = a.get_intersection(&b) {
                pieces.push(common);
            }
            pieces.sort_by(|x, y| x.start().path().cmp(y.start().path()));

            let mut joined = pieces[0].clone();
            for piece in &pieces[1..] {
                joined = joined.get_joined(piece).unwrap();
            }
            prop_assert_eq!(joined, a);
        }
    }
}
