//! Passes that turn a raw diff list into one that reads naturally.
//!
//! Every pass consumes its input list and builds a fresh one; the coverage
//! invariant of the input (everything outside the diffs is equal) is kept.

use textdiff_model::OffsetRange;

use crate::algorithms::{Sequence, SequenceDiff};

/// Join pass twice, then the boundary shift pass.
pub fn optimize_sequence_diffs<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
    max_shift: usize,
) -> Vec<SequenceDiff> {
    let diffs = join_diffs_by_shifting(seq1, seq2, diffs);
    let diffs = join_diffs_by_shifting(seq1, seq2, diffs);
    shift_diffs(seq1, seq2, diffs, max_shift)
}

/// Merge diffs whose gap on either side is at most `max_gap` elements.
pub fn smooth(diffs: Vec<SequenceDiff>, max_gap: usize) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    for diff in diffs {
        match result.last_mut() {
            Some(last)
                if diff.seq1_range.start - last.seq1_range.end_exclusive <= max_gap
                    || diff.seq2_range.start - last.seq2_range.end_exclusive <= max_gap =>
            {
                *last = last.join(&diff);
            }
            _ => result.push(diff),
        }
    }
    result
}

/// Slide one-sided diffs left then right, absorbing them into a neighbour
/// when the equal gap in between can be crossed entirely.
fn join_diffs_by_shifting<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut left: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    for cur in diffs {
        let Some(&prev) = left.last() else {
            left.push(cur);
            continue;
        };
        if !cur.is_one_sided() {
            left.push(cur);
            continue;
        }

        let gap = cur.seq1_range.start - prev.seq1_range.end_exclusive;
        let mut d = 0;
        while d < gap
            && seq1.element(cur.seq1_range.start - d - 1)
                == seq1.element(cur.seq1_range.end_exclusive - d - 1)
            && seq2.element(cur.seq2_range.start - d - 1)
                == seq2.element(cur.seq2_range.end_exclusive - d - 1)
        {
            d += 1;
        }

        if d == gap {
            let merged = SequenceDiff::new(
                OffsetRange::new(prev.seq1_range.start, cur.seq1_range.end_exclusive - gap),
                OffsetRange::new(prev.seq2_range.start, cur.seq2_range.end_exclusive - gap),
            );
            let last = left.len() - 1;
            left[last] = merged;
        } else {
            left.push(cur.delta(-(d as isize)));
        }
    }

    let mut result = Vec::with_capacity(left.len());
    let mut iter = left.into_iter().peekable();
    while let Some(cur) = iter.next() {
        let Some(next) = iter.peek_mut() else {
            result.push(cur);
            break;
        };
        if !cur.is_one_sided() {
            result.push(cur);
            continue;
        }

        let gap = next.seq1_range.start - cur.seq1_range.end_exclusive;
        let mut d = 0;
        while d < gap
            && seq1.is_strongly_equal(cur.seq1_range.start + d, cur.seq1_range.end_exclusive + d)
            && seq2.is_strongly_equal(cur.seq2_range.start + d, cur.seq2_range.end_exclusive + d)
        {
            d += 1;
        }

        if d == gap {
            *next = SequenceDiff::new(
                OffsetRange::new(cur.seq1_range.start + gap, next.seq1_range.end_exclusive),
                OffsetRange::new(cur.seq2_range.start + gap, next.seq2_range.end_exclusive),
            );
        } else {
            result.push(cur.delta(d as isize));
        }
    }
    result
}

/// Move each one-sided diff to the best scoring equivalent position.
///
/// A no-op unless both sequences provide boundary scores.
fn shift_diffs<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
    max_shift: usize,
) -> Vec<SequenceDiff> {
    let mut result = Vec::with_capacity(diffs.len());
    for (i, &diff) in diffs.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| diffs[p]);
        let next = diffs.get(i + 1);

        // Valid positions never touch the neighbouring diffs.
        let bounds1 = (
            prev.map_or(0, |p| p.seq1_range.end_exclusive + 1),
            next.map_or(seq1.len(), |n| n.seq1_range.start.saturating_sub(1)),
        );
        let bounds2 = (
            prev.map_or(0, |p| p.seq2_range.end_exclusive + 1),
            next.map_or(seq2.len(), |n| n.seq2_range.start.saturating_sub(1)),
        );

        let shifted = if diff.seq1_range.is_empty() {
            shift_to_better_position(diff, seq1, seq2, bounds1, bounds2, max_shift)
        } else if diff.seq2_range.is_empty() {
            shift_to_better_position(diff.swap(), seq2, seq1, bounds2, bounds1, max_shift).swap()
        } else {
            diff
        };
        result.push(shifted);
    }
    result
}

/// `diff` is an insertion into `seq2` at `diff.seq1_range.start`.
fn shift_to_better_position<S: Sequence + ?Sized>(
    diff: SequenceDiff,
    seq1: &S,
    seq2: &S,
    (lo1, hi1): (usize, usize),
    (lo2, hi2): (usize, usize),
    max_shift: usize,
) -> SequenceDiff {
    let start1 = diff.seq1_range.start;
    let start2 = diff.seq2_range.start;
    let end2 = diff.seq2_range.end_exclusive;

    let mut before = 0;
    while before < max_shift
        && start1 >= lo1 + before + 1
        && start2 >= lo2 + before + 1
        && seq2.is_strongly_equal(start2 - before - 1, end2 - before - 1)
    {
        before += 1;
    }

    let mut after = 0;
    while after < max_shift
        && start1 + after < hi1
        && end2 + after < hi2
        && seq2.is_strongly_equal(start2 + after, end2 + after)
    {
        after += 1;
    }

    if before == 0 && after == 0 {
        return diff;
    }

    let score = |delta: isize| -> Option<i32> {
        let shift = |offset: usize| offset.checked_add_signed(delta).unwrap_or(0);
        Some(
            seq1.boundary_score(shift(start1))?
                + seq2.boundary_score(shift(start2))?
                + seq2.boundary_score(shift(end2))?,
        )
    };

    let Some(mut best_score) = score(0) else {
        return diff;
    };
    let mut best_delta = 0isize;
    for delta in -(before as isize)..=(after as isize) {
        if delta == 0 {
            continue;
        }
        if let Some(candidate) = score(delta)
            && candidate > best_score
        {
            best_score = candidate;
            best_delta = delta;
        }
    }
    diff.delta(best_delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::Bytes;

    /// Bytes that prefer cuts at their ends and right after a space.
    struct Words(Vec<u8>);

    impl Sequence for Words {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn element(&self, offset: usize) -> u32 {
            u32::from(self.0[offset])
        }

        fn boundary_score(&self, offset: usize) -> Option<i32> {
            if offset == 0 || offset == self.0.len() || self.0[offset - 1] == b' ' {
                Some(10)
            } else {
                Some(0)
            }
        }
    }

    fn diff(s1: (usize, usize), s2: (usize, usize)) -> SequenceDiff {
        SequenceDiff::new(OffsetRange::new(s1.0, s1.1), OffsetRange::new(s2.0, s2.1))
    }

    #[test]
    fn insertion_is_absorbed_into_previous_diff() {
        let seq1 = Bytes::of("Xab");
        let seq2 = Bytes::of("Yabab");
        let diffs = vec![diff((0, 1), (0, 1)), diff((3, 3), (3, 5))];
        let joined = optimize_sequence_diffs(&seq1, &seq2, diffs, 20);
        assert_eq!(joined, vec![diff((0, 1), (0, 3))]);
    }

    #[test]
    fn insertion_moves_to_word_boundary() {
        let seq1 = Words(b"foo bar".to_vec());
        let seq2 = Words(b"foo bar bar".to_vec());
        let shifted = shift_diffs(&seq1, &seq2, vec![diff((7, 7), (7, 11))], 20);
        assert_eq!(shifted, vec![diff((4, 4), (4, 8))]);
    }

    #[test]
    fn deletion_is_shifted_symmetrically() {
        let seq1 = Words(b"foo bar bar".to_vec());
        let seq2 = Words(b"foo bar".to_vec());
        let shifted = shift_diffs(&seq1, &seq2, vec![diff((7, 11), (7, 7))], 20);
        assert_eq!(shifted, vec![diff((4, 8), (4, 4))]);
    }

    #[test]
    fn shift_window_is_bounded() {
        let seq1 = Words(b"foo bar".to_vec());
        let seq2 = Words(b"foo bar bar".to_vec());
        let shifted = shift_diffs(&seq1, &seq2, vec![diff((7, 7), (7, 11))], 2);
        assert_eq!(shifted, vec![diff((7, 7), (7, 11))]);
    }

    #[test]
    fn sequences_without_scores_are_not_shifted() {
        let seq1 = Bytes::of("foo bar");
        let seq2 = Bytes::of("foo bar bar");
        let diffs = vec![diff((7, 7), (7, 11))];
        assert_eq!(shift_diffs(&seq1, &seq2, diffs.clone(), 20), diffs);
    }

    #[test]
    fn smoothing_merges_short_gaps_only() {
        let merged = smooth(vec![diff((1, 2), (1, 2)), diff((4, 5), (4, 5))], 2);
        assert_eq!(merged, vec![diff((1, 5), (1, 5))]);

        let kept = smooth(vec![diff((1, 2), (1, 2)), diff((5, 6), (5, 6))], 2);
        assert_eq!(kept.len(), 2);
    }
}
