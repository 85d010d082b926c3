//! Sequence diff algorithms.
//!
//! Both algorithms take two [`Sequence`]s and return the ordered,
//! non-overlapping list of [`SequenceDiff`]s between them. Everything outside
//! the returned diffs is element-wise equal.

mod dynamic_programming;
mod myers;

use textdiff_model::OffsetRange;

use crate::deadline::Deadline;

pub(crate) use myers::DiagonalArray;

/// Ordered, indexable sequence compared element by element.
pub trait Sequence {
    fn len(&self) -> usize;

    fn element(&self, offset: usize) -> u32;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Preference for cutting the sequence before `offset`; `None` disables shifting.
    fn boundary_score(&self, _offset: usize) -> Option<i32> {
        None
    }

    /// Equality used when shifting diffs; stricter than [`Sequence::element`] equality
    /// for sequences whose elements are normalized.
    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        self.element(offset1) == self.element(offset2)
    }
}

/// Aligned non-matching region between two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequenceDiff {
    pub seq1_range: OffsetRange,
    pub seq2_range: OffsetRange,
}

impl SequenceDiff {
    pub fn new(seq1_range: OffsetRange, seq2_range: OffsetRange) -> Self {
        Self {
            seq1_range,
            seq2_range,
        }
    }

    pub fn swap(&self) -> Self {
        Self::new(self.seq2_range, self.seq1_range)
    }

    pub fn delta(&self, offset: isize) -> Self {
        Self::new(self.seq1_range.delta(offset), self.seq2_range.delta(offset))
    }

    pub fn join(&self, other: &SequenceDiff) -> Self {
        Self::new(
            self.seq1_range.join(other.seq1_range),
            self.seq2_range.join(other.seq2_range),
        )
    }

    /// `true` for pure insertions and pure deletions.
    pub fn is_one_sided(&self) -> bool {
        self.seq1_range.is_empty() || self.seq2_range.is_empty()
    }
}

/// Diffs produced by one algorithm run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffAlgorithmResult {
    pub diffs: Vec<SequenceDiff>,
    pub hit_timeout: bool,
}

impl DiffAlgorithmResult {
    /// Everything differs: one diff spanning both sequences, or nothing when both are empty.
    pub fn trivial(len1: usize, len2: usize) -> Self {
        let diffs = if len1 == 0 && len2 == 0 {
            Vec::new()
        } else {
            vec![SequenceDiff::new(
                OffsetRange::new(0, len1),
                OffsetRange::new(0, len2),
            )]
        };
        Self {
            diffs,
            hit_timeout: false,
        }
    }

    pub fn trivial_timed_out(len1: usize, len2: usize) -> Self {
        Self {
            hit_timeout: true,
            ..Self::trivial(len1, len2)
        }
    }
}

/// Caller-supplied weight for matching element `offset1` with `offset2`.
pub type EqualityScore<'a> = &'a dyn Fn(usize, usize) -> f64;

/// Sequence diff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceAlgorithm {
    /// Quadratic LCS table; exact and quality-weighted.
    DynamicProgramming,
    /// Greedy O((N+M)·D) shortest edit script.
    Myers,
}

impl SequenceAlgorithm {
    /// Dynamic programming below `threshold` combined elements, greedy otherwise.
    pub fn for_size(combined_len: usize, threshold: usize) -> Self {
        if combined_len < threshold {
            SequenceAlgorithm::DynamicProgramming
        } else {
            SequenceAlgorithm::Myers
        }
    }

    pub fn compute<S: Sequence + ?Sized>(
        self,
        seq1: &S,
        seq2: &S,
        deadline: &Deadline,
        equality_score: Option<EqualityScore<'_>>,
    ) -> DiffAlgorithmResult {
        match self {
            SequenceAlgorithm::DynamicProgramming => {
                dynamic_programming::compute(seq1, seq2, deadline, equality_score)
            }
            SequenceAlgorithm::Myers => myers::compute(seq1, seq2, deadline),
        }
    }
}

/// Collect diffs from alignment points visited in decreasing order.
///
/// Each reported run is a matched stretch; any gap between its end and the
/// start of the previously reported run becomes a diff.
pub(crate) struct AlignmentCollector {
    last_s1: usize,
    last_s2: usize,
    diffs: Vec<SequenceDiff>,
}

impl AlignmentCollector {
    pub(crate) fn new(len1: usize, len2: usize) -> Self {
        Self {
            last_s1: len1,
            last_s2: len2,
            diffs: Vec::new(),
        }
    }

    /// Report that the run `[s1, s1 + len)` / `[s2, s2 + len)` aligns.
    pub(crate) fn aligned_run(&mut self, s1: usize, s2: usize, len: usize) {
        let end1 = s1 + len;
        let end2 = s2 + len;
        if end1 != self.last_s1 || end2 != self.last_s2 {
            self.diffs.push(SequenceDiff::new(
                OffsetRange::new(end1, self.last_s1),
                OffsetRange::new(end2, self.last_s2),
            ));
        }
        self.last_s1 = s1;
        self.last_s2 = s2;
    }

    pub(crate) fn finish(mut self) -> Vec<SequenceDiff> {
        self.aligned_run(0, 0, 0);
        self.diffs.reverse();
        self.diffs
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::Bytes;
    use super::*;

    fn assert_covers(a: &Bytes, b: &Bytes, diffs: &[SequenceDiff]) {
        let mut i = 0usize;
        let mut j = 0usize;
        for diff in diffs {
            assert!(diff.seq1_range.start >= i && diff.seq2_range.start >= j);
            assert_eq!(diff.seq1_range.start - i, diff.seq2_range.start - j);
            while i < diff.seq1_range.start {
                assert_eq!(a.element(i), b.element(j));
                i += 1;
                j += 1;
            }
            i = diff.seq1_range.end_exclusive;
            j = diff.seq2_range.end_exclusive;
        }
        assert_eq!(a.len() - i, b.len() - j);
        while i < a.len() {
            assert_eq!(a.element(i), b.element(j));
            i += 1;
            j += 1;
        }
    }

    #[test]
    fn both_algorithms_cover_simple_edits() {
        let cases = [
            ("", ""),
            ("abc", ""),
            ("", "abc"),
            ("abc", "abc"),
            ("abcabba", "cbabac"),
            ("kitten", "sitting"),
            ("aaaa", "aa"),
        ];
        for (left, right) in cases {
            let a = Bytes::of(left);
            let b = Bytes::of(right);
            for algorithm in [SequenceAlgorithm::DynamicProgramming, SequenceAlgorithm::Myers] {
                let result = algorithm.compute(&a, &b, &Deadline::Unbounded, None);
                assert!(!result.hit_timeout);
                assert_covers(&a, &b, &result.diffs);
                if left == right {
                    assert!(result.diffs.is_empty(), "{algorithm:?} on {left:?}");
                }
            }
        }
    }

    #[test]
    fn trivial_is_empty_for_two_empty_sequences() {
        assert!(DiffAlgorithmResult::trivial(0, 0).diffs.is_empty());
        assert_eq!(
            DiffAlgorithmResult::trivial_timed_out(2, 0).diffs,
            vec![SequenceDiff::new(OffsetRange::new(0, 2), OffsetRange::empty_at(0))]
        );
    }

    #[test]
    fn size_threshold_selects_algorithm() {
        assert_eq!(
            SequenceAlgorithm::for_size(1499, 1500),
            SequenceAlgorithm::DynamicProgramming
        );
        assert_eq!(SequenceAlgorithm::for_size(1500, 1500), SequenceAlgorithm::Myers);
    }
}
