use super::{AlignmentCollector, DiffAlgorithmResult, EqualityScore, Sequence};
use crate::deadline::Deadline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Left,
    Up,
    Diagonal,
}

/// Row-major `n × m` table.
struct Table<T> {
    width: usize,
    cells: Vec<T>,
}

impl<T: Copy> Table<T> {
    fn new(height: usize, width: usize, fill: T) -> Self {
        Self {
            width,
            cells: vec![fill; height * width],
        }
    }

    fn get(&self, row: usize, col: usize) -> T {
        self.cells[row * self.width + col]
    }

    fn set(&mut self, row: usize, col: usize, value: T) {
        self.cells[row * self.width + col] = value;
    }
}

/// Weighted LCS over the full `n × m` table.
///
/// Matches score `equality_score(i, j)` (1 when absent) plus the length of
/// the diagonal run they extend, so ties prefer long consecutive matches.
/// The deadline is polled once per row.
pub(crate) fn compute<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    deadline: &Deadline,
    equality_score: Option<EqualityScore<'_>>,
) -> DiffAlgorithmResult {
    let n = seq1.len();
    let m = seq2.len();
    if n == 0 || m == 0 {
        return DiffAlgorithmResult::trivial(n, m);
    }

    let mut scores = Table::new(n, m, 0.0f64);
    let mut steps = Table::new(n, m, Step::Left);
    let mut run_lengths = Table::new(n, m, 0usize);

    for s1 in 0..n {
        if !deadline.is_valid() {
            return DiffAlgorithmResult::trivial_timed_out(n, m);
        }

        for s2 in 0..m {
            let left = if s1 == 0 { 0.0 } else { scores.get(s1 - 1, s2) };
            let up = if s2 == 0 { 0.0 } else { scores.get(s1, s2 - 1) };

            let diagonal = if seq1.element(s1) == seq2.element(s2) {
                let mut score = if s1 == 0 || s2 == 0 {
                    0.0
                } else {
                    scores.get(s1 - 1, s2 - 1)
                };
                if s1 > 0 && s2 > 0 && steps.get(s1 - 1, s2 - 1) == Step::Diagonal {
                    score += run_lengths.get(s1 - 1, s2 - 1) as f64;
                }
                score + equality_score.map_or(1.0, |f| f(s1, s2))
            } else {
                -1.0
            };

            let best = left.max(up).max(diagonal);
            if best == diagonal {
                let prev_run = if s1 > 0 && s2 > 0 {
                    run_lengths.get(s1 - 1, s2 - 1)
                } else {
                    0
                };
                run_lengths.set(s1, s2, prev_run + 1);
                steps.set(s1, s2, Step::Diagonal);
            } else if best == left {
                run_lengths.set(s1, s2, 0);
                steps.set(s1, s2, Step::Left);
            } else {
                run_lengths.set(s1, s2, 0);
                steps.set(s1, s2, Step::Up);
            }
            scores.set(s1, s2, best);
        }
    }

    let mut collector = AlignmentCollector::new(n, m);
    let mut s1 = n;
    let mut s2 = m;
    while s1 > 0 && s2 > 0 {
        match steps.get(s1 - 1, s2 - 1) {
            Step::Diagonal => {
                collector.aligned_run(s1 - 1, s2 - 1, 1);
                s1 -= 1;
                s2 -= 1;
            }
            Step::Left => s1 -= 1,
            Step::Up => s2 -= 1,
        }
    }

    DiffAlgorithmResult {
        diffs: collector.finish(),
        hit_timeout: false,
    }
}

#[cfg(test)]
mod tests {
    use textdiff_model::OffsetRange;

    use super::*;
    use crate::algorithms::SequenceDiff;
    use crate::algorithms::test_support::Bytes;

    #[test]
    fn single_substitution_is_one_diff() {
        let result = compute(&Bytes::of("abc"), &Bytes::of("axc"), &Deadline::Unbounded, None);
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::new(1, 2), OffsetRange::new(1, 2))]
        );
    }

    #[test]
    fn equality_score_steers_ambiguous_alignment() {
        // "a" can match either the first or the second "a" of the right side.
        let left = Bytes::of("a");
        let right = Bytes::of("aa");
        let prefer_second = |_: usize, j: usize| if j == 1 { 2.0 } else { 1.0 };
        let result = compute(&left, &right, &Deadline::Unbounded, Some(&prefer_second));
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::empty_at(0), OffsetRange::new(0, 1))]
        );
    }

    #[test]
    fn exhausted_deadline_returns_trivial_result() {
        let result = compute(
            &Bytes::of("abc"),
            &Bytes::of("abd"),
            &Deadline::after_checkpoints(0),
            None,
        );
        assert!(result.hit_timeout);
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::new(0, 3), OffsetRange::new(0, 3))]
        );
    }
}
