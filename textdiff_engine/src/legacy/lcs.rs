//! Divide-and-conquer shortest edit script.
//!
//! Each sub-problem runs a forward and a reverse greedy search until the two
//! frontiers overlap (the middle snake) and recurses on both halves. The
//! forward frontier of every round is retained so that, when the budget runs
//! out before the frontiers meet, the explored part of the path can still be
//! reported exactly.

use textdiff_model::OffsetRange;
use tracing::warn;

use super::elements::Elements;
use super::prettify::prettify;
use crate::algorithms::{AlignmentCollector, DiagonalArray, SequenceDiff};
use crate::deadline::Deadline;

pub(crate) struct LcsOutcome {
    pub(crate) changes: Vec<SequenceDiff>,
    pub(crate) quit_early: bool,
}

/// Diff `original` against `modified` and prettify the result.
pub(crate) fn compute_diff(
    original: &Elements<'_>,
    modified: &Elements<'_>,
    deadline: &Deadline,
    max_history_rounds: usize,
) -> LcsOutcome {
    let mut search = Search {
        original,
        modified,
        deadline,
        max_history_rounds,
        quit_early: false,
    };
    let mut changes = Vec::new();
    search.conquer(
        OffsetRange::new(0, original.len()),
        OffsetRange::new(0, modified.len()),
        &mut changes,
    );
    LcsOutcome {
        changes: prettify(original, modified, changes),
        quit_early: search.quit_early,
    }
}

enum Split {
    /// Both halves can be solved independently around this point.
    At(usize, usize),
    /// The budget ran out; diffs covering the whole sub-problem.
    Exhausted(Vec<SequenceDiff>),
}

struct Search<'s, 'a> {
    original: &'s Elements<'a>,
    modified: &'s Elements<'a>,
    deadline: &'s Deadline,
    max_history_rounds: usize,
    quit_early: bool,
}

impl Search<'_, '_> {
    fn conquer(&mut self, original: OffsetRange, modified: OffsetRange, out: &mut Vec<SequenceDiff>) {
        if self.quit_early {
            push_change(out, SequenceDiff::new(original, modified));
            return;
        }

        let (mut o_lo, mut o_hi) = (original.start, original.end_exclusive);
        let (mut m_lo, mut m_hi) = (modified.start, modified.end_exclusive);
        while o_lo < o_hi && m_lo < m_hi && self.original.matches(o_lo, self.modified, m_lo) {
            o_lo += 1;
            m_lo += 1;
        }
        while o_hi > o_lo && m_hi > m_lo && self.original.matches(o_hi - 1, self.modified, m_hi - 1) {
            o_hi -= 1;
            m_hi -= 1;
        }

        let original = OffsetRange::new(o_lo, o_hi);
        let modified = OffsetRange::new(m_lo, m_hi);
        if original.is_empty() || modified.is_empty() {
            push_change(out, SequenceDiff::new(original, modified));
            return;
        }

        match self.middle_snake(original, modified) {
            Split::At(x, y) if (x, y) != (o_lo, m_lo) && (x, y) != (o_hi, m_hi) => {
                self.conquer(OffsetRange::new(o_lo, x), OffsetRange::new(m_lo, y), out);
                self.conquer(OffsetRange::new(x, o_hi), OffsetRange::new(y, m_hi), out);
            }
            Split::At(..) => push_change(out, SequenceDiff::new(original, modified)),
            Split::Exhausted(diffs) => {
                warn!(
                    original = %original,
                    modified = %modified,
                    "diff budget exhausted, reporting remaining span coarsely"
                );
                self.quit_early = true;
                for diff in diffs {
                    push_change(
                        out,
                        SequenceDiff::new(
                            diff.seq1_range.delta(o_lo as isize),
                            diff.seq2_range.delta(m_lo as isize),
                        ),
                    );
                }
            }
        }
    }

    fn middle_snake(&self, original: OffsetRange, modified: OffsetRange) -> Split {
        let (o_lo, m_lo) = (original.start, modified.start);
        let n = original.len() as isize;
        let m = modified.len() as isize;
        let delta = n - m;
        let odd = delta & 1 == 1;
        let equal = |x: isize, y: isize| {
            self.original
                .matches(o_lo + x as usize, self.modified, m_lo + y as usize)
        };

        let mut forward = DiagonalArray::new(0isize);
        let mut backward = DiagonalArray::new(0isize);
        let mut history = ForwardHistory::default();

        let d_max = (n + m + 1) / 2 + 1;
        for d in 0..d_max {
            if history.rounds() >= self.max_history_rounds || !self.deadline.is_valid() {
                return Split::Exhausted(history.reconstruct(n, m));
            }

            let mut k = d;
            while k >= -d {
                let mut x = if k == -d || (k != d && forward.get(k - 1) < forward.get(k + 1)) {
                    forward.get(k + 1)
                } else {
                    forward.get(k - 1) + 1
                };
                let (x0, y0) = (x, x - k);
                if x < n && (0..m).contains(&y0) {
                    while x < n && x - k < m && equal(x, x - k) {
                        x += 1;
                    }
                }
                forward.set(k, x);
                if odd && (k - delta).abs() < d && x + backward.get(-(k - delta)) >= n {
                    return Split::At(o_lo + x0 as usize, m_lo + y0 as usize);
                }
                k -= 2;
            }
            history.push_round(d, &forward);

            let mut k = d;
            while k >= -d {
                let mut x = if k == -d || (k != d && backward.get(k - 1) < backward.get(k + 1)) {
                    backward.get(k + 1)
                } else {
                    backward.get(k - 1) + 1
                };
                let mut y = x - k;
                if x < n && (0..m).contains(&y) {
                    while x < n && y < m && equal(n - x - 1, m - y - 1) {
                        x += 1;
                        y += 1;
                    }
                }
                backward.set(k, x);
                if !odd && (k - delta).abs() <= d && x + forward.get(-(k - delta)) >= n {
                    return Split::At(o_lo + (n - x) as usize, m_lo + (m - y) as usize);
                }
                k -= 2;
            }
        }

        Split::Exhausted(vec![SequenceDiff::new(
            OffsetRange::new(0, n as usize),
            OffsetRange::new(0, m as usize),
        )])
    }
}

/// Append `diff`, merging it into the previous diff when the two touch.
fn push_change(out: &mut Vec<SequenceDiff>, diff: SequenceDiff) {
    if diff.seq1_range.is_empty() && diff.seq2_range.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last)
            if last.seq1_range.end_exclusive == diff.seq1_range.start
                && last.seq2_range.end_exclusive == diff.seq2_range.start =>
        {
            *last = last.join(&diff);
        }
        _ => out.push(diff),
    }
}

/// Forward frontier of every completed round, stored back to back.
///
/// Round `d` holds the furthest `x` of diagonals `-d, -d + 2, ..., d`.
#[derive(Default)]
struct ForwardHistory {
    values: Vec<isize>,
    round_starts: Vec<usize>,
}

impl ForwardHistory {
    fn rounds(&self) -> usize {
        self.round_starts.len()
    }

    fn push_round(&mut self, d: isize, frontier: &DiagonalArray<isize>) {
        self.round_starts.push(self.values.len());
        let mut k = -d;
        while k <= d {
            self.values.push(frontier.get(k));
            k += 2;
        }
    }

    fn get(&self, round: usize, k: isize) -> isize {
        let d = round as isize;
        debug_assert!(k.abs() <= d && (k + d) % 2 == 0);
        self.values[self.round_starts[round] + ((k + d) / 2) as usize]
    }

    /// Exact diffs up to the furthest point reached inside the `n × m` grid,
    /// followed by one change over everything after it.
    fn reconstruct(&self, n: isize, m: isize) -> Vec<SequenceDiff> {
        let whole = || {
            vec![SequenceDiff::new(
                OffsetRange::new(0, n as usize),
                OffsetRange::new(0, m as usize),
            )]
        };
        let Some(last) = self.rounds().checked_sub(1) else {
            return whole();
        };

        let d = last as isize;
        let mut best: Option<(isize, isize)> = None;
        let mut k = -d;
        while k <= d {
            let x = self.get(last, k);
            let y = x - k;
            let in_grid = x <= n && (0..=m).contains(&y);
            if in_grid && best.is_none_or(|(bk, bx)| x + y > 2 * bx - bk) {
                best = Some((k, x));
            }
            k += 2;
        }
        let Some((mut k, end_x)) = best else {
            return whole();
        };
        let end_y = end_x - k;

        let mut collector = AlignmentCollector::new(end_x as usize, end_y as usize);
        for round in (0..=last).rev() {
            let d = round as isize;
            let snake_end = self.get(round, k);
            let (snake_start, prev_k) = if round == 0 {
                (0, 0)
            } else if k == -d || (k != d && self.get(round - 1, k - 1) < self.get(round - 1, k + 1)) {
                (self.get(round - 1, k + 1), k + 1)
            } else {
                (self.get(round - 1, k - 1) + 1, k - 1)
            };
            collector.aligned_run(
                snake_start as usize,
                (snake_start - k) as usize,
                (snake_end - snake_start) as usize,
            );
            k = prev_k;
        }

        let mut diffs = collector.finish();
        if end_x < n || end_y < m {
            push_change(
                &mut diffs,
                SequenceDiff::new(
                    OffsetRange::new(end_x as usize, n as usize),
                    OffsetRange::new(end_y as usize, m as usize),
                ),
            );
        }
        diffs
    }
}
