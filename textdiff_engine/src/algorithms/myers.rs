use super::{AlignmentCollector, DiffAlgorithmResult, Sequence};
use crate::deadline::Deadline;

/// Growable array indexed by a signed diagonal number.
#[derive(Debug, Clone)]
pub(crate) struct DiagonalArray<T> {
    non_negative: Vec<T>,
    negative: Vec<T>,
    fill: T,
}

impl<T: Copy> DiagonalArray<T> {
    pub(crate) fn new(fill: T) -> Self {
        Self {
            non_negative: Vec::new(),
            negative: Vec::new(),
            fill,
        }
    }

    pub(crate) fn get(&self, k: isize) -> T {
        let (slot, index) = self.locate(k);
        slot.get(index).copied().unwrap_or(self.fill)
    }

    pub(crate) fn set(&mut self, k: isize, value: T) {
        let fill = self.fill;
        let (slot, index) = if k >= 0 {
            (&mut self.non_negative, k as usize)
        } else {
            (&mut self.negative, (-k - 1) as usize)
        };
        if slot.len() <= index {
            slot.resize(index + 1, fill);
        }
        slot[index] = value;
    }

    fn locate(&self, k: isize) -> (&Vec<T>, usize) {
        if k >= 0 {
            (&self.non_negative, k as usize)
        } else {
            (&self.negative, (-k - 1) as usize)
        }
    }
}

/// Matching run `[x, x + len)` / `[y, y + len)`, linked to the snake before it.
#[derive(Debug, Clone, Copy)]
struct Snake {
    prev: Option<usize>,
    x: usize,
    y: usize,
    len: usize,
}

/// Greedy shortest edit script in O((N+M)·D).
///
/// For every diagonal `k = x - y` the furthest reachable `x` with `d` edits
/// is kept in `furthest`; `paths` holds, per diagonal, the index of the last
/// snake on that path inside the `snakes` arena. The deadline is polled once
/// per round.
pub(crate) fn compute<S: Sequence + ?Sized>(
    seq1: &S,
    seq2: &S,
    deadline: &Deadline,
) -> DiffAlgorithmResult {
    let n = seq1.len();
    let m = seq2.len();
    if n == 0 || m == 0 {
        return DiffAlgorithmResult::trivial(n, m);
    }

    let slide = |mut x: usize, mut y: usize| {
        while x < n && y < m && seq1.element(x) == seq2.element(y) {
            x += 1;
            y += 1;
        }
        x
    };

    let mut snakes: Vec<Snake> = Vec::new();
    let mut furthest = DiagonalArray::new(0isize);
    let mut paths: DiagonalArray<Option<usize>> = DiagonalArray::new(None);

    let start = slide(0, 0);
    furthest.set(0, start as isize);
    if start > 0 {
        snakes.push(Snake {
            prev: None,
            x: 0,
            y: 0,
            len: start,
        });
        paths.set(0, Some(0));
    }

    let (n_i, m_i) = (n as isize, m as isize);
    let mut d = 0isize;
    let final_k = if start == n && start == m {
        0
    } else {
        'rounds: loop {
            d += 1;
            if !deadline.is_valid() {
                return DiffAlgorithmResult::trivial_timed_out(n, m);
            }

            let lower = -d.min(m_i + d % 2);
            let upper = d.min(n_i + d % 2);
            let mut k = lower;
            while k <= upper {
                let from_top = if k == upper { -1 } else { furthest.get(k + 1) };
                let from_left = if k == lower { -1 } else { furthest.get(k - 1) + 1 };
                let x = from_top.max(from_left).min(n_i);
                let y = x - k;
                if x > n_i || y > m_i || y < 0 {
                    k += 2;
                    continue;
                }

                let new_x = slide(x as usize, y as usize);
                furthest.set(k, new_x as isize);

                let last_path = if x == from_top {
                    paths.get(k + 1)
                } else {
                    paths.get(k - 1)
                };
                let path = if new_x as isize != x {
                    snakes.push(Snake {
                        prev: last_path,
                        x: x as usize,
                        y: y as usize,
                        len: new_x - x as usize,
                    });
                    Some(snakes.len() - 1)
                } else {
                    last_path
                };
                paths.set(k, path);

                if new_x == n && new_x as isize - k == m_i {
                    break 'rounds k;
                }
                k += 2;
            }
        }
    };

    let mut collector = AlignmentCollector::new(n, m);
    let mut cursor = paths.get(final_k);
    while let Some(index) = cursor {
        let snake = snakes[index];
        collector.aligned_run(snake.x, snake.y, snake.len);
        cursor = snake.prev;
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
    fn diagonal_array_grows_in_both_directions() {
        let mut array = DiagonalArray::new(0isize);
        array.set(-3, 7);
        array.set(2, 5);
        assert_eq!(array.get(-3), 7);
        assert_eq!(array.get(2), 5);
        assert_eq!(array.get(-1), 0);
        assert_eq!(array.get(40), 0);
    }

    #[test]
    fn insertion_in_the_middle() {
        let result = compute(&Bytes::of("abcd"), &Bytes::of("abXcd"), &Deadline::Unbounded);
        assert_eq!(
            result.diffs,
            vec![SequenceDiff::new(OffsetRange::empty_at(2), OffsetRange::new(2, 3))]
        );
    }

    #[test]
    fn edit_count_is_minimal() {
        let result = compute(&Bytes::of("abcabba"), &Bytes::of("cbabac"), &Deadline::Unbounded);
        let edits: usize = result
            .diffs
            .iter()
            .map(|d| d.seq1_range.len() + d.seq2_range.len())
            .sum();
        assert_eq!(edits, 5);
    }

    #[test]
    fn exhausted_deadline_returns_trivial_result() {
        let result = compute(&Bytes::of("ab"), &Bytes::of("ba"), &Deadline::after_checkpoints(0));
        assert!(result.hit_timeout);
        assert_eq!(result.diffs.len(), 1);
    }
}
