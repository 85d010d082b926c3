use textdiff_model::OffsetRange;

use super::elements::Elements;
use crate::algorithms::SequenceDiff;

/// Changes shorter than this (on both sides, gap included) may be re-anchored.
const REANCHOR_MAX_SPAN: usize = 20;
const REANCHOR_MAX_GAP: usize = 5;
const TOUCHING_BONUS: u32 = 5;

/// Move change boundaries to where a reader expects them.
pub(crate) fn prettify(
    original: &Elements<'_>,
    modified: &Elements<'_>,
    changes: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let changes = shift_down(original, modified, changes);
    let mut changes = shift_up(original, modified, changes);
    if original.has_strings() && modified.has_strings() {
        reanchor(original, modified, &mut changes);
        changes.retain(|c| !c.seq1_range.is_empty() || !c.seq2_range.is_empty());
    }
    changes
}

fn overlaps(left: &SequenceDiff, right: &SequenceDiff) -> bool {
    left.seq1_range.end_exclusive >= right.seq1_range.start
        || left.seq2_range.end_exclusive >= right.seq2_range.start
}

/// Slide every change forward while the element it leaves behind equals the
/// one it takes on; stop before trading a strictly equal pair for a merely
/// equal one.
fn shift_down(
    original: &Elements<'_>,
    modified: &Elements<'_>,
    changes: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut result = Vec::with_capacity(changes.len());
    let mut rest = changes.into_iter().peekable();
    let mut current = rest.next();

    while let Some(change) = current.take() {
        let (stop1, stop2) = rest.peek().map_or((original.len(), modified.len()), |next| {
            (next.seq1_range.start, next.seq2_range.start)
        });
        let check1 = !change.seq1_range.is_empty();
        let check2 = !change.seq2_range.is_empty();

        let mut change = change;
        loop {
            let (s1, e1) = (change.seq1_range.start, change.seq1_range.end_exclusive);
            let (s2, e2) = (change.seq2_range.start, change.seq2_range.end_exclusive);
            if e1 >= stop1
                || e2 >= stop2
                || (check1 && !original.same(s1, e1))
                || (check2 && !modified.same(s2, e2))
            {
                break;
            }
            let start_strict = original.strictly_matches(s1, modified, s2);
            let end_strict = original.strictly_matches(e1, modified, e2);
            if end_strict && !start_strict {
                break;
            }
            change = change.delta(1);
        }

        match rest.peek() {
            Some(next) if overlaps(&change, next) => {
                let next = *next;
                rest.next();
                current = Some(change.join(&next));
            }
            _ => {
                result.push(change);
                current = rest.next();
            }
        }
    }
    result
}

/// Slide every change backward to the position with the best boundary score.
fn shift_up(
    original: &Elements<'_>,
    modified: &Elements<'_>,
    changes: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    let mut result = Vec::with_capacity(changes.len());
    let mut rest = changes.into_iter().rev().peekable();
    let mut current = rest.next();

    while let Some(change) = current.take() {
        let (stop1, stop2) = rest.peek().map_or((0, 0), |prev| {
            (prev.seq1_range.end_exclusive, prev.seq2_range.end_exclusive)
        });
        let len1 = change.seq1_range.len();
        let len2 = change.seq2_range.len();
        let boundary_score = |start1: usize, start2: usize| {
            u32::from(original.region_is_boundary(start1, len1))
                + u32::from(modified.region_is_boundary(start2, len2))
        };

        let (start1, start2) = (change.seq1_range.start, change.seq2_range.start);
        let mut best_delta = 0;
        let mut best_score = boundary_score(start1, start2);
        let mut delta = 1;
        while start1 >= stop1 + delta && start2 >= stop2 + delta {
            let (s1, s2) = (start1 - delta, start2 - delta);
            if (len1 > 0 && !original.same(s1, s1 + len1))
                || (len2 > 0 && !modified.same(s2, s2 + len2))
            {
                break;
            }
            let touching = s1 == stop1 && s2 == stop2;
            let score = boundary_score(s1, s2) + if touching { TOUCHING_BONUS } else { 0 };
            if score > best_score {
                best_score = score;
                best_delta = delta;
            }
            delta += 1;
        }
        let change = change.delta(-(best_delta as isize));

        match rest.peek() {
            Some(prev) if overlaps(prev, &change) => {
                let prev = *prev;
                rest.next();
                current = Some(prev.join(&change));
            }
            _ => {
                result.push(change);
                current = rest.next();
            }
        }
    }
    result.reverse();
    result
}

/// Re-anchor pairs of short, close changes around the heaviest equal run.
fn reanchor(original: &Elements<'_>, modified: &Elements<'_>, changes: &mut [SequenceDiff]) {
    for i in 1..changes.len() {
        let a = changes[i - 1];
        let b = changes[i];
        let gap = b.seq1_range.start - a.seq1_range.end_exclusive;
        let span1 = OffsetRange::new(a.seq1_range.start, b.seq1_range.end_exclusive);
        let span2 = OffsetRange::new(a.seq2_range.start, b.seq2_range.end_exclusive);
        if gap >= REANCHOR_MAX_GAP
            || span1.len() >= REANCHOR_MAX_SPAN
            || span2.len() >= REANCHOR_MAX_SPAN
        {
            continue;
        }
        let Some((match1, match2)) = best_contiguous_run(original, modified, span1, span2, gap)
        else {
            continue;
        };
        if match1 == a.seq1_range.end_exclusive && match2 == a.seq2_range.end_exclusive {
            continue;
        }
        changes[i - 1] = SequenceDiff::new(
            OffsetRange::new(span1.start, match1),
            OffsetRange::new(span2.start, match2),
        );
        changes[i] = SequenceDiff::new(
            OffsetRange::new(match1 + gap, span1.end_exclusive),
            OffsetRange::new(match2 + gap, span2.end_exclusive),
        );
    }
}

/// Start of the equal run of `len` elements inside both spans with the most text.
fn best_contiguous_run(
    original: &Elements<'_>,
    modified: &Elements<'_>,
    span1: OffsetRange,
    span2: OffsetRange,
    len: usize,
) -> Option<(usize, usize)> {
    if span1.len() < len || span2.len() < len {
        return None;
    }
    let mut best: Option<(usize, usize, usize)> = None;
    for i in span1.start..=span1.end_exclusive - len {
        for j in span2.start..=span2.end_exclusive - len {
            let mut score = 0;
            for l in 0..len {
                if !original.matches(i + l, modified, j + l) {
                    score = 0;
                    break;
                }
                score += original.string_len(i + l);
            }
            if score > 0 && best.is_none_or(|(s, _, _)| score > s) {
                best = Some((score, i, j));
            }
        }
    }
    best.map(|(_, i, j)| (i, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(s1: (usize, usize), s2: (usize, usize)) -> SequenceDiff {
        SequenceDiff::new(OffsetRange::new(s1.0, s1.1), OffsetRange::new(s2.0, s2.1))
    }

    #[test]
    fn inserted_block_stays_after_blank_line() {
        // The block can slide by a whole function; every position borders a
        // boundary, so the first one found is kept.
        let original = ["fn a() {", "}", "", "fn c() {", "}"];
        let modified = ["fn a() {", "}", "", "fn b() {", "}", "", "fn c() {", "}"];
        let o = Elements::from_lines(&original);
        let m = Elements::from_lines(&modified);

        let raw = vec![diff((1, 1), (1, 4))];
        let pretty = prettify(&o, &m, raw);
        assert_eq!(pretty, vec![diff((3, 3), (3, 6))]);
    }

    #[test]
    fn touching_changes_are_merged() {
        let o = Elements::from_lines(&["a", "b", "c"]);
        let m = Elements::from_lines(&["x", "y", "c"]);
        let pretty = prettify(&o, &m, vec![diff((0, 1), (0, 1)), diff((1, 2), (1, 2))]);
        assert_eq!(pretty, vec![diff((0, 2), (0, 2))]);
    }

    #[test]
    fn strict_mismatch_stops_the_forward_slide() {
        // Sliding forward would leave "a" matched against " a".
        let o = Elements::from_lines(&["x", "a"]);
        let m = Elements::from_lines(&["x", " a", "a"]);
        let pretty = prettify(&o, &m, vec![diff((1, 1), (1, 2))]);
        assert_eq!(pretty, vec![diff((1, 1), (1, 2))]);
    }
}
