//! Line-level diff computer.
//!
//! Lines are diffed by trimmed content, the resulting regions (and, when
//! whitespace counts, matched lines that still differ) are refined at UTF-16
//! character granularity, and the character changes are grouped back into
//! line hunks.

use std::collections::HashMap;

use textdiff_model::{
    DiffOptions, DiffResult, LineRange, LineRangeMapping, OffsetRange, Position, RangeMapping,
    TextRange,
};
use tracing::{debug, trace};

use crate::algorithms::{Sequence, SequenceAlgorithm, SequenceDiff};
use crate::deadline::Deadline;
use crate::grouping::{line_range_mapping, merge_touching};
use crate::is_single_empty_line;
use crate::optimize::{optimize_sequence_diffs, smooth};
use crate::sequence::{CharSlice, LineSequence, utf16_len};

pub(crate) fn compute(
    original_lines: &[&str],
    modified_lines: &[&str],
    options: &DiffOptions,
    deadline: &Deadline,
) -> DiffResult {
    if original_lines.len() <= 1 && original_lines == modified_lines {
        return DiffResult::default();
    }
    if is_single_empty_line(original_lines) || is_single_empty_line(modified_lines) {
        return DiffResult {
            quit_early: false,
            changes: vec![whole_document_change(
                original_lines,
                modified_lines,
                options.compute_char_changes,
            )],
        };
    }

    let tuning = &options.tuning;
    let mut ids: HashMap<&str, u32> = HashMap::new();
    let seq1 = LineSequence::new(trimmed_ids(original_lines, &mut ids), original_lines);
    let seq2 = LineSequence::new(trimmed_ids(modified_lines, &mut ids), modified_lines);

    let algorithm = SequenceAlgorithm::for_size(
        original_lines.len() + modified_lines.len(),
        tuning.line_dp_threshold,
    );
    debug!(
        ?algorithm,
        original_lines = original_lines.len(),
        modified_lines = modified_lines.len(),
        "diffing lines"
    );

    let line_weight = |i: usize, j: usize| {
        if original_lines[i] == modified_lines[j] {
            match utf16_len(modified_lines[j]) {
                0 => 0.1,
                len => 1.0 + (1.0 + len as f64).ln(),
            }
        } else {
            0.99
        }
    };
    let line_result = algorithm.compute(&seq1, &seq2, deadline, Some(&line_weight));
    let mut hit_timeout = line_result.hit_timeout;
    let line_diffs = optimize_sequence_diffs(&seq1, &seq2, line_result.diffs, tuning.max_shift);

    let refiner = Refiner {
        original_lines,
        modified_lines,
        options,
        deadline,
    };
    let mut hunks: Vec<LineRangeMapping> = Vec::new();
    let mut last1 = 0usize;
    let mut last2 = 0usize;

    for diff in &line_diffs {
        hit_timeout |= refiner.scan_whitespace_changes(
            last1,
            last2,
            diff.seq1_range.start - last1,
            &mut hunks,
        );
        last1 = diff.seq1_range.end_exclusive;
        last2 = diff.seq2_range.end_exclusive;

        hit_timeout |= refiner.refine(*diff, &mut hunks);
    }
    hit_timeout |= refiner.scan_whitespace_changes(
        last1,
        last2,
        original_lines.len() - last1,
        &mut hunks,
    );

    let mut changes = merge_touching(hunks);
    if !options.compute_char_changes {
        for change in &mut changes {
            change.inner_changes = None;
        }
    }

    debug!(
        line_diffs = line_diffs.len(),
        hunks = changes.len(),
        hit_timeout,
        "line-level diff done"
    );
    DiffResult {
        quit_early: hit_timeout,
        changes,
    }
}

/// Sequential id per distinct trimmed line, shared between both sides.
fn trimmed_ids<'a>(lines: &[&'a str], ids: &mut HashMap<&'a str, u32>) -> Vec<u32> {
    lines
        .iter()
        .map(|line| {
            let next = ids.len() as u32;
            *ids.entry(line.trim()).or_insert(next)
        })
        .collect()
}

fn whole_document_change(
    original_lines: &[&str],
    modified_lines: &[&str],
    with_inner: bool,
) -> LineRangeMapping {
    let whole = |lines: &[&str]| {
        let last = lines.last().map_or(0, |line| utf16_len(line));
        TextRange::new(Position::new(1, 1), Position::new(lines.len(), last + 1))
    };
    LineRangeMapping::new(
        LineRange::new(1, original_lines.len() + 1),
        LineRange::new(1, modified_lines.len() + 1),
        with_inner.then(|| vec![RangeMapping::new(whole(original_lines), whole(modified_lines))]),
    )
}

/// Character-level refinement of line regions.
struct Refiner<'a> {
    original_lines: &'a [&'a str],
    modified_lines: &'a [&'a str],
    options: &'a DiffOptions,
    deadline: &'a Deadline,
}

impl Refiner<'_> {
    /// Refine the line region `diff`; returns whether the budget ran out.
    fn refine(&self, diff: SequenceDiff, out: &mut Vec<LineRangeMapping>) -> bool {
        let (range1, range2) = self.region_text_ranges(diff);
        self.refine_ranges(diff, range1, range2, out)
    }

    /// Text covered by a pair of line regions, built the same way on both
    /// sides: the line feed ending the last line is included only when both
    /// regions have one, and the line feed before the regions only when both
    /// reach the end of their documents.
    fn region_text_ranges(&self, diff: SequenceDiff) -> (TextRange, TextRange) {
        let (range1, range2) = (diff.seq1_range, diff.seq2_range);
        let (len1, len2) = (self.original_lines.len(), self.modified_lines.len());
        if range1.end_exclusive == len1
            && range2.end_exclusive == len2
            && range1.start > 0
            && range2.start > 0
        {
            return (
                after_line_end(self.original_lines, range1),
                after_line_end(self.modified_lines, range2),
            );
        }
        let with_line_feed = range1.end_exclusive < len1 && range2.end_exclusive < len2;
        (
            lines_text_range(self.original_lines, range1, with_line_feed),
            lines_text_range(self.modified_lines, range2, with_line_feed),
        )
    }

    fn refine_ranges(
        &self,
        diff: SequenceDiff,
        range1: TextRange,
        range2: TextRange,
        out: &mut Vec<LineRangeMapping>,
    ) -> bool {
        let consider_whitespace = !self.options.ignore_trim_whitespace;
        let tuning = &self.options.tuning;
        let slice1 = CharSlice::new(self.original_lines, range1, consider_whitespace);
        let slice2 = CharSlice::new(self.modified_lines, range2, consider_whitespace);

        let algorithm = SequenceAlgorithm::for_size(
            slice1.len() + slice2.len(),
            tuning.char_dp_threshold,
        );
        let result = algorithm.compute(&slice1, &slice2, self.deadline, None);
        trace!(
            original = %diff.seq1_range,
            modified = %diff.seq2_range,
            ?algorithm,
            char_diffs = result.diffs.len(),
            "refined region"
        );

        let diffs = optimize_sequence_diffs(&slice1, &slice2, result.diffs, tuning.max_shift);
        let diffs = smooth(diffs, tuning.smoothing_gap);
        out.extend(diffs.into_iter().map(|d| {
            let mapping = RangeMapping::new(
                slice1.translate_range(d.seq1_range),
                slice2.translate_range(d.seq2_range),
            );
            line_range_mapping(mapping, self.original_lines, self.modified_lines)
        }));
        result.hit_timeout
    }

    /// Refine matched lines whose raw text differs; a no-op when whitespace is ignored.
    ///
    /// Only the line contents are compared, so neither line feed can be
    /// claimed by both this line and a neighbouring region.
    fn scan_whitespace_changes(
        &self,
        start1: usize,
        start2: usize,
        equal_lines: usize,
        out: &mut Vec<LineRangeMapping>,
    ) -> bool {
        if self.options.ignore_trim_whitespace {
            return false;
        }
        let mut hit_timeout = false;
        for i in 0..equal_lines {
            let (line1, line2) = (start1 + i, start2 + i);
            if self.original_lines[line1] != self.modified_lines[line2] {
                hit_timeout |= self.refine_ranges(
                    SequenceDiff::new(
                        OffsetRange::of_length(line1, 1),
                        OffsetRange::of_length(line2, 1),
                    ),
                    lines_text_range(self.original_lines, OffsetRange::of_length(line1, 1), false),
                    lines_text_range(self.modified_lines, OffsetRange::of_length(line2, 1), false),
                    out,
                );
            }
        }
        hit_timeout
    }
}

/// End of the 1-based `line`.
fn line_end(lines: &[&str], line: usize) -> Position {
    let len = lines.get(line - 1).map_or(0, |l| utf16_len(l));
    Position::new(line, len + 1)
}

/// Lines of `range`, starting at the end of the line before it.
fn after_line_end(lines: &[&str], range: OffsetRange) -> TextRange {
    TextRange::new(line_end(lines, range.start), line_end(lines, range.end_exclusive))
}

/// Lines of `range` from their first column, with or without the line feed
/// ending the last one.
fn lines_text_range(lines: &[&str], range: OffsetRange, with_line_feed: bool) -> TextRange {
    let start = Position::new(range.start + 1, 1);
    if range.is_empty() {
        TextRange::empty_at(start)
    } else if with_line_feed {
        TextRange::new(start, Position::new(range.end_exclusive + 1, 1))
    } else {
        TextRange::new(start, line_end(lines, range.end_exclusive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(original: &[&str], modified: &[&str], options: DiffOptions) -> DiffResult {
        compute(original, modified, &options, &Deadline::Unbounded)
    }

    fn strict() -> DiffOptions {
        DiffOptions::default().with_ignore_trim_whitespace(false)
    }

    fn mapping(o: (usize, usize, usize, usize), m: (usize, usize, usize, usize)) -> RangeMapping {
        RangeMapping::new(
            TextRange::new(Position::new(o.0, o.1), Position::new(o.2, o.3)),
            TextRange::new(Position::new(m.0, m.1), Position::new(m.2, m.3)),
        )
    }

    /// Lines outside the hunks pair up one to one and are identical.
    fn assert_unchanged_lines_match(original: &[&str], modified: &[&str], result: &DiffResult) {
        let (mut next1, mut next2) = (1, 1);
        let ends = result
            .changes
            .iter()
            .map(|c| (c.original_range, c.modified_range))
            .chain([(
                LineRange::new(original.len() + 1, original.len() + 1),
                LineRange::new(modified.len() + 1, modified.len() + 1),
            )]);
        for (range1, range2) in ends {
            assert!(range1.start_line >= next1 && range2.start_line >= next2, "{:?}", result.changes);
            assert_eq!(
                range1.start_line - next1,
                range2.start_line - next2,
                "unequal gap before {range1}/{range2}: {:?}",
                result.changes
            );
            for (line1, line2) in (next1..range1.start_line).zip(next2..) {
                assert_eq!(original[line1 - 1], modified[line2 - 1], "{:?}", result.changes);
            }
            next1 = range1.end_line_exclusive;
            next2 = range2.end_line_exclusive;
        }
    }

    #[test]
    fn single_line_substitution_has_inner_change() {
        let result = run(&["a", "b", "c"], &["a", "x", "c"], DiffOptions::default());
        assert!(!result.quit_early);
        assert_eq!(result.changes.len(), 1);
        let change = &result.changes[0];
        assert_eq!(change.original_range, LineRange::new(2, 3));
        assert_eq!(change.modified_range, LineRange::new(2, 3));
        assert_eq!(
            change.inner_changes,
            Some(vec![RangeMapping::new(
                TextRange::new(Position::new(2, 1), Position::new(2, 2)),
                TextRange::new(Position::new(2, 1), Position::new(2, 2)),
            )])
        );
    }

    #[test]
    fn empty_original_is_a_pure_insertion() {
        let result = run(&[""], &["a", "b"], DiffOptions::default());
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original_range, LineRange::new(1, 2));
        assert_eq!(result.changes[0].modified_range, LineRange::new(1, 3));
    }

    #[test]
    fn two_empty_documents_are_identical() {
        assert!(run(&[""], &[""], DiffOptions::default()).is_identical());
    }

    #[test]
    fn whitespace_only_changes_depend_on_option() {
        let original = ["fn main() {", "x", "}"];
        let modified = ["fn main() {", "    x", "}"];
        assert!(run(&original, &modified, DiffOptions::default()).is_identical());

        let strict = DiffOptions::default().with_ignore_trim_whitespace(false);
        let result = run(&original, &modified, strict);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original_range, LineRange::new(2, 3));
        assert_eq!(
            result.changes[0].inner_changes,
            Some(vec![RangeMapping::new(
                TextRange::empty_at(Position::new(2, 1)),
                TextRange::new(Position::new(2, 1), Position::new(2, 5)),
            )])
        );
    }

    #[test]
    fn inserted_line_is_reported_without_neighbours() {
        let result = run(&["a", "b"], &["a", "new", "b"], DiffOptions::default());
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].original_range, LineRange::new(2, 2));
        assert_eq!(result.changes[0].modified_range, LineRange::new(2, 3));
    }

    #[test]
    fn char_changes_can_be_omitted() {
        let options = DiffOptions::default().with_char_changes(false);
        let result = run(&["a", "b"], &["a", "c"], options);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].inner_changes, None);
    }

    #[test]
    fn whitespace_line_before_a_trailing_deletion_keeps_gaps_equal() {
        let original = ["", "", "", "a"];
        let modified = ["", "", "", " "];
        let result = run(&original, &modified, strict());
        assert!(!result.is_identical());
        assert_unchanged_lines_match(&original, &modified, &result);
    }

    #[test]
    fn trailing_deletion_after_whitespace_change() {
        let original = ["", " a", "😀", " 😀 1\u{e9}"];
        let modified = ["", "a"];
        let result = run(&original, &modified, strict());
        assert_unchanged_lines_match(&original, &modified, &result);
        assert_eq!(
            result.changes,
            vec![LineRangeMapping::new(
                LineRange::new(2, 5),
                LineRange::new(2, 3),
                Some(vec![
                    mapping((2, 1, 2, 2), (2, 1, 2, 1)),
                    mapping((2, 3, 4, 7), (2, 2, 2, 2)),
                ]),
            )]
        );
    }

    #[test]
    fn whitespace_change_on_last_line_claims_no_line_feed() {
        let original = ["x  "];
        let modified = ["p", "x", "q"];
        let result = run(&original, &modified, strict());
        assert_unchanged_lines_match(&original, &modified, &result);
        assert_eq!(
            result.changes,
            vec![LineRangeMapping::new(
                LineRange::new(1, 2),
                LineRange::new(1, 4),
                Some(vec![
                    mapping((1, 1, 1, 1), (1, 1, 2, 1)),
                    mapping((1, 2, 1, 4), (2, 2, 2, 2)),
                    mapping((1, 4, 1, 4), (2, 2, 3, 2)),
                ]),
            )]
        );
    }

    #[test]
    fn insertion_at_document_end_borrows_line_feed_on_both_sides() {
        let original = ["a", "b"];
        let modified = ["a", "b", "c"];
        let result = run(&original, &modified, strict());
        assert_eq!(
            result.changes,
            vec![LineRangeMapping::new(
                LineRange::new(3, 3),
                LineRange::new(3, 4),
                Some(vec![mapping((2, 2, 2, 2), (2, 2, 3, 2))]),
            )]
        );
    }
}
