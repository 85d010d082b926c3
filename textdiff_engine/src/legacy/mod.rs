//! Legacy whole-document backend.
//!
//! Lines are compared by their blank-trimmed text with a divide-and-conquer
//! shortest edit script, prettified, and short hunks get character changes
//! from the same algorithm run over their characters.

mod elements;
mod lcs;
mod prettify;

use textdiff_model::{
    DiffOptions, DiffResult, LineRange, LineRangeMapping, Position, RangeMapping, TextRange,
};
use tracing::debug;

use self::elements::LineTable;
use crate::algorithms::SequenceDiff;
use crate::deadline::Deadline;
use crate::grouping::merge_touching;
use crate::is_single_empty_line;
use crate::optimize::smooth;

pub(crate) fn compute(
    original_lines: &[&str],
    modified_lines: &[&str],
    options: &DiffOptions,
    deadline: &Deadline,
) -> DiffResult {
    if is_single_empty_line(original_lines) || is_single_empty_line(modified_lines) {
        if original_lines == modified_lines {
            return DiffResult::default();
        }
        return DiffResult {
            quit_early: false,
            changes: vec![LineRangeMapping::new(
                LineRange::new(1, original_lines.len() + 1),
                LineRange::new(1, modified_lines.len() + 1),
                None,
            )],
        };
    }

    let tuning = &options.tuning;
    let original = LineTable::new(original_lines);
    let modified = LineTable::new(modified_lines);
    let outcome = lcs::compute_diff(
        &original.elements,
        &modified.elements,
        deadline,
        tuning.max_history_rounds,
    );
    debug!(
        changes = outcome.changes.len(),
        quit_early = outcome.quit_early,
        "legacy line diff"
    );

    let char_deadline = deadline.capped(tuning.legacy_char_budget_cap_ms);
    let builder = HunkBuilder {
        original: &original,
        modified: &modified,
        options,
        char_deadline: &char_deadline,
    };

    let mut hunks: Vec<LineRangeMapping> = Vec::with_capacity(outcome.changes.len());
    if options.ignore_trim_whitespace {
        hunks.extend(outcome.changes.iter().map(|change| builder.hunk(change)));
    } else {
        // Matched lines before, between and after the changes may still
        // differ in leading or trailing whitespace.
        let (mut line1, mut line2) = (0, 0);
        let mut changes = outcome.changes.iter();
        loop {
            let next = changes.next();
            let (stop1, stop2) = next.map_or((original.len(), modified.len()), |c| {
                (c.seq1_range.start, c.seq2_range.start)
            });
            while line1 < stop1 && line2 < stop2 {
                builder.push_whitespace_changes(line1, line2, &mut hunks);
                line1 += 1;
                line2 += 1;
            }
            let Some(change) = next else {
                break;
            };
            hunks.push(builder.hunk(change));
            line1 = change.seq1_range.end_exclusive;
            line2 = change.seq2_range.end_exclusive;
        }
    }

    DiffResult {
        quit_early: outcome.quit_early,
        changes: merge_touching(hunks),
    }
}

struct HunkBuilder<'b, 'a> {
    original: &'b LineTable<'a>,
    modified: &'b LineTable<'a>,
    options: &'b DiffOptions,
    char_deadline: &'b Deadline,
}

impl HunkBuilder<'_, '_> {
    fn hunk(&self, change: &SequenceDiff) -> LineRangeMapping {
        LineRangeMapping::new(
            LineRange::from_offset_range(change.seq1_range),
            LineRange::from_offset_range(change.seq2_range),
            self.char_changes(change),
        )
    }

    /// Character changes for hunks that are short on both sides.
    fn char_changes(&self, change: &SequenceDiff) -> Option<Vec<RangeMapping>> {
        let tuning = &self.options.tuning;
        let max_lines = tuning.legacy_char_change_max_lines;
        let (len1, len2) = (change.seq1_range.len(), change.seq2_range.len());
        if !self.options.compute_char_changes
            || !(1..max_lines).contains(&len1)
            || !(1..max_lines).contains(&len2)
            || !self.char_deadline.is_valid()
        {
            return None;
        }

        let ignore = self.options.ignore_trim_whitespace;
        let chars1 = self.original.char_sequence(change.seq1_range, ignore);
        let chars2 = self.modified.char_sequence(change.seq2_range, ignore);
        if chars1.is_empty() || chars2.is_empty() {
            return None;
        }

        let outcome = lcs::compute_diff(
            &chars1.elements,
            &chars2.elements,
            self.char_deadline,
            tuning.max_history_rounds,
        );
        let merged = smooth(
            outcome.changes,
            tuning.legacy_min_matching_chars.saturating_sub(1),
        );
        Some(
            merged
                .into_iter()
                .map(|d| {
                    RangeMapping::new(
                        chars1.text_range(d.seq1_range),
                        chars2.text_range(d.seq2_range),
                    )
                })
                .collect(),
        )
    }

    /// Leading and trailing whitespace changes of two matched lines.
    fn push_whitespace_changes(&self, line1: usize, line2: usize, hunks: &mut Vec<LineRangeMapping>) {
        if self.original.raw(line1) == self.modified.raw(line2) {
            return;
        }
        let o = self.original.units(line1);
        let m = self.modified.units(line2);
        let (n1, n2) = (line1 + 1, line2 + 1);

        let mut o_col = self.original.start_column(line1);
        let mut m_col = self.modified.start_column(line2);
        while o_col > 1 && m_col > 1 && o[o_col - 2] == m[m_col - 2] {
            o_col -= 1;
            m_col -= 1;
        }
        if o_col > 1 || m_col > 1 {
            self.push_whitespace_change(
                hunks,
                TextRange::new(Position::new(n1, 1), Position::new(n1, o_col)),
                TextRange::new(Position::new(n2, 1), Position::new(n2, m_col)),
            );
        }

        let mut o_end = self.original.end_column(line1);
        let mut m_end = self.modified.end_column(line2);
        let (o_max, m_max) = (o.len() + 1, m.len() + 1);
        while o_end < o_max && m_end < m_max && o[o_end - 1] == m[m_end - 1] {
            o_end += 1;
            m_end += 1;
        }
        if o_end < o_max || m_end < m_max {
            self.push_whitespace_change(
                hunks,
                TextRange::new(Position::new(n1, o_end), Position::new(n1, o_max)),
                TextRange::new(Position::new(n2, m_end), Position::new(n2, m_max)),
            );
        }
    }

    /// Append a single-line whitespace change, extending the previous hunk
    /// when it ends on this line or the one before.
    fn push_whitespace_change(
        &self,
        hunks: &mut Vec<LineRangeMapping>,
        original: TextRange,
        modified: TextRange,
    ) {
        let with_chars = self.options.compute_char_changes;
        let inner = RangeMapping::new(original, modified);
        let (line1, line2) = (original.start.line, modified.start.line);

        if let Some(prev) = hunks.last_mut()
            && !prev.original_range.is_empty()
            && !prev.modified_range.is_empty()
        {
            let same_line = prev.original_range.end_line_exclusive == line1 + 1
                && prev.modified_range.end_line_exclusive == line2 + 1;
            let next_line = prev.original_range.end_line_exclusive == line1
                && prev.modified_range.end_line_exclusive == line2;
            if same_line || next_line {
                if next_line {
                    prev.original_range.end_line_exclusive += 1;
                    prev.modified_range.end_line_exclusive += 1;
                }
                if with_chars && let Some(inner_changes) = prev.inner_changes.as_mut() {
                    inner_changes.push(inner);
                }
                return;
            }
        }

        hunks.push(LineRangeMapping::new(
            LineRange::of_length(line1, 1),
            LineRange::of_length(line2, 1),
            with_chars.then(|| vec![inner]),
        ));
    }
}
