use textdiff_model::{LineRange, LineRangeMapping, RangeMapping};

use crate::sequence::utf16_len;

/// Lines touched by one character change.
///
/// A change ending at column 1 leaves its last line untouched, and a change
/// starting at or after the end of its first line leaves that line untouched,
/// as long as the range does not become inverted.
pub(crate) fn line_range_mapping(
    mapping: RangeMapping,
    original_lines: &[&str],
    modified_lines: &[&str],
) -> LineRangeMapping {
    let original = mapping.original_range;
    let modified = mapping.modified_range;

    let end_adjust = usize::from(original.end.column == 1 && modified.end.column == 1);

    let line_len = |lines: &[&str], line: usize| lines.get(line - 1).map_or(0, |l| utf16_len(l));
    let start_adjust = usize::from(
        modified.start.column - 1 >= line_len(modified_lines, modified.start.line)
            && original.start.column - 1 >= line_len(original_lines, original.start.line)
            && original.start.line + end_adjust <= original.end.line
            && modified.start.line + end_adjust <= modified.end.line,
    );

    LineRangeMapping::new(
        LineRange::new(
            original.start.line + start_adjust,
            original.end.line + 1 - end_adjust,
        ),
        LineRange::new(
            modified.start.line + start_adjust,
            modified.end.line + 1 - end_adjust,
        ),
        Some(vec![mapping]),
    )
}

/// Merge consecutive hunks that overlap or touch on either side.
pub(crate) fn merge_touching(changes: Vec<LineRangeMapping>) -> Vec<LineRangeMapping> {
    let mut result: Vec<LineRangeMapping> = Vec::with_capacity(changes.len());
    for change in changes {
        match result.pop() {
            Some(last) if last.touches(&change) => result.push(last.join(change)),
            Some(last) => {
                result.push(last);
                result.push(change);
            }
            None => result.push(change),
        }
    }
    result
}
