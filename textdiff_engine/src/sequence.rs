//! Concrete [`Sequence`]s: whole lines for the line pass, flattened
//! characters for refinement.

use textdiff_model::{OffsetRange, Position, TextRange};

use crate::algorithms::Sequence;

pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn indentation(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Lines compared by the id of their trimmed content.
pub struct LineSequence<'a> {
    ids: Vec<u32>,
    lines: &'a [&'a str],
}

impl<'a> LineSequence<'a> {
    pub fn new(ids: Vec<u32>, lines: &'a [&'a str]) -> Self {
        debug_assert_eq!(ids.len(), lines.len());
        Self { ids, lines }
    }
}

impl Sequence for LineSequence<'_> {
    fn len(&self) -> usize {
        self.ids.len()
    }

    fn element(&self, offset: usize) -> u32 {
        self.ids[offset]
    }

    /// Prefer cuts between weakly indented lines.
    fn boundary_score(&self, offset: usize) -> Option<i32> {
        let before = offset
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map_or(0, |line| indentation(line));
        let after = self.lines.get(offset).map_or(0, |line| indentation(line));
        Some(1000 - (before + after) as i32)
    }

    fn is_strongly_equal(&self, offset1: usize, offset2: usize) -> bool {
        self.lines[offset1] == self.lines[offset2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharCategory {
    WordLower,
    WordUpper,
    WordNumber,
    End,
    Other,
    Space,
    LineBreakCr,
    LineBreakLf,
}

impl CharCategory {
    fn of(unit: Option<u16>) -> Self {
        let Some(unit) = unit else {
            return CharCategory::End;
        };
        match unit {
            0x0A => CharCategory::LineBreakLf,
            0x0D => CharCategory::LineBreakCr,
            0x20 | 0x09 => CharCategory::Space,
            0x61..=0x7A => CharCategory::WordLower,
            0x41..=0x5A => CharCategory::WordUpper,
            0x30..=0x39 => CharCategory::WordNumber,
            _ => CharCategory::Other,
        }
    }

    fn weight(self) -> i32 {
        match self {
            CharCategory::End | CharCategory::LineBreakCr | CharCategory::LineBreakLf => 10,
            CharCategory::Space => 3,
            CharCategory::Other => 2,
            CharCategory::WordLower | CharCategory::WordUpper | CharCategory::WordNumber => 0,
        }
    }
}

/// UTF-16 view over a text range, with a line feed between covered lines.
///
/// When whitespace changes are ignored every covered line is trimmed and the
/// width of its leading whitespace kept for mapping offsets back to columns.
#[derive(Debug, Clone)]
pub struct CharSlice {
    first_line: usize,
    elements: Vec<u16>,
    /// Slice offset at which each covered line starts.
    first_char_offset_by_line: Vec<usize>,
    /// Columns cut off the start of each covered line by the range.
    start_offset_by_line: Vec<usize>,
    /// Leading whitespace trimmed from each covered line.
    trimmed_ws_by_line: Vec<usize>,
}

impl CharSlice {
    pub fn new(lines: &[&str], range: TextRange, consider_whitespace_changes: bool) -> Self {
        let mut elements = Vec::new();
        let line_count = range.end.line + 1 - range.start.line;
        let mut first_char_offset_by_line = Vec::with_capacity(line_count);
        let mut start_offset_by_line = Vec::with_capacity(line_count);
        let mut trimmed_ws_by_line = Vec::with_capacity(line_count);

        for line_number in range.start.line..=range.end.line {
            let units: Vec<u16> = lines
                .get(line_number - 1)
                .map_or_else(Vec::new, |line| line.encode_utf16().collect());
            let start_offset = if line_number == range.start.line {
                (range.start.column - 1).min(units.len())
            } else {
                0
            };
            let mut content = &units[start_offset..];
            let mut trimmed_ws = 0;
            if !consider_whitespace_changes {
                trimmed_ws = content.iter().take_while(|&&u| is_whitespace(u)).count();
                content = &content[trimmed_ws..];
                let trailing = content.iter().rev().take_while(|&&u| is_whitespace(u)).count();
                content = &content[..content.len() - trailing];
            }
            let take = if line_number == range.end.line {
                (range.end.column - 1)
                    .saturating_sub(start_offset + trimmed_ws)
                    .min(content.len())
            } else {
                content.len()
            };

            first_char_offset_by_line.push(elements.len());
            start_offset_by_line.push(start_offset);
            trimmed_ws_by_line.push(trimmed_ws);
            elements.extend_from_slice(&content[..take]);
            if line_number < range.end.line {
                elements.push(u16::from(b'\n'));
            }
        }

        Self {
            first_line: range.start.line,
            elements,
            first_char_offset_by_line,
            start_offset_by_line,
            trimmed_ws_by_line,
        }
    }

    /// Position of a slice offset. At the start of a trimmed line,
    /// `prefer_left` maps before its leading whitespace.
    pub fn translate_offset(&self, offset: usize, prefer_left: bool) -> Position {
        let line = self
            .first_char_offset_by_line
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_offset = offset - self.first_char_offset_by_line[line];
        let trimmed = if line_offset == 0 && prefer_left {
            0
        } else {
            self.trimmed_ws_by_line[line]
        };
        Position::new(
            self.first_line + line,
            1 + self.start_offset_by_line[line] + line_offset + trimmed,
        )
    }

    pub fn translate_range(&self, range: OffsetRange) -> TextRange {
        if range.is_empty() {
            return TextRange::empty_at(self.translate_offset(range.start, true));
        }
        TextRange::new(
            self.translate_offset(range.start, false),
            self.translate_offset(range.end_exclusive, true),
        )
    }
}

fn is_whitespace(unit: u16) -> bool {
    char::from_u32(u32::from(unit)).is_some_and(char::is_whitespace)
}

impl Sequence for CharSlice {
    fn len(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, offset: usize) -> u32 {
        u32::from(self.elements[offset])
    }

    fn boundary_score(&self, offset: usize) -> Option<i32> {
        let prev = CharCategory::of(
            offset
                .checked_sub(1)
                .and_then(|i| self.elements.get(i).copied()),
        );
        let next = CharCategory::of(self.elements.get(offset).copied());

        if prev == CharCategory::LineBreakCr && next == CharCategory::LineBreakLf {
            return Some(0);
        }

        let mut score = 0;
        if prev != next {
            score += 10;
            if next == CharCategory::WordUpper {
                score += 1;
            }
        }
        Some(score + prev.weight() + next.weight())
    }
}
