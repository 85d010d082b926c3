use textdiff_model::{OffsetRange, Position, TextRange};
use xxhash_rust::xxh3::xxh3_64;

fn is_blank(unit: u16) -> bool {
    unit == u16::from(b' ') || unit == u16::from(b'\t')
}

fn trim_blanks(line: &str) -> &str {
    line.trim_matches(|c| c == ' ' || c == '\t')
}

/// Hashed elements of one side, optionally backed by their text.
///
/// Line elements carry their blank-trimmed text (compared on a hash hit) and
/// their raw text (used for strict equality). Character elements carry only
/// the code unit.
#[derive(Debug, Clone)]
pub(crate) struct Elements<'a> {
    hashes: Vec<u64>,
    strings: Option<Vec<&'a str>>,
    strict: Option<Vec<&'a str>>,
}

impl<'a> Elements<'a> {
    pub(crate) fn from_lines(lines: &[&'a str]) -> Self {
        let strings: Vec<&str> = lines.iter().map(|line| trim_blanks(line)).collect();
        Self {
            hashes: strings.iter().map(|s| xxh3_64(s.as_bytes())).collect(),
            strings: Some(strings),
            strict: Some(lines.to_vec()),
        }
    }

    pub(crate) fn from_units(units: &[u16]) -> Self {
        Self {
            hashes: units.iter().map(|&u| u64::from(u)).collect(),
            strings: None,
            strict: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.hashes.len()
    }

    pub(crate) fn has_strings(&self) -> bool {
        self.strings.is_some()
    }

    pub(crate) fn string_len(&self, index: usize) -> usize {
        self.strings.as_ref().map_or(0, |s| s[index].len())
    }

    /// Equality of two elements of this side.
    pub(crate) fn same(&self, i: usize, j: usize) -> bool {
        self.hashes[i] == self.hashes[j]
            && self.strings.as_ref().is_none_or(|s| s[i] == s[j])
    }

    pub(crate) fn matches(&self, i: usize, other: &Elements<'_>, j: usize) -> bool {
        if self.hashes[i] != other.hashes[j] {
            return false;
        }
        match (&self.strings, &other.strings) {
            (Some(a), Some(b)) => a[i] == b[j],
            _ => true,
        }
    }

    /// Equal including leading and trailing blanks.
    pub(crate) fn strictly_matches(&self, i: usize, other: &Elements<'_>, j: usize) -> bool {
        if !self.matches(i, other, j) {
            return false;
        }
        match (&self.strict, &other.strict) {
            (Some(a), Some(b)) => a[i] == b[j],
            _ => true,
        }
    }

    /// Sequence edges and blank lines are natural places for a change to end.
    pub(crate) fn is_boundary(&self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.len() {
            return true;
        }
        self.strings.as_ref().is_some_and(|s| s[index].is_empty())
    }

    /// A region is a boundary when it starts or ends next to one.
    pub(crate) fn region_is_boundary(&self, start: usize, len: usize) -> bool {
        self.is_boundary(start)
            || start
                .checked_sub(1)
                .is_some_and(|before| self.is_boundary(before))
            || (len > 0 && (self.is_boundary(start + len - 1) || self.is_boundary(start + len)))
    }
}

/// One side of a legacy diff: raw lines plus their blank-trimmed elements.
pub(crate) struct LineTable<'a> {
    lines: &'a [&'a str],
    units: Vec<Vec<u16>>,
    /// 1-based column of the first non-blank unit, 1 for blank lines.
    start_columns: Vec<usize>,
    /// 1-based column after the last non-blank unit, 1 for blank lines.
    end_columns: Vec<usize>,
    pub(crate) elements: Elements<'a>,
}

impl<'a> LineTable<'a> {
    pub(crate) fn new(lines: &'a [&'a str]) -> Self {
        let units: Vec<Vec<u16>> = lines
            .iter()
            .map(|line| line.encode_utf16().collect())
            .collect();
        let mut start_columns = Vec::with_capacity(lines.len());
        let mut end_columns = Vec::with_capacity(lines.len());
        for line in &units {
            match line.iter().position(|&u| !is_blank(u)) {
                Some(first) => {
                    let last = line.iter().rposition(|&u| !is_blank(u)).unwrap_or(first);
                    start_columns.push(first + 1);
                    end_columns.push(last + 2);
                }
                None => {
                    start_columns.push(1);
                    end_columns.push(1);
                }
            }
        }
        Self {
            lines,
            units,
            start_columns,
            end_columns,
            elements: Elements::from_lines(lines),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }

    pub(crate) fn raw(&self, index: usize) -> &'a str {
        self.lines[index]
    }

    pub(crate) fn units(&self, index: usize) -> &[u16] {
        &self.units[index]
    }

    pub(crate) fn start_column(&self, index: usize) -> usize {
        self.start_columns[index]
    }

    pub(crate) fn end_column(&self, index: usize) -> usize {
        self.end_columns[index]
    }

    /// Characters of the 0-based lines in `range`.
    ///
    /// Blank-trimmed when `ignore_trim_whitespace`, otherwise complete and
    /// joined by line feeds.
    pub(crate) fn char_sequence(
        &self,
        range: OffsetRange,
        ignore_trim_whitespace: bool,
    ) -> CharSequence {
        let mut units = Vec::new();
        let mut starts = Vec::new();
        let mut ends = Vec::new();

        for index in range.start..range.end_exclusive {
            let line = &self.units[index];
            let line_number = index + 1;
            let (from, to) = if ignore_trim_whitespace {
                (self.start_columns[index], self.end_columns[index])
            } else {
                (1, line.len() + 1)
            };
            for column in from..to {
                units.push(line[column - 1]);
                starts.push(Position::new(line_number, column));
                ends.push(Position::new(line_number, column + 1));
            }
            if !ignore_trim_whitespace && index + 1 < range.end_exclusive {
                units.push(u16::from(b'\n'));
                starts.push(Position::new(line_number, line.len() + 1));
                ends.push(Position::new(line_number + 1, 1));
            }
        }

        CharSequence {
            elements: Elements::from_units(&units),
            starts,
            ends,
        }
    }
}

/// Characters of a line run with the position each one occupies.
pub(crate) struct CharSequence {
    pub(crate) elements: Elements<'static>,
    starts: Vec<Position>,
    ends: Vec<Position>,
}

impl CharSequence {
    pub(crate) fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Text span covered by `range`; an empty range maps to its insertion point.
    pub(crate) fn text_range(&self, range: OffsetRange) -> TextRange {
        if range.is_empty() {
            let at = match self.starts.get(range.start) {
                Some(&position) => position,
                None => self.ends.last().copied().unwrap_or(Position::new(1, 1)),
            };
            return TextRange::empty_at(at);
        }
        TextRange::new(self.starts[range.start], self.ends[range.end_exclusive - 1])
    }
}
