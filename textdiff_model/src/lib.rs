//! Value types shared by the `textdiff` engine and its callers.
//!
//! This crate provides:
//! - range primitives over flat sequences and line numbers ([`OffsetRange`], [`LineRange`])
//! - positions and character-level change mappings ([`Position`], [`TextRange`], [`RangeMapping`])
//! - the externally visible result contract ([`LineRangeMapping`], [`DiffResult`])
//! - diff options, tuning constants and backend selection ([`DiffOptions`], [`DiffTuning`], [`DiffBackend`])
//! - the read-only line source consumed by the engine ([`TextSource`])
//!
//! Every type is a plain value built fresh per diff call. Line numbers and
//! columns are 1-based; columns count UTF-16 code units.
//!
//! # Example
//!
//! ```rust
//! use textdiff_model::{LineRange, OffsetRange};
//!
//! let a = OffsetRange::new(2, 5);
//! assert_eq!(a.len(), 3);
//! assert_eq!(a.join(OffsetRange::new(7, 8)), OffsetRange::new(2, 8));
//!
//! let lines = LineRange::new(3, 3);
//! assert!(lines.is_empty());
//! ```

use std::cmp::{max, min};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod source;

pub use source::{TextSource, split_lines};

/// Half-open range `[start, end_exclusive)` over a sequence's index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetRange {
    pub start: usize,
    pub end_exclusive: usize,
}

impl OffsetRange {
    pub fn new(start: usize, end_exclusive: usize) -> Self {
        debug_assert!(
            start <= end_exclusive,
            "invalid offset range [{start}, {end_exclusive})"
        );
        Self {
            start,
            end_exclusive,
        }
    }

    /// Empty range positioned at `offset`.
    pub fn empty_at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn of_length(start: usize, len: usize) -> Self {
        Self::new(start, start + len)
    }

    pub fn len(&self) -> usize {
        self.end_exclusive - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end_exclusive
    }

    /// Move both ends by `offset`.
    pub fn delta(&self, offset: isize) -> Self {
        Self::new(
            shift_index(self.start, offset),
            shift_index(self.end_exclusive, offset),
        )
    }

    pub fn delta_start(&self, offset: isize) -> Self {
        Self::new(shift_index(self.start, offset), self.end_exclusive)
    }

    pub fn delta_end(&self, offset: isize) -> Self {
        Self::new(self.start, shift_index(self.end_exclusive, offset))
    }

    /// Smallest range covering both `self` and `other`.
    pub fn join(&self, other: OffsetRange) -> Self {
        Self::new(
            min(self.start, other.start),
            max(self.end_exclusive, other.end_exclusive),
        )
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end_exclusive
    }

    pub fn intersects_or_touches(&self, other: &OffsetRange) -> bool {
        self.start <= other.end_exclusive && other.start <= self.end_exclusive
    }
}

impl fmt::Display for OffsetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end_exclusive)
    }
}

fn shift_index(index: usize, offset: isize) -> usize {
    let shifted = index.checked_add_signed(offset);
    debug_assert!(shifted.is_some(), "index {index} shifted by {offset}");
    shifted.unwrap_or(0)
}

/// Half-open range of 1-based line numbers `[start_line, end_line_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: usize,
    pub end_line_exclusive: usize,
}

impl LineRange {
    pub fn new(start_line: usize, end_line_exclusive: usize) -> Self {
        debug_assert!(start_line >= 1, "line numbers are 1-based");
        debug_assert!(
            start_line <= end_line_exclusive,
            "invalid line range [{start_line}, {end_line_exclusive})"
        );
        Self {
            start_line,
            end_line_exclusive,
        }
    }

    pub fn of_length(start_line: usize, len: usize) -> Self {
        Self::new(start_line, start_line + len)
    }

    /// Line range covering the 0-based line indices of `range`.
    pub fn from_offset_range(range: OffsetRange) -> Self {
        Self::new(range.start + 1, range.end_exclusive + 1)
    }

    pub fn len(&self) -> usize {
        self.end_line_exclusive - self.start_line
    }

    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line_exclusive
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line < self.end_line_exclusive
    }

    pub fn join(&self, other: LineRange) -> Self {
        Self::new(
            min(self.start_line, other.start_line),
            max(self.end_line_exclusive, other.end_line_exclusive),
        )
    }

    /// `true` when the ranges share a line or one ends where the other starts.
    pub fn overlaps_or_touches(&self, other: &LineRange) -> bool {
        self.start_line <= other.end_line_exclusive && other.start_line <= self.end_line_exclusive
    }

    /// 0-based index range of the covered lines.
    pub fn to_offset_range(&self) -> OffsetRange {
        OffsetRange::new(self.start_line - 1, self.end_line_exclusive - 1)
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_line, self.end_line_exclusive)
    }
}

/// 1-based line/column position; columns count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Span between two positions, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start <= end, "text range ends before it starts");
        Self { start, end }
    }

    pub fn empty_at(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One character-level change: `original_range` is replaced by the text of `modified_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeMapping {
    pub original_range: TextRange,
    pub modified_range: TextRange,
}

impl RangeMapping {
    pub fn new(original_range: TextRange, modified_range: TextRange) -> Self {
        Self {
            original_range,
            modified_range,
        }
    }

    /// Swap the original and modified sides.
    pub fn flip(&self) -> Self {
        Self::new(self.modified_range, self.original_range)
    }
}

/// Externally visible unit of change between two line sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRangeMapping {
    pub original_range: LineRange,
    pub modified_range: LineRange,
    pub inner_changes: Option<Vec<RangeMapping>>,
}

impl LineRangeMapping {
    pub fn new(
        original_range: LineRange,
        modified_range: LineRange,
        inner_changes: Option<Vec<RangeMapping>>,
    ) -> Self {
        Self {
            original_range,
            modified_range,
            inner_changes,
        }
    }

    /// Swap the original and modified sides, including inner changes.
    pub fn flip(&self) -> Self {
        Self::new(
            self.modified_range,
            self.original_range,
            self.inner_changes
                .as_ref()
                .map(|inner| inner.iter().map(RangeMapping::flip).collect()),
        )
    }

    /// `true` when `other` overlaps or touches this mapping on either side.
    pub fn touches(&self, other: &LineRangeMapping) -> bool {
        self.original_range.overlaps_or_touches(&other.original_range)
            || self.modified_range.overlaps_or_touches(&other.modified_range)
    }

    /// Merge `other` (which follows `self`) into one mapping.
    ///
    /// Inner changes survive only when both sides carry them.
    pub fn join(self, other: LineRangeMapping) -> Self {
        let inner_changes = match (self.inner_changes, other.inner_changes) {
            (Some(mut left), Some(right)) => {
                left.extend(right);
                Some(left)
            }
            _ => None,
        };
        Self::new(
            self.original_range.join(other.original_range),
            self.modified_range.join(other.modified_range),
            inner_changes,
        )
    }
}

/// Top-level diff output contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffResult {
    pub quit_early: bool,
    pub changes: Vec<LineRangeMapping>,
}

impl DiffResult {
    pub fn is_identical(&self) -> bool {
        self.changes.is_empty()
    }

    /// Aggregate counters for this result.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats {
            hunks: self.changes.len(),
            ..DiffStats::default()
        };
        for change in &self.changes {
            stats.original_lines += change.original_range.len();
            stats.modified_lines += change.modified_range.len();
            stats.inner_changes += change.inner_changes.as_ref().map_or(0, Vec::len);
        }
        stats
    }
}

/// Summary counters derived from a [`DiffResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiffStats {
    pub hunks: usize,
    pub original_lines: usize,
    pub modified_lines: usize,
    pub inner_changes: usize,
}

/// Numeric tuning constants of the engine.
///
/// The defaults are the values the engine has always shipped with; none of
/// them is derived from first principles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffTuning {
    /// Combined line count below which the line-level computer uses dynamic programming.
    pub line_dp_threshold: usize,
    /// Combined character count below which refinement uses dynamic programming.
    pub char_dp_threshold: usize,
    /// Maximum distance a one-sided diff is moved looking for a better boundary.
    pub max_shift: usize,
    /// Character diffs closer than or equal to this gap are merged.
    pub smoothing_gap: usize,
    /// Frontier rounds retained per middle-snake search in the legacy backend.
    pub max_history_rounds: usize,
    /// Legacy character changes are computed only for hunks shorter than this on both sides.
    pub legacy_char_change_max_lines: usize,
    /// Upper bound of the legacy character-level budget; 0 disables the cap.
    pub legacy_char_budget_cap_ms: u64,
    /// Legacy character changes separated by fewer matching characters are merged.
    pub legacy_min_matching_chars: usize,
}

impl Default for DiffTuning {
    fn default() -> Self {
        Self {
            line_dp_threshold: 1500,
            char_dp_threshold: 500,
            max_shift: 20,
            smoothing_gap: 2,
            max_history_rounds: 1447,
            legacy_char_change_max_lines: 20,
            legacy_char_budget_cap_ms: 5000,
            legacy_min_matching_chars: 3,
        }
    }
}

/// Options controlling a diff call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Wall-clock budget in milliseconds; 0 means unbounded.
    pub max_computation_time_ms: u64,
    pub ignore_trim_whitespace: bool,
    pub compute_char_changes: bool,
    pub tuning: DiffTuning,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_computation_time_ms: 5000,
            ignore_trim_whitespace: true,
            compute_char_changes: true,
            tuning: DiffTuning::default(),
        }
    }
}

impl DiffOptions {
    pub fn with_max_computation_time_ms(mut self, millis: u64) -> Self {
        self.max_computation_time_ms = millis;
        self
    }

    pub fn with_ignore_trim_whitespace(mut self, ignore: bool) -> Self {
        self.ignore_trim_whitespace = ignore;
        self
    }

    pub fn with_char_changes(mut self, compute: bool) -> Self {
        self.compute_char_changes = compute;
        self
    }

    pub fn with_tuning(mut self, tuning: DiffTuning) -> Self {
        self.tuning = tuning;
        self
    }
}

/// Named diff backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffBackend {
    Legacy,
    #[default]
    LineLevel,
}

impl DiffBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffBackend::Legacy => "legacy",
            DiffBackend::LineLevel => "line-level",
        }
    }
}

impl fmt::Display for DiffBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a backend name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diff backend `{0}` (expected `legacy` or `line-level`)")]
pub struct ParseBackendError(pub String);

impl FromStr for DiffBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(DiffBackend::Legacy),
            "line-level" => Ok(DiffBackend::LineLevel),
            other => Err(ParseBackendError(other.to_string())),
        }
    }
}
