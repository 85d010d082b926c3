//! Time-boxed line and character diff engine.
//!
//! Two documents, given as line sources, are compared and the result is a
//! list of line hunks ([`LineRangeMapping`]), each optionally refined into
//! character-level [`RangeMapping`]s. Two interchangeable backends produce the
//! same output shape:
//! - [`DiffBackend::LineLevel`]: trimmed-line diff refined per region at UTF-16
//!   granularity, with boundary-aware shifting and smoothing
//! - [`DiffBackend::Legacy`]: hashed-line divide-and-conquer diff with
//!   heuristic prettification
//!
//! Every call runs under an explicit [`Deadline`]. When it runs out, the
//! result is still a valid (coarser) diff and [`DiffResult::quit_early`] is set.
//!
//! Primary entrypoints:
//! - [`diff_sources`]
//! - [`diff_lines`]
//! - [`diff_texts`]
//!
//! # Example
//!
//! ```rust
//! use textdiff_engine::{DiffBackend, DiffOptions, LineRange, diff_lines};
//!
//! let result = diff_lines(
//!     &["a", "b", "c"],
//!     &["a", "x", "c"],
//!     &DiffOptions::default(),
//!     DiffBackend::LineLevel,
//! );
//! assert_eq!(result.changes.len(), 1);
//! assert_eq!(result.changes[0].original_range, LineRange::new(2, 3));
//! ```

pub mod algorithms;
pub mod deadline;
mod grouping;
mod legacy;
mod line_level;
pub mod optimize;
pub mod sequence;

use tracing::{debug, warn};

pub use deadline::Deadline;
pub use textdiff_model::{
    DiffBackend, DiffOptions, DiffResult, DiffStats, DiffTuning, LineRange, LineRangeMapping,
    OffsetRange, ParseBackendError, Position, RangeMapping, TextRange, TextSource, split_lines,
};

/// A line source that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("source did not report a line count")]
    MissingLineCount,
    #[error("source has no line {index}")]
    MissingLine { index: usize },
}

/// Diff two line sources under the budget in `options`.
///
/// Unreadable or empty sources yield an empty result.
pub fn diff_sources<O, M>(
    original: &O,
    modified: &M,
    options: &DiffOptions,
    backend: DiffBackend,
) -> DiffResult
where
    O: TextSource + ?Sized,
    M: TextSource + ?Sized,
{
    let deadline = Deadline::from_millis(options.max_computation_time_ms);
    diff_sources_with_deadline(original, modified, options, backend, &deadline)
}

/// Like [`diff_sources`], with a caller-supplied deadline instead of
/// `options.max_computation_time_ms`.
pub fn diff_sources_with_deadline<O, M>(
    original: &O,
    modified: &M,
    options: &DiffOptions,
    backend: DiffBackend,
    deadline: &Deadline,
) -> DiffResult
where
    O: TextSource + ?Sized,
    M: TextSource + ?Sized,
{
    let lines = collect_lines(original).and_then(|o| Ok((o, collect_lines(modified)?)));
    match lines {
        Ok((original_lines, modified_lines)) => {
            run_backend(&original_lines, &modified_lines, options, backend, deadline)
        }
        Err(error) => {
            warn!(%error, "unreadable diff source, reporting no changes");
            DiffResult::default()
        }
    }
}

/// Diff two documents already split into lines.
pub fn diff_lines(
    original: &[&str],
    modified: &[&str],
    options: &DiffOptions,
    backend: DiffBackend,
) -> DiffResult {
    let deadline = Deadline::from_millis(options.max_computation_time_ms);
    run_backend(original, modified, options, backend, &deadline)
}

/// Diff two texts, splitting them on `\r\n`, `\n` and `\r`.
pub fn diff_texts(
    original: &str,
    modified: &str,
    options: &DiffOptions,
    backend: DiffBackend,
) -> DiffResult {
    diff_lines(
        &split_lines(original),
        &split_lines(modified),
        options,
        backend,
    )
}

fn collect_lines<S: TextSource + ?Sized>(source: &S) -> Result<Vec<&str>, SourceError> {
    let count = source.line_count().ok_or(SourceError::MissingLineCount)?;
    (0..count)
        .map(|index| source.line(index).ok_or(SourceError::MissingLine { index }))
        .collect()
}

fn run_backend(
    original: &[&str],
    modified: &[&str],
    options: &DiffOptions,
    backend: DiffBackend,
    deadline: &Deadline,
) -> DiffResult {
    if original.is_empty() || modified.is_empty() {
        warn!(
            original_lines = original.len(),
            modified_lines = modified.len(),
            "diff source without lines, reporting no changes"
        );
        return DiffResult::default();
    }

    debug!(%backend, unbounded = deadline.is_unbounded(), "computing diff");
    let result = match backend {
        DiffBackend::LineLevel => line_level::compute(original, modified, options, deadline),
        DiffBackend::Legacy => legacy::compute(original, modified, options, deadline),
    };
    if result.quit_early {
        warn!(
            %backend,
            budget_ms = options.max_computation_time_ms,
            "diff budget exhausted, result is coarser than optimal"
        );
    }
    result
}

pub(crate) fn is_single_empty_line(lines: &[&str]) -> bool {
    matches!(lines, [line] if line.is_empty())
}

#[cfg(test)]
mod tests;
