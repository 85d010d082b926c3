use super::{
    DiffBackend, DiffOptions, DiffResult, DiffStats, LineRange, Position, RangeMapping,
    SourceError, TextRange, TextSource, collect_lines, diff_lines, diff_sources, diff_texts,
};

const BACKENDS: [DiffBackend; 2] = [DiffBackend::LineLevel, DiffBackend::Legacy];

/// Source whose storage loses a line.
struct Truncated {
    claimed: usize,
    lines: Vec<&'static str>,
}

impl TextSource for Truncated {
    fn line_count(&self) -> Option<usize> {
        Some(self.claimed)
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).copied()
    }
}

struct Unsized;

impl TextSource for Unsized {
    fn line_count(&self) -> Option<usize> {
        None
    }

    fn line(&self, _index: usize) -> Option<&str> {
        None
    }
}

fn assert_hunks_ordered(result: &DiffResult) {
    for pair in result.changes.windows(2) {
        assert!(
            pair[0].original_range.end_line_exclusive < pair[1].original_range.start_line
                && pair[0].modified_range.end_line_exclusive < pair[1].modified_range.start_line,
            "hunks touch or overlap: {:?}",
            result.changes
        );
    }
}

#[test]
fn single_line_substitution_on_both_backends() {
    for backend in BACKENDS {
        let result = diff_lines(
            &["a", "b", "c"],
            &["a", "x", "c"],
            &DiffOptions::default(),
            backend,
        );
        assert!(!result.quit_early);
        assert_eq!(result.changes.len(), 1, "{backend}");
        let change = &result.changes[0];
        assert_eq!(change.original_range, LineRange::new(2, 3));
        assert_eq!(change.modified_range, LineRange::new(2, 3));
        assert_eq!(
            change.inner_changes,
            Some(vec![RangeMapping::new(
                TextRange::new(Position::new(2, 1), Position::new(2, 2)),
                TextRange::new(Position::new(2, 1), Position::new(2, 2)),
            )]),
            "{backend}"
        );
    }
}

#[test]
fn empty_original_covers_all_modified_lines() {
    for backend in BACKENDS {
        let result = diff_lines(&[""], &["a", "b"], &DiffOptions::default(), backend);
        assert_eq!(result.changes.len(), 1, "{backend}");
        assert_eq!(result.changes[0].original_range, LineRange::new(1, 2));
        assert_eq!(result.changes[0].modified_range, LineRange::new(1, 3));
    }
}

#[test]
fn swapped_lines_give_ordered_hunks() {
    for backend in BACKENDS {
        let result = diff_lines(
            &["foo", "bar"],
            &["bar", "foo"],
            &DiffOptions::default(),
            backend,
        );
        assert!(!result.changes.is_empty(), "{backend}");
        assert!(result.changes.len() <= 2, "{backend}");
        assert_hunks_ordered(&result);
    }
}

#[test]
fn identical_documents_have_no_changes() {
    let lines = ["fn main() {", "    run();", "}"];
    for backend in BACKENDS {
        let result = diff_lines(&lines, &lines, &DiffOptions::default(), backend);
        assert!(result.is_identical(), "{backend}");
        assert!(!result.quit_early);
    }
}

#[test]
fn unreadable_sources_yield_empty_result() {
    let good = vec!["a", "b"];
    let truncated = Truncated {
        claimed: 3,
        lines: vec!["a", "b"],
    };
    for backend in BACKENDS {
        let options = DiffOptions::default();
        assert_eq!(
            diff_sources(&truncated, &good, &options, backend),
            DiffResult::default()
        );
        assert_eq!(
            diff_sources(&good, &Unsized, &options, backend),
            DiffResult::default()
        );
    }
}

#[test]
fn source_errors_name_the_missing_line() {
    let truncated = Truncated {
        claimed: 3,
        lines: vec!["a", "b"],
    };
    assert_eq!(
        collect_lines(&truncated),
        Err(SourceError::MissingLine { index: 2 })
    );
    assert_eq!(collect_lines(&Unsized), Err(SourceError::MissingLineCount));
    assert_eq!(
        SourceError::MissingLine { index: 2 }.to_string(),
        "source has no line 2"
    );
}

#[test]
fn zero_line_sources_yield_empty_result() {
    let empty: Vec<&str> = Vec::new();
    let result = diff_sources(
        &empty,
        &vec!["a"],
        &DiffOptions::default(),
        DiffBackend::LineLevel,
    );
    assert_eq!(result, DiffResult::default());
}

#[test]
fn texts_are_split_on_any_terminator() {
    let result = diff_texts(
        "one\r\ntwo\nthree",
        "one\ntwo\rTHREE",
        &DiffOptions::default(),
        DiffBackend::LineLevel,
    );
    assert_eq!(result.changes.len(), 1);
    assert_eq!(result.changes[0].original_range, LineRange::new(3, 4));
}

#[test]
fn char_changes_can_be_disabled() {
    let options = DiffOptions::default().with_char_changes(false);
    for backend in BACKENDS {
        let result = diff_lines(&["a", "b", "c"], &["a", "x", "c"], &options, backend);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].inner_changes, None, "{backend}");
    }
}

#[test]
fn stats_summarize_hunks() {
    let result = diff_lines(
        &["a", "b", "c", "d"],
        &["a", "x", "c", "d", "e"],
        &DiffOptions::default(),
        DiffBackend::Legacy,
    );
    assert_eq!(
        result.stats(),
        DiffStats {
            hunks: 2,
            original_lines: 1,
            modified_lines: 2,
            inner_changes: 1,
        }
    );
}
