/// Read-only, line-oriented view of a text document.
///
/// Either method may return `None` when the underlying storage cannot answer;
/// the engine treats such a source as having nothing to diff.
pub trait TextSource {
    fn line_count(&self) -> Option<usize>;

    /// Content of the 0-based line `index`, without its line terminator.
    fn line(&self, index: usize) -> Option<&str>;
}

impl<S: AsRef<str>> TextSource for [S] {
    fn line_count(&self) -> Option<usize> {
        Some(self.len())
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(AsRef::as_ref)
    }
}

impl<S: AsRef<str>> TextSource for Vec<S> {
    fn line_count(&self) -> Option<usize> {
        self.as_slice().line_count()
    }

    fn line(&self, index: usize) -> Option<&str> {
        self.as_slice().line(index)
    }
}

/// Split `text` on `\r\n`, `\n` and `\r`.
///
/// A text always has at least one line; a trailing terminator yields a final
/// empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    lines.push(&text[start..]);
    lines
}
