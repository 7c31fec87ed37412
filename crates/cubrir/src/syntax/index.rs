//! Byte-offset to line-number mapping for raw source text.

/// Maps zero-based byte offsets in a source string to 1-based line numbers.
///
/// Built once per file; lookups are binary searches over the recorded line
/// start offsets. A sentinel end-of-text offset is kept so offsets at or past
/// the final newline still resolve to the last line.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Zero-based byte offset where each 1-based line starts.
    starts: Vec<usize>,
    /// Sentinel: total byte length of the indexed text.
    end: usize,
}

impl LineIndex {
    /// Index the given source text.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self {
            starts,
            end: source.len(),
        }
    }

    /// Number of lines in the indexed text. An empty text has one line.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }

    /// 1-based line number containing the given byte offset.
    ///
    /// Offsets at or beyond the end-of-text sentinel resolve to the last line.
    #[must_use]
    pub fn line_at(&self, offset: usize) -> u32 {
        let offset = offset.min(self.end);
        self.starts.partition_point(|&s| s <= offset) as u32
    }

    /// Zero-based byte offset where the given 1-based line starts.
    ///
    /// Lines past the end of the text resolve to the sentinel end offset.
    #[must_use]
    pub fn line_start(&self, line: u32) -> usize {
        if line == 0 {
            return 0;
        }
        self.starts
            .get(line as usize - 1)
            .copied()
            .unwrap_or(self.end)
    }

    /// Sentinel end-of-text offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }
}
