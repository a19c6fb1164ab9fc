//! Source location tracking for error reporting.
//!
//! # Design
//!
//! - `Span` — compact source location (file id + byte range)
//! - `SourceMap` — manages all source files and provides lookup operations
//! - `SourceFile` — single source file with line indexing
//!
//! # Examples
//!
//! ```
//! # use elfin_lang::foundation::span::*;
//! # use std::path::PathBuf;
//! let mut map = SourceMap::new();
//! let file_id = map.add_file(PathBuf::from("test.elfin"), "system S {\n}".to_string());
//! let span = Span::new(file_id, 0, 6);
//!
//! assert_eq!(map.snippet(&span), "system");
//! assert_eq!(map.line_col(&span), (1, 1));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compact source location reference.
///
/// Points to a byte range in a source file. Line and column numbers are
/// recovered through the owning [`SourceMap`], never stored per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into SourceMap.files
    pub file_id: u16,
    /// Byte offset of start position
    pub start: u32,
    /// Byte offset of end position (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// Create a zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0)
    }

    /// Check if this span is zero-length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans (returns span covering both).
    ///
    /// Panics if spans are from different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Collection of all source files in a compilation.
///
/// Provides lookup operations for converting Spans into human-readable
/// locations and snippets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path to this file as given by the caller
    pub path: PathBuf,
    /// Original source text
    pub source: String,
    /// Byte offsets of each line start
    ///
    /// line_starts[0] is always 0 (start of file).
    /// The last entry is an EOF sentinel.
    pub line_starts: Vec<u32>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Add a source file and return its ID.
    ///
    /// The line_starts index is computed automatically.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");

        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    /// Get the source file for a span.
    pub fn file(&self, span: &Span) -> &SourceFile {
        &self.files[span.file_id as usize]
    }

    /// Get the file path for a span.
    pub fn file_path(&self, span: &Span) -> &Path {
        &self.files[span.file_id as usize].path
    }

    /// Get the source snippet for a span.
    pub fn snippet(&self, span: &Span) -> &str {
        let file = &self.files[span.file_id as usize];
        &file.source[span.start as usize..span.end as usize]
    }

    /// Get the (line, column) position for a span's start.
    ///
    /// Both line and column are 1-based.
    pub fn line_col(&self, span: &Span) -> (u32, u32) {
        let file = &self.files[span.file_id as usize];
        file.line_col(span.start)
    }

    /// Get the number of files in this map.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl SourceFile {
    /// Create a new source file with precomputed line starts.
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// Get (line, column) for a byte offset.
    ///
    /// Both line and column are 1-based. Offsets beyond EOF clamp to EOF.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);

        // Binary search to find the line
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,             // Exact match (start of line)
            Err(idx) => idx.max(1) - 1, // Falls within line idx-1
        };
        // EOF sentinel is not the start of a real line
        let line_idx = line_idx.min(self.line_starts.len().saturating_sub(2));

        let line = (line_idx + 1) as u32;
        let col = (offset - self.line_starts[line_idx]) + 1;

        (line, col)
    }

    /// Get the text of a specific line (1-based), without its terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        if line == 0 || line as usize >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[(line - 1) as usize] as usize;
        let end = self.line_starts[line as usize] as usize;
        Some(self.source[start..end].trim_end_matches(['\n', '\r']))
    }

    /// Get the number of lines in this file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }
}

/// Compute byte offsets of line starts in source text.
///
/// The returned Vec always ends with an EOF sentinel, so the number of
/// lines is `line_starts.len() - 1`.
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0];

    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }

    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }

    line_starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(0, 4, 10);
        let b = Span::new(0, 8, 20);
        let merged = a.merge(&b);
        assert_eq!(merged.start, 4);
        assert_eq!(merged.end, 20);
    }

    #[test]
    fn test_line_col_lookup() {
        let file = SourceFile::new(
            PathBuf::from("test.elfin"),
            "system S {\n  params {}\n}\n".to_string(),
        );
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(7), (1, 8));
        assert_eq!(file.line_col(11), (2, 1));
        assert_eq!(file.line_col(13), (2, 3));
        assert_eq!(file.line_count(), 3);
    }

    #[test]
    fn test_line_text() {
        let file = SourceFile::new(PathBuf::from("t"), "ab\ncd\n".to_string());
        assert_eq!(file.line_text(1), Some("ab"));
        assert_eq!(file.line_text(2), Some("cd"));
        assert_eq!(file.line_text(3), None);
    }

    #[test]
    fn test_snippet() {
        let mut map = SourceMap::new();
        let id = map.add_file(PathBuf::from("t"), "mode M {}".to_string());
        assert_eq!(map.snippet(&Span::new(id, 5, 6)), "M");
    }
}
