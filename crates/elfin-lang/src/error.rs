//! Compile-time diagnostics.
//!
//! Every stage of the pipeline reports problems as [`CompileError`] values
//! collected into lists, never by aborting: a single compile surfaces as
//! many independent problems as possible in one pass.
//!
//! # Design
//!
//! - `CompileError` — single diagnostic with primary and optional secondary spans
//! - `ErrorKind` — categorizes diagnostics by compiler phase
//! - `Severity` — error, warning, or advisory note
//! - `DiagnosticFormatter` — formats diagnostics with source snippets
//!
//! The one-line form used by the batch entry point is
//! `path:line:col: severity: message`.

use crate::foundation::{SourceMap, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compilation diagnostic with source location and message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileError {
    /// Category of this diagnostic
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary source location
    pub span: Span,
    /// Primary message
    pub message: String,
    /// Additional labeled spans
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// Category of diagnostic, by the phase that detected it.
///
/// # Invariant
///
/// The discriminant values must match the ERROR_KIND_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorKind {
    // Lexing
    /// Character the lexer cannot tokenize (skipped, lexing continues)
    InvalidChar = 0,

    // Parsing
    /// Malformed token sequence
    Syntax = 1,

    // Name resolution
    /// Cross-section reference to a declaration that does not exist
    UndefinedReference = 2,
    /// Free variable not found in any scope (warning, not fatal)
    UndefinedVariable = 3,
    /// Duplicate declaration name within one kind, or duplicate lhs/key
    DuplicateName = 4,

    // Unit & constant-folding pass
    /// Parameter referenced before its definition in the same block
    ForwardReference = 5,
    /// Unit annotation that does not name a known unit
    InvalidUnit = 6,
    /// Addition/comparison of operands with different exponent vectors
    DimensionalMismatch = 7,
    /// Exponentiation by a non-constant exponent leaves units unchecked
    UnresolvedUnitExponent = 8,
    /// Unfolded conditional whose branches carry different units
    UnitMismatchBetweenBranches = 9,

    // Imports
    /// Import path could not be loaded (fatal for that import only)
    Load = 10,

    // Generic
    /// Internal compiler error (bug in compiler)
    Internal = 11,
}

/// Human-readable names for error kinds.
///
/// Index matches ErrorKind discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "invalid character",             // 0: InvalidChar
    "syntax error",                  // 1: Syntax
    "undefined reference",           // 2: UndefinedReference
    "undefined variable",            // 3: UndefinedVariable
    "duplicate name",                // 4: DuplicateName
    "forward reference",             // 5: ForwardReference
    "invalid unit",                  // 6: InvalidUnit
    "dimensional mismatch",          // 7: DimensionalMismatch
    "unresolved unit exponent",      // 8: UnresolvedUnitExponent
    "unit mismatch between branches", // 9: UnitMismatchBetweenBranches
    "load error",                    // 10: Load
    "internal compiler error",       // 11: Internal
];

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory note (never blocks IR production)
    Note,
    /// Warning (IR is still produced)
    Warning,
    /// Error (exit code 1 for the batch entry point)
    Error,
}

/// Secondary labeled span in a diagnostic.
///
/// Used to point to related code locations (e.g., "first defined here").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Source location
    pub span: Span,
    /// Label text
    pub message: String,
}

impl CompileError {
    /// Creates an Error-severity diagnostic.
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, span, message)
    }

    /// Creates a Warning-severity diagnostic.
    pub fn warning(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, span, message)
    }

    /// Creates a Note-severity diagnostic.
    pub fn note(kind: ErrorKind, span: Span, message: String) -> Self {
        Self::with_severity(kind, Severity::Note, span, message)
    }

    fn with_severity(kind: ErrorKind, severity: Severity, span: Span, message: String) -> Self {
        Self {
            kind,
            severity,
            span,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a secondary labeled span (for chaining).
    pub fn with_label(mut self, span: Span, message: String) -> Self {
        self.labels.push(Label { span, message });
        self
    }

    /// Adds a note or hint (for chaining).
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// Formats this diagnostic on one line: `path:line:col: severity: message`.
    pub fn one_line(&self, sources: &SourceMap) -> String {
        let (line, col) = sources.line_col(&self.span);
        format!(
            "{}:{}:{}: {}: {}",
            sources.file_path(&self.span).display(),
            line,
            col,
            self.severity,
            self.message
        )
    }
}

impl ErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES[self as usize]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// Formats diagnostics with source code context.
///
/// Produces rich messages with file path, line/column, a source snippet,
/// a caret underline, secondary labels and notes. The batch entry point
/// uses [`CompileError::one_line`] instead.
pub struct DiagnosticFormatter<'a> {
    sources: &'a SourceMap,
}

impl<'a> DiagnosticFormatter<'a> {
    /// Creates a new diagnostic formatter over a source map.
    pub fn new(sources: &'a SourceMap) -> Self {
        Self { sources }
    }

    /// Formats a diagnostic as a string with source context.
    pub fn format(&self, error: &CompileError) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}: {}: {}\n",
            error.severity,
            error.kind.name(),
            error.message
        ));

        let file_path = self.sources.file_path(&error.span);
        let (line, col) = self.sources.line_col(&error.span);
        output.push_str(&format!("  --> {}:{}:{}\n", file_path.display(), line, col));

        let file = self.sources.file(&error.span);
        if let Some(source_line) = file.line_text(line) {
            output.push_str("   |\n");
            output.push_str(&format!("{:3} | {}\n", line, source_line));

            let start_col = col as usize;
            let span_len = (error.span.end - error.span.start) as usize;
            let end_col = (start_col + span_len).min(source_line.len() + 1);
            let underline = " ".repeat(start_col.saturating_sub(1))
                + &"^".repeat(end_col.saturating_sub(start_col).max(1));
            output.push_str(&format!("   | {}\n", underline));
        }

        for label in &error.labels {
            let (label_line, label_col) = self.sources.line_col(&label.span);
            let label_path = self.sources.file_path(&label.span);
            output.push_str(&format!(
                "   = note: {} ({}:{}:{})\n",
                label.message,
                label_path.display(),
                label_line,
                label_col
            ));
        }

        for note in &error.notes {
            output.push_str(&format!("   = help: {}\n", note));
        }

        output
    }

    /// Formats multiple diagnostics, separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_sources() -> SourceMap {
        let mut sources = SourceMap::new();
        sources.add_file(
            PathBuf::from("test.elfin"),
            "mode M {\n  system Ghost;\n}".to_string(),
        );
        sources
    }

    #[test]
    fn test_one_line_format() {
        let sources = test_sources();
        let err = CompileError::new(
            ErrorKind::UndefinedReference,
            Span::new(0, 18, 23),
            "undefined system 'Ghost'".to_string(),
        );
        assert_eq!(
            err.one_line(&sources),
            "test.elfin:2:10: error: undefined system 'Ghost'"
        );
    }

    #[test]
    fn test_formatter_snippet() {
        let sources = test_sources();
        let err = CompileError::new(
            ErrorKind::UndefinedReference,
            Span::new(0, 18, 23),
            "undefined system 'Ghost'".to_string(),
        )
        .with_note("declare the system before referencing it".to_string());

        let formatted = DiagnosticFormatter::new(&sources).format(&err);
        assert!(formatted.contains("--> test.elfin:2:10"));
        assert!(formatted.contains("system Ghost;"));
        assert!(formatted.contains("^^^^^"));
        assert!(formatted.contains("help: declare the system"));
    }

    #[test]
    fn test_kind_names_cover_all_kinds() {
        for kind in [
            ErrorKind::InvalidChar,
            ErrorKind::Syntax,
            ErrorKind::UndefinedReference,
            ErrorKind::UndefinedVariable,
            ErrorKind::DuplicateName,
            ErrorKind::ForwardReference,
            ErrorKind::InvalidUnit,
            ErrorKind::DimensionalMismatch,
            ErrorKind::UnresolvedUnitExponent,
            ErrorKind::UnitMismatchBetweenBranches,
            ErrorKind::Load,
            ErrorKind::Internal,
        ] {
            assert!(!kind.name().is_empty());
        }
    }
}
