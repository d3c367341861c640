//! Diagnostics and the `ErrorCollector` that threads them through the
//! compile pipeline.
//!
//! No global mutable error sink: every component that can report a problem
//! (tokenizer, parser, evaluator) takes an explicit `&mut ErrorCollector`
//! instead.

use std::fmt;

use crate::source::{Source, SourceRange};

/// Severity levels, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        };
        f.write_str(s)
    }
}

/// The diagnostic-kind catalogue. These are labels, not
/// Rust exception types: runtime occurrences of the catchable kinds are
/// surfaced to user code as `ExceptionCarrier` values (see `value.rs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lex,
    Parse,
    NameResolution,
    Type,
    Arithmetic,
    Index,
    Arity,
    Unimplemented,
    Internal,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lex => "LexError",
            Self::Parse => "ParseError",
            Self::NameResolution => "NameError",
            Self::Type => "TypeError",
            Self::Arithmetic => "ArithmeticError",
            Self::Index => "IndexError",
            Self::Arity => "ArityError",
            Self::Unimplemented => "Unimplemented",
            Self::Internal => "InternalError",
        };
        f.write_str(s)
    }
}

/// A single diagnostic, optionally anchored to a source range.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub range: Option<SourceRange>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, kind: DiagnosticKind, message: impl Into<String>, range: Option<SourceRange>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
            range,
        }
    }

    #[must_use]
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, range: SourceRange) -> Self {
        Self::new(Severity::Error, kind, message, Some(range))
    }

    /// Renders the `[LEVEL] message` / `  --> file:line:col` / caret-preview
    /// format. `color` is accepted for symmetry with an
    /// embedding host's terminal writer, but this core crate never emits
    /// ANSI escapes itself — that decision belongs to the CLI driver.
    #[must_use]
    pub fn render(&self, source: &Source, color: bool) -> String {
        let _ = color;
        let mut out = format!("[{}] {}", self.severity, self.message);
        if let Some(range) = self.range {
            let pos = source.offset_to_position(range.start);
            out.push_str(&format!("\n  --> {}:{pos}", source.filename()));
            let line = source.line_text(pos.line);
            if !line.is_empty() {
                let caret_len = (range.end - range.start).max(1) as usize;
                let caret_start = pos.column.saturating_sub(1) as usize;
                let mut carets = String::new();
                for i in 0..caret_start + caret_len {
                    carets.push(if i >= caret_start { '^' } else { ' ' });
                }
                out.push_str(&format!("\n  {line}\n  {carets}"));
            }
        }
        out
    }
}

/// Accumulates diagnostics across the tokenizer, parser, and (for uncaught
/// runtime exceptions) the evaluator.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
}

impl ErrorCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity >= Severity::Error {
            self.had_error = true;
        }
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushing_an_error_sets_had_error() {
        let mut collector = ErrorCollector::new();
        assert!(!collector.had_error());
        collector.push(Diagnostic::error(DiagnosticKind::Parse, "unexpected token", SourceRange::new(0, 1)));
        assert!(collector.had_error());
    }

    #[test]
    fn warnings_do_not_set_had_error() {
        let mut collector = ErrorCollector::new();
        collector.push(Diagnostic::new(Severity::Warning, DiagnosticKind::Internal, "heads up", None));
        assert!(!collector.had_error());
    }

    #[test]
    fn render_includes_location_and_caret() {
        let source = Source::new("t.fx", "int x = ;");
        let diag = Diagnostic::error(DiagnosticKind::Parse, "expected expression", SourceRange::new(8, 9));
        let rendered = diag.render(&source, false);
        assert!(rendered.contains("[ERROR] expected expression"));
        assert!(rendered.contains("t.fx:1:9"));
        assert!(rendered.contains('^'));
    }
}
