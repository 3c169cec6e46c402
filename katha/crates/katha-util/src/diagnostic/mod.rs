//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Each phase of the interpreter reports problems through a shared
//! [`Handler`]. Diagnostics carry a severity [`Level`], the [`Phase`]
//! that produced them, a message, and a [`Span`]. The user-facing
//! rendering is one line per diagnostic:
//!
//! ```text
//! [Line 3] [Col 7] Runtime: Division by zero
//! ```
//!
//! # Examples
//!
//! ```
//! use katha_util::diagnostic::{DiagnosticBuilder, Handler, Phase};
//! use katha_util::span::Span;
//!
//! let mut handler = Handler::new();
//! DiagnosticBuilder::error(Phase::Lexer, "unexpected character '~'")
//!     .span(Span::new(4, 5, 1, 5))
//!     .emit(&mut handler);
//!
//! assert!(handler.has_errors());
//! ```

mod builder;

pub use builder::DiagnosticBuilder;

use std::fmt;

use crate::span::Span;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that stops the script.
    Error,
    /// A warning that does not stop the script.
    Warning,
    /// Additional information about a diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// The pipeline phase a diagnostic originates from.
///
/// The phase name appears verbatim in the rendered line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Tokenization (unknown character, unterminated string, ...).
    Lexer,
    /// Parsing, including string-escape expansion.
    Parser,
    /// Execution (type mismatch, undefined variable, ...).
    Runtime,
    /// Bugs and resource exhaustion inside the interpreter itself.
    Internal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexer => write!(f, "Lexer"),
            Phase::Parser => write!(f, "Parser"),
            Phase::Runtime => write!(f, "Runtime"),
            Phase::Internal => write!(f, "Internal"),
        }
    }
}

/// A diagnostic message with severity, phase, and location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Originating phase.
    pub phase: Phase,
    /// Main message.
    pub message: String,
    /// Source location.
    pub span: Span,
    /// Additional notes for context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(level: Level, phase: Phase, message: impl Into<String>, span: Span) -> Self {
        Self {
            level,
            phase,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Shorthand for an error diagnostic.
    pub fn error(phase: Phase, message: impl Into<String>, span: Span) -> Self {
        Self::new(Level::Error, phase, message, span)
    }

    /// Renders the single-line user-facing form.
    pub fn render(&self) -> String {
        format!(
            "[Line {}] [Col {}] {}: {}",
            self.span.line, self.span.column, self.phase, self.message
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Collects diagnostics emitted by the pipeline phases.
///
/// The handler only stores; rendering and process exit decisions
/// belong to the driver.
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl Handler {
    /// Creates an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.level == Level::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Shorthand: records an error for `phase` at `span`.
    pub fn error(&mut self, phase: Phase, message: impl Into<String>, span: Span) {
        self.emit(Diagnostic::error(phase, message, span));
    }

    /// True if at least one error-level diagnostic was recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// All recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Writes every diagnostic as one rendered line.
    pub fn print_all(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for diagnostic in &self.diagnostics {
            writeln!(out, "{}", diagnostic.render())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_format() {
        let diag = Diagnostic::error(Phase::Runtime, "Division by zero", Span::new(0, 1, 3, 7));
        assert_eq!(diag.render(), "[Line 3] [Col 7] Runtime: Division by zero");
    }

    #[test]
    fn test_handler_counts_errors_only() {
        let mut handler = Handler::new();
        handler.emit(Diagnostic::new(
            Level::Warning,
            Phase::Parser,
            "odd but legal",
            Span::DUMMY,
        ));
        assert!(!handler.has_errors());

        handler.error(Phase::Parser, "Expected ')'", Span::DUMMY);
        assert!(handler.has_errors());
        assert_eq!(handler.error_count(), 1);
        assert_eq!(handler.diagnostics().len(), 2);
    }

    #[test]
    fn test_print_all() {
        let mut handler = Handler::new();
        handler.error(Phase::Lexer, "unexpected character", Span::new(0, 1, 1, 1));
        handler.error(Phase::Parser, "Expected expression", Span::new(2, 3, 2, 1));

        let mut out = Vec::new();
        handler.print_all(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[Line 1] [Col 1] Lexer: unexpected character\n\
             [Line 2] [Col 1] Parser: Expected expression\n"
        );
    }
}
