//! Fluent construction of diagnostics.
//!
//! [`DiagnosticBuilder`] is the preferred way for phases to report:
//!
//! ```
//! use katha_util::diagnostic::{DiagnosticBuilder, Handler, Phase};
//! use katha_util::span::Span;
//!
//! let mut handler = Handler::new();
//! DiagnosticBuilder::error(Phase::Parser, "Expected ')'")
//!     .span(Span::point(4, 12))
//!     .note("call arguments start here")
//!     .emit(&mut handler);
//! ```

use super::{Diagnostic, Handler, Level, Phase};
use crate::span::Span;

/// Builder for [`Diagnostic`] values.
#[derive(Debug)]
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    /// Starts an error-level diagnostic.
    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Error, phase, message, Span::DUMMY),
        }
    }

    /// Starts a warning-level diagnostic.
    pub fn warning(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            diagnostic: Diagnostic::new(Level::Warning, phase, message, Span::DUMMY),
        }
    }

    /// Sets the source location.
    pub fn span(mut self, span: Span) -> Self {
        self.diagnostic.span = span;
        self
    }

    /// Attaches a context note.
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    /// Finishes and returns the diagnostic without emitting it.
    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }

    /// Finishes and records the diagnostic on `handler`.
    pub fn emit(self, handler: &mut Handler) {
        handler.emit(self.diagnostic);
    }
}
