//! Runtime errors.

use katha_lex::Token;
use katha_util::{Diagnostic, Phase, Span};

/// A terminal runtime error with the position of the token that
/// raised it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeError {
    /// What went wrong.
    pub message: String,
    /// Line of the offending token (1-based).
    pub line: u32,
    /// Column of the offending token (1-based).
    pub column: u32,
}

impl RuntimeError {
    /// Creates an error positioned at `token`.
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }

    /// Converts to a diagnostic for uniform rendering.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(
            Phase::Runtime,
            self.message.clone(),
            Span::point(self.line, self.column),
        )
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Line {}] [Col {}] Runtime: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for RuntimeError {}
