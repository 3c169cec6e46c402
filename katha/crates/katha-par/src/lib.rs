//! katha-par - Recursive-Descent Parser
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The parser consumes the token stream produced by `katha-lex` and
//! builds a list of statement nodes. Expressions follow this
//! precedence ladder, loosest first:
//!
//! | Level      | Operators                  | Associativity |
//! |------------|----------------------------|---------------|
//! | assignment | `=`                        | Right         |
//! | logic_or   | `or`                       | Left          |
//! | logic_and  | `and`                      | Left          |
//! | equality   | `==`, `!=`                 | Left          |
//! | comparison | `<`, `<=`, `>`, `>=`       | Left          |
//! | term       | `+`, `-`                   | Left          |
//! | factor     | `*`, `/`, `%`              | Left          |
//! | unary      | `!`, `-` (prefix)          | Right         |
//! | power      | `**`                       | Right         |
//! | postfix    | call `()`, subscript `[]`, module get `.` | Left |
//!
//! SEMANTICS BAKED INTO PARSING:
//! -----------------------------
//! - Number lexemes are converted to `f64` here, translating Bengali
//!   digits to their ASCII values first
//! - String escape sequences are expanded here (see [`escape`])
//! - Assignment targets are validated: only variables and subscripts
//! - The module side of `m.child` must be a plain variable
//!
//! ERROR RECOVERY:
//! ---------------
//! On a parse error the parser reports through the shared handler and
//! synchronizes: tokens are discarded until a `;` has been consumed
//! or the current token is one of `func let while if return import
//! print`. Parsing then continues, so one script can surface several
//! errors in a single run.

pub mod ast;
pub mod escape;
mod expr;
mod stmt;

#[cfg(test)]
mod edge_cases;

pub use ast::{Expr, LitKind, LitValue, Stmt};
pub use escape::{decode_escapes, EscapeError};

use katha_lex::{Token, TokenKind};
use katha_util::{Handler, Phase};

/// Recursive descent parser for Katha.
pub struct Parser<'a> {
    /// Token stream from the lexer, terminated by `Eof`.
    tokens: Vec<Token>,

    /// Current position in the token stream.
    position: usize,

    /// Error handler shared with the other phases.
    handler: &'a mut Handler,
}

impl<'a> Parser<'a> {
    /// Creates a parser over a token stream.
    ///
    /// The stream must be `Eof`-terminated, which [`katha_lex::Lexer::scan`]
    /// guarantees.
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        Self {
            tokens,
            position: 0,
            handler,
        }
    }

    /// Parses the whole program into a statement list.
    ///
    /// Errors are reported through the handler; the returned list is
    /// best-effort and must not be executed if the handler holds
    /// errors.
    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut program = Vec::new();
        while !self.is_at_end() {
            if self.match_kind(TokenKind::Semicolon) {
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => program.push(stmt),
                None => self.synchronize(),
            }
        }
        program
    }

    // =========================================================================
    // TOKEN STREAM HELPERS
    // =========================================================================

    /// The token under the cursor.
    pub(crate) fn current(&self) -> &Token {
        // The stream is Eof-terminated, so position is always valid.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    /// True when the cursor sits on `Eof`.
    pub(crate) fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    /// Consumes and returns the current token.
    pub(crate) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous().clone()
    }

    /// True if the current token has the given kind.
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current().kind == kind
    }

    /// Consumes the current token when it has the given kind.
    pub(crate) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token when it has any of the given kinds.
    pub(crate) fn match_any(&mut self, kinds: &[TokenKind]) -> bool {
        for kind in kinds {
            if self.check(*kind) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Consumes a token of the given kind or reports `message`.
    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            return Some(self.advance());
        }
        let at = self.current().clone();
        self.error(&at, message);
        None
    }

    /// Reports a parse error at `token`.
    pub(crate) fn error(&mut self, token: &Token, message: &str) {
        self.handler.error(Phase::Parser, message, token.span());
    }

    /// Discards tokens until a statement boundary.
    ///
    /// A boundary is either a consumed `;` or a statement-head
    /// keyword at the cursor.
    pub(crate) fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            match self.current().kind {
                TokenKind::Func
                | TokenKind::Let
                | TokenKind::While
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::Import
                | TokenKind::Print => return,
                _ => {
                    self.advance();
                },
            }
        }
    }
}
