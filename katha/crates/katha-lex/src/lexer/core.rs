//! Core lexer implementation.
//!
//! This module contains the main [`Lexer`] struct, the whitespace
//! loop, and the dispatch in [`Lexer::next_token`]. The per-family
//! scanning lives in the sibling modules.

use katha_util::{DiagnosticBuilder, Handler, HashSeed, Phase, Span};

use crate::bengali;
use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Lexer for Katha source code.
///
/// Transforms source text into a token stream terminated by exactly
/// one [`TokenKind::Eof`]. Errors are reported through the shared
/// [`Handler`]; the lexer always makes progress past them.
pub struct Lexer<'a> {
    /// Character cursor for source traversal.
    pub(crate) cursor: Cursor<'a>,

    /// Error handler for reporting lexical errors.
    handler: &'a mut Handler,

    /// Per-process seed for identifier hashing.
    seed: &'a HashSeed,

    /// Starting byte offset of the current token.
    pub(crate) token_start: usize,

    /// Line where the current token starts (1-based).
    pub(crate) token_start_line: u32,

    /// Column where the current token starts (1-based).
    pub(crate) token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source code.
    ///
    /// A leading byte-order mark is skipped if present, so callers
    /// that already stripped it and callers that did not both work.
    pub fn new(source: &'a str, handler: &'a mut Handler, seed: &'a HashSeed) -> Self {
        let mut cursor = Cursor::new(source);
        if cursor.current_char() == '\u{feff}' {
            cursor.advance();
        }
        let token_start = cursor.position();
        Self {
            cursor,
            handler,
            seed,
            token_start,
            token_start_line: 1,
            token_start_column: 1,
        }
    }

    /// Scans the whole source and returns the token list.
    ///
    /// The list always ends with exactly one `Eof` token whose line is
    /// the final source line.
    pub fn scan(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Returns the next token from the source code.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            self.token_start = self.cursor.position();
            self.token_start_line = self.cursor.line();
            self.token_start_column = self.cursor.column();

            if self.cursor.is_at_end() {
                return Token::new(
                    TokenKind::Eof,
                    "",
                    self.cursor.line(),
                    self.cursor.column(),
                );
            }

            let c = self.cursor.current_char();
            return match c {
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                ',' => self.single(TokenKind::Comma),
                '.' => self.single(TokenKind::Dot),
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                ';' => self.single(TokenKind::Semicolon),
                ':' => self.single(TokenKind::Colon),
                '%' => self.single(TokenKind::Percent),
                '/' => self.single(TokenKind::Slash),
                '*' => self.lex_star(),
                '=' => self.lex_equals(),
                '!' => self.lex_bang(),
                '<' => self.lex_less(),
                '>' => self.lex_greater(),
                '"' => self.lex_string(),
                c if bengali::is_any_digit(c) => self.lex_number(),
                c if bengali::is_ident_start(c) => self.lex_identifier(),
                c => {
                    self.report_error(format!("unexpected character '{}'", c));
                    self.cursor.advance();
                    continue;
                },
            };
        }
    }

    /// Skips spaces, tabs, and carriage returns; the cursor's own
    /// line tracking handles line feeds.
    fn skip_whitespace(&mut self) {
        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r' | '\n') {
            self.cursor.advance();
        }
    }

    /// Consumes one character and builds a token of `kind`.
    fn single(&mut self, kind: TokenKind) -> Token {
        self.cursor.advance();
        self.make_token(kind)
    }

    /// Builds a token of `kind` from the current token window.
    pub(crate) fn make_token(&mut self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            self.cursor.slice_from(self.token_start),
            self.token_start_line,
            self.token_start_column,
        )
    }

    /// Hashes an identifier lexeme with the process seed.
    pub(crate) fn hash_ident(&self, lexeme: &str) -> u64 {
        self.seed.hash_str(lexeme)
    }

    /// Reports a lexical error at the current token position.
    pub(crate) fn report_error(&mut self, message: String) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.token_start_line,
            self.token_start_column,
        );
        DiagnosticBuilder::error(Phase::Lexer, message)
            .span(span)
            .emit(self.handler);
    }
}
