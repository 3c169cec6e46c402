//! Operator lexing.
//!
//! Two-character operators are matched with maximal munch: `==`, `!=`,
//! `<=`, `>=`, and the exponent operator `**`.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes `*` or `**`.
    pub(crate) fn lex_star(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('*') {
            self.make_token(TokenKind::StarStar)
        } else {
            self.make_token(TokenKind::Star)
        }
    }

    /// Lexes `=` or `==`.
    pub(crate) fn lex_equals(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::EqEq)
        } else {
            self.make_token(TokenKind::Eq)
        }
    }

    /// Lexes `!` or `!=`.
    pub(crate) fn lex_bang(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::BangEq)
        } else {
            self.make_token(TokenKind::Bang)
        }
    }

    /// Lexes `<` or `<=`.
    pub(crate) fn lex_less(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::LtEq)
        } else {
            self.make_token(TokenKind::Lt)
        }
    }

    /// Lexes `>` or `>=`.
    pub(crate) fn lex_greater(&mut self) -> Token {
        self.cursor.advance();
        if self.cursor.match_char('=') {
            self.make_token(TokenKind::GtEq)
        } else {
            self.make_token(TokenKind::Gt)
        }
    }
}
