//! Identifier and keyword lexing.
//!
//! Identifiers start with an ASCII letter, underscore, or a Bengali
//! letter, and continue with the same plus digits in either script.
//! A scanned identifier that matches a keyword spelling (English,
//! phonetic, or Bengali) reclassifies to the keyword kind.

use crate::bengali::is_ident_continue;
use crate::token::{keyword_kind, Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes an identifier or keyword.
    pub(crate) fn lex_identifier(&mut self) -> Token {
        while is_ident_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }

        let lexeme = self.cursor.slice_from(self.token_start);
        match keyword_kind(lexeme) {
            Some(kind) => self.make_token(kind),
            None => {
                let hash = self.hash_ident(lexeme);
                Token::with_hash(
                    TokenKind::Identifier,
                    lexeme,
                    self.token_start_line,
                    self.token_start_column,
                    hash,
                )
            },
        }
    }
}
