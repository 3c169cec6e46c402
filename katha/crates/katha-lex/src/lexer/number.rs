//! Number literal lexing.
//!
//! A number is one or more digits in either script (ASCII `0..9` or
//! Bengali `০..৯`, freely mixed), optionally followed by `.` and more
//! digits. The raw lexeme is preserved; digit translation and the
//! conversion to `f64` happen at parse time.

use crate::bengali::is_any_digit;
use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a number literal.
    ///
    /// The decimal point is only consumed when a digit follows it, so
    /// `5.foo` lexes as `5` `.` `foo`.
    pub(crate) fn lex_number(&mut self) -> Token {
        while is_any_digit(self.cursor.current_char()) {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' && is_any_digit(self.cursor.peek_char(1)) {
            self.cursor.advance();
            while is_any_digit(self.cursor.current_char()) {
                self.cursor.advance();
            }
        }

        self.make_token(TokenKind::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katha_util::{Handler, HashSeed};

    fn first(source: &str) -> Token {
        let mut handler = Handler::new();
        let seed = HashSeed::from_parts(3, 5);
        Lexer::new(source, &mut handler, &seed)
            .scan()
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_integer() {
        let token = first("12345");
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.lexeme, "12345");
    }

    #[test]
    fn test_fraction() {
        let token = first("3.14");
        assert_eq!(token.lexeme, "3.14");
    }

    #[test]
    fn test_bengali_digits() {
        let token = first("১২৩");
        assert_eq!(token.kind, TokenKind::Number);
        assert_eq!(token.lexeme, "১২৩");
    }

    #[test]
    fn test_mixed_scripts() {
        let token = first("১2৩.4৫");
        assert_eq!(token.lexeme, "১2৩.4৫");
    }

    #[test]
    fn test_dot_without_digit_not_consumed() {
        let mut handler = Handler::new();
        let seed = HashSeed::from_parts(3, 5);
        let tokens = Lexer::new("5.x", &mut handler, &seed).scan();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[0].lexeme, "5");
    }
}
