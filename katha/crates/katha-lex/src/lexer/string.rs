//! String literal lexing.
//!
//! Strings are bounded by `"` and may span lines. The token lexeme is
//! the raw contents between the quotes, escapes untouched; the parser
//! expands them. Hitting end-of-file inside a string is a lexical
//! error.

use crate::token::{Token, TokenKind};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a string literal. The opening quote is the current
    /// character.
    pub(crate) fn lex_string(&mut self) -> Token {
        self.cursor.advance(); // opening quote
        let content_start = self.cursor.position();

        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }

        if self.cursor.is_at_end() {
            self.report_error("unterminated string".to_string());
            let contents = self.cursor.slice_from(content_start).to_string();
            return Token::new(
                TokenKind::String,
                contents,
                self.token_start_line,
                self.token_start_column,
            );
        }

        let contents = self.cursor.slice_from(content_start).to_string();
        self.cursor.advance(); // closing quote

        Token::new(
            TokenKind::String,
            contents,
            self.token_start_line,
            self.token_start_column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katha_util::{Handler, HashSeed};

    fn scan(source: &str) -> (Vec<Token>, Handler) {
        let mut handler = Handler::new();
        let seed = HashSeed::from_parts(3, 5);
        let tokens = Lexer::new(source, &mut handler, &seed).scan();
        (tokens, handler)
    }

    #[test]
    fn test_simple_string() {
        let (tokens, handler) = scan("\"hello\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "hello");
        assert!(!handler.has_errors());
    }

    #[test]
    fn test_escapes_kept_raw() {
        let (tokens, _) = scan(r#""a\nb""#);
        assert_eq!(tokens[0].lexeme, r"a\nb");
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let (tokens, _) = scan("\"a\nb\" x");
        assert_eq!(tokens[0].lexeme, "a\nb");
        // The identifier after the string is on line 2.
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, handler) = scan("\"abc");
        assert!(handler.has_errors());
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_bengali_contents() {
        let (tokens, _) = scan("\"কথা\"");
        assert_eq!(tokens[0].lexeme, "কথা");
    }
}
