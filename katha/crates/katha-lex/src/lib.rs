//! katha-lex - Lexical Analyzer (Lexer/Tokenizer)
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The lexer transforms Katha source text into a stream of tokens. Katha
//! source is Unicode-first: identifiers, keywords, and digits may be
//! written in English, in Bengali script, or in phoneticized Bengali,
//! and all three spellings of a keyword lex to the same token kind.
//!
//! ```text
//! Source:  ধরি x = ১০
//! Tokens:  [Let] [Ident("x")] [Eq] [Number("১০")] [Eof]
//! ```
//!
//! PIPELINE POSITION:
//! ------------------
//! ```text
//! Source (&str) ──▶ [katha-lex] ──▶ Vec<Token> ──▶ [katha-par]
//! ```
//!
//! PROPERTIES:
//! -----------
//! - Single pass, O(n) in the input length
//! - The returned stream always ends with exactly one `Eof` token
//! - String literal contents are kept raw; escape expansion happens
//!   in the parser
//! - Number lexemes are kept raw; Bengali→ASCII digit translation
//!   happens at parse time
//!
//! Errors (unknown characters, unterminated strings) are reported
//! through the shared diagnostic [`Handler`](katha_util::Handler); the
//! lexer skips the offending code point and keeps going.

pub mod bengali;
pub mod cursor;
mod edge_cases;
pub mod lexer;
pub mod token;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{keyword_kind, Token, TokenKind};
