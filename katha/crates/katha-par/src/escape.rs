//! String escape expansion.
//!
//! The lexer hands string contents over raw; this module expands the
//! escape sequences at parse time:
//!
//! - single-character escapes: `\n \t \r \a \b \f \v \\ \" \'`
//! - `\xHH` - one byte-sized code point from two hex digits
//! - `\uHHHH` - a UTF-16 code unit; a high surrogate must be
//!   followed by a second `\uHHHH` low surrogate and the pair is
//!   combined
//! - `\UHHHHHHHH` - a full code point, validated to be at most
//!   U+10FFFF and not a lone surrogate

use thiserror::Error;

/// Ways a string escape can be malformed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EscapeError {
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),

    #[error("invalid hex digit '{0}' in escape sequence")]
    InvalidHexDigit(char),

    #[error("escape sequence ends before its hex digits")]
    TruncatedHex,

    #[error("high surrogate escape is not followed by a low surrogate")]
    MissingLowSurrogate,

    #[error("lone low surrogate escape")]
    LoneLowSurrogate,

    #[error("escaped code point U+{0:X} is not a valid character")]
    InvalidCodePoint(u32),
}

/// Expands all escape sequences in `raw`.
///
/// # Examples
///
/// ```
/// use katha_par::escape::decode_escapes;
///
/// assert_eq!(decode_escapes(r"a\tb").unwrap(), "a\tb");
/// assert_eq!(decode_escapes(r"\u09E6").unwrap(), "০");
/// assert!(decode_escapes(r"\q").is_err());
/// ```
pub fn decode_escapes(raw: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(esc) = chars.next() else {
            return Err(EscapeError::UnknownEscape('\\'));
        };

        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => {
                let value = read_hex(&mut chars, 2)?;
                match char::from_u32(value) {
                    Some(c) => out.push(c),
                    None => return Err(EscapeError::InvalidCodePoint(value)),
                }
            },
            'u' => {
                let value = read_hex(&mut chars, 4)?;
                let cp = combine_surrogates(value, &mut chars)?;
                match char::from_u32(cp) {
                    Some(c) => out.push(c),
                    None => return Err(EscapeError::InvalidCodePoint(cp)),
                }
            },
            'U' => {
                let value = read_hex(&mut chars, 8)?;
                if value > 0x10FFFF || (0xD800..=0xDFFF).contains(&value) {
                    return Err(EscapeError::InvalidCodePoint(value));
                }
                match char::from_u32(value) {
                    Some(c) => out.push(c),
                    None => return Err(EscapeError::InvalidCodePoint(value)),
                }
            },
            other => return Err(EscapeError::UnknownEscape(other)),
        }
    }

    Ok(out)
}

/// Reads exactly `count` hex digits.
fn read_hex(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    count: usize,
) -> Result<u32, EscapeError> {
    let mut value = 0u32;
    for _ in 0..count {
        let Some(c) = chars.next() else {
            return Err(EscapeError::TruncatedHex);
        };
        let digit = c
            .to_digit(16)
            .ok_or(EscapeError::InvalidHexDigit(c))?;
        value = (value << 4) | digit;
    }
    Ok(value)
}

/// Resolves UTF-16 surrogate handling for a `\uHHHH` escape.
///
/// A high surrogate demands an immediately following `\uHHHH` low
/// surrogate; the two combine into one code point. A lone low
/// surrogate is an error.
fn combine_surrogates(
    value: u32,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<u32, EscapeError> {
    if (0xD800..=0xDBFF).contains(&value) {
        if chars.next() != Some('\\') || chars.next() != Some('u') {
            return Err(EscapeError::MissingLowSurrogate);
        }
        let low = read_hex(chars, 4)?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(EscapeError::MissingLowSurrogate);
        }
        Ok(0x10000 + ((value - 0xD800) << 10) + (low - 0xDC00))
    } else if (0xDC00..=0xDFFF).contains(&value) {
        Err(EscapeError::LoneLowSurrogate)
    } else {
        Ok(value)
    }
}
