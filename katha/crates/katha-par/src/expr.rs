//! Expression parsing.
//!
//! A classic precedence cascade: each level parses the tighter level
//! and folds its own operators left-to-right, except assignment and
//! `**`, which recurse to the right. Postfix forms (call, subscript,
//! module get) are a left fold over `primary`.

use katha_lex::bengali::digit_value;
use katha_lex::{Token, TokenKind};

use crate::ast::{Expr, LitKind, LitValue};
use crate::escape::decode_escapes;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Main expression entry point.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_assignment()
    }

    /// `assignment := logic_or ("=" assignment)?` - right associative.
    ///
    /// The left side must turn out to be a variable or a subscript.
    fn parse_assignment(&mut self) -> Option<Expr> {
        let expr = self.parse_logic_or()?;

        if self.match_kind(TokenKind::Eq) {
            let op = self.previous().clone();
            let value = self.parse_assignment()?;

            return match expr {
                Expr::Variable { .. } | Expr::Subscript { .. } => Some(Expr::Assign {
                    target: Box::new(expr),
                    value: Box::new(value),
                    op,
                }),
                _ => {
                    self.error(&op, "Invalid assignment target");
                    None
                },
            };
        }

        Some(expr)
    }

    /// `logic_or := logic_and ("or" logic_and)*`
    fn parse_logic_or(&mut self) -> Option<Expr> {
        let mut expr = self.parse_logic_and()?;
        while self.match_kind(TokenKind::Or) {
            let op = self.previous().clone();
            let right = self.parse_logic_and()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Some(expr)
    }

    /// `logic_and := equality ("and" equality)*`
    fn parse_logic_and(&mut self) -> Option<Expr> {
        let mut expr = self.parse_equality()?;
        while self.match_kind(TokenKind::And) {
            let op = self.previous().clone();
            let right = self.parse_equality()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Some(expr)
    }

    /// `equality := comparison (("==" | "!=") comparison)*`
    fn parse_equality(&mut self) -> Option<Expr> {
        let mut expr = self.parse_comparison()?;
        while self.match_any(&[TokenKind::EqEq, TokenKind::BangEq]) {
            let op = self.previous().clone();
            let right = self.parse_comparison()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `comparison := term (("<" | "<=" | ">" | ">=") term)*`
    fn parse_comparison(&mut self) -> Option<Expr> {
        let mut expr = self.parse_term()?;
        while self.match_any(&[
            TokenKind::Gt,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::LtEq,
        ]) {
            let op = self.previous().clone();
            let right = self.parse_term()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `term := factor (("+" | "-") factor)*`
    fn parse_term(&mut self) -> Option<Expr> {
        let mut expr = self.parse_factor()?;
        while self.match_any(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.parse_factor()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `factor := unary (("*" | "/" | "%") unary)*`
    fn parse_factor(&mut self) -> Option<Expr> {
        let mut expr = self.parse_unary()?;
        while self.match_any(&[TokenKind::Star, TokenKind::Slash, TokenKind::Percent]) {
            let op = self.previous().clone();
            let right = self.parse_unary()?;
            expr = binary(expr, op, right);
        }
        Some(expr)
    }

    /// `unary := ("!" | "-") unary | power`
    fn parse_unary(&mut self) -> Option<Expr> {
        if self.match_any(&[TokenKind::Bang, TokenKind::Minus]) {
            let op = self.previous().clone();
            let right = self.parse_unary()?;
            return Some(Expr::Unary {
                op,
                right: Box::new(right),
            });
        }
        self.parse_power()
    }

    /// `power := postfix ("**" unary)?` - right associative, so
    /// `2**3**2` is `2**(3**2)`.
    fn parse_power(&mut self) -> Option<Expr> {
        let expr = self.parse_postfix()?;
        if self.match_kind(TokenKind::StarStar) {
            let op = self.previous().clone();
            let right = self.parse_unary()?;
            return Some(binary(expr, op, right));
        }
        Some(expr)
    }

    /// Left-folds calls, subscripts, and module gets over `primary`.
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.match_kind(TokenKind::LParen) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(TokenKind::LBracket) {
                let bracket = self.previous().clone();
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "Expected ']' after subscript")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                    bracket,
                };
            } else if self.match_kind(TokenKind::Dot) {
                let dot = self.previous().clone();
                let child = self.expect(TokenKind::Identifier, "Expected name after '.'")?;
                if !matches!(expr, Expr::Variable { .. }) {
                    self.error(&dot, "Module access needs a module name on the left");
                    return None;
                }
                expr = Expr::ModGet {
                    module: Box::new(expr),
                    child,
                    dot,
                };
            } else {
                break;
            }
        }

        Some(expr)
    }

    /// Parses arguments after the opening parenthesis.
    fn finish_call(&mut self, callee: Expr) -> Option<Expr> {
        let paren = self.previous().clone();
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "Expected ')' after arguments")?;
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
            paren,
        })
    }

    /// `primary := literal | IDENT | "(" expression ")"
    ///           | "[" items? "]" | "{" pairs? "}"`
    fn parse_primary(&mut self) -> Option<Expr> {
        if self.match_kind(TokenKind::True) {
            return Some(literal(self.previous().clone(), LitKind::Bool, LitValue::Bool(true)));
        }
        if self.match_kind(TokenKind::False) {
            return Some(literal(
                self.previous().clone(),
                LitKind::Bool,
                LitValue::Bool(false),
            ));
        }
        if self.match_kind(TokenKind::Nil) {
            return Some(literal(self.previous().clone(), LitKind::Nil, LitValue::Nil));
        }
        if self.match_kind(TokenKind::Number) {
            let token = self.previous().clone();
            let value = match number_from_lexeme(&token.lexeme) {
                Some(n) => n,
                None => {
                    self.error(&token, "Invalid number literal");
                    return None;
                },
            };
            return Some(literal(token, LitKind::Number, LitValue::Number(value)));
        }
        if self.match_kind(TokenKind::String) {
            let token = self.previous().clone();
            let value = match decode_escapes(&token.lexeme) {
                Ok(s) => s,
                Err(err) => {
                    self.error(&token, &err.to_string());
                    return None;
                },
            };
            return Some(literal(token, LitKind::String, LitValue::Str(value)));
        }
        if self.match_kind(TokenKind::Identifier) {
            return Some(Expr::Variable {
                name: self.previous().clone(),
            });
        }
        if self.match_kind(TokenKind::LParen) {
            let inner = self.parse_expression()?;
            self.expect(TokenKind::RParen, "Expected ')' after expression")?;
            return Some(Expr::Grouping {
                inner: Box::new(inner),
            });
        }
        if self.match_kind(TokenKind::LBracket) {
            return self.parse_array_literal();
        }
        if self.match_kind(TokenKind::LBrace) {
            return self.parse_map_literal();
        }

        let at = self.current().clone();
        self.error(&at, "Expected expression");
        None
    }

    /// `"[" (expression ("," expression)*)? "]"`
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let bracket = self.previous().clone();
        let mut items = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                items.push(self.parse_expression()?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket, "Expected ']' after array items")?;
        Some(Expr::Array { items, bracket })
    }

    /// `"{" (key ":" expression ("," key ":" expression)*)? "}"`
    fn parse_map_literal(&mut self) -> Option<Expr> {
        let brace = self.previous().clone();
        let mut entries = Vec::new();
        if !self.check(TokenKind::RBrace) {
            loop {
                let key = self.parse_expression()?;
                self.expect(TokenKind::Colon, "Expected ':' after map key")?;
                let value = self.parse_expression()?;
                entries.push((key, value));
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBrace, "Expected '}' after map entries")?;
        Some(Expr::Map { entries, brace })
    }

    /// True when the current token can begin an expression. Used by
    /// `return` to decide whether a value follows.
    pub(crate) fn can_start_expression(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nil
                | TokenKind::Identifier
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Bang
                | TokenKind::Minus
        )
    }
}

fn binary(left: Expr, op: Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn literal(token: Token, kind: LitKind, value: LitValue) -> Expr {
    Expr::Literal { kind, value, token }
}

/// Converts a number lexeme to `f64`, translating Bengali digits.
///
/// The lexer guarantees the shape (digits, optional `.`, digits), so
/// failure here means a malformed token and returns `None`.
pub fn number_from_lexeme(lexeme: &str) -> Option<f64> {
    let mut ascii = String::with_capacity(lexeme.len());
    for c in lexeme.chars() {
        if c == '.' {
            ascii.push('.');
        } else {
            ascii.push((b'0' + digit_value(c)?) as char);
        }
    }
    ascii.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{parse_expr, parse_source};

    fn op_of(expr: &Expr) -> &str {
        match expr {
            Expr::Binary { op, .. } => &op.lexeme,
            Expr::Logical { op, .. } => &op.lexeme,
            other => panic!("expected operator node, got {other:?}"),
        }
    }

    #[test]
    fn test_term_vs_factor_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let expr = parse_expr("1 + 2 * 3");
        assert_eq!(op_of(&expr), "+");
        match expr {
            Expr::Binary { right, .. } => assert_eq!(op_of(&right), "*"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_left_associativity_of_minus() {
        // 1 - 2 - 3 parses as (1 - 2) - 3
        let expr = parse_expr("1 - 2 - 3");
        match expr {
            Expr::Binary { left, .. } => assert_eq!(op_of(&left), "-"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        // 2 ** 3 ** 2 parses as 2 ** (3 ** 2)
        let expr = parse_expr("2 ** 3 ** 2");
        assert_eq!(op_of(&expr), "**");
        match expr {
            Expr::Binary { left, right, .. } => {
                assert!(matches!(*left, Expr::Literal { .. }));
                assert_eq!(op_of(&right), "**");
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_power_binds_tighter_than_factor() {
        // 2 * 3 ** 2 parses as 2 * (3 ** 2)
        let expr = parse_expr("2 * 3 ** 2");
        assert_eq!(op_of(&expr), "*");
    }

    #[test]
    fn test_unary_binds_tighter_than_power() {
        // -2 ** 2 parses as (-2) ** 2: unary prefix binds tighter.
        let expr = parse_expr("-2 ** 2");
        assert_eq!(op_of(&expr), "**");
        match expr {
            Expr::Binary { left, .. } => assert!(matches!(*left, Expr::Unary { .. })),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse_expr("a or b and c");
        assert_eq!(op_of(&expr), "or");
    }

    #[test]
    fn test_comparison_tighter_than_equality() {
        let expr = parse_expr("1 < 2 == true");
        assert_eq!(op_of(&expr), "==");
    }

    #[test]
    fn test_bengali_number_value() {
        let expr = parse_expr("১২৩");
        match expr {
            Expr::Literal {
                value: LitValue::Number(n),
                ..
            } => assert_eq!(n, 123.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mixed_digit_fraction() {
        assert_eq!(number_from_lexeme("১2.৫"), Some(12.5));
        assert_eq!(number_from_lexeme("৩.১৪"), Some(3.14));
        assert_eq!(number_from_lexeme("x"), None);
    }

    #[test]
    fn test_string_escapes_expanded() {
        let expr = parse_expr(r#""a\nb""#);
        match expr {
            Expr::Literal {
                value: LitValue::Str(s),
                ..
            } => assert_eq!(s, "a\nb"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_escape_is_parse_error() {
        let (_, handler) = parse_source(r#"print "\q""#);
        assert!(handler.has_errors());
    }

    #[test]
    fn test_call_subscript_chain() {
        let expr = parse_expr("f(1)[2]");
        assert!(matches!(expr, Expr::Subscript { .. }));
    }

    #[test]
    fn test_modget_requires_variable() {
        let (_, handler) = parse_source("(a).b");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_modget_on_variable() {
        let expr = parse_expr("math.pow(2, 3)");
        match expr {
            Expr::Call { callee, args, .. } => {
                assert!(matches!(*callee, Expr::ModGet { .. }));
                assert_eq!(args.len(), 2);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_assignment_to_subscript() {
        let expr = parse_expr("a[0] = 9");
        assert!(matches!(expr, Expr::Assign { .. }));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, handler) = parse_source("1 + 2 = 3");
        assert!(handler.has_errors());
    }

    #[test]
    fn test_assignment_right_associative() {
        let expr = parse_expr("a = b = 1");
        match expr {
            Expr::Assign { value, .. } => assert!(matches!(*value, Expr::Assign { .. })),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_map_literal_pairs() {
        let expr = parse_expr(r#"{"k": 1, "j": 2}"#);
        match expr {
            Expr::Map { entries, .. } => assert_eq!(entries.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_array_and_map() {
        assert!(matches!(parse_expr("[]"), Expr::Array { items, .. } if items.is_empty()));
        assert!(matches!(parse_expr("{}"), Expr::Map { entries, .. } if entries.is_empty()));
    }
}
