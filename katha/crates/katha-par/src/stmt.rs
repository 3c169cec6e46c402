//! Statement parsing.
//!
//! Statements are introduced by a keyword, or default to an
//! expression statement. Bodies of `if`/`while`/`func` run until the
//! matching `end` (or `else`) and become block nodes.

use std::rc::Rc;

use katha_lex::{Token, TokenKind};

use crate::ast::{Expr, LitKind, LitValue, Stmt};
use crate::Parser;

impl<'a> Parser<'a> {
    /// Parses one statement. Returns `None` after reporting an error;
    /// the caller synchronizes.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        if self.match_kind(TokenKind::Let) {
            return self.parse_let();
        }
        if self.match_kind(TokenKind::Func) {
            return self.parse_func();
        }
        if self.match_kind(TokenKind::If) {
            return self.parse_if();
        }
        if self.match_kind(TokenKind::While) {
            return self.parse_while();
        }
        if self.match_kind(TokenKind::Return) {
            return self.parse_return();
        }
        if self.match_kind(TokenKind::Break) {
            let token = self.previous().clone();
            return Some(Stmt::Break { token });
        }
        if self.match_kind(TokenKind::Import) {
            return self.parse_import();
        }
        if self.match_kind(TokenKind::Print) {
            let token = self.previous().clone();
            let expr = self.parse_expression()?;
            return Some(Stmt::Print { expr, token });
        }
        if self.match_kind(TokenKind::Panic) {
            let token = self.previous().clone();
            let expr = self.parse_expression()?;
            return Some(Stmt::Panic { expr, token });
        }
        let expr = self.parse_expression()?;
        // Optional terminating semicolon.
        self.match_kind(TokenKind::Semicolon);
        Some(Stmt::Expr { expr })
    }

    /// `let IDENT ("=" expression)?`
    fn parse_let(&mut self) -> Option<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expected identifier after 'let'")?;
        let init = if self.match_kind(TokenKind::Eq) {
            self.parse_expression()?
        } else {
            nil_literal(&name)
        };
        self.match_kind(TokenKind::Semicolon);
        Some(Stmt::Let { name, init })
    }

    /// `func IDENT "(" params? ")" block "end"`
    fn parse_func(&mut self) -> Option<Stmt> {
        let token = self.previous().clone();
        let name = self.expect(TokenKind::Identifier, "Expected function name")?;
        self.expect(TokenKind::LParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param = self.expect(TokenKind::Identifier, "Expected parameter name")?;
                params.push(param);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "Expected ')' after parameters")?;

        let body = self.parse_block_until(&[TokenKind::End])?;
        self.expect(TokenKind::End, "Expected 'end' after function body")?;

        Some(Stmt::Func {
            name,
            params: params.into(),
            body: Rc::new(body),
            token,
        })
    }

    /// `if expression "then" block ("else" block)? "end"`
    fn parse_if(&mut self) -> Option<Stmt> {
        let token = self.previous().clone();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Then, "Expected 'then' after condition")?;

        let then_branch = self.parse_block_until(&[TokenKind::Else, TokenKind::End])?;
        let else_branch = if self.match_kind(TokenKind::Else) {
            Some(Box::new(self.parse_block_until(&[TokenKind::End])?))
        } else {
            None
        };
        self.expect(TokenKind::End, "Expected 'end' to close 'if'")?;

        Some(Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch,
            token,
        })
    }

    /// `while expression "do" block "end"`
    fn parse_while(&mut self) -> Option<Stmt> {
        let token = self.previous().clone();
        let cond = self.parse_expression()?;
        self.expect(TokenKind::Do, "Expected 'do' after loop condition")?;

        let body = self.parse_block_until(&[TokenKind::End])?;
        self.expect(TokenKind::End, "Expected 'end' to close 'while'")?;

        Some(Stmt::While {
            cond,
            body: Box::new(body),
            token,
        })
    }

    /// `return expression?`
    fn parse_return(&mut self) -> Option<Stmt> {
        let token = self.previous().clone();
        let value = if self.can_start_expression() {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.match_kind(TokenKind::Semicolon);
        Some(Stmt::Return { value, token })
    }

    /// `import IDENT "=" expression`
    fn parse_import(&mut self) -> Option<Stmt> {
        let token = self.previous().clone();
        let name = self.expect(TokenKind::Identifier, "Expected module alias after 'import'")?;
        self.expect(TokenKind::Eq, "Expected '=' after module alias")?;
        let path = self.parse_expression()?;
        Some(Stmt::Import { name, path, token })
    }

    /// Parses statements until one of `terminators` (or end of
    /// input) is at the cursor, without consuming the terminator.
    fn parse_block_until(&mut self, terminators: &[TokenKind]) -> Option<Stmt> {
        let mut stmts = Vec::new();
        while !self.is_at_end() && !terminators.contains(&self.current().kind) {
            // Stray semicolons separate statements and carry nothing.
            if self.match_kind(TokenKind::Semicolon) {
                continue;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => {
                    self.synchronize();
                    // A malformed statement inside a block poisons the
                    // block; the caller still gets to see 'end'.
                    return None;
                },
            }
        }
        Some(Stmt::Block { stmts })
    }
}

/// Synthesizes the nil literal used for `let x` without an
/// initializer.
fn nil_literal(at: &Token) -> Expr {
    Expr::Literal {
        kind: LitKind::Nil,
        value: LitValue::Nil,
        token: at.clone(),
    }
}
