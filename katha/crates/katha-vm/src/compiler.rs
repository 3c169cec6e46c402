//! AST-to-bytecode compiler.
//!
//! Compiles the supported statement/expression subset; anything the
//! opcode set cannot express is reported as
//! [`CompileError::Unsupported`] so the driver can fall back to the
//! tree-walking interpreter.

use katha_lex::{Token, TokenKind};
use katha_par::{Expr, LitValue, Stmt};
use katha_util::Name;
use kgc::{Heap, Value};
use thiserror::Error;

use crate::bytecode::Bytecode;
use crate::opcode::OpCode;

/// Ways compilation can fail.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("{what} is not supported by the bytecode back end")]
    Unsupported {
        what: &'static str,
        line: u32,
        column: u32,
    },

    #[error("too many constants in one bytecode unit")]
    TooManyConstants { line: u32, column: u32 },

    #[error("compiled code exceeds the addressable jump range")]
    CodeTooLarge { line: u32, column: u32 },
}

impl CompileError {
    fn unsupported(what: &'static str, token: &Token) -> Self {
        CompileError::Unsupported {
            what,
            line: token.line,
            column: token.column,
        }
    }

    /// Line of the failing construct (1-based).
    pub fn line(&self) -> u32 {
        match self {
            CompileError::Unsupported { line, .. }
            | CompileError::TooManyConstants { line, .. }
            | CompileError::CodeTooLarge { line, .. } => *line,
        }
    }

    /// Column of the failing construct (1-based).
    pub fn column(&self) -> u32 {
        match self {
            CompileError::Unsupported { column, .. }
            | CompileError::TooManyConstants { column, .. }
            | CompileError::CodeTooLarge { column, .. } => *column,
        }
    }
}

/// One block-scoped local: its name and declaration depth.
struct Local {
    name: Name,
    depth: usize,
}

/// The bytecode compiler.
pub struct Compiler<'h> {
    heap: &'h mut Heap,
    code: Bytecode,
    locals: Vec<Local>,
    scope_depth: usize,
}

impl<'h> Compiler<'h> {
    /// Creates a compiler allocating constants on `heap`.
    pub fn new(heap: &'h mut Heap) -> Self {
        Self {
            heap,
            code: Bytecode::new(),
            locals: Vec::new(),
            scope_depth: 0,
        }
    }

    /// Compiles a program into bytecode.
    pub fn compile(mut self, program: &[Stmt]) -> Result<Bytecode, CompileError> {
        for stmt in program {
            self.compile_stmt(stmt)?;
        }
        let end = Token::new(TokenKind::Eof, "", 0, 0);
        self.code.emit(&end, OpCode::Return);
        Ok(self.code)
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Expr { expr } => {
                self.compile_expr(expr)?;
                self.code.emit(expr.token(), OpCode::Pop);
                Ok(())
            },

            Stmt::Print { expr, token } => {
                self.compile_expr(expr)?;
                self.code.emit(token, OpCode::Debug);
                Ok(())
            },

            Stmt::Let { name, init } => {
                self.compile_expr(init)?;
                if self.scope_depth == 0 {
                    let index = self.name_constant(name)?;
                    self.code.emit_u16(name, OpCode::DefineGlobal, index);
                } else {
                    // The initializer value stays on the stack; its
                    // slot is the local.
                    self.locals.push(Local {
                        name: name_of(name),
                        depth: self.scope_depth,
                    });
                }
                Ok(())
            },

            Stmt::Block { stmts } => {
                self.begin_scope();
                for stmt in stmts {
                    self.compile_stmt(stmt)?;
                }
                self.end_scope();
                Ok(())
            },

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                token,
            } => {
                self.compile_expr(cond)?;
                let skip_then = self.code.emit_u16(token, OpCode::JumpIfFalse, 0xFFFF);
                self.compile_stmt(then_branch)?;
                let skip_else = self.code.emit_u16(token, OpCode::Jump, 0xFFFF);
                self.patch_to_here(skip_then, token)?;
                if let Some(else_branch) = else_branch {
                    self.compile_stmt(else_branch)?;
                }
                self.patch_to_here(skip_else, token)?;
                Ok(())
            },

            Stmt::While { cond, body, token } => {
                let loop_start = self.here(token)?;
                self.compile_expr(cond)?;
                let exit = self.code.emit_u16(token, OpCode::JumpIfFalse, 0xFFFF);
                self.compile_stmt(body)?;
                self.code.emit_u16(token, OpCode::Jump, loop_start);
                self.patch_to_here(exit, token)?;
                Ok(())
            },

            Stmt::Return { token, .. } => Err(CompileError::unsupported("return", token)),
            Stmt::Break { token } => Err(CompileError::unsupported("break", token)),
            Stmt::Func { token, .. } => {
                Err(CompileError::unsupported("function declaration", token))
            },
            Stmt::Import { token, .. } => Err(CompileError::unsupported("import", token)),
            Stmt::Panic { token, .. } => Err(CompileError::unsupported("panic", token)),
        }
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Literal { value, token, .. } => match value {
                LitValue::Number(n) => {
                    let index = self.constant(Value::Number(*n), token)?;
                    self.code.emit_u16(token, OpCode::Const, index);
                    Ok(())
                },
                LitValue::Str(s) => {
                    let obj = self.heap.alloc_string(s.as_str());
                    let index = self.constant(Value::Obj(obj), token)?;
                    self.code.emit_u16(token, OpCode::Const, index);
                    Ok(())
                },
                LitValue::Bool(true) => {
                    self.code.emit(token, OpCode::True);
                    Ok(())
                },
                LitValue::Bool(false) => {
                    self.code.emit(token, OpCode::False);
                    Ok(())
                },
                LitValue::Nil => {
                    self.code.emit(token, OpCode::Nil);
                    Ok(())
                },
            },

            Expr::Grouping { inner } => self.compile_expr(inner),

            Expr::Unary { op, right } => {
                self.compile_expr(right)?;
                match op.kind {
                    TokenKind::Minus => self.code.emit(op, OpCode::Negate),
                    TokenKind::Bang => self.code.emit(op, OpCode::Not),
                    _ => return Err(CompileError::unsupported("unary operator", op)),
                };
                Ok(())
            },

            Expr::Binary { left, op, right } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                let opcode = match op.kind {
                    TokenKind::Plus => OpCode::Add,
                    TokenKind::Minus => OpCode::Sub,
                    TokenKind::Star => OpCode::Mul,
                    TokenKind::Slash => OpCode::Div,
                    TokenKind::StarStar => OpCode::Exponent,
                    TokenKind::EqEq => OpCode::Equal,
                    TokenKind::BangEq => OpCode::NotEqual,
                    TokenKind::Gt => OpCode::Gt,
                    TokenKind::GtEq => OpCode::Gte,
                    TokenKind::Lt => OpCode::Lt,
                    TokenKind::LtEq => OpCode::Lte,
                    _ => return Err(CompileError::unsupported("operator", op)),
                };
                self.code.emit(op, opcode);
                Ok(())
            },

            Expr::Variable { name } => {
                if let Some(slot) = self.resolve_local(name) {
                    self.code.emit_u16(name, OpCode::GetLocal, slot);
                } else {
                    let index = self.name_constant(name)?;
                    self.code.emit_u16(name, OpCode::GetGlobal, index);
                }
                Ok(())
            },

            Expr::Assign { target, value, op } => match &**target {
                Expr::Variable { name } => {
                    self.compile_expr(value)?;
                    if let Some(slot) = self.resolve_local(name) {
                        self.code.emit_u16(name, OpCode::SetLocal, slot);
                    } else {
                        let index = self.name_constant(name)?;
                        self.code.emit_u16(name, OpCode::SetGlobal, index);
                    }
                    Ok(())
                },
                _ => Err(CompileError::unsupported("subscript assignment", op)),
            },

            Expr::Array { items, bracket } => {
                for item in items {
                    self.compile_expr(item)?;
                }
                self.code
                    .emit_u16(bracket, OpCode::Array, items.len() as u16);
                Ok(())
            },

            Expr::Map { entries, brace } => {
                for (key, value) in entries {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.code.emit_u16(brace, OpCode::Map, entries.len() as u16);
                Ok(())
            },

            Expr::Logical { op, .. } => Err(CompileError::unsupported("logical operator", op)),
            Expr::Call { paren, .. } => Err(CompileError::unsupported("function call", paren)),
            Expr::Subscript { bracket, .. } => {
                Err(CompileError::unsupported("subscript", bracket))
            },
            Expr::ModGet { dot, .. } => Err(CompileError::unsupported("module access", dot)),
        }
    }

    // =========================================================================
    // SCOPES AND NAMES
    // =========================================================================

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        let end = Token::new(TokenKind::Eof, "", 0, 0);
        while matches!(self.locals.last(), Some(local) if local.depth > self.scope_depth) {
            self.locals.pop();
            self.code.emit(&end, OpCode::Pop);
        }
    }

    /// Stack slot of a local, innermost declaration first.
    fn resolve_local(&self, name: &Token) -> Option<u16> {
        let target = name_of(name);
        self.locals
            .iter()
            .rposition(|local| local.name == target)
            .map(|slot| slot as u16)
    }

    fn constant(&mut self, value: Value, token: &Token) -> Result<u16, CompileError> {
        self.code
            .add_constant(self.heap, value)
            .ok_or(CompileError::TooManyConstants {
                line: token.line,
                column: token.column,
            })
    }

    /// Pool index of an identifier's name string.
    fn name_constant(&mut self, name: &Token) -> Result<u16, CompileError> {
        let obj = self.heap.alloc_string(name.lexeme.as_str());
        self.constant(Value::Obj(obj), name)
    }

    /// The current code offset as a jump target.
    fn here(&self, token: &Token) -> Result<u16, CompileError> {
        u16::try_from(self.code.code.len()).map_err(|_| CompileError::CodeTooLarge {
            line: token.line,
            column: token.column,
        })
    }

    /// Patches the jump at `offset` to land at the current end of
    /// code.
    fn patch_to_here(&mut self, offset: usize, token: &Token) -> Result<(), CompileError> {
        let target = self.here(token)?;
        self.code.patch_u16(offset, target);
        Ok(())
    }
}

fn name_of(token: &Token) -> Name {
    Name::from_raw(token.lexeme.as_str(), token.hash)
}
