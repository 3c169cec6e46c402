//! The stack VM.
//!
//! A tight dispatch loop over the opcode stream with a fixed-size
//! value stack. The VM shares the value model and heap with the
//! tree-walking interpreter; it performs no collection safepoints of
//! its own, so every value it allocates stays live for the duration
//! of the run.

use std::io::Write;

use katha_util::Name;
use kgc::printer::render_value;
use kgc::{Heap, ObjKind, Value};
use log::trace;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::bytecode::Bytecode;
use crate::opcode::OpCode;

/// Fixed stack capacity.
pub const STACK_SIZE: usize = 2048;

/// A terminal VM error with the source position of the instruction
/// that raised it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct VmError {
    /// What went wrong.
    pub message: String,
    /// Line of the offending instruction (1-based).
    pub line: u32,
    /// Column of the offending instruction (1-based).
    pub column: u32,
}

/// The virtual machine.
pub struct Vm<'a> {
    heap: &'a mut Heap,
    out: &'a mut dyn Write,
    stack: Vec<Value>,
    globals: FxHashMap<Name, Value>,
}

impl<'a> Vm<'a> {
    /// Creates a VM over the shared heap and output stream.
    pub fn new(heap: &'a mut Heap, out: &'a mut dyn Write) -> Self {
        Self {
            heap,
            out,
            stack: Vec::with_capacity(STACK_SIZE),
            globals: FxHashMap::default(),
        }
    }

    /// Executes a bytecode object to completion.
    pub fn run(&mut self, code: &Bytecode) -> Result<(), VmError> {
        let mut ip = 0usize;

        while ip < code.code.len() {
            let Some(op) = OpCode::from_byte(code.code[ip]) else {
                return Err(self.error(code, ip, format!("bad opcode {}", code.code[ip])));
            };
            trace!("{ip:04} {} (stack {})", op.name(), self.stack.len());

            match op {
                OpCode::Const => {
                    let index = code.read_u16(ip) as usize;
                    let Some(value) = code.constants.get(index).copied() else {
                        return Err(self.error(code, ip, "constant index out of range"));
                    };
                    self.push(code, ip, value)?;
                },
                OpCode::Debug => {
                    let value = self.pop(code, ip)?;
                    let text = render_value(self.heap, value);
                    writeln!(self.out, "{}", text)
                        .map_err(|e| self.error(code, ip, format!("failed to write: {e}")))?;
                },
                OpCode::Return => break,
                OpCode::True => self.push(code, ip, Value::Bool(true))?,
                OpCode::False => self.push(code, ip, Value::Bool(false))?,
                OpCode::Nil => self.push(code, ip, Value::Nil)?,
                OpCode::Pop => {
                    self.pop(code, ip)?;
                },

                OpCode::Add => {
                    let r = self.pop(code, ip)?;
                    let l = self.pop(code, ip)?;
                    let result = match (l, r) {
                        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                        _ => match (self.heap.value_str(l), self.heap.value_str(r)) {
                            (Some(a), Some(b)) => {
                                let joined = format!("{}{}", a.value, b.value);
                                Value::Obj(self.heap.alloc_string(joined))
                            },
                            _ => {
                                return Err(self.error(
                                    code,
                                    ip,
                                    "Addition needs two numbers or two strings",
                                ))
                            },
                        },
                    };
                    self.push(code, ip, result)?;
                },
                OpCode::Sub => self.binary_number(code, ip, |a, b| a - b)?,
                OpCode::Mul => self.binary_number(code, ip, |a, b| a * b)?,
                OpCode::Div => {
                    let r = self.pop(code, ip)?;
                    let l = self.pop(code, ip)?;
                    match (l, r) {
                        (Value::Number(_), Value::Number(b)) if b == 0.0 => {
                            return Err(self.error(code, ip, "Division by zero"))
                        },
                        (Value::Number(a), Value::Number(b)) => {
                            self.push(code, ip, Value::Number(a / b))?
                        },
                        _ => {
                            return Err(self.error(
                                code,
                                ip,
                                "Division can only be done with numbers",
                            ))
                        },
                    }
                },
                OpCode::Exponent => self.binary_number(code, ip, f64::powf)?,

                OpCode::Equal => {
                    let r = self.pop(code, ip)?;
                    let l = self.pop(code, ip)?;
                    let eq = self.heap.values_equal(l, r);
                    self.push(code, ip, Value::Bool(eq))?;
                },
                OpCode::NotEqual => {
                    let r = self.pop(code, ip)?;
                    let l = self.pop(code, ip)?;
                    let eq = self.heap.values_equal(l, r);
                    self.push(code, ip, Value::Bool(!eq))?;
                },
                OpCode::Gt => self.binary_compare(code, ip, |a, b| a > b)?,
                OpCode::Gte => self.binary_compare(code, ip, |a, b| a >= b)?,
                OpCode::Lt => self.binary_compare(code, ip, |a, b| a < b)?,
                OpCode::Lte => self.binary_compare(code, ip, |a, b| a <= b)?,

                OpCode::Negate => {
                    let value = self.pop(code, ip)?;
                    match value {
                        Value::Number(n) => self.push(code, ip, Value::Number(-n))?,
                        _ => return Err(self.error(code, ip, "Negation needs a number")),
                    }
                },
                OpCode::Not => {
                    let value = self.pop(code, ip)?;
                    self.push(code, ip, Value::Bool(!value.is_truthy()))?;
                },

                OpCode::Array => {
                    let count = code.read_u16(ip) as usize;
                    let mut items = Vec::with_capacity(count);
                    for _ in 0..count {
                        items.push(self.pop(code, ip)?);
                    }
                    items.reverse();
                    let arr = self.heap.alloc(ObjKind::Array(items));
                    self.push(code, ip, Value::Obj(arr))?;
                },
                OpCode::Map => {
                    let pairs = code.read_u16(ip) as usize;
                    let mut flat = Vec::with_capacity(pairs * 2);
                    for _ in 0..pairs * 2 {
                        flat.push(self.pop(code, ip)?);
                    }
                    flat.reverse();
                    let map = self.heap.alloc(ObjKind::Map(Default::default()));
                    for pair in flat.chunks_exact(2) {
                        if self.heap.map_insert(map, pair[0], pair[1]).is_none() {
                            return Err(self.error(code, ip, "Invalid key for map"));
                        }
                    }
                    self.push(code, ip, Value::Obj(map))?;
                },

                OpCode::DefineGlobal => {
                    let name = self.constant_name(code, ip)?;
                    let value = self.pop(code, ip)?;
                    self.globals.insert(name, value);
                },
                OpCode::GetGlobal => {
                    let name = self.constant_name(code, ip)?;
                    let Some(value) = self.globals.get(&name).copied() else {
                        return Err(self.error(
                            code,
                            ip,
                            format!("Undefined variable '{}'", name),
                        ));
                    };
                    self.push(code, ip, value)?;
                },
                OpCode::SetGlobal => {
                    let name = self.constant_name(code, ip)?;
                    let value = self.peek(code, ip)?;
                    if !self.globals.contains_key(&name) {
                        return Err(self.error(
                            code,
                            ip,
                            format!("Undefined assignment target '{}'", name),
                        ));
                    }
                    self.globals.insert(name, value);
                },

                OpCode::GetLocal => {
                    let slot = code.read_u16(ip) as usize;
                    let Some(value) = self.stack.get(slot).copied() else {
                        return Err(self.error(code, ip, "local slot out of range"));
                    };
                    self.push(code, ip, value)?;
                },
                OpCode::SetLocal => {
                    let slot = code.read_u16(ip) as usize;
                    let value = self.peek(code, ip)?;
                    if slot >= self.stack.len() {
                        return Err(self.error(code, ip, "local slot out of range"));
                    }
                    self.stack[slot] = value;
                },

                OpCode::JumpIfFalse => {
                    let target = code.read_u16(ip) as usize;
                    let value = self.pop(code, ip)?;
                    if !value.is_truthy() {
                        ip = target;
                        continue;
                    }
                },
                OpCode::Jump => {
                    ip = code.read_u16(ip) as usize;
                    continue;
                },
            }

            ip += 1 + op.operand_width();
        }

        Ok(())
    }

    // =========================================================================
    // STACK PRIMITIVES
    // =========================================================================

    fn push(&mut self, code: &Bytecode, ip: usize, value: Value) -> Result<(), VmError> {
        if self.stack.len() >= STACK_SIZE {
            return Err(self.error(code, ip, "stack overflow"));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, code: &Bytecode, ip: usize) -> Result<Value, VmError> {
        self.stack
            .pop()
            .ok_or_else(|| self.error_raw(code, ip, "stack underflow".to_string()))
    }

    fn peek(&self, code: &Bytecode, ip: usize) -> Result<Value, VmError> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| self.error_raw(code, ip, "stack underflow".to_string()))
    }

    fn binary_number(
        &mut self,
        code: &Bytecode,
        ip: usize,
        apply: fn(f64, f64) -> f64,
    ) -> Result<(), VmError> {
        let r = self.pop(code, ip)?;
        let l = self.pop(code, ip)?;
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => self.push(code, ip, Value::Number(apply(a, b))),
            _ => Err(self.error(code, ip, "Arithmetic needs two numbers")),
        }
    }

    fn binary_compare(
        &mut self,
        code: &Bytecode,
        ip: usize,
        apply: fn(f64, f64) -> bool,
    ) -> Result<(), VmError> {
        let r = self.pop(code, ip)?;
        let l = self.pop(code, ip)?;
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => self.push(code, ip, Value::Bool(apply(a, b))),
            _ => Err(self.error(code, ip, "Comparison can only be done with numbers")),
        }
    }

    /// Reads the operand of the current instruction as a name
    /// constant.
    fn constant_name(&self, code: &Bytecode, ip: usize) -> Result<Name, VmError> {
        let index = code.read_u16(ip) as usize;
        let Some(value) = code.constants.get(index) else {
            return Err(self.error_raw(code, ip, "constant index out of range".to_string()));
        };
        match self.heap.value_str(*value) {
            Some(s) => Ok(Name::from_raw(s.value.clone(), s.hash)),
            None => Err(self.error_raw(code, ip, "name constant is not a string".to_string())),
        }
    }

    fn error(&self, code: &Bytecode, ip: usize, message: impl Into<String>) -> VmError {
        self.error_raw(code, ip, message.into())
    }

    fn error_raw(&self, code: &Bytecode, ip: usize, message: String) -> VmError {
        let (line, column) = code
            .token_at(ip)
            .map(|token| (token.line, token.column))
            .unwrap_or((0, 0));
        VmError {
            message,
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use katha_lex::Lexer;
    use katha_par::Parser;
    use katha_util::{Handler, HashSeed};
    use kgc::GcConfig;

    /// Compiles and runs a snippet, capturing DEBUG output.
    fn run(source: &str) -> Result<String, VmError> {
        let seed = HashSeed::from_parts(41, 43);
        let mut handler = Handler::new();
        let tokens = Lexer::new(source, &mut handler, &seed).scan();
        let program = Parser::new(tokens, &mut handler).parse();
        assert!(!handler.has_errors());

        let mut heap = Heap::new(GcConfig::default(), seed);
        let code = Compiler::new(&mut heap)
            .compile(&program)
            .expect("snippet should compile");

        let mut out = Vec::new();
        let mut vm = Vm::new(&mut heap, &mut out);
        vm.run(&code)?;
        drop(vm);
        Ok(String::from_utf8(out).expect("output is UTF-8"))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("print 1 + 2 * 3").unwrap(), "7\n");
        assert_eq!(run("print 2 ** 3 ** 2").unwrap(), "512\n");
        assert_eq!(run("print -(3 - 5)").unwrap(), "2\n");
    }

    #[test]
    fn test_string_concat() {
        assert_eq!(run("print \"ab\" + \"cd\"").unwrap(), "abcd\n");
    }

    #[test]
    fn test_globals() {
        assert_eq!(run("let x = 4 x = x + 1 print x").unwrap(), "5\n");
    }

    #[test]
    fn test_while_loop() {
        let source = "let i = 0 while i < 3 do print i i = i + 1 end";
        assert_eq!(run(source).unwrap(), "0\n1\n2\n");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            run("if true then print 1 else print 2 end").unwrap(),
            "1\n"
        );
        // Numbers are falsy.
        assert_eq!(run("if 1 then print 1 else print 2 end").unwrap(), "2\n");
    }

    #[test]
    fn test_locals_shadow_globals() {
        let source = "\
let x = 1
if true then
    let x = 2
    print x
end
print x";
        assert_eq!(run(source).unwrap(), "2\n1\n");
    }

    #[test]
    fn test_array_and_map_literals() {
        assert_eq!(run("print [1, 2, 3]").unwrap(), "[1, 2, 3]\n");
        assert_eq!(run("print {\"a\": 1}").unwrap(), "{a : 1}\n");
    }

    #[test]
    fn test_division_by_zero() {
        let err = run("print 1 / 0").unwrap_err();
        assert_eq!(err.message, "Division by zero");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_undefined_global() {
        let err = run("print ghost").unwrap_err();
        assert!(err.message.contains("Undefined variable 'ghost'"));
    }

    #[test]
    fn test_equality_matches_interpreter_rules() {
        assert_eq!(run("print 1 == 1").unwrap(), "সত্যি\n");
        assert_eq!(run("print 1 == \"1\"").unwrap(), "মিথ্যা\n");
        assert_eq!(run("print \"x\" == \"x\"").unwrap(), "সত্যি\n");
    }
}
