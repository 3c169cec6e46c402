//! katha-vm - Bytecode Compiler and Stack VM
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! A secondary execution path: the compiler lowers a subset of the
//! AST to a linear byte stream, and the VM executes it on a
//! fixed-size value stack.
//!
//! ```text
//! AST ──▶ [Compiler] ──▶ Bytecode ──▶ [Vm] ──▶ effects
//!                          │
//!                          ├── code: Vec<u8> (big-endian u16 operands)
//!                          ├── constants (deduplicated, max 65535)
//!                          └── per-instruction source tokens
//! ```
//!
//! SUPPORTED SUBSET:
//! -----------------
//! Literals, unary and binary operators, grouping, array and map
//! literals, global and local variables, `if`/`while` via jump
//! patching, and `print`. Functions, calls, subscripts, imports, and
//! `break` are not in the opcode set; compiling them reports
//! [`CompileError::Unsupported`] and the driver falls back to the
//! tree-walking interpreter, which remains the reference back end.

pub mod bytecode;
pub mod compiler;
pub mod opcode;
pub mod vm;

pub use bytecode::Bytecode;
pub use compiler::{CompileError, Compiler};
pub use opcode::OpCode;
pub use vm::{Vm, VmError};
