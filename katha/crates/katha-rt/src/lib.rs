//! katha-rt - Tree-Walking Interpreter
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The interpreter executes the statement list produced by
//! `katha-par`, reading and writing variables through the
//! environment chains in `kgc` and allocating every string, array,
//! map, and function on the collected heap.
//!
//! EXECUTION RESULTS:
//! ------------------
//! Every statement produces a [`Flow`]:
//!
//! ```text
//! Normal(value)   ordinary completion
//! Break           unwinds to the nearest loop
//! Return(value)   unwinds to the nearest function call
//! ```
//!
//! Runtime errors are terminal: there is no catch. They carry the
//! source position of the token that raised them and surface through
//! the driver as `[Line n] [Col c] Runtime: message`.
//!
//! LANGUAGE RULES WORTH READING TWICE:
//! -----------------------------------
//! - Truthiness: only the bool `true` is truthy. Numbers (including
//!   zero), strings, nil, and every object are false.
//! - `and`/`or` short-circuit and evaluate to a bool, never to one
//!   of their operands.
//! - Assignment requires an existing binding somewhere up the chain;
//!   there is no shadowing-on-assignment.
//! - `len` and `string.index` count grapheme clusters, not bytes.

pub mod error;
pub mod eval;
pub mod interpreter;
pub mod modules;
pub mod natives;
pub mod printer;
pub mod stdlib;

pub use error::RuntimeError;
pub use interpreter::{Flow, Interpreter};
pub use printer::render_value;
