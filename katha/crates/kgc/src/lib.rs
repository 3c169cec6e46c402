//! kgc - Katha Garbage-Collected Heap
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! This crate owns the runtime data model and its memory:
//!
//! - [`Value`]: the four-way tagged value (number, bool, nil, object)
//! - [`ObjKind`]: heap object payloads (string, array, map, function,
//!   native function, upvalue, error)
//! - environment frames: parent-linked scopes mapping identifier
//!   names to values, with transparent upvalue indirection
//! - [`Heap`]: a slotted arena for objects and environment frames,
//!   collected with a stop-the-world mark-and-sweep
//!
//! MEMORY MODEL:
//! -------------
//! ```text
//!            ┌────────────────────────────────────────┐
//!   roots ──▶│ EnvFrame ──▶ Value ──▶ Obj ──▶ Value … │
//!            │    │                    │              │
//!            │    └── parent EnvFrame  └── EnvFrame   │
//!            └────────────────────────────────────────┘
//!                    (slotted arenas inside Heap)
//! ```
//!
//! Objects and frames are addressed by plain index handles
//! ([`ObjRef`], [`EnvRef`]); nothing in the graph is reference
//! counted, so function/environment cycles are collected naturally
//! by the tracer.
//!
//! SAFEPOINTS:
//! -----------
//! Collection only runs at a safepoint, which the interpreter places
//! between top-level statements. At that moment every live value is
//! reachable from a registered root environment, so the collector
//! needs no shadow stack for evaluator temporaries. Allocation
//! tracks an approximate byte count against a threshold; crossing it
//! makes the next safepoint collect. Stress mode collects at every
//! safepoint.

pub mod config;
pub mod env;
pub mod heap;
pub mod object;
pub mod printer;
pub mod stats;
pub mod value;

pub use config::GcConfig;
pub use env::EnvRef;
pub use heap::Heap;
pub use object::{Function, MapKey, MapSlot, NativeCtx, NativeDef, NativeFn, Obj, ObjKind, ObjRef};
pub use stats::GcStats;
pub use value::Value;
