//! katha-util - Shared infrastructure for the Katha interpreter.
//!
//! This crate holds the pieces every other phase needs:
//!
//! - [`Span`]: source location tracking (byte offsets + line/column)
//! - [`diagnostic`]: error and warning reporting ([`Handler`],
//!   [`Diagnostic`], [`DiagnosticBuilder`]) with the user-facing
//!   rendering `[Line <n>] [Col <c>] <phase>: <message>`
//! - [`name`]: identifier names carrying a stable seeded 64-bit hash,
//!   used for environment and module-proxy lookup
//!
//! The crate deliberately has no knowledge of tokens, AST nodes, or
//! runtime values; those live in the downstream phase crates.

pub mod diagnostic;
pub mod name;
pub mod span;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level, Phase};
pub use name::{HashSeed, Name};
pub use span::Span;
