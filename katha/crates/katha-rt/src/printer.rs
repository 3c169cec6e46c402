//! Value rendering lives next to the value model in `kgc`, shared
//! with the VM back end; re-exported here for the interpreter's
//! callers.

pub use kgc::printer::render_value;
