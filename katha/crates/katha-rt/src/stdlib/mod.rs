//! The standard library.
//!
//! A standard-library module is a named collection of native
//! entries. Importing one creates a fresh environment, binds every
//! entry under each of its alias spellings, and registers the
//! environment as a GC root.

mod array;
mod map;
mod math;
mod os;
mod string;

use katha_util::Name;
use kgc::{EnvRef, Heap, NativeDef, NativeFn, ObjKind, Value};

use crate::modules::StdlibModule;

/// One standard-library entry: alias spellings, arity,
/// implementation.
pub struct StdEntry {
    /// Names this entry is bound under (English first).
    pub names: &'static [&'static str],
    /// Required argument count; negative means variadic.
    pub arity: i32,
    /// Implementation.
    pub func: NativeFn,
}

/// Populates `env` with the entries of `module`.
pub fn populate_module(heap: &mut Heap, env: EnvRef, module: StdlibModule) {
    let entries: &[StdEntry] = match module {
        StdlibModule::Math => math::ENTRIES,
        StdlibModule::Os => os::ENTRIES,
        StdlibModule::Map => map::ENTRIES,
        StdlibModule::Array => array::ENTRIES,
        StdlibModule::Str => string::ENTRIES,
    };

    let seed = *heap.seed();
    for entry in entries {
        let obj = heap.alloc(ObjKind::Native(NativeDef {
            name: entry.names[0],
            arity: entry.arity,
            func: entry.func,
        }));
        for alias in entry.names {
            let name = Name::new(*alias, &seed);
            heap.env_put(env, &name, Value::Obj(obj));
        }
    }
}
