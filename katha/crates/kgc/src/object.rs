//! Heap object payloads.
//!
//! Every collectable object is an [`Obj`]: a mark bit plus a tagged
//! payload. Strings cache their seeded 64-bit hash at allocation so
//! map lookups never re-hash contents. Maps use an insertion-ordered
//! table keyed by [`MapKey`], the normalized form of the hashable
//! value kinds (numbers, bools, nil, strings).

use std::rc::Rc;

use indexmap::IndexMap;
use katha_par::Stmt;
use katha_util::Name;

use crate::env::EnvRef;
use crate::value::Value;
use crate::Heap;

/// Handle to a heap object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    /// Builds a handle from a raw slot index.
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// The raw slot index.
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }

    /// Builds a handle from a raw index. Only tests should need this.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// A user-defined function: parameters, shared body block, and the
/// environment captured at declaration.
#[derive(Clone, Debug)]
pub struct Function {
    /// Function name, for display and recursion.
    pub name: Name,
    /// Parameter names in declaration order.
    pub params: Rc<[Name]>,
    /// The body block, shared with the AST.
    pub body: Rc<Stmt>,
    /// The closure environment. Must stay reachable as long as the
    /// function is.
    pub env: EnvRef,
}

/// Host context handed to native functions: the heap for allocation
/// plus the interpreter's output stream (for `show`).
pub struct NativeCtx<'a> {
    pub heap: &'a mut Heap,
    pub out: &'a mut dyn std::io::Write,
}

/// Signature of a native (host-implemented) function.
///
/// Natives return either a value or an error message; the
/// interpreter turns the message into a runtime error at the call
/// site.
pub type NativeFn = fn(&mut NativeCtx<'_>, &[Value]) -> Result<Value, String>;

/// A native function entry.
#[derive(Clone, Copy, Debug)]
pub struct NativeDef {
    /// Display name.
    pub name: &'static str,
    /// Required argument count; negative means variadic.
    pub arity: i32,
    /// Implementation.
    pub func: NativeFn,
}

/// An interned string payload with its cached seeded hash.
#[derive(Clone, Debug)]
pub struct KString {
    /// UTF-8 contents.
    pub value: Rc<str>,
    /// Seeded 64-bit hash of the contents, fixed at allocation.
    pub hash: u64,
}

/// The normalized key of a map entry. Restricted to the hashable
/// value kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MapKey {
    /// Number key, by bit pattern with -0.0 folded into 0.0.
    Number(u64),
    /// Bool key.
    Bool(bool),
    /// Nil key.
    Nil,
    /// String key: spelling plus cached hash (hash feeds the table,
    /// the spelling decides equality).
    Str(Name),
}

/// One map entry: the original key value (for `keys()`) and the
/// stored value.
#[derive(Clone, Copy, Debug)]
pub struct MapSlot {
    pub key: Value,
    pub value: Value,
}

/// The payload of a heap object.
#[derive(Clone, Debug)]
pub enum ObjKind {
    /// Immutable string.
    Str(KString),
    /// Growable array of values.
    Array(Vec<Value>),
    /// Insertion-ordered hash map.
    Map(IndexMap<MapKey, MapSlot>),
    /// User-defined function.
    Function(Function),
    /// Native function.
    Native(NativeDef),
    /// Shared mutable cell for captured variables.
    Upvalue(Value),
    /// In-band error value returned by natives.
    Error(String),
}

impl ObjKind {
    /// Human-readable kind name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ObjKind::Str(_) => "String",
            ObjKind::Array(_) => "Array",
            ObjKind::Map(_) => "Map",
            ObjKind::Function(_) => "Function",
            ObjKind::Native(_) => "Native Func",
            ObjKind::Upvalue(_) => "Upvalue",
            ObjKind::Error(_) => "Error",
        }
    }

    /// Approximate payload footprint, used for the collection
    /// threshold. Deliberately shallow: children are counted by
    /// their own slots.
    pub(crate) fn shallow_size(&self) -> usize {
        let base = std::mem::size_of::<Obj>();
        base + match self {
            ObjKind::Str(s) => s.value.len(),
            ObjKind::Array(items) => items.capacity() * std::mem::size_of::<Value>(),
            ObjKind::Map(map) => map.capacity() * std::mem::size_of::<(MapKey, MapSlot)>(),
            ObjKind::Function(_) | ObjKind::Native(_) | ObjKind::Upvalue(_) => 0,
            ObjKind::Error(msg) => msg.len(),
        }
    }
}

/// A heap object: mark bit plus payload.
#[derive(Clone, Debug)]
pub struct Obj {
    /// Set during the mark phase, cleared by sweep.
    pub(crate) marked: bool,
    /// The payload.
    pub kind: ObjKind,
}

impl Obj {
    pub(crate) fn new(kind: ObjKind) -> Self {
        Self {
            marked: false,
            kind,
        }
    }
}
