//! Environment frames.
//!
//! An environment is a parent-linked chain of frames, each mapping
//! identifier [`Name`]s to values. Frames live in the heap's frame
//! arena and are traced like objects, so a closure keeps its
//! defining chain alive for exactly as long as the closure itself.
//!
//! UPVALUES:
//! ---------
//! When a function is declared, every binding in the declaring frame
//! is promoted to an upvalue: the stored value moves into a shared
//! cell object and the frame entry becomes a handle to that cell.
//! Reads dereference the cell transparently; writes (from the
//! enclosing scope or from any closure) converge on the same slot,
//! which is what makes mutation of captured variables visible
//! everywhere.

use rustc_hash::FxHashMap;

use katha_util::Name;

use crate::object::{ObjKind, ObjRef};
use crate::value::Value;
use crate::Heap;

/// Handle to an environment frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EnvRef(u32);

impl EnvRef {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One scope frame.
#[derive(Debug, Default)]
pub(crate) struct EnvFrame {
    /// Set during the mark phase, cleared by sweep.
    pub(crate) marked: bool,
    /// Bindings of this frame.
    pub(crate) table: FxHashMap<Name, Value>,
    /// Enclosing frame, `None` for a root.
    pub(crate) parent: Option<EnvRef>,
}

impl EnvFrame {
    /// Approximate footprint for the collection threshold.
    pub(crate) fn shallow_size(&self) -> usize {
        std::mem::size_of::<EnvFrame>()
            + self.table.len() * std::mem::size_of::<(Name, Value)>()
    }
}

impl Heap {
    /// Creates a frame with an optional parent.
    pub fn env_new(&mut self, parent: Option<EnvRef>) -> EnvRef {
        self.insert_env_frame(EnvFrame {
            marked: false,
            table: FxHashMap::default(),
            parent,
        })
    }

    /// The parent of a frame.
    pub fn env_parent(&self, env: EnvRef) -> Option<EnvRef> {
        self.frame(env).parent
    }

    /// Number of bindings in exactly this frame.
    pub fn env_len(&self, env: EnvRef) -> usize {
        self.frame(env).table.len()
    }

    /// Inserts or updates a binding in this frame.
    ///
    /// If the existing entry is an upvalue cell, the write lands in
    /// the cell so sibling closures observe it.
    pub fn env_put(&mut self, env: EnvRef, name: &Name, value: Value) {
        if let Some(cell) = self.upvalue_entry(env, name) {
            self.set_upvalue(cell, value);
            return;
        }
        self.frame_mut(env).table.insert(name.clone(), value);
    }

    /// Walks the chain and updates an existing binding.
    ///
    /// Returns false when no frame in the chain has the name; the
    /// language has no shadowing-on-assignment, so the caller turns
    /// that into a runtime error.
    pub fn env_set(&mut self, env: EnvRef, name: &Name, value: Value) -> bool {
        let mut current = Some(env);
        while let Some(e) = current {
            if self.frame(e).table.contains_key(name) {
                if let Some(cell) = self.upvalue_entry(e, name) {
                    self.set_upvalue(cell, value);
                } else {
                    self.frame_mut(e).table.insert(name.clone(), value);
                }
                return true;
            }
            current = self.frame(e).parent;
        }
        false
    }

    /// Walks the chain and reads a binding, dereferencing upvalue
    /// cells transparently.
    pub fn env_get(&self, env: EnvRef, name: &Name) -> Option<Value> {
        let mut current = Some(env);
        while let Some(e) = current {
            if let Some(value) = self.frame(e).table.get(name) {
                return Some(match value {
                    Value::Obj(r) => match self.obj(*r) {
                        ObjKind::Upvalue(inner) => *inner,
                        _ => *value,
                    },
                    _ => *value,
                });
            }
            current = self.frame(e).parent;
        }
        None
    }

    /// Promotes every binding of this frame to an upvalue cell.
    ///
    /// Called when a function is declared in `env`: afterwards the
    /// declaring scope and the closure share one cell per binding,
    /// so writes from either side meet in the middle. Entries that
    /// are already cells are left alone.
    pub fn env_promote_upvalues(&mut self, env: EnvRef) {
        let plain: Vec<(Name, Value)> = self
            .frame(env)
            .table
            .iter()
            .filter(|(_, value)| self.upvalue_entry_value(value).is_none())
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        for (name, value) in plain {
            let cell = self.alloc(ObjKind::Upvalue(value));
            self.frame_mut(env).table.insert(name, Value::Obj(cell));
        }
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    pub(crate) fn frame(&self, env: EnvRef) -> &EnvFrame {
        self.envs[env.index()]
            .as_ref()
            .expect("dangling environment handle")
    }

    pub(crate) fn frame_mut(&mut self, env: EnvRef) -> &mut EnvFrame {
        self.envs[env.index()]
            .as_mut()
            .expect("dangling environment handle")
    }

    /// The upvalue cell stored under `name` in exactly this frame.
    fn upvalue_entry(&self, env: EnvRef, name: &Name) -> Option<ObjRef> {
        let value = self.frame(env).table.get(name)?;
        self.upvalue_entry_value(value)
    }

    /// The upvalue cell behind `value`, when it is one.
    fn upvalue_entry_value(&self, value: &Value) -> Option<ObjRef> {
        match value {
            Value::Obj(r) => match self.obj(*r) {
                ObjKind::Upvalue(_) => Some(*r),
                _ => None,
            },
            _ => None,
        }
    }

    fn set_upvalue(&mut self, cell: ObjRef, value: Value) {
        if let ObjKind::Upvalue(slot) = self.obj_mut(cell) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GcConfig;
    use katha_util::HashSeed;

    fn heap_and_seed() -> Heap {
        Heap::new(GcConfig::default(), HashSeed::from_parts(2, 4))
    }

    fn name(heap: &Heap, text: &str) -> Name {
        Name::new(text, heap.seed())
    }

    #[test]
    fn test_put_then_get() {
        let mut heap = heap_and_seed();
        let env = heap.env_new(None);
        let x = name(&heap, "x");
        heap.env_put(env, &x, Value::Number(7.0));
        assert!(matches!(heap.env_get(env, &x), Some(Value::Number(n)) if n == 7.0));
    }

    #[test]
    fn test_get_walks_the_chain() {
        let mut heap = heap_and_seed();
        let global = heap.env_new(None);
        let inner = heap.env_new(Some(global));
        let x = name(&heap, "x");
        heap.env_put(global, &x, Value::Bool(true));
        assert!(matches!(heap.env_get(inner, &x), Some(Value::Bool(true))));
    }

    #[test]
    fn test_set_updates_owning_frame() {
        let mut heap = heap_and_seed();
        let global = heap.env_new(None);
        let inner = heap.env_new(Some(global));
        let x = name(&heap, "x");
        heap.env_put(global, &x, Value::Number(1.0));

        assert!(heap.env_set(inner, &x, Value::Number(2.0)));
        // The write landed in the global frame, not the inner one.
        assert!(matches!(heap.env_get(global, &x), Some(Value::Number(n)) if n == 2.0));
        assert!(!heap.frame(inner).table.contains_key(&x));
    }

    #[test]
    fn test_set_unknown_name_fails() {
        let mut heap = heap_and_seed();
        let env = heap.env_new(None);
        let ghost = name(&heap, "ghost");
        assert!(!heap.env_set(env, &ghost, Value::Nil));
    }

    #[test]
    fn test_shadowing_via_put() {
        let mut heap = heap_and_seed();
        let global = heap.env_new(None);
        let inner = heap.env_new(Some(global));
        let x = name(&heap, "x");
        heap.env_put(global, &x, Value::Number(1.0));
        heap.env_put(inner, &x, Value::Number(99.0));

        assert!(matches!(heap.env_get(inner, &x), Some(Value::Number(n)) if n == 99.0));
        assert!(matches!(heap.env_get(global, &x), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn test_promotion_shares_one_cell() {
        let mut heap = heap_and_seed();
        let scope = heap.env_new(None);
        let counter = name(&heap, "counter");
        heap.env_put(scope, &counter, Value::Number(0.0));

        heap.env_promote_upvalues(scope);

        // Reads dereference the cell.
        assert!(matches!(
            heap.env_get(scope, &counter),
            Some(Value::Number(n)) if n == 0.0
        ));

        // A child frame (a closure call) writes through the chain...
        let call_env = heap.env_new(Some(scope));
        assert!(heap.env_set(call_env, &counter, Value::Number(5.0)));

        // ...and the enclosing scope sees the update.
        assert!(matches!(
            heap.env_get(scope, &counter),
            Some(Value::Number(n)) if n == 5.0
        ));
    }

    #[test]
    fn test_put_writes_into_existing_cell() {
        let mut heap = heap_and_seed();
        let scope = heap.env_new(None);
        let x = name(&heap, "x");
        heap.env_put(scope, &x, Value::Number(1.0));
        heap.env_promote_upvalues(scope);

        let cell = match heap.frame(scope).table.get(&x) {
            Some(Value::Obj(r)) => *r,
            other => panic!("expected a cell, got {other:?}"),
        };

        // Re-declaring the same name updates the cell in place.
        heap.env_put(scope, &x, Value::Number(2.0));
        let still_cell = match heap.frame(scope).table.get(&x) {
            Some(Value::Obj(r)) => *r,
            other => panic!("expected a cell, got {other:?}"),
        };
        assert_eq!(cell, still_cell);
        assert!(matches!(heap.env_get(scope, &x), Some(Value::Number(n)) if n == 2.0));
    }

    #[test]
    fn test_promotion_is_idempotent() {
        let mut heap = heap_and_seed();
        let scope = heap.env_new(None);
        let x = name(&heap, "x");
        heap.env_put(scope, &x, Value::Number(3.0));
        heap.env_promote_upvalues(scope);
        let cell_before = match heap.frame(scope).table.get(&x) {
            Some(Value::Obj(r)) => *r,
            other => panic!("expected a cell, got {other:?}"),
        };
        heap.env_promote_upvalues(scope);
        let cell_after = match heap.frame(scope).table.get(&x) {
            Some(Value::Obj(r)) => *r,
            other => panic!("expected a cell, got {other:?}"),
        };
        assert_eq!(cell_before, cell_after);
    }
}
