//! The slotted-arena heap and its mark-and-sweep collector.
//!
//! Objects and environment frames live in two `Vec`s of optional
//! slots; freed slots go on free lists for reuse. Handles are plain
//! indices, so the object graph may contain cycles (function →
//! environment → function) without leaking: reachability is decided
//! by tracing from the registered roots, never by counting.

use std::rc::Rc;
use std::time::Instant;

use katha_util::{HashSeed, Name};
use log::debug;

use crate::config::GcConfig;
use crate::env::{EnvFrame, EnvRef};
use crate::object::{KString, MapKey, MapSlot, Obj, ObjKind, ObjRef};
use crate::stats::GcStats;
use crate::value::Value;

/// Work items for the mark phase.
enum Work {
    Obj(ObjRef),
    Env(EnvRef),
}

/// The garbage-collected heap.
///
/// Also owns the per-process hash seed and the process start time:
/// both are initialized once at interpreter startup and consulted by
/// string hashing and the `clock()` native.
#[derive(Debug)]
pub struct Heap {
    /// Object slots; `None` marks a free slot.
    pub(crate) objects: Vec<Option<Obj>>,
    /// Free object slots available for reuse.
    free_objects: Vec<usize>,

    /// Environment frame slots.
    pub(crate) envs: Vec<Option<EnvFrame>>,
    /// Free frame slots available for reuse.
    free_envs: Vec<usize>,

    /// Root environments: the interpreter global plus one per module.
    roots: Vec<EnvRef>,

    /// Approximate bytes held by live objects.
    bytes_allocated: usize,
    /// Crossing this arms a collection at the next safepoint.
    next_gc: usize,

    config: GcConfig,
    seed: HashSeed,
    start: Instant,
    stats: GcStats,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new(config: GcConfig, seed: HashSeed) -> Self {
        Self {
            objects: Vec::new(),
            free_objects: Vec::new(),
            envs: Vec::new(),
            free_envs: Vec::new(),
            roots: Vec::new(),
            bytes_allocated: 0,
            next_gc: config.initial_threshold,
            config,
            seed,
            start: Instant::now(),
            stats: GcStats::default(),
        }
    }

    /// The per-process hash seed.
    pub fn seed(&self) -> &HashSeed {
        &self.seed
    }

    /// Seconds since interpreter startup, for the `clock()` native.
    pub fn clock_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Collector statistics so far.
    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    /// Approximate live byte count.
    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated
    }

    // =========================================================================
    // ALLOCATION
    // =========================================================================

    /// Allocates an object and returns its handle.
    pub fn alloc(&mut self, kind: ObjKind) -> ObjRef {
        self.bytes_allocated += kind.shallow_size();
        let obj = Obj::new(kind);
        match self.free_objects.pop() {
            Some(index) => {
                self.objects[index] = Some(obj);
                ObjRef::new(index)
            },
            None => {
                self.objects.push(Some(obj));
                ObjRef::new(self.objects.len() - 1)
            },
        }
    }

    /// Allocates a string object, caching its seeded hash.
    pub fn alloc_string(&mut self, text: impl Into<Rc<str>>) -> ObjRef {
        let value: Rc<str> = text.into();
        let hash = self.seed.hash_str(&value);
        self.alloc(ObjKind::Str(KString { value, hash }))
    }

    /// Allocates an in-band error object for native returns.
    pub fn alloc_error(&mut self, message: impl Into<String>) -> ObjRef {
        self.alloc(ObjKind::Error(message.into()))
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    /// The payload of an object.
    pub fn obj(&self, r: ObjRef) -> &ObjKind {
        &self.objects[r.index()]
            .as_ref()
            .expect("dangling object handle")
            .kind
    }

    /// Mutable payload of an object.
    pub fn obj_mut(&mut self, r: ObjRef) -> &mut ObjKind {
        &mut self.objects[r.index()]
            .as_mut()
            .expect("dangling object handle")
            .kind
    }

    /// The string payload of `r`, if it is a string object.
    pub fn as_str(&self, r: ObjRef) -> Option<&KString> {
        match self.obj(r) {
            ObjKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The string contents of a value, if it holds a string object.
    pub fn value_str(&self, v: Value) -> Option<&KString> {
        match v {
            Value::Obj(r) => self.as_str(r),
            _ => None,
        }
    }

    // =========================================================================
    // VALUE SEMANTICS THAT NEED HEAP CONTENTS
    // =========================================================================

    /// Structural/identity equality across values.
    ///
    /// Numbers compare as floats, bools by value, nil equals only
    /// nil; strings compare by contents, every other object kind by
    /// handle identity. Mixed kinds are never equal.
    pub fn values_equal(&self, a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Nil, Value::Nil) => true,
            (Value::Obj(x), Value::Obj(y)) => match (self.obj(x), self.obj(y)) {
                (ObjKind::Str(sx), ObjKind::Str(sy)) => sx.value == sy.value,
                _ => x == y,
            },
            _ => false,
        }
    }

    /// Builds the normalized map key for `v`, or `None` when the
    /// value kind is not hashable (arrays, maps, functions, ...).
    pub fn map_key(&self, v: Value) -> Option<MapKey> {
        match v {
            Value::Number(n) => {
                let n = if n == 0.0 { 0.0 } else { n };
                Some(MapKey::Number(n.to_bits()))
            },
            Value::Bool(b) => Some(MapKey::Bool(b)),
            Value::Nil => Some(MapKey::Nil),
            Value::Obj(r) => match self.obj(r) {
                ObjKind::Str(s) => Some(MapKey::Str(Name::from_raw(s.value.clone(), s.hash))),
                _ => None,
            },
        }
    }

    /// Inserts or updates a map entry. Returns the new entry count,
    /// or `None` when the key is not hashable.
    pub fn map_insert(&mut self, map: ObjRef, key: Value, value: Value) -> Option<usize> {
        let map_key = self.map_key(key)?;
        match self.obj_mut(map) {
            ObjKind::Map(table) => {
                table.insert(map_key, MapSlot { key, value });
                Some(table.len())
            },
            _ => None,
        }
    }

    // =========================================================================
    // ROOTS AND COLLECTION
    // =========================================================================

    /// Registers a root environment. Roots are never collected.
    pub fn add_root(&mut self, env: EnvRef) {
        self.roots.push(env);
    }

    /// True when stress mode forces a collection at every safepoint.
    pub fn stress(&self) -> bool {
        self.config.stress
    }

    /// Collection safepoint, called between top-level statements.
    ///
    /// At a safepoint every live value is reachable from a root, so
    /// collecting here is always safe. Collects when the threshold
    /// has been crossed, or always under stress.
    pub fn safepoint(&mut self) {
        if self.config.stress || self.bytes_allocated > self.next_gc {
            self.collect();
        }
    }

    /// Runs one stop-the-world mark-and-sweep cycle.
    pub fn collect(&mut self) {
        let before_objects = self.objects.len() - self.free_objects.len();

        self.mark_from_roots();
        let (objects_freed, envs_freed) = self.sweep();

        self.next_gc = ((self.bytes_allocated as f64 * self.config.growth_factor) as usize)
            .max(self.config.min_threshold);

        self.stats.cycles += 1;
        self.stats.objects_freed += objects_freed;
        self.stats.envs_freed += envs_freed;
        self.stats.live_bytes = self.bytes_allocated;

        debug!(
            "gc cycle {}: freed {} objects, {} frames ({} of {} live, next at {} bytes)",
            self.stats.cycles,
            objects_freed,
            envs_freed,
            before_objects as u64 - objects_freed,
            before_objects,
            self.next_gc,
        );
    }

    /// Marks everything reachable from the registered roots.
    fn mark_from_roots(&mut self) {
        let mut work: Vec<Work> = self.roots.iter().map(|e| Work::Env(*e)).collect();

        while let Some(item) = work.pop() {
            match item {
                Work::Env(e) => {
                    let frame = self.envs[e.index()]
                        .as_mut()
                        .expect("dangling environment handle");
                    if frame.marked {
                        continue;
                    }
                    frame.marked = true;
                    if let Some(parent) = frame.parent {
                        work.push(Work::Env(parent));
                    }
                    for value in frame.table.values() {
                        if let Value::Obj(r) = value {
                            work.push(Work::Obj(*r));
                        }
                    }
                },
                Work::Obj(r) => {
                    let obj = self.objects[r.index()]
                        .as_mut()
                        .expect("dangling object handle");
                    if obj.marked {
                        continue;
                    }
                    obj.marked = true;
                    push_children(&obj.kind, &mut work);
                },
            }
        }
    }

    /// Frees unmarked slots and recomputes the live byte count.
    fn sweep(&mut self) -> (u64, u64) {
        let mut objects_freed = 0u64;
        let mut live_bytes = 0usize;

        for index in 0..self.objects.len() {
            match &mut self.objects[index] {
                Some(obj) if obj.marked => {
                    obj.marked = false;
                    live_bytes += obj.kind.shallow_size();
                },
                Some(_) => {
                    self.objects[index] = None;
                    self.free_objects.push(index);
                    objects_freed += 1;
                },
                None => {},
            }
        }

        let mut envs_freed = 0u64;
        for index in 0..self.envs.len() {
            match &mut self.envs[index] {
                Some(frame) if frame.marked => {
                    frame.marked = false;
                    live_bytes += frame.shallow_size();
                },
                Some(_) => {
                    self.envs[index] = None;
                    self.free_envs.push(index);
                    envs_freed += 1;
                },
                None => {},
            }
        }

        self.bytes_allocated = live_bytes;
        (objects_freed, envs_freed)
    }

    /// Hands out a frame slot; used by the environment code.
    pub(crate) fn insert_env_frame(&mut self, frame: EnvFrame) -> EnvRef {
        self.bytes_allocated += frame.shallow_size();
        match self.free_envs.pop() {
            Some(index) => {
                self.envs[index] = Some(frame);
                EnvRef::new(index)
            },
            None => {
                self.envs.push(Some(frame));
                EnvRef::new(self.envs.len() - 1)
            },
        }
    }
}

/// Queues the structural children of an object payload.
fn push_children(kind: &ObjKind, work: &mut Vec<Work>) {
    match kind {
        ObjKind::Str(_) | ObjKind::Native(_) | ObjKind::Error(_) => {},
        ObjKind::Array(items) => {
            for item in items {
                if let Value::Obj(r) = item {
                    work.push(Work::Obj(*r));
                }
            }
        },
        ObjKind::Map(table) => {
            for slot in table.values() {
                if let Value::Obj(r) = slot.key {
                    work.push(Work::Obj(r));
                }
                if let Value::Obj(r) = slot.value {
                    work.push(Work::Obj(r));
                }
            }
        },
        ObjKind::Function(f) => {
            work.push(Work::Env(f.env));
        },
        ObjKind::Upvalue(value) => {
            if let Value::Obj(r) = value {
                work.push(Work::Obj(*r));
            }
        },
    }
}
