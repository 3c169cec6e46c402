//! The `map` module (`ম্যাপ`).

use kgc::{NativeCtx, ObjKind, Value};

use super::StdEntry;

pub(super) const ENTRIES: &[StdEntry] = &[
    StdEntry {
        names: &["exists", "বর্তমান"],
        arity: 2,
        func: map_exists,
    },
    StdEntry {
        names: &["keys", "সূচক"],
        arity: 1,
        func: map_keys,
    },
    StdEntry {
        names: &["values", "মান"],
        arity: 1,
        func: map_values,
    },
];

/// `exists(m, k)`: true when the map has the key.
fn map_exists(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let Some(obj) = args[0].as_obj() else {
        return Err("exists(...) only works with maps".to_string());
    };
    let Some(key) = ctx.heap.map_key(args[1]) else {
        return Err("Invalid key for map".to_string());
    };
    match ctx.heap.obj(obj) {
        ObjKind::Map(table) => Ok(Value::Bool(table.contains_key(&key))),
        _ => Err("exists(...) only works with maps".to_string()),
    }
}

/// `keys(m)`: the keys as a fresh array, in insertion order.
fn map_keys(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    map_items(ctx, args[0], true)
}

/// `values(m)`: the values as a fresh array, in insertion order.
fn map_values(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    map_items(ctx, args[0], false)
}

fn map_items(ctx: &mut NativeCtx<'_>, raw: Value, need_keys: bool) -> Result<Value, String> {
    let Some(obj) = raw.as_obj() else {
        return Err("keys(...)/values(...) only works with maps".to_string());
    };
    let items: Vec<Value> = match ctx.heap.obj(obj) {
        ObjKind::Map(table) => table
            .values()
            .map(|slot| if need_keys { slot.key } else { slot.value })
            .collect(),
        _ => return Err("keys(...)/values(...) only works with maps".to_string()),
    };
    Ok(Value::Obj(ctx.heap.alloc(ObjKind::Array(items))))
}
