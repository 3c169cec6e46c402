//! The `array` module (`তালিকা`).

use kgc::value::is_whole;
use kgc::{Heap, NativeCtx, ObjKind, ObjRef, Value};

use super::StdEntry;

pub(super) const ENTRIES: &[StdEntry] = &[
    StdEntry {
        names: &["exists"],
        arity: 2,
        func: array_exists,
    },
    StdEntry {
        names: &["index"],
        arity: 2,
        func: array_index,
    },
    StdEntry {
        names: &["delete"],
        arity: -1,
        func: array_delete,
    },
];

fn as_array(heap: &Heap, value: Value, who: &str) -> Result<ObjRef, String> {
    match value.as_obj() {
        Some(obj) if matches!(heap.obj(obj), ObjKind::Array(_)) => Ok(obj),
        _ => Err(format!("{who}(...) only works on arrays")),
    }
}

/// Position of `needle` in the array, by value equality.
fn find(heap: &Heap, arr: ObjRef, needle: Value) -> Option<usize> {
    match heap.obj(arr) {
        ObjKind::Array(items) => items
            .iter()
            .position(|item| heap.values_equal(*item, needle)),
        _ => None,
    }
}

/// `exists(a, v)`: true when some item equals `v`.
fn array_exists(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let arr = as_array(ctx.heap, args[0], "exists")?;
    Ok(Value::Bool(find(ctx.heap, arr, args[1]).is_some()))
}

/// `index(a, v)`: position of `v`, or -1 when absent.
fn array_index(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let arr = as_array(ctx.heap, args[0], "index")?;
    match find(ctx.heap, arr, args[1]) {
        Some(position) => Ok(Value::Number(position as f64)),
        None => Ok(Value::Number(-1.0)),
    }
}

/// `delete(a)` pops and returns the last item (nil when empty);
/// `delete(a, i)` removes and returns the item at `i`.
fn array_delete(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    if args.is_empty() || args.len() > 2 {
        return Err("delete(...) takes one or two arguments".to_string());
    }
    let arr = as_array(ctx.heap, args[0], "delete")?;

    if args.len() == 1 {
        return match ctx.heap.obj_mut(arr) {
            ObjKind::Array(items) => Ok(items.pop().unwrap_or(Value::Nil)),
            _ => unreachable!("array payload changed kind"),
        };
    }

    let index = match args[1] {
        Value::Number(n) if is_whole(n) && n >= 0.0 => n as usize,
        _ => return Err("delete(array, index) -> index must be a non-negative integer".to_string()),
    };
    match ctx.heap.obj_mut(arr) {
        ObjKind::Array(items) => {
            if index >= items.len() {
                return Err("delete(...) index out of range".to_string());
            }
            Ok(items.remove(index))
        },
        _ => unreachable!("array payload changed kind"),
    }
}
