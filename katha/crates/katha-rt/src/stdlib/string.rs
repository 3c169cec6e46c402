//! The `string` module.
//!
//! String positions count grapheme clusters, not bytes or code
//! points: `index("কথা", 1)` is the second user-perceived character
//! even when it spans several scalar values.

use kgc::value::is_whole;
use kgc::{NativeCtx, ObjKind, Value};
use unicode_segmentation::UnicodeSegmentation;

use super::StdEntry;
use crate::printer::render_value;

pub(super) const ENTRIES: &[StdEntry] = &[
    StdEntry {
        names: &["index"],
        arity: 2,
        func: string_index,
    },
    StdEntry {
        names: &["split"],
        arity: 2,
        func: string_split,
    },
    StdEntry {
        names: &["string"],
        arity: 1,
        func: string_string,
    },
];

/// `index(s, i)`: the i-th grapheme cluster as a fresh string.
fn string_index(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let Some(s) = ctx.heap.value_str(args[0]) else {
        return Err("index(...) first argument must be a string".to_string());
    };
    let index = match args[1] {
        Value::Number(n) if is_whole(n) && n >= 0.0 => n as usize,
        _ => return Err("index(...) index must be a non-negative integer".to_string()),
    };

    let grapheme = s
        .value
        .graphemes(true)
        .nth(index)
        .map(str::to_string)
        .ok_or_else(|| "index(...) index is out of range".to_string())?;
    Ok(Value::Obj(ctx.heap.alloc_string(grapheme)))
}

/// `split(s, sep)`: the pieces of `s` around `sep` as an array of
/// fresh strings. An empty separator splits into grapheme clusters.
fn string_split(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let (Some(s), Some(sep)) = (ctx.heap.value_str(args[0]), ctx.heap.value_str(args[1])) else {
        return Err("split(...) both arguments must be strings".to_string());
    };

    let pieces: Vec<String> = if sep.value.is_empty() {
        s.value.graphemes(true).map(str::to_string).collect()
    } else {
        s.value
            .split(sep.value.as_ref())
            .map(str::to_string)
            .collect()
    };

    let mut items = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let obj = ctx.heap.alloc_string(piece);
        items.push(Value::Obj(obj));
    }
    Ok(Value::Obj(ctx.heap.alloc(ObjKind::Array(items))))
}

/// `string(v)`: the textual rendering of any value.
fn string_string(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let text = render_value(ctx.heap, args[0]);
    Ok(Value::Obj(ctx.heap.alloc_string(text)))
}
