//! Global native functions.
//!
//! These are bound directly in the root environment, not behind any
//! module: `show`, `len`, `append`, and `clock`, each under its
//! English, Bengali, and phonetic names.

use std::io::Write;

use katha_util::Name;
use kgc::{NativeCtx, NativeDef, ObjKind, Value};
use unicode_segmentation::UnicodeSegmentation;

use crate::interpreter::Interpreter;
use crate::printer::render_value;

/// A global entry: alias spellings, arity, implementation.
struct GlobalEntry {
    names: &'static [&'static str],
    arity: i32,
    func: kgc::NativeFn,
}

const GLOBALS: &[GlobalEntry] = &[
    GlobalEntry {
        names: &["show", "দেখাও", "dekhao"],
        arity: -1,
        func: ntv_show,
    },
    GlobalEntry {
        names: &["len", "আয়তন", "ayoton"],
        arity: 1,
        func: ntv_len,
    },
    GlobalEntry {
        names: &["append", "সংযোগ", "songjog"],
        arity: -1,
        func: ntv_append,
    },
    GlobalEntry {
        names: &["clock", "সময়", "somoy"],
        arity: 0,
        func: ntv_clock,
    },
];

/// Binds every global native in the interpreter's root environment.
/// One native object per entry, shared across its alias names.
pub(crate) fn register_globals(interpreter: &mut Interpreter<'_>) {
    let globals = interpreter.globals();
    let seed = *interpreter.heap.seed();
    for entry in GLOBALS {
        let obj = interpreter.heap.alloc(ObjKind::Native(NativeDef {
            name: entry.names[0],
            arity: entry.arity,
            func: entry.func,
        }));
        for alias in entry.names {
            let name = Name::new(*alias, &seed);
            interpreter.heap.env_put(globals, &name, Value::Obj(obj));
        }
    }
}

/// `show(...)`: renders each argument, separated by a single space,
/// without a trailing newline.
fn ntv_show(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    for (i, arg) in args.iter().enumerate() {
        let text = render_value(ctx.heap, *arg);
        if i + 1 < args.len() {
            write!(ctx.out, "{} ", text)
        } else {
            write!(ctx.out, "{}", text)
        }
        .map_err(|e| format!("Failed to write output: {e}"))?;
    }
    Ok(Value::Nil)
}

/// `len(x)`: grapheme count for strings, item count for arrays,
/// entry count for maps.
fn ntv_len(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    let Some(obj) = args[0].as_obj() else {
        return Err("Length can not be calculated for this value".to_string());
    };
    let length = match ctx.heap.obj(obj) {
        ObjKind::Str(s) => s.value.graphemes(true).count(),
        ObjKind::Array(items) => items.len(),
        ObjKind::Map(table) => table.len(),
        _ => return Err("Length can not be calculated for this value".to_string()),
    };
    Ok(Value::Number(length as f64))
}

/// `append(a, items...)` pushes onto an array and returns the new
/// length; `append(m, k, v)` inserts into a map and returns the new
/// entry count.
fn ntv_append(ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    if args.len() < 2 {
        return Err(
            "append(...) needs at least two arguments for an array, or three for a map"
                .to_string(),
        );
    }

    let Some(obj) = args[0].as_obj() else {
        return Err("append(...) only works on arrays and maps".to_string());
    };

    match ctx.heap.obj(obj) {
        ObjKind::Array(_) => {
            let new_len = match ctx.heap.obj_mut(obj) {
                ObjKind::Array(items) => {
                    items.extend_from_slice(&args[1..]);
                    items.len()
                },
                _ => unreachable!("array payload changed kind"),
            };
            Ok(Value::Number(new_len as f64))
        },
        ObjKind::Map(_) => {
            if args.len() != 3 {
                return Err(
                    "append(...) on a map needs exactly three arguments: map, key, value"
                        .to_string(),
                );
            }
            match ctx.heap.map_insert(obj, args[1], args[2]) {
                Some(count) => Ok(Value::Number(count as f64)),
                None => Err("Invalid key for map".to_string()),
            }
        },
        _ => Err("append(...) only works on arrays and maps".to_string()),
    }
}

/// `clock()`: seconds since interpreter startup.
fn ntv_clock(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    Ok(Value::Number(ctx.heap.clock_seconds()))
}
