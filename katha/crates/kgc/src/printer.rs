//! Value rendering.
//!
//! The textual form shared by `print`, `show(...)`,
//! `string.string(v)`, and the VM's debug print. Whole numbers
//! render without a decimal point, other numbers with six
//! fractional digits. Bools and nil render with their Bengali
//! spellings.

use crate::object::ObjKind;
use crate::value::{is_whole, Value};
use crate::Heap;

/// Renders a value to its user-facing textual form.
///
/// Arrays render as `[a, b]`, maps as `{k : v}` in insertion order,
/// functions as `<fn name>`, natives as `<native name>`.
pub fn render_value(heap: &Heap, value: Value) -> String {
    match value {
        Value::Number(n) => render_number(n),
        Value::Bool(true) => "সত্যি".to_string(),
        Value::Bool(false) => "মিথ্যা".to_string(),
        Value::Nil => "নিল".to_string(),
        Value::Obj(r) => match heap.obj(r) {
            ObjKind::Str(s) => s.value.to_string(),
            ObjKind::Array(items) => {
                let rendered: Vec<String> =
                    items.iter().map(|item| render_value(heap, *item)).collect();
                format!("[{}]", rendered.join(", "))
            },
            ObjKind::Map(table) => {
                let rendered: Vec<String> = table
                    .values()
                    .map(|slot| {
                        format!(
                            "{} : {}",
                            render_value(heap, slot.key),
                            render_value(heap, slot.value)
                        )
                    })
                    .collect();
                format!("{{{}}}", rendered.join(", "))
            },
            ObjKind::Function(f) => format!("<fn {}>", f.name),
            ObjKind::Native(n) => format!("<native {}>", n.name),
            ObjKind::Upvalue(inner) => render_value(heap, *inner),
            ObjKind::Error(message) => message.clone(),
        },
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && is_whole(n) {
        format!("{:.0}", n)
    } else {
        format!("{:.6}", n)
    }
}
