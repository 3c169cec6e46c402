//! The `math` module (`গণিত`).

use kgc::{NativeCtx, Value};

use super::StdEntry;

pub(super) const ENTRIES: &[StdEntry] = &[StdEntry {
    names: &["pow"],
    arity: 2,
    func: math_pow,
}];

/// `pow(x, y)`: `x` raised to `y`.
fn math_pow(_ctx: &mut NativeCtx<'_>, args: &[Value]) -> Result<Value, String> {
    match (args[0], args[1]) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.powf(y))),
        _ => Err("pow(...) needs two numbers".to_string()),
    }
}
