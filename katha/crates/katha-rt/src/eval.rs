//! Expression evaluation.
//!
//! Operator dispatch is a match on value kinds at each operator.
//! Type errors, undefined names, bad subscripts, and arity
//! mismatches are runtime errors positioned at the operator or call
//! token.

use katha_lex::{Token, TokenKind};
use katha_par::{Expr, LitValue};
use kgc::value::is_whole;
use kgc::{EnvRef, Function, NativeCtx, NativeDef, ObjKind, Value};

use crate::error::RuntimeError;
use crate::interpreter::{name_of, Flow, Interpreter};

impl<'w> Interpreter<'w> {
    /// Evaluates an expression in `env`.
    pub fn eval(&mut self, expr: &Expr, env: EnvRef) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LitValue::Number(n) => Value::Number(*n),
                LitValue::Bool(b) => Value::Bool(*b),
                LitValue::Nil => Value::Nil,
                LitValue::Str(s) => {
                    let obj = self.heap.alloc_string(s.as_str());
                    Value::Obj(obj)
                },
            }),

            Expr::Grouping { inner } => self.eval(inner, env),

            Expr::Variable { name } => {
                let key = name_of(name);
                self.heap.env_get(env, &key).ok_or_else(|| {
                    RuntimeError::at(name, format!("Undefined variable '{}'", name.lexeme))
                })
            },

            Expr::Unary { op, right } => {
                let value = self.eval(right, env)?;
                match op.kind {
                    TokenKind::Minus => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::at(op, "Negation needs a number")),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!value.is_truthy())),
                    _ => Err(RuntimeError::at(op, "Invalid unary operator")),
                }
            },

            Expr::Binary { left, op, right } => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                self.eval_binary(l, op, r)
            },

            Expr::Logical { left, op, right } => self.eval_logical(left, op, right, env),

            Expr::Assign { target, value, op } => self.eval_assignment(target, value, op, env),

            Expr::Call { callee, args, paren } => self.eval_call(callee, args, paren, env),

            Expr::Array { items, .. } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, env)?);
                }
                Ok(Value::Obj(self.heap.alloc(ObjKind::Array(values))))
            },

            Expr::Map { entries, .. } => {
                let map = self.heap.alloc(ObjKind::Map(Default::default()));
                for (key_expr, value_expr) in entries {
                    let key = self.eval(key_expr, env)?;
                    let value = self.eval(value_expr, env)?;
                    if self.heap.map_insert(map, key, value).is_none() {
                        return Err(RuntimeError::at(
                            key_expr.token(),
                            "Invalid key for map",
                        ));
                    }
                }
                Ok(Value::Obj(map))
            },

            Expr::Subscript { value, index, bracket } => {
                let collection = self.eval(value, env)?;
                let index = self.eval(index, env)?;
                self.eval_subscript_read(collection, index, bracket)
            },

            Expr::ModGet { module, child, dot } => self.eval_modget(module, child, dot),
        }
    }

    // =========================================================================
    // OPERATORS
    // =========================================================================

    fn eval_binary(&mut self, l: Value, op: &Token, r: Value) -> Result<Value, RuntimeError> {
        match op.kind {
            TokenKind::Plus => match (l, r) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                _ => {
                    let (ls, rs) = (self.heap.value_str(l), self.heap.value_str(r));
                    match (ls, rs) {
                        (Some(a), Some(b)) => {
                            let joined = format!("{}{}", a.value, b.value);
                            Ok(Value::Obj(self.heap.alloc_string(joined)))
                        },
                        _ => Err(RuntimeError::at(
                            op,
                            "Addition needs two numbers or two strings",
                        )),
                    }
                },
            },
            TokenKind::Minus => self.arith(l, r, op, "Subtraction", |a, b| a - b),
            TokenKind::Star => self.arith(l, r, op, "Multiplication", |a, b| a * b),
            TokenKind::Percent => self.arith(l, r, op, "Modulo", |a, b| a % b),
            TokenKind::StarStar => self.arith(l, r, op, "Exponentiation", f64::powf),
            TokenKind::Slash => match (l, r) {
                (Value::Number(_), Value::Number(b)) if b == 0.0 => {
                    Err(RuntimeError::at(op, "Division by zero"))
                },
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(RuntimeError::at(op, "Division can only be done with numbers")),
            },
            TokenKind::EqEq => Ok(Value::Bool(self.heap.values_equal(l, r))),
            TokenKind::BangEq => Ok(Value::Bool(!self.heap.values_equal(l, r))),
            TokenKind::Gt => self.compare(l, r, op, |a, b| a > b),
            TokenKind::GtEq => self.compare(l, r, op, |a, b| a >= b),
            TokenKind::Lt => self.compare(l, r, op, |a, b| a < b),
            TokenKind::LtEq => self.compare(l, r, op, |a, b| a <= b),
            _ => Err(RuntimeError::at(op, "Invalid binary operator")),
        }
    }

    fn arith(
        &mut self,
        l: Value,
        r: Value,
        op: &Token,
        what: &str,
        apply: fn(f64, f64) -> f64,
    ) -> Result<Value, RuntimeError> {
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(a, b))),
            _ => Err(RuntimeError::at(
                op,
                format!("{what} can only be done with numbers"),
            )),
        }
    }

    fn compare(
        &mut self,
        l: Value,
        r: Value,
        op: &Token,
        apply: fn(f64, f64) -> bool,
    ) -> Result<Value, RuntimeError> {
        match (l, r) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(apply(a, b))),
            _ => Err(RuntimeError::at(
                op,
                "Comparison can only be done with numbers",
            )),
        }
    }

    /// `and`/`or`: short-circuiting, and the result is always a
    /// bool, never one of the operands.
    fn eval_logical(
        &mut self,
        left: &Expr,
        op: &Token,
        right: &Expr,
        env: EnvRef,
    ) -> Result<Value, RuntimeError> {
        let l = self.eval(left, env)?;
        match op.kind {
            TokenKind::Or => {
                if l.is_truthy() {
                    Ok(Value::Bool(true))
                } else {
                    let r = self.eval(right, env)?;
                    Ok(Value::Bool(r.is_truthy()))
                }
            },
            TokenKind::And => {
                if !l.is_truthy() {
                    Ok(Value::Bool(false))
                } else {
                    let r = self.eval(right, env)?;
                    Ok(Value::Bool(r.is_truthy()))
                }
            },
            _ => Err(RuntimeError::at(op, "Invalid logical operator")),
        }
    }

    // =========================================================================
    // ASSIGNMENT
    // =========================================================================

    fn eval_assignment(
        &mut self,
        target: &Expr,
        value: &Expr,
        op: &Token,
        env: EnvRef,
    ) -> Result<Value, RuntimeError> {
        match target {
            Expr::Variable { name } => {
                let new_value = self.eval(value, env)?;
                let key = name_of(name);
                if self.heap.env_set(env, &key, new_value) {
                    Ok(new_value)
                } else {
                    Err(RuntimeError::at(
                        name,
                        format!("Undefined assignment target '{}'", name.lexeme),
                    ))
                }
            },
            Expr::Subscript {
                value: collection,
                index,
                bracket,
            } => {
                let collection = self.eval(collection, env)?;
                let index = self.eval(index, env)?;
                let new_value = self.eval(value, env)?;
                self.eval_subscript_write(collection, index, new_value, bracket)
            },
            // The parser only builds assignments to the two shapes
            // above.
            _ => Err(RuntimeError::at(op, "Invalid assignment target")),
        }
    }

    fn eval_subscript_write(
        &mut self,
        collection: Value,
        index: Value,
        new_value: Value,
        bracket: &Token,
    ) -> Result<Value, RuntimeError> {
        let Some(obj) = collection.as_obj() else {
            return Err(RuntimeError::at(
                bracket,
                "Subscript only works on arrays and maps",
            ));
        };
        match self.heap.obj(obj) {
            ObjKind::Array(items) => {
                let len = items.len();
                let at = array_index(index, len, bracket)?;
                match self.heap.obj_mut(obj) {
                    ObjKind::Array(items) => items[at] = new_value,
                    _ => unreachable!("array payload changed kind"),
                }
                Ok(new_value)
            },
            ObjKind::Map(_) => match self.heap.map_insert(obj, index, new_value) {
                Some(_) => Ok(new_value),
                None => Err(RuntimeError::at(bracket, "Invalid key for map")),
            },
            _ => Err(RuntimeError::at(
                bracket,
                "Subscript only works on arrays and maps",
            )),
        }
    }

    fn eval_subscript_read(
        &mut self,
        collection: Value,
        index: Value,
        bracket: &Token,
    ) -> Result<Value, RuntimeError> {
        let Some(obj) = collection.as_obj() else {
            return Err(RuntimeError::at(
                bracket,
                "Subscript only works on arrays and maps",
            ));
        };
        match self.heap.obj(obj) {
            ObjKind::Array(items) => {
                let at = array_index(index, items.len(), bracket)?;
                Ok(items[at])
            },
            ObjKind::Map(table) => {
                let Some(key) = self.heap.map_key(index) else {
                    return Err(RuntimeError::at(bracket, "Invalid key for map"));
                };
                match table.get(&key) {
                    Some(slot) => Ok(slot.value),
                    None => Err(RuntimeError::at(bracket, "Key doesn't exist in map")),
                }
            },
            _ => Err(RuntimeError::at(
                bracket,
                "Subscript only works on arrays and maps",
            )),
        }
    }

    // =========================================================================
    // CALLS
    // =========================================================================

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        paren: &Token,
        env: EnvRef,
    ) -> Result<Value, RuntimeError> {
        let callee_value = self.eval(callee, env)?;
        let Some(obj) = callee_value.as_obj() else {
            return Err(RuntimeError::at(paren, "Can only call functions"));
        };

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg, env)?);
        }

        match self.heap.obj(obj) {
            ObjKind::Function(f) => {
                let f = f.clone();
                self.call_function(&f, &arg_values, paren)
            },
            ObjKind::Native(def) => {
                let def = *def;
                self.call_native(&def, &arg_values, paren)
            },
            _ => Err(RuntimeError::at(paren, "Can only call functions")),
        }
    }

    /// Calls a user-defined function: exact arity, parameters bound
    /// in a child of the captured environment, `return` giving the
    /// call's value.
    fn call_function(
        &mut self,
        f: &Function,
        args: &[Value],
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        if args.len() != f.params.len() {
            return Err(RuntimeError::at(
                paren,
                format!(
                    "Function needs {} arguments but {} was given when calling",
                    f.params.len(),
                    args.len()
                ),
            ));
        }

        self.enter_call(paren)?;

        let call_env = self.heap.env_new(Some(f.env));
        for (param, value) in f.params.iter().zip(args) {
            self.heap.env_put(call_env, param, *value);
        }

        // The depth counter is decremented exactly once on every
        // exit path, errors included.
        let result = self.execute(&f.body, call_env);
        self.exit_call();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) | Flow::Break => Ok(Value::Nil),
        }
    }

    /// Calls a native: negative declared arity accepts any count.
    /// An error return, or an in-band error object, surfaces as a
    /// runtime error at the call's paren token.
    fn call_native(
        &mut self,
        def: &NativeDef,
        args: &[Value],
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        if def.arity >= 0 && args.len() != def.arity as usize {
            return Err(RuntimeError::at(
                paren,
                format!(
                    "Function needs {} arguments but {} was given when calling",
                    def.arity,
                    args.len()
                ),
            ));
        }

        let mut ctx = NativeCtx {
            heap: &mut self.heap,
            out: &mut *self.out,
        };
        let value = (def.func)(&mut ctx, args).map_err(|message| RuntimeError::at(paren, message))?;

        if let Some(message) = self.error_obj_message(value) {
            return Err(RuntimeError::at(paren, message));
        }
        Ok(value)
    }

    /// The message of an in-band error object, if `value` is one.
    fn error_obj_message(&self, value: Value) -> Option<String> {
        match value {
            Value::Obj(r) => match self.heap.obj(r) {
                ObjKind::Error(message) => Some(message.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    // =========================================================================
    // MODULE ACCESS
    // =========================================================================

    fn eval_modget(
        &mut self,
        module: &Expr,
        child: &Token,
        dot: &Token,
    ) -> Result<Value, RuntimeError> {
        let Expr::Variable { name } = module else {
            return Err(RuntimeError::at(dot, "Module is not a name"));
        };

        let module_name = name_of(name);
        let Some(module) = self.proxy(&module_name) else {
            return Err(RuntimeError::at(
                name,
                format!("Module not found: '{}'", name.lexeme),
            ));
        };
        let module_env = module.env;

        let child_name = name_of(child);
        self.heap.env_get(module_env, &child_name).ok_or_else(|| {
            RuntimeError::at(
                child,
                format!("Module has no member '{}'", child.lexeme),
            )
        })
    }
}

/// Validates an array index: a whole, in-range number.
fn array_index(index: Value, len: usize, bracket: &Token) -> Result<usize, RuntimeError> {
    let Value::Number(n) = index else {
        return Err(RuntimeError::at(
            bracket,
            "Arrays can only be indexed with integers",
        ));
    };
    if !is_whole(n) {
        return Err(RuntimeError::at(
            bracket,
            "Arrays can only be indexed with integers",
        ));
    }
    if n < 0.0 || n >= len as f64 {
        return Err(RuntimeError::at(bracket, "Array index out of range"));
    }
    Ok(n as usize)
}
