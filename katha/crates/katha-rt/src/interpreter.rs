//! Statement execution and interpreter state.

use std::io::Write;
use std::rc::Rc;

use katha_lex::Token;
use katha_par::Stmt;
use katha_util::{HashSeed, Name};
use kgc::{EnvRef, GcConfig, Heap, ObjKind, Value};
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::RuntimeError;
use crate::modules::{resolve_stdlib, Module, ModuleKind};
use crate::natives::register_globals;
use crate::printer::render_value;
use crate::stdlib::populate_module;

/// Default maximum call depth before a runtime error.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// The result of executing one statement.
#[derive(Clone, Copy, Debug)]
pub enum Flow {
    /// Ordinary completion with a value.
    Normal(Value),
    /// `break` unwinding to the nearest loop.
    Break,
    /// `return` unwinding to the nearest call.
    Return(Value),
}

/// The tree-walking interpreter.
///
/// Owns the heap, the global environment, and the module registry.
/// Output from `print` and `show` goes to the supplied writer, so
/// tests can capture it and the driver can hand over stdout.
pub struct Interpreter<'w> {
    /// The collected heap. Public so natives and the driver can
    /// inspect values after a run.
    pub heap: Heap,
    globals: EnvRef,
    modules: Vec<Module>,
    proxies: FxHashMap<Name, usize>,
    call_depth: usize,
    max_call_depth: usize,
    pub(crate) out: &'w mut dyn Write,
}

impl<'w> Interpreter<'w> {
    /// Creates an interpreter.
    ///
    /// `seed` must be the same seed the token stream was lexed with:
    /// identifier hashes computed by the lexer key the environment
    /// tables directly.
    pub fn new(config: GcConfig, seed: HashSeed, out: &'w mut dyn Write) -> Self {
        let mut heap = Heap::new(config, seed);
        let globals = heap.env_new(None);
        heap.add_root(globals);

        let mut interpreter = Self {
            heap,
            globals,
            modules: Vec::new(),
            proxies: FxHashMap::default(),
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            out,
        };
        register_globals(&mut interpreter);
        interpreter
    }

    /// The global environment.
    pub fn globals(&self) -> EnvRef {
        self.globals
    }

    /// Runs a program, collecting garbage between statements.
    ///
    /// A top-level `return` is a runtime error; a top-level `break`
    /// is ignored.
    pub fn run(&mut self, program: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in program {
            let flow = self.execute(stmt, self.globals)?;
            if let Flow::Return(_) = flow {
                return Err(RuntimeError {
                    message: "Cannot return from top-level code".to_string(),
                    line: stmt_token(stmt).map(|t| t.line).unwrap_or(0),
                    column: stmt_token(stmt).map(|t| t.column).unwrap_or(0),
                });
            }
            self.heap.safepoint();
        }
        debug!("run finished: {}", self.heap.stats());
        Ok(())
    }

    /// Executes one statement in `env`.
    pub fn execute(&mut self, stmt: &Stmt, env: EnvRef) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr { expr } => Ok(Flow::Normal(self.eval(expr, env)?)),

            Stmt::Print { expr, .. } => {
                let value = self.eval(expr, env)?;
                let text = render_value(&self.heap, value);
                writeln!(self.out, "{}", text).map_err(|e| RuntimeError {
                    message: format!("Failed to write output: {e}"),
                    line: 0,
                    column: 0,
                })?;
                Ok(Flow::Normal(Value::Nil))
            },

            Stmt::Let { name, init } => {
                let value = self.eval(init, env)?;
                let name = name_of(name);
                self.heap.env_put(env, &name, value);
                Ok(Flow::Normal(value))
            },

            Stmt::Block { stmts } => self.execute_block(stmts, env),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let condition = self.eval(cond, env)?;
                if condition.is_truthy() {
                    self.execute(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, env)
                } else {
                    Ok(Flow::Normal(Value::Nil))
                }
            },

            Stmt::While { cond, body, .. } => {
                while self.eval(cond, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                        Flow::Normal(_) => {},
                    }
                }
                Ok(Flow::Normal(Value::Nil))
            },

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            },

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Func {
                name, params, body, ..
            } => {
                self.declare_function(name, params, body, env);
                Ok(Flow::Normal(Value::Nil))
            },

            Stmt::Import { name, path, token } => {
                self.execute_import(name, path, token, env)?;
                Ok(Flow::Normal(Value::Nil))
            },

            Stmt::Panic { expr, token } => {
                let value = self.eval(expr, env)?;
                let text = render_value(&self.heap, value);
                Err(RuntimeError::at(token, format!("panic: {text}")))
            },
        }
    }

    /// Executes a block's statements in a fresh child scope,
    /// forwarding `break` and `return` to the enclosing construct.
    fn execute_block(&mut self, stmts: &[Stmt], env: EnvRef) -> Result<Flow, RuntimeError> {
        let block_env = self.heap.env_new(Some(env));
        for stmt in stmts {
            match self.execute(stmt, block_env)? {
                Flow::Normal(_) => {},
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal(Value::Nil))
    }

    /// Declares a function: builds the closure, binds it under its
    /// name, then promotes the declaring frame's bindings to shared
    /// upvalue cells so the closure and the scope converge on the
    /// same slots.
    fn declare_function(&mut self, name: &Token, params: &Rc<[Token]>, body: &Rc<Stmt>, env: EnvRef) {
        let fn_name = name_of(name);
        let param_names: Vec<Name> = params.iter().map(name_of).collect();
        let closure_env = self.heap.env_new(Some(env));

        let function = self.heap.alloc(ObjKind::Function(kgc::Function {
            name: fn_name.clone(),
            params: param_names.into(),
            body: Rc::clone(body),
            env: closure_env,
        }));

        self.heap.env_put(env, &fn_name, Value::Obj(function));
        self.heap.env_promote_upvalues(env);
    }

    /// Resolves an `import` statement.
    fn execute_import(
        &mut self,
        name: &Token,
        path: &katha_par::Expr,
        token: &Token,
        env: EnvRef,
    ) -> Result<(), RuntimeError> {
        let path_value = self.eval(path, env)?;
        let pathname = match self.heap.value_str(path_value) {
            Some(s) => s.value.to_string(),
            None => return Err(RuntimeError::at(token, "Import path must be a string")),
        };

        let Some(module) = resolve_stdlib(&pathname) else {
            return Err(RuntimeError::at(
                token,
                format!("Module not found: '{pathname}'"),
            ));
        };

        let module_env = self.heap.env_new(None);
        self.heap.add_root(module_env);
        populate_module(&mut self.heap, module_env, module);

        self.modules.push(Module {
            pathname,
            env: module_env,
            kind: ModuleKind::Stdlib,
        });
        self.proxies
            .insert(name_of(name), self.modules.len() - 1);
        Ok(())
    }

    /// Looks up a module proxy by local name.
    pub(crate) fn proxy(&self, name: &Name) -> Option<&Module> {
        self.proxies.get(name).map(|index| &self.modules[*index])
    }

    /// Call-depth bookkeeping for user function calls.
    pub(crate) fn enter_call(&mut self, at: &Token) -> Result<(), RuntimeError> {
        if self.call_depth + 1 > self.max_call_depth {
            return Err(RuntimeError::at(
                at,
                format!("Maximum call depth reached: {}", self.max_call_depth),
            ));
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Decrements the call depth. Paired with every `enter_call` on
    /// all exit paths, including errors.
    pub(crate) fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }
}

/// Builds the runtime [`Name`] of an identifier token, reusing the
/// hash computed by the lexer.
pub(crate) fn name_of(token: &Token) -> Name {
    Name::from_raw(token.lexeme.as_str(), token.hash)
}

/// The token of a statement, for error positions.
fn stmt_token(stmt: &Stmt) -> Option<&Token> {
    match stmt {
        Stmt::Print { token, .. }
        | Stmt::If { token, .. }
        | Stmt::While { token, .. }
        | Stmt::Return { token, .. }
        | Stmt::Break { token }
        | Stmt::Func { token, .. }
        | Stmt::Import { token, .. }
        | Stmt::Panic { token, .. } => Some(token),
        Stmt::Let { name, .. } => Some(name),
        Stmt::Expr { expr } => Some(expr.token()),
        Stmt::Block { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use katha_lex::Lexer;
    use katha_par::Parser;
    use katha_util::Handler;

    const TEST_SEED: (u64, u64) = (101, 202);

    /// Lexes, parses, and runs a source snippet; returns captured
    /// output and the run result.
    fn run_with_config(source: &str, config: GcConfig) -> (String, Result<(), RuntimeError>) {
        let seed = HashSeed::from_parts(TEST_SEED.0, TEST_SEED.1);
        let mut handler = Handler::new();
        let tokens = Lexer::new(source, &mut handler, &seed).scan();
        let program = Parser::new(tokens, &mut handler).parse();
        assert!(
            !handler.has_errors(),
            "unexpected front-end errors: {:?}",
            handler.diagnostics()
        );

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(config, seed, &mut out);
        let result = interpreter.run(&program);
        drop(interpreter);
        (String::from_utf8(out).expect("output is UTF-8"), result)
    }

    fn run(source: &str) -> (String, Result<(), RuntimeError>) {
        run_with_config(source, GcConfig::default())
    }

    fn run_ok(source: &str) -> String {
        let (output, result) = run(source);
        result.expect("script should succeed");
        output
    }

    fn run_err(source: &str) -> RuntimeError {
        let (_, result) = run(source);
        result.expect_err("script should fail")
    }

    // =====================================================================
    // END-TO-END SCENARIOS
    // =====================================================================

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(run_ok("print 1+2*3"), "7\n");
    }

    #[test]
    fn test_exponent_right_associative() {
        assert_eq!(run_ok("print 2**3**2"), "512\n");
    }

    #[test]
    fn test_while_loop_counts() {
        let source = "let x = 0  while x < 3 do  print x  x = x + 1  end";
        assert_eq!(run_ok(source), "0\n1\n2\n");
    }

    #[test]
    fn test_recursive_fibonacci() {
        let source = "\
func fib(n) if n < 2 then return n end return fib(n-1)+fib(n-2) end
print fib(10)";
        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_array_assign_and_len() {
        let source = "let a = [10,20,30]  a[1] = 99  print a[1]  print len(a)";
        assert_eq!(run_ok(source), "99\n3\n");
    }

    #[test]
    fn test_map_append_and_read() {
        let source = "let m = {\"k\": 1}  append(m, \"j\", 2)  print m[\"j\"]+m[\"k\"]";
        assert_eq!(run_ok(source), "3\n");
    }

    #[test]
    fn test_import_math_pow() {
        let source = "import math = \"math\"  print math.pow(2, 10)";
        assert_eq!(run_ok(source), "1024\n");
    }

    #[test]
    fn test_string_concat_keeps_digits_verbatim() {
        let source = "print \"১২৩\" + \"४\"";
        assert_eq!(run_ok(source), "১২৩४\n");
    }

    // =====================================================================
    // TRUTHINESS AND LOGICAL OPERATORS
    // =====================================================================

    #[test]
    fn test_numbers_are_falsy() {
        // Only the bool true is truthy; 1 is not.
        let source = "if 1 then print \"yes\" else print \"no\" end";
        assert_eq!(run_ok(source), "no\n");
    }

    #[test]
    fn test_bool_true_is_truthy() {
        let source = "if true then print \"yes\" else print \"no\" end";
        assert_eq!(run_ok(source), "yes\n");
    }

    #[test]
    fn test_logical_ops_return_bools() {
        // `or`/`and` yield bools, not operands.
        assert_eq!(run_ok("print 5 or true"), "সত্যি\n");
        assert_eq!(run_ok("print true and 5"), "মিথ্যা\n");
        assert_eq!(run_ok("print false or false"), "মিথ্যা\n");
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        let source = "\
let hit = 0
func side() hit = 1 return true end
print false and side()
print hit
print true or side()
print hit";
        assert_eq!(run_ok(source), "মিথ্যা\n0\nসত্যি\n0\n");
    }

    // =====================================================================
    // CLOSURES AND UPVALUES
    // =====================================================================

    #[test]
    fn test_closures_share_captured_binding() {
        let source = "\
let count = 0
func bump() count = count + 1 return count end
func peek() return count end
bump()
bump()
print peek()
print count";
        assert_eq!(run_ok(source), "2\n2\n");
    }

    #[test]
    fn test_closure_outlives_declaring_scope() {
        let source = "\
func make()
    let n = 0
    func get() return n end
    n = 5
    return get
end
let g = make()
print g()";
        assert_eq!(run_ok(source), "5\n");
    }

    #[test]
    fn test_enclosing_scope_sees_closure_writes() {
        let source = "\
func make()
    let n = 1
    func set() n = 42 return nil end
    set()
    return n
end
print make()";
        assert_eq!(run_ok(source), "42\n");
    }

    // =====================================================================
    // CONTROL FLOW
    // =====================================================================

    #[test]
    fn test_break_leaves_loop() {
        let source = "\
let i = 0
while true do
    if i == 2 then break end
    print i
    i = i + 1
end
print \"done\"";
        assert_eq!(run_ok(source), "0\n1\ndone\n");
    }

    #[test]
    fn test_return_unwinds_through_nested_blocks() {
        let source = "\
func f()
    while true do
        if true then return 9 end
    end
    return 0
end
print f()";
        assert_eq!(run_ok(source), "9\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        let source = "func f() let x = 1 end print f()";
        assert_eq!(run_ok(source), "নিল\n");
    }

    #[test]
    fn test_top_level_return_is_an_error() {
        let err = run_err("return 5");
        assert!(err.message.contains("top-level"));
    }

    // =====================================================================
    // RUNTIME ERRORS
    // =====================================================================

    #[test]
    fn test_division_by_zero() {
        let err = run_err("print 1 / 0");
        assert_eq!(err.message, "Division by zero");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_undefined_variable() {
        let err = run_err("print ghost");
        assert!(err.message.contains("Undefined variable 'ghost'"));
    }

    #[test]
    fn test_assignment_needs_existing_binding() {
        let err = run_err("ghost = 1");
        assert!(err.message.contains("Undefined assignment target"));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = run_err("func f(a, b) return a end f(1)");
        assert!(err.message.contains("needs 2 arguments but 1 was given"));
    }

    #[test]
    fn test_array_index_out_of_range() {
        let err = run_err("let a = [1]  print a[5]");
        assert_eq!(err.message, "Array index out of range");
    }

    #[test]
    fn test_array_index_must_be_whole() {
        let err = run_err("let a = [1]  print a[0.5]");
        assert!(err.message.contains("indexed with integers"));
    }

    #[test]
    fn test_map_missing_key() {
        let err = run_err("let m = {}  print m[\"x\"]");
        assert_eq!(err.message, "Key doesn't exist in map");
    }

    #[test]
    fn test_unhashable_map_key() {
        let err = run_err("let m = {[1]: 2}");
        assert_eq!(err.message, "Invalid key for map");
    }

    #[test]
    fn test_call_depth_limit() {
        let err = run_err("func f() return f() end print f()");
        assert!(err.message.contains("Maximum call depth reached"));
    }

    #[test]
    fn test_calling_a_number_fails() {
        let err = run_err("let x = 5 x()");
        assert_eq!(err.message, "Can only call functions");
    }

    #[test]
    fn test_type_mismatch_in_addition() {
        let err = run_err("print 1 + \"a\"");
        assert!(err.message.contains("Addition"));
    }

    #[test]
    fn test_panic_statement_is_terminal() {
        let (output, result) = run("print 1 panic \"boom\" print 2");
        assert_eq!(output, "1\n");
        let err = result.expect_err("panic should stop the script");
        assert_eq!(err.message, "panic: boom");
    }

    // =====================================================================
    // MODULES
    // =====================================================================

    #[test]
    fn test_unknown_module_is_an_error() {
        let err = run_err("import x = \"no_such\"");
        assert!(err.message.contains("Module not found"));
    }

    #[test]
    fn test_unknown_module_member() {
        let err = run_err("import math = \"math\"  print math.sin(1)");
        assert!(err.message.contains("no member 'sin'"));
    }

    #[test]
    fn test_module_alias_is_local_name() {
        let source = "import gonit = \"গণিত\"  print gonit.pow(3, 2)";
        assert_eq!(run_ok(source), "9\n");
    }

    #[test]
    fn test_import_path_must_be_string() {
        let err = run_err("import m = 42");
        assert!(err.message.contains("must be a string"));
    }

    #[test]
    fn test_string_module_grapheme_ops() {
        let source = "\
import string = \"string\"
print string.index(\"কথা\", 1)
print len(\"কথা\")";
        // \"কথা\" is two grapheme clusters: ক and থা.
        assert_eq!(run_ok(source), "থা\n2\n");
    }

    #[test]
    fn test_string_split() {
        let source = "\
import string = \"string\"
let parts = string.split(\"a,b,c\", \",\")
print len(parts)
print parts[2]";
        assert_eq!(run_ok(source), "3\nc\n");
    }

    #[test]
    fn test_map_module_keys_and_exists() {
        let source = "\
import map = \"map\"
let m = {\"a\": 1, \"b\": 2}
print map.exists(m, \"a\")
print map.exists(m, \"z\")
print len(map.keys(m))
print map.values(m)[1]";
        assert_eq!(run_ok(source), "সত্যি\nমিথ্যা\n2\n2\n");
    }

    #[test]
    fn test_array_module() {
        let source = "\
import array = \"array\"
let a = [10, 20, 30]
print array.index(a, 20)
print array.exists(a, 99)
print array.delete(a)
print array.delete(a, 0)
print len(a)";
        assert_eq!(run_ok(source), "1\nমিথ্যা\n30\n10\n1\n");
    }

    // =====================================================================
    // GARBAGE COLLECTION UNDER EXECUTION
    // =====================================================================

    #[test]
    fn test_stress_collection_preserves_live_values() {
        let config = GcConfig {
            stress: true,
            ..Default::default()
        };
        let source = "\
let keep = \"যত্ন\" + \"!\"
let i = 0
while i < 40 do
    let junk = \"gar\" + \"bage\"
    i = i + 1
end
print keep
print i";
        let (output, result) = run_with_config(source, config);
        result.expect("script should succeed under GC stress");
        assert_eq!(output, "যত্ন!\n40\n");
    }

    #[test]
    fn test_closure_env_survives_collection() {
        let config = GcConfig {
            stress: true,
            ..Default::default()
        };
        let source = "\
func make()
    let secret = \"রহস্য\"
    func tell() return secret end
    return tell
end
let t = make()
let i = 0
while i < 10 do
    let junk = [1, 2, 3]
    i = i + 1
end
print t()";
        let (output, result) = run_with_config(source, config);
        result.expect("script should succeed under GC stress");
        assert_eq!(output, "রহস্য\n");
    }

    // =====================================================================
    // NATIVES
    // =====================================================================

    #[test]
    fn test_show_spaces_no_newline() {
        let source = "show(\"ক\", 1, true)";
        assert_eq!(run_ok(source), "ক 1 সত্যি");
    }

    #[test]
    fn test_show_bengali_alias() {
        assert_eq!(run_ok("dekhao(7)"), "7");
        assert_eq!(run_ok("দেখাও(7)"), "7");
    }

    #[test]
    fn test_len_on_wrong_type_errors() {
        let err = run_err("print len(5)");
        assert!(err.message.contains("Length"));
    }

    #[test]
    fn test_append_variadic_on_array() {
        let source = "let a = []  print append(a, 1, 2, 3)  print a[2]";
        assert_eq!(run_ok(source), "3\n3\n");
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(run_ok("print clock() >= 0"), "সত্যি\n");
    }

    #[test]
    fn test_native_error_object_surfaces_at_call_site() {
        fn bad(ctx: &mut kgc::NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
            let err = ctx.heap.alloc_error("boom from native");
            Ok(Value::Obj(err))
        }

        let seed = HashSeed::from_parts(TEST_SEED.0, TEST_SEED.1);
        let mut handler = Handler::new();
        let tokens = Lexer::new("bad()", &mut handler, &seed).scan();
        let program = Parser::new(tokens, &mut handler).parse();

        let mut out = Vec::new();
        let mut interpreter = Interpreter::new(GcConfig::default(), seed, &mut out);
        let globals = interpreter.globals();
        let obj = interpreter.heap.alloc(ObjKind::Native(kgc::NativeDef {
            name: "bad",
            arity: 0,
            func: bad,
        }));
        let name = Name::new("bad", &seed);
        interpreter.heap.env_put(globals, &name, Value::Obj(obj));

        let err = interpreter.run(&program).expect_err("error object should surface");
        assert_eq!(err.message, "boom from native");
    }

    // =====================================================================
    // EQUALITY
    // =====================================================================

    #[test]
    fn test_equality_rules() {
        assert_eq!(run_ok("print 1 == 1"), "সত্যি\n");
        assert_eq!(run_ok("print \"ab\" == \"ab\""), "সত্যি\n");
        assert_eq!(run_ok("print nil == nil"), "সত্যি\n");
        // Mixed kinds are never equal.
        assert_eq!(run_ok("print 1 == \"1\""), "মিথ্যা\n");
        assert_eq!(run_ok("print nil == false"), "মিথ্যা\n");
        // Arrays compare by identity.
        assert_eq!(run_ok("let a = [1] let b = [1] print a == b"), "মিথ্যা\n");
        assert_eq!(run_ok("let a = [1] let b = a print a == b"), "সত্যি\n");
    }

    #[test]
    fn test_bengali_numerals_equal_ascii() {
        assert_eq!(run_ok("print ১২৩ == 123"), "সত্যি\n");
        assert_eq!(run_ok("print ৩.১৪ + 0 == 3.14"), "সত্যি\n");
    }
}
