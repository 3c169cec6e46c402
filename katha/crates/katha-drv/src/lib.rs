//! katha-drv - Interpreter Driver
//!
//! ============================================================================
//! OVERVIEW
//! ============================================================================
//!
//! The driver is the entry point and orchestrator for the whole
//! pipeline. It is responsible for:
//!
//! 1. FILE MANAGEMENT
//!    - Read the script file
//!    - Strip a leading UTF-8 BOM
//!    - Lossy-decode invalid UTF-8 to U+FFFD
//!
//! 2. PIPELINE ORCHESTRATION
//!    - Run the phases in order, stopping early per `--emit`
//!    - Choose the back end (tree-walking interpreter or, for the
//!      supported subset, the bytecode VM)
//!
//! 3. ERROR REPORTING
//!    - Render every diagnostic as
//!      `[Line <n>] [Col <c>] <phase>: <message>`
//!    - Exit non-zero on any lexer, parser, or runtime error
//!
//! ============================================================================
//! PIPELINE
//! ============================================================================
//!
//! ```text
//! Script (.kth)
//!       │
//!       ▼
//!  [Read + BOM strip]
//!       │
//!       ▼
//!  [Lexer] ──▶ tokens            --emit tokens stops here
//!       │
//!       ▼
//!  [Parser] ──▶ statements       --emit ast stops here
//!       │
//!       ├──▶ [Interpreter]       default back end
//!       │
//!       └──▶ [Compiler] ──▶ bytecode ──▶ [VM]
//!                                --backend vm / --emit bytecode
//! ```
//!
//! Exit codes: 0 on success, 1 on any reported error.

use std::io::Write;
use std::path::PathBuf;

use katha_lex::Lexer;
use katha_par::Parser;
use katha_rt::Interpreter;
use katha_util::{Diagnostic, Handler, HashSeed, Phase, Span};
use kgc::GcConfig;
use log::info;

/// What the driver should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitKind {
    /// Dump the token stream and stop.
    Tokens,
    /// Dump the parsed statements and stop.
    Ast,
    /// Dump the compiled bytecode listing and stop.
    Bytecode,
    /// Execute the script.
    Run,
}

/// Which execution engine runs the script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// The tree-walking interpreter (the reference back end).
    Tree,
    /// The bytecode compiler + stack VM, for the supported subset.
    Vm,
}

/// Driver configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Path to the script file.
    pub script: PathBuf,
    /// What to produce.
    pub emit: EmitKind,
    /// Execution engine.
    pub backend: Backend,
    /// Collect at every safepoint.
    pub gc_stress: bool,
}

impl Config {
    /// Creates a config that just runs a script with defaults.
    pub fn run_file(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            emit: EmitKind::Run,
            backend: Backend::Tree,
            gc_stress: false,
        }
    }
}

/// One driver invocation.
pub struct Session {
    config: Config,
}

impl Session {
    /// Creates a session.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the pipeline, writing program output to `out` and
    /// diagnostics to `err_out`. Returns the process exit code.
    pub fn run(&self, out: &mut dyn Write, err_out: &mut dyn Write) -> anyhow::Result<i32> {
        let source = match read_source(&self.config.script) {
            Ok(source) => source,
            Err(e) => {
                writeln!(
                    err_out,
                    "error: cannot read '{}': {}",
                    self.config.script.display(),
                    e
                )?;
                return Ok(1);
            },
        };
        self.run_source(&source, out, err_out)
    }

    /// Runs the pipeline over already-loaded source text.
    pub fn run_source(
        &self,
        source: &str,
        out: &mut dyn Write,
        err_out: &mut dyn Write,
    ) -> anyhow::Result<i32> {
        let seed = HashSeed::from_clock();
        let mut handler = Handler::new();

        // Phase 1: lexing.
        info!("lexing {}", self.config.script.display());
        let tokens = Lexer::new(source, &mut handler, &seed).scan();

        if self.config.emit == EmitKind::Tokens {
            for token in &tokens {
                writeln!(out, "{}", token)?;
            }
            handler.print_all(err_out)?;
            return Ok(if handler.has_errors() { 1 } else { 0 });
        }

        // Phase 2: parsing.
        info!("parsing ({} tokens)", tokens.len());
        let program = Parser::new(tokens, &mut handler).parse();

        if handler.has_errors() {
            handler.print_all(err_out)?;
            return Ok(1);
        }

        if self.config.emit == EmitKind::Ast {
            writeln!(out, "{:#?}", program)?;
            return Ok(0);
        }

        // Phase 3: execution.
        let gc_config = GcConfig {
            stress: self.config.gc_stress,
            ..Default::default()
        };

        match (self.config.backend, self.config.emit) {
            (Backend::Vm, _) | (_, EmitKind::Bytecode) => {
                self.run_vm(&program, gc_config, seed, out, err_out)
            },
            (Backend::Tree, _) => {
                let mut interpreter = Interpreter::new(gc_config, seed, out);
                match interpreter.run(&program) {
                    Ok(()) => Ok(0),
                    Err(e) => {
                        writeln!(err_out, "{}", e.to_diagnostic().render())?;
                        Ok(1)
                    },
                }
            },
        }
    }

    /// Compiles and executes through the bytecode back end.
    fn run_vm(
        &self,
        program: &[katha_par::Stmt],
        gc_config: GcConfig,
        seed: HashSeed,
        out: &mut dyn Write,
        err_out: &mut dyn Write,
    ) -> anyhow::Result<i32> {
        let mut heap = kgc::Heap::new(gc_config, seed);

        let code = match katha_vm::Compiler::new(&mut heap).compile(program) {
            Ok(code) => code,
            Err(e) => {
                let diagnostic = Diagnostic::error(
                    Phase::Internal,
                    e.to_string(),
                    Span::point(e.line(), e.column()),
                );
                writeln!(err_out, "{}", diagnostic.render())?;
                return Ok(1);
            },
        };

        if self.config.emit == EmitKind::Bytecode {
            write!(out, "{}", code.disassemble())?;
            return Ok(0);
        }

        let mut vm = katha_vm::Vm::new(&mut heap, out);
        match vm.run(&code) {
            Ok(()) => Ok(0),
            Err(e) => {
                let diagnostic = Diagnostic::error(
                    Phase::Runtime,
                    e.message.clone(),
                    Span::point(e.line, e.column),
                );
                writeln!(err_out, "{}", diagnostic.render())?;
                Ok(1)
            },
        }
    }
}

/// Reads a script: bytes from disk, BOM stripped, invalid UTF-8
/// replaced with U+FFFD.
pub fn read_source(path: &std::path::Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let bytes = match bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        Some(rest) => rest,
        None => &bytes,
    };
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
