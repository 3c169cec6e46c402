//! The `katha` binary: parse the command line, build a session, run
//! it, and exit with its code.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use katha_drv::{Backend, Config, EmitKind, Session};

/// The Katha programming language.
#[derive(Parser, Debug)]
#[command(name = "katha", author, version, about)]
struct Cli {
    /// Script file to run.
    file: PathBuf,

    /// What to produce.
    #[arg(long, value_enum, default_value_t = EmitArg::Run)]
    emit: EmitArg,

    /// Execution engine.
    #[arg(long, value_enum, default_value_t = BackendArg::Tree)]
    backend: BackendArg,

    /// Collect garbage at every safepoint (debug aid).
    #[arg(long)]
    gc_stress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmitArg {
    Tokens,
    Ast,
    Bytecode,
    Run,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Tree,
    Vm,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("warning: failed to initialize logging: {e}");
    }

    let config = Config {
        script: cli.file,
        emit: match cli.emit {
            EmitArg::Tokens => EmitKind::Tokens,
            EmitArg::Ast => EmitKind::Ast,
            EmitArg::Bytecode => EmitKind::Bytecode,
            EmitArg::Run => EmitKind::Run,
        },
        backend: match cli.backend {
            BackendArg::Tree => Backend::Tree,
            BackendArg::Vm => Backend::Vm,
        },
        gc_stress: cli.gc_stress,
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err_out = stderr.lock();

    let code = match Session::new(config).run(&mut out, &mut err_out) {
        Ok(code) => code,
        Err(e) => {
            let _ = writeln!(err_out, "error: {e}");
            2
        },
    };
    let _ = out.flush();
    let _ = err_out.flush();
    std::process::exit(code);
}
