//! The `os` module (`ওএস`).
//!
//! Platform answers use their Bengali renderings; anything the
//! platform cannot answer is nil.

use kgc::{NativeCtx, Value};

use super::StdEntry;

const OS_NAME_LINUX: &str = "লিনাক্স";
const OS_NAME_WIN: &str = "উইন্ডোজ";
const OS_NAME_MAC: &str = "ম্যাকওএস";

const OS_ARCH_ARM: &str = "আর্ম";
const OS_ARCH_X86: &str = "এক্স86";
const OS_ARCH_X86_64: &str = "এক্স86_64";

pub(super) const ENTRIES: &[StdEntry] = &[
    StdEntry {
        names: &["name", "নাম"],
        arity: 0,
        func: os_name,
    },
    StdEntry {
        names: &["arch", "আর্চ"],
        arity: 0,
        func: os_arch,
    },
    StdEntry {
        names: &["username", "ব্যবহারকারী"],
        arity: 0,
        func: os_username,
    },
    StdEntry {
        names: &["home", "ঘর"],
        arity: 0,
        func: os_home,
    },
    StdEntry {
        names: &["cwd", "বর্তমান"],
        arity: 0,
        func: os_cwd,
    },
];

/// `name()`: the operating system, or nil when unknown.
fn os_name(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    let name = if cfg!(target_os = "linux") {
        OS_NAME_LINUX
    } else if cfg!(target_os = "windows") {
        OS_NAME_WIN
    } else if cfg!(target_os = "macos") {
        OS_NAME_MAC
    } else {
        return Ok(Value::Nil);
    };
    Ok(Value::Obj(ctx.heap.alloc_string(name)))
}

/// `arch()`: the processor architecture, or nil when unknown.
fn os_arch(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    let arch = if cfg!(target_arch = "x86_64") {
        OS_ARCH_X86_64
    } else if cfg!(target_arch = "x86") {
        OS_ARCH_X86
    } else if cfg!(any(target_arch = "aarch64", target_arch = "arm")) {
        OS_ARCH_ARM
    } else {
        return Ok(Value::Nil);
    };
    Ok(Value::Obj(ctx.heap.alloc_string(arch)))
}

/// `username()`: the current user's name, or nil.
fn os_username(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    from_env(ctx, &["USER", "USERNAME"])
}

/// `home()`: the user's home directory, or nil.
fn os_home(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    from_env(ctx, &["HOME", "USERPROFILE"])
}

/// `cwd()`: the working directory, or nil.
fn os_cwd(ctx: &mut NativeCtx<'_>, _args: &[Value]) -> Result<Value, String> {
    match std::env::current_dir() {
        Ok(path) => Ok(Value::Obj(
            ctx.heap.alloc_string(path.to_string_lossy().into_owned()),
        )),
        Err(_) => Ok(Value::Nil),
    }
}

fn from_env(ctx: &mut NativeCtx<'_>, keys: &[&str]) -> Result<Value, String> {
    for key in keys {
        if let Ok(value) = std::env::var(key) {
            return Ok(Value::Obj(ctx.heap.alloc_string(value)));
        }
    }
    Ok(Value::Nil)
}
