//! Module registry.
//!
//! `import chobi = "math"` binds the local name `chobi` to a proxy
//! for a freshly-instantiated standard-library module. Proxies are a
//! separate namespace from ordinary variables and are only reachable
//! through the `.` operator.

use kgc::EnvRef;

/// Where a module's bindings came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    /// Built-in standard-library module.
    Stdlib,
    /// Script-file module. Declared extension point; the resolver
    /// only produces stdlib modules today.
    Script,
}

/// One loaded module.
#[derive(Debug)]
pub struct Module {
    /// The import path string, e.g. `"math"` or `"গণিত"`.
    pub pathname: String,
    /// The module's root environment, registered as a GC root.
    pub env: EnvRef,
    /// Module kind tag.
    pub kind: ModuleKind,
}

/// The standard-library modules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StdlibModule {
    Math,
    Os,
    Map,
    Array,
    Str,
}

/// Resolves an import path to a standard-library module. English and
/// Bengali names are accepted.
///
/// # Examples
///
/// ```
/// use katha_rt::modules::{resolve_stdlib, StdlibModule};
///
/// assert_eq!(resolve_stdlib("math"), Some(StdlibModule::Math));
/// assert_eq!(resolve_stdlib("গণিত"), Some(StdlibModule::Math));
/// assert_eq!(resolve_stdlib("nothing"), None);
/// ```
pub fn resolve_stdlib(pathname: &str) -> Option<StdlibModule> {
    match pathname {
        "math" | "গণিত" => Some(StdlibModule::Math),
        "os" | "ওএস" => Some(StdlibModule::Os),
        "map" | "ম্যাপ" => Some(StdlibModule::Map),
        "array" | "তালিকা" => Some(StdlibModule::Array),
        "string" => Some(StdlibModule::Str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_scripts_resolve() {
        assert_eq!(resolve_stdlib("os"), Some(StdlibModule::Os));
        assert_eq!(resolve_stdlib("ওএস"), Some(StdlibModule::Os));
        assert_eq!(resolve_stdlib("map"), Some(StdlibModule::Map));
        assert_eq!(resolve_stdlib("ম্যাপ"), Some(StdlibModule::Map));
        assert_eq!(resolve_stdlib("array"), Some(StdlibModule::Array));
        assert_eq!(resolve_stdlib("তালিকা"), Some(StdlibModule::Array));
        assert_eq!(resolve_stdlib("string"), Some(StdlibModule::Str));
    }

    #[test]
    fn test_gfx_is_absent() {
        assert_eq!(resolve_stdlib("gfx"), None);
    }
}
