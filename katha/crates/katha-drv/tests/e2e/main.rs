//! End-to-end tests for the `katha` binary.

mod cli_tests;
mod run_tests;

use std::path::PathBuf;

/// The fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("e2e")
        .join("fixtures")
}

/// The path to the katha binary under test.
pub fn katha_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_katha"))
}
