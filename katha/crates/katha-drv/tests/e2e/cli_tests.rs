//! CLI surface tests: flags, exit codes, diagnostics format.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::{fixtures_dir, katha_bin};

/// Test 1: Help Output
#[test]
fn test_cli_help() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("katha"));
}

/// Test 2: Version Output
#[test]
fn test_cli_version() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("katha"));
}

/// Test 3: Missing Script File
/// A nonexistent path exits non-zero with a readable message.
#[test]
fn test_cli_missing_file() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("definitely_not_here.kth");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

/// Test 4: Parse Error Exit Code
/// A script with a syntax error exits 1 and renders the diagnostic
/// in the `[Line n] [Col c] Parser: ...` format.
#[test]
fn test_cli_parse_error() {
    let temp_dir = TempDir::new().expect("temp dir");
    let script = temp_dir.path().join("broken.kth");
    std::fs::write(&script, "let = 5").expect("write fixture");

    let mut cmd = Command::new(katha_bin());
    cmd.arg(&script);

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::is_match(r"\[Line \d+\] \[Col \d+\] Parser:").unwrap());
}

/// Test 5: Runtime Error Exit Code
#[test]
fn test_cli_runtime_error() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg(fixtures_dir().join("divide_by_zero.kth"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Runtime: Division by zero"));
}

/// Test 6: Token Dump
#[test]
fn test_cli_emit_tokens() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--emit").arg("tokens").arg(fixtures_dir().join("arithmetic.kth"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Num"))
        .stdout(predicate::str::contains("EOF"));
}

/// Test 7: AST Dump
#[test]
fn test_cli_emit_ast() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--emit").arg("ast").arg(fixtures_dir().join("arithmetic.kth"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Print"));
}

/// Test 8: GC Stress Mode
/// The stress flag must not change observable behavior.
#[test]
fn test_cli_gc_stress_same_output() {
    let fixture = fixtures_dir().join("closures.kth");

    let plain = Command::new(katha_bin())
        .arg(&fixture)
        .output()
        .expect("run plain");
    let stressed = Command::new(katha_bin())
        .arg("--gc-stress")
        .arg(&fixture)
        .output()
        .expect("run stressed");

    assert!(plain.status.success());
    assert!(stressed.status.success());
    assert_eq!(plain.stdout, stressed.stdout);
}

/// Test 9: VM Back End on the Supported Subset
#[test]
fn test_cli_vm_backend() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--backend").arg("vm").arg(fixtures_dir().join("arithmetic.kth"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("7"));
}

/// Test 10: Bytecode Listing
#[test]
fn test_cli_emit_bytecode() {
    let mut cmd = Command::new(katha_bin());
    cmd.arg("--emit").arg("bytecode").arg(fixtures_dir().join("arithmetic.kth"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CONST"))
        .stdout(predicate::str::contains("RETURN"));
}

/// Test 11: BOM Handling
/// A script with a UTF-8 byte-order mark runs normally.
#[test]
fn test_cli_bom_stripped() {
    let temp_dir = TempDir::new().expect("temp dir");
    let script = temp_dir.path().join("bom.kth");
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("print 42".as_bytes());
    std::fs::write(&script, bytes).expect("write fixture");

    let mut cmd = Command::new(katha_bin());
    cmd.arg(&script);

    cmd.assert().success().stdout("42\n");
}
