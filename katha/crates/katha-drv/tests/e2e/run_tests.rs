//! Script execution tests over the fixture programs.

use assert_cmd::Command;

use crate::{fixtures_dir, katha_bin};

fn run_fixture(name: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::new(katha_bin());
    cmd.arg(fixtures_dir().join(name));
    cmd.assert()
}

/// Scenario 1 + 2: precedence and right-associative exponent.
#[test]
fn test_arithmetic() {
    run_fixture("arithmetic.kth").success().stdout("7\n512\n");
}

/// Scenario 3: while loop with counter.
#[test]
fn test_loop() {
    run_fixture("loop.kth").success().stdout("0\n1\n2\n");
}

/// Scenario 4: recursive fibonacci.
#[test]
fn test_fib() {
    run_fixture("fib.kth").success().stdout("55\n");
}

/// Scenario 5: array subscript assignment and length.
#[test]
fn test_arrays() {
    run_fixture("arrays.kth").success().stdout("99\n3\n");
}

/// Scenario 6: map insertion through append.
#[test]
fn test_maps() {
    run_fixture("maps.kth").success().stdout("3\n");
}

/// Scenario 7: stdlib import and module call.
#[test]
fn test_modules() {
    run_fixture("modules.kth").success().stdout("1024\n");
}

/// Scenario 8: Bengali-digit strings concatenate verbatim, and a
/// fully Bengali program runs.
#[test]
fn test_bengali() {
    // Number printing normalizes digits to ASCII; strings keep
    // their script verbatim.
    run_fixture("bengali.kth")
        .success()
        .stdout("১২৩४\n0\n1\n2\n");
}

/// Closures share captured bindings through upvalues.
#[test]
fn test_closures() {
    run_fixture("closures.kth").success().stdout("2\n2\n5\n");
}

/// Runtime errors stop the script after partial output.
#[test]
fn test_divide_by_zero_stops() {
    run_fixture("divide_by_zero.kth")
        .failure()
        .stdout("before\n");
}
