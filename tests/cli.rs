// ==============================================================================
// CLI Integration Tests: Exercise the `pysimilar` Binary via Subprocess
// ==============================================================================
//
// These tests run the compiled binary with `assert_cmd`, checking exit codes,
// stderr content and the output file. Inputs live in a fresh temporary
// directory per test.

mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{manifest_line, write_file};

/// Helper to construct a `Command` for the `pysimilar` binary built by this
/// crate.
#[allow(deprecated)] // cargo_bin() warns about custom build-dir; acceptable here
fn pysimilar_cmd() -> Command {
    Command::cargo_bin("pysimilar").expect("pysimilar binary should be built by cargo")
}

#[test]
fn test_cli_scores_pairs_in_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let a = write_file(dir.path(), "a.py", "def f(x):\n return x+1\n");
    let b = write_file(dir.path(), "b.py", "def g(y):\n return y+1\n");
    let c = write_file(dir.path(), "c.py", "x\n");
    let d = write_file(dir.path(), "d.py", "x\nx\n");
    let manifest = write_file(
        dir.path(),
        "input.txt",
        &(manifest_line(&a, &b) + &manifest_line(&c, &d) + &manifest_line(&d, &c)),
    );
    let output = dir.path().join("output.txt");

    pysimilar_cmd()
        .arg(&manifest)
        .arg(&output)
        .assert()
        .success();

    // "id0" against "id0\nid0": four insertions over three characters.
    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        "0.000\n1.333\n0.571\n"
    );
}

#[test]
fn test_cli_help() {
    pysimilar_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("usage: pysimilar INPUT OUTPUT"));
    pysimilar_cmd().arg("-h").assert().success();
}

#[test]
fn test_cli_missing_arguments() {
    pysimilar_cmd()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("missing argument INPUT"))
        .stderr(predicate::str::contains("usage"));

    pysimilar_cmd()
        .arg("input.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing argument OUTPUT"));
}

#[test]
fn test_cli_extra_argument() {
    pysimilar_cmd()
        .args(["a", "b", "c"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("c"));
}

#[test]
fn test_cli_unknown_option() {
    pysimilar_cmd()
        .args(["--verbose", "a", "b"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--verbose"));
}

#[test]
fn test_cli_nonexistent_manifest() {
    let dir = tempfile::tempdir().expect("create temp dir");
    pysimilar_cmd()
        .arg(dir.path().join("nonexistent.txt"))
        .arg(dir.path().join("out.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.txt"));
}

#[test]
fn test_cli_syntax_error_keeps_earlier_lines() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let good = write_file(dir.path(), "good.py", "print('hi')\n");
    let bad = write_file(dir.path(), "bad.py", "def f(:\n    pass\n");
    let manifest = write_file(
        dir.path(),
        "input.txt",
        &(manifest_line(&good, &good) + &manifest_line(&bad, &good)),
    );
    let output = dir.path().join("output.txt");

    pysimilar_cmd()
        .arg(&manifest)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.py"))
        .stderr(predicate::str::contains("invalid syntax"));

    assert_eq!(fs::read_to_string(&output).expect("read output"), "0.000\n");
}

#[test]
fn test_cli_malformed_manifest_line() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let manifest = write_file(dir.path(), "input.txt", "only_one_path.py\n");
    pysimilar_cmd()
        .arg(&manifest)
        .arg(dir.path().join("output.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed pair on line 1"));
}

#[test]
fn test_cli_blank_lines_warn_but_succeed() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let a = write_file(dir.path(), "a.py", "a = 1\n");
    let manifest = write_file(
        dir.path(),
        "input.txt",
        &(manifest_line(&a, &a) + "\n" + &manifest_line(&a, &a)),
    );
    let output = dir.path().join("output.txt");

    pysimilar_cmd()
        .arg(&manifest)
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("skipping blank line 2"));

    assert_eq!(
        fs::read_to_string(&output).expect("read output"),
        "0.000\n0.000\n"
    );
}

#[test]
fn test_cli_empty_first_file_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let empty = write_file(dir.path(), "empty.py", "# nothing here\n");
    let other = write_file(dir.path(), "other.py", "x = 1\n");
    let manifest = write_file(dir.path(), "input.txt", &manifest_line(&empty, &other));

    pysimilar_cmd()
        .arg(&manifest)
        .arg(dir.path().join("output.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty canonical form"));
}
