// ==============================================================================
// Library Integration Tests: Canonicalization and Scoring End to End
// ==============================================================================
//
// These tests drive the public API (`Comparison`, `canonicalize_source`,
// `batch`) the way the binary does, from source text or files on disk to
// canonical text and scores.

mod common;

use std::fs;

use pretty_assertions::assert_eq;
use pysimilar::batch::{self, Manifest};
use pysimilar::{Comparison, canonicalize, canonicalize_source, distance, parse_module, score};

use common::{manifest_line, write_file};

fn canonical(source: &str) -> String {
    canonicalize_source(source, "test.py", None).expect("test source should parse")
}

// ==============================================================================
// Pipeline Scenarios
// ==============================================================================

#[test]
fn renamed_function_is_identical() {
    let output = Comparison::new()
        .compare_str("def f(x):\n return x+1\n", "def g(y):\n return y+1\n")
        .expect("both sources should parse");
    assert_eq!(output.first, "def func0(arg0):\n    return id0 + 1");
    assert_eq!(output.first, output.second);
    assert_eq!(output.score.to_string(), "0.000");
}

#[test]
fn one_character_difference() {
    let output = Comparison::new()
        .compare_str("def f():\n return 1\n", "def f():\n return 2\n")
        .expect("both sources should parse");
    let len = output.first.chars().count();
    assert_eq!(output.distance, 1);
    assert_eq!(output.score.to_string(), format!("{:.3}", 1.0 / len as f64));
    assert_eq!(output.score.to_string(), "0.040");
}

#[test]
fn filter_for_absent_function_keeps_other_content() {
    let mut comparison = Comparison::new();
    comparison.function("missing");
    let text = comparison
        .canonicalize_str("import sys\n\ndef main():\n    pass\n\nCONFIG = {'debug': True}\n")
        .expect("source should parse");
    assert_eq!(text, "import sys\nid0 = {'debug': True}");
}

#[test]
fn eleventh_function_uses_hex() {
    let source: String = (0..11).map(|i| format!("def f{i}(): pass\n")).collect();
    let text = canonical(&source);
    let last = text.lines().filter(|l| l.starts_with("def ")).last();
    assert_eq!(last, Some("def funca():"));
}

#[test]
fn canonicalization_is_deterministic_across_calls() {
    let source = "class Stack:\n    def push(self, item):\n        self.items.append(item)\n";
    let first = canonical(source);
    let second = canonicalize(parse_module(source).expect("source should parse"), None);
    assert_eq!(first, second);
}

#[test]
fn match_statements_are_canonicalized() {
    let output = Comparison::new()
        .compare_str(
            "def handle(cmd):\n    match cmd:\n        case ['go', where]:\n            return where\n        case _:\n            return None\n",
            "def route(command):\n    match command:\n        case [\"go\", where]: return where\n        case _: return None\n",
        )
        .expect("both sources should parse");
    assert_eq!(
        output.first,
        "def func0(arg0):\n    match id0:\n        case ['go', where]:\n            return id1\n        case _:\n            return None"
    );
    assert_eq!(output.first, output.second);
    assert_eq!(output.score.to_string(), "0.000");
}

#[test]
fn restructured_code_is_not_equivalent() {
    let output = Comparison::new()
        .compare_str(
            "def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n",
            "def total(xs):\n    return sum(xs)\n",
        )
        .expect("both sources should parse");
    assert!(output.score.value() > 0.0);
    assert_eq!(output.distance, distance(&output.first, &output.second));
}

#[test]
fn score_depends_on_argument_order() {
    let forward = score("x", "xx").expect("non-empty first text");
    let backward = score("xx", "x").expect("non-empty first text");
    assert_eq!(forward.to_string(), "1.000");
    assert_eq!(backward.to_string(), "0.500");
}

#[test]
fn comments_docstrings_and_layout_are_ignored() {
    let original = "\
def mean(values):
    \"\"\"Return the arithmetic mean.\"\"\"
    # guard against empty input
    if not values:
        return 0
    return sum(values) / len(values)
";
    let disguised = "\
def average(nums):
    '''Average.'''
    if not nums: return 0
    return (sum(nums)) / (len(nums))
";
    assert_eq!(canonical(original), canonical(disguised));
}

// ==============================================================================
// Batch Driver
// ==============================================================================

#[test]
fn batch_writes_one_line_per_pair() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let a = write_file(dir.path(), "a.py", "def f(x):\n return x+1\n");
    let b = write_file(dir.path(), "b.py", "def g(y):\n return y+1\n");
    let c = write_file(dir.path(), "c.py", "def f():\n return 1\n");
    let d = write_file(dir.path(), "d.py", "def f():\n return 2\n");
    let manifest_path = write_file(
        dir.path(),
        "pairs.txt",
        &(manifest_line(&a, &b) + &manifest_line(&c, &d)),
    );
    let output = dir.path().join("scores.txt");

    let manifest = Manifest::read(&manifest_path).expect("manifest should parse");
    batch::run(&manifest, &output, &Comparison::new()).expect("batch should succeed");

    assert_eq!(
        fs::read_to_string(&output).expect("read scores"),
        "0.000\n0.040\n"
    );
}

#[test]
fn batch_keeps_results_before_a_failure() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let good = write_file(dir.path(), "good.py", "x = 1\n");
    let bad = write_file(dir.path(), "bad.py", "def broken(:\n");
    let manifest_path = write_file(
        dir.path(),
        "pairs.txt",
        &(manifest_line(&good, &good) + &manifest_line(&good, &bad)),
    );
    let output = dir.path().join("scores.txt");

    let manifest = Manifest::read(&manifest_path).expect("manifest should parse");
    let err = batch::run(&manifest, &output, &Comparison::new()).unwrap_err();
    assert!(format!("{err}").contains("manifest line 2"), "got: {err}");
    assert_eq!(fs::read_to_string(&output).expect("read scores"), "0.000\n");
}

#[test]
fn batch_truncates_existing_output() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let a = write_file(dir.path(), "a.py", "y = 2\n");
    let manifest_path = write_file(dir.path(), "pairs.txt", &manifest_line(&a, &a));
    let output = write_file(dir.path(), "scores.txt", "stale\nstale\nstale\n");

    let manifest = Manifest::read(&manifest_path).expect("manifest should parse");
    batch::run(&manifest, &output, &Comparison::new()).expect("batch should succeed");
    assert_eq!(fs::read_to_string(&output).expect("read scores"), "0.000\n");
}
