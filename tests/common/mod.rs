// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use miette::{GraphicalReportHandler, GraphicalTheme};

/// Render a report to a deterministic string: ASCII theme, no color,
/// 80 columns.
pub fn render_report(report: &miette::Report) -> String {
    render_diagnostic(report.as_ref())
}

pub fn render_diagnostic(diag: &dyn miette::Diagnostic) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, diag)
        .expect("render to String is infallible");
    buf
}

/// Render multiple reports, separated by blank lines.
pub fn render_reports(reports: &[miette::Report]) -> String {
    let mut buf = String::new();
    for (i, r) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(buf).expect("write to String is infallible");
        }
        buf.push_str(&render_report(r));
    }
    buf
}

/// Write `contents` to `dir/name` and return the full path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    path
}

/// A manifest line pairing two paths.
pub fn manifest_line(first: &Path, second: &Path) -> String {
    format!("{} {}\n", first.display(), second.display())
}
