// ==============================================================================
// Batch Driver: Manifest In, Scores Out
// ==============================================================================
//
// A manifest lists one comparison per line as two whitespace-separated paths.
// `run` scores the pairs in order and writes one line per pair, flushing each
// line as soon as it is written, so that when a later pair fails the results
// for earlier pairs are already on disk.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use miette::{Context, NamedSource};

use crate::comparison::Comparison;
use crate::error::{ParseDiagnostic, Warning};

/// Two files to compare. The score is relative to `first`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub first: PathBuf,
    pub second: PathBuf,
    /// 1-based line of the manifest this pair came from.
    pub line: usize,
}

#[derive(Debug)]
pub struct Manifest {
    pub pairs: Vec<Pair>,
    /// Blank lines that were skipped. Each is a [`miette::Report`] with
    /// `Severity::Warning`.
    pub warnings: Vec<miette::Report>,
}

impl Manifest {
    pub fn read(path: impl AsRef<Path>) -> miette::Result<Manifest> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| miette::miette!("{e}"))
            .with_context(|| format!("read {}", path.display()))?;
        Ok(Manifest::parse_named(&text, &path.display().to_string())?)
    }

    /// Parse manifest text. `name` labels the text in diagnostics.
    ///
    /// Relative paths are kept as written and resolve against the working
    /// directory when opened.
    pub fn parse_named(text: &str, name: &str) -> Result<Manifest, ParseDiagnostic> {
        let mut pairs = Vec::new();
        let mut warnings = Vec::new();

        let mut offset = 0;
        for (index, raw) in text.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);

            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => warnings.push(miette::Report::new(Warning {
                    message: format!("skipping blank line {}", index + 1),
                    src: NamedSource::new(name, text.to_string()),
                    span: (start, line.len()).into(),
                    help: None,
                })),
                [first, second] => pairs.push(Pair {
                    first: PathBuf::from(first),
                    second: PathBuf::from(second),
                    line: index + 1,
                }),
                _ => {
                    return Err(ParseDiagnostic {
                        src: NamedSource::new(name, text.to_string()),
                        span: (start, line.len()).into(),
                        message: format!("malformed pair on line {}", index + 1),
                        label: Some(format!("expected 2 paths, found {}", fields.len())),
                        help: Some(
                            "write two whitespace-separated file paths per line; paths cannot contain spaces"
                                .to_string(),
                        ),
                    });
                }
            }
        }

        Ok(Manifest { pairs, warnings })
    }
}

/// Score every pair of `manifest` and write the results to `output`, one
/// three-decimal score per line in manifest order.
///
/// `output` is created or truncated first. The first failing pair aborts the
/// run; lines already written stay in the file.
pub fn run(manifest: &Manifest, output: &Path, comparison: &Comparison) -> miette::Result<()> {
    let file = fs::File::create(output)
        .map_err(|e| miette::miette!("{e}"))
        .with_context(|| format!("create {}", output.display()))?;
    let mut out = BufWriter::new(file);

    for pair in &manifest.pairs {
        let result = comparison.compare(&pair.first, &pair.second).with_context(|| {
            format!(
                "compare {} with {} (manifest line {})",
                pair.first.display(),
                pair.second.display(),
                pair.line
            )
        })?;
        writeln!(out, "{}", result.score)
            .and_then(|()| out.flush())
            .map_err(|e| miette::miette!("{e}"))
            .with_context(|| format!("write {}", output.display()))?;
    }
    Ok(())
}
