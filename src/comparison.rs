// ==============================================================================
// Library API: Comparing Python Sources
// ==============================================================================
//
// `Comparison` is the single entry point behind the CLI. It follows the
// non-consuming builder pattern: configure it once with `&mut self` setters,
// then call the terminal methods any number of times. Every call parses and
// canonicalizes from scratch with fresh rename maps, so results never depend
// on earlier calls.

use std::fs;
use std::path::Path;

use miette::Context;

use crate::canonicalize::canonicalize_source;
use crate::distance::distance;
use crate::score::Score;

/// Builder for canonicalizing and scoring Python sources.
///
/// # Example
///
/// ```no_run
/// use pysimilar::Comparison;
///
/// let output = Comparison::new().compare("submissions/a.py", "submissions/b.py")?;
/// println!("{}", output.score);
/// # Ok::<(), miette::Report>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    filter: Option<String>,
}

/// The outcome of comparing two sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutput {
    /// Canonical text of the first source.
    pub first: String,
    /// Canonical text of the second source.
    pub second: String,
    /// Edit distance between the two canonical texts, in characters.
    pub distance: usize,
    /// `distance` relative to the length of `first`.
    pub score: Score,
}

impl Comparison {
    pub fn new() -> Self {
        Comparison::default()
    }

    /// Keep only function definitions named `name`; every other `def` is
    /// removed before comparison. An empty name disables the filter.
    pub fn function(&mut self, name: impl Into<String>) -> &mut Self {
        self.filter = Some(name.into());
        self
    }

    fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Read and canonicalize a Python file.
    pub fn canonicalize(&self, path: impl AsRef<Path>) -> miette::Result<String> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .map_err(|e| miette::miette!("{e}"))
            .with_context(|| format!("read {}", path.display()))?;
        self.canonicalize_str_named(&source, &path.display().to_string())
    }

    /// Canonicalize Python source text. Uses `"<input>"` as the source name
    /// in diagnostics.
    pub fn canonicalize_str(&self, source: &str) -> miette::Result<String> {
        self.canonicalize_str_named(source, "<input>")
    }

    pub fn canonicalize_str_named(&self, source: &str, name: &str) -> miette::Result<String> {
        canonicalize_source(source, name, self.filter()).with_context(|| format!("parse {name}"))
    }

    /// Canonicalize two files and score the second against the first.
    pub fn compare(
        &self,
        first: impl AsRef<Path>,
        second: impl AsRef<Path>,
    ) -> miette::Result<ComparisonOutput> {
        let (first, second) = (first.as_ref(), second.as_ref());
        let first_text = self.canonicalize(first)?;
        let second_text = self.canonicalize(second)?;
        finish(first_text, second_text).with_context(|| {
            format!("score {} against {}", second.display(), first.display())
        })
    }

    /// Like [`compare`](Self::compare), for in-memory sources.
    pub fn compare_str(&self, first: &str, second: &str) -> miette::Result<ComparisonOutput> {
        let first_text = self.canonicalize_str_named(first, "<first>")?;
        let second_text = self.canonicalize_str_named(second, "<second>")?;
        finish(first_text, second_text)
    }
}

fn finish(first: String, second: String) -> miette::Result<ComparisonOutput> {
    let distance = distance(&first, &second);
    let score = Score::relative_to(&first, distance)?;
    Ok(ComparisonOutput {
        distance,
        first,
        second,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renamed_copy_scores_zero() {
        let output = Comparison::new()
            .compare_str(
                "def f(x):\n    return x + 1\n",
                "def g(y):\n    return y+1\n",
            )
            .expect("both sources should parse");
        assert_eq!(output.first, output.second);
        assert_eq!(output.distance, 0);
        assert_eq!(output.score.to_string(), "0.000");
    }

    #[test]
    fn one_changed_literal() {
        let output = Comparison::new()
            .compare_str("def a():\n    return 1\n", "def b():\n    return 2\n")
            .expect("both sources should parse");
        assert_eq!(output.first, "def func0():\n    return 1");
        assert_eq!(output.distance, 1);
        assert_eq!(output.score.to_string(), "0.040");
    }

    #[test]
    fn function_filter_is_applied_to_both_sides() {
        let mut comparison = Comparison::new();
        comparison.function("target");
        let output = comparison
            .compare_str(
                "def noise(): pass\ndef target(n):\n    return n\n",
                "def target(k):\n    return k\ndef other(): return 0\n",
            )
            .expect("both sources should parse");
        assert_eq!(output.first, "def func0(arg0):\n    return id0");
        assert_eq!(output.first, output.second);
    }

    #[test]
    fn builder_reuse_is_independent() {
        let comparison = Comparison::new();
        let a = comparison.canonicalize_str("def f(q): return q\n").unwrap();
        let b = comparison.canonicalize_str("def f(q): return q\n").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn output_score_matches_its_distance() {
        let output = Comparison::new()
            .compare_str("x = 1\n", "x = 1\ny = 22\n")
            .expect("both sources should parse");
        assert_eq!(output.first, "id0 = 1");
        assert_eq!(output.distance, 9);
        assert_eq!(output.score, Score::relative_to(&output.first, 9).unwrap());
        assert_eq!(output.score.to_string(), "1.286");
    }

    #[test]
    fn empty_first_source_cannot_be_scored() {
        let err = Comparison::new()
            .compare_str("# only a comment\n", "x = 1\n")
            .unwrap_err();
        assert!(
            format!("{err}").contains("empty canonical form"),
            "got: {err}"
        );
    }

    #[test]
    fn parse_errors_name_the_source() {
        let err = Comparison::new()
            .canonicalize_str_named("def broken(:\n", "broken.py")
            .unwrap_err();
        assert_eq!(format!("{err}"), "parse broken.py");
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = Comparison::new()
            .canonicalize("definitely/not/here.py")
            .unwrap_err();
        assert!(
            format!("{err}").contains("read definitely/not/here.py"),
            "got: {err}"
        );
    }
}
