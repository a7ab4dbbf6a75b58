use std::fmt;

use crate::distance::distance;
use crate::error::ScoreError;

/// How far the second text is from the first, relative to the first text's
/// length. Zero means identical; there is no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    /// Score an edit distance that was already computed against `first`.
    pub fn relative_to(first: &str, distance: usize) -> Result<Score, ScoreError> {
        let len = first.chars().count();
        if len == 0 {
            return Err(ScoreError::DivisionUndefined);
        }
        Ok(Score(distance as f64 / len as f64))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The value rounded to three decimal places, as reported.
    pub fn rounded(self) -> f64 {
        // Parsing the three-decimal rendering gives the same tie-breaking as
        // the printed output.
        format!("{self}").parse().unwrap_or(self.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Score `second` against `first`: the edit distance divided by the length
/// of `first` in characters.
///
/// The denominator is always the first text, so `score(a, b)` and
/// `score(b, a)` differ when the lengths do.
pub fn score(first: &str, second: &str) -> Result<Score, ScoreError> {
    Score::relative_to(first, distance(first, second))
}
