use std::fmt;

use miette::{LabeledSpan, NamedSource, Severity, SourceSpan};

/// A syntax error with source location information for rich diagnostics.
///
/// Produced by the reader for unparseable Python files and by the manifest
/// reader for malformed lines. The source text is carried along so the
/// report can underline the offending span.
#[derive(Debug)]
pub struct ParseDiagnostic {
    pub src: NamedSource<String>,
    pub span: SourceSpan,
    pub message: String,
    /// Text shown next to the underlined span; defaults to the message.
    pub label: Option<String>,
    pub help: Option<String>,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseDiagnostic {}

impl miette::Diagnostic for ParseDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = self.label.clone().unwrap_or_else(|| self.message.clone());
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(label),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn fmt::Display + 'a>)
    }
}

/// The similarity score is a ratio over the length of the first canonical
/// text, which is undefined when that text is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    DivisionUndefined,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::DivisionUndefined => {
                write!(f, "cannot score against an empty canonical form")
            }
        }
    }
}

impl std::error::Error for ScoreError {}

impl miette::Diagnostic for ScoreError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("pysimilar::score::division_undefined"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "the first file of the pair has no code left after canonicalization",
        ))
    }
}

/// A non-fatal problem, reported on stderr without stopping the run.
#[derive(Debug)]
pub struct Warning {
    pub message: String,
    pub src: NamedSource<String>,
    pub span: SourceSpan,
    pub help: Option<String>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Warning {}

impl miette::Diagnostic for Warning {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Warning)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            None, self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn fmt::Display + 'a>)
    }
}

/// Render any diagnostic to a plain string without ANSI colors, for
/// tests and for callers that log instead of printing to a terminal.
pub fn render_diagnostic(diag: &dyn miette::Diagnostic) -> String {
    let mut out = String::new();
    let handler = miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
        .with_width(80);
    if handler.render_report(&mut out, diag).is_err() {
        return diag.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(help: Option<&str>) -> ParseDiagnostic {
        ParseDiagnostic {
            src: NamedSource::new("broken.py", "def f(:\n    pass\n".to_string()),
            span: (6, 1).into(),
            message: "invalid syntax".to_string(),
            label: Some("expected a parameter name".to_string()),
            help: help.map(str::to_string),
        }
    }

    #[test]
    fn rendered_parse_error_names_file_and_label() {
        let rendered = render_diagnostic(&diagnostic(None));
        assert!(rendered.contains("invalid syntax"), "{rendered}");
        assert!(rendered.contains("broken.py"), "{rendered}");
        assert!(rendered.contains("expected a parameter name"), "{rendered}");
    }

    #[test]
    fn rendered_parse_error_includes_help() {
        let rendered = render_diagnostic(&diagnostic(Some("remove the colon")));
        assert!(rendered.contains("remove the colon"), "{rendered}");
    }

    #[test]
    fn score_error_has_code() {
        let rendered = render_diagnostic(&ScoreError::DivisionUndefined);
        assert!(
            rendered.contains("pysimilar::score::division_undefined"),
            "{rendered}"
        );
    }

    #[test]
    fn warnings_have_warning_severity() {
        let warning = Warning {
            message: "skipping blank line".to_string(),
            src: NamedSource::new("pairs.txt", "\n".to_string()),
            span: (0, 0).into(),
            help: None,
        };
        assert_eq!(
            miette::Diagnostic::severity(&warning),
            Some(Severity::Warning)
        );
    }
}
