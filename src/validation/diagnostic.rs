//! Diagnostic types for validation results.

use std::fmt;

use serde::Serialize;

use crate::parser::{ParseError, Span};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// What a validation diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    MissingRequiredField,
    TypeMismatch,
    UnknownField,
    DuplicateField,
    DefaultInjected,
    UnknownBlock,
    UnknownNamespace,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::MissingRequiredField => "MissingRequiredField",
            DiagnosticCode::TypeMismatch => "TypeMismatch",
            DiagnosticCode::UnknownField => "UnknownField",
            DiagnosticCode::DuplicateField => "DuplicateField",
            DiagnosticCode::DefaultInjected => "DefaultInjected",
            DiagnosticCode::UnknownBlock => "UnknownBlock",
            DiagnosticCode::UnknownNamespace => "UnknownNamespace",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Where the problem is.
    pub span: Span,
    /// A second location involved, e.g. the first of two duplicates.
    pub related: Option<Span>,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        code: DiagnosticCode,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            span,
            related: None,
            help: None,
        }
    }

    pub fn error(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, span, message)
    }

    pub fn warning(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, span, message)
    }

    pub fn info(code: DiagnosticCode, span: Span, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, span, message)
    }

    /// Add help text to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_related(mut self, span: Span) -> Self {
        self.related = Some(span);
        self
    }

    pub fn record(&self) -> DiagnosticRecord {
        DiagnosticRecord {
            severity: self.severity,
            line: self.span.line(),
            column: self.span.column(),
            message: self.message.clone(),
            code: self.code.as_str().to_string(),
        }
    }
}

/// Flat, serializable form of any diagnostic, parse errors included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub code: String,
}

impl From<&ParseError> for DiagnosticRecord {
    fn from(error: &ParseError) -> Self {
        Self {
            severity: Severity::Error,
            line: error.line(),
            column: error.column(),
            message: error.message.clone(),
            code: error.kind.code().to_string(),
        }
    }
}

/// Collects diagnostics in the order they were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count(Severity::Info)
    }

    /// Check if there are no diagnostics at all.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Codes in order, handy for assertions.
    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.diagnostics.iter().map(Diagnostic::record).collect()
    }
}

impl IntoIterator for ValidationResult {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Location, ParseErrorKind};

    fn span_at(line: u32, column: u32) -> Span {
        Span::new(Location::new(0, line, column), Location::new(0, line, column))
    }

    #[test]
    fn test_empty_result() {
        let result = ValidationResult::new();
        assert!(result.is_ok());
        assert!(!result.has_errors());
        assert!(!result.has_warnings());
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.info_count(), 0);
    }

    #[test]
    fn test_counts_by_severity() {
        let mut result = ValidationResult::new();
        result.push(Diagnostic::error(DiagnosticCode::TypeMismatch, span_at(1, 1), "bad"));
        result.push(Diagnostic::warning(DiagnosticCode::UnknownField, span_at(2, 1), "odd"));
        result.push(Diagnostic::info(DiagnosticCode::DefaultInjected, span_at(3, 1), "filled"));
        result.push(Diagnostic::info(DiagnosticCode::DefaultInjected, span_at(3, 1), "filled"));

        assert!(result.has_errors());
        assert!(result.has_warnings());
        assert_eq!(
            (result.error_count(), result.warning_count(), result.info_count()),
            (1, 1, 2)
        );
    }

    #[test]
    fn test_record_serializes_flat() {
        let d = Diagnostic::warning(
            DiagnosticCode::UnknownField,
            span_at(4, 9),
            "unknown field 'foo'",
        )
            .with_help("declare it in a schema layer");
        let json = serde_json::to_value(d.record()).unwrap();

        assert_eq!(json["severity"], "warning");
        assert_eq!(json["line"], 4);
        assert_eq!(json["column"], 9);
        assert_eq!(json["code"], "UnknownField");
    }

    #[test]
    fn test_parse_error_record() {
        let error =
            ParseError::new(ParseErrorKind::MissingValue, span_at(2, 16), "expected a value");
        let record = DiagnosticRecord::from(&error);
        assert_eq!(record.code, "MissingValue");
        assert_eq!(record.severity, Severity::Error);
    }
}
