//! Grammar errors.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use super::lexer::LexErrorKind;
use super::span::Span;

/// The grammar rule that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    MissingEquals,
    MissingValue,
    MissingSemicolon,
    MissingNamespace,
    InvalidNamespace,
    DuplicateNamespace,
    UnterminatedBlock,
    UnexpectedEof,
    /// A malformed token where the grammar expected something else.
    Lex(LexErrorKind),
}

impl ParseErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedToken => "UnexpectedToken",
            ParseErrorKind::MissingEquals => "MissingEquals",
            ParseErrorKind::MissingValue => "MissingValue",
            ParseErrorKind::MissingSemicolon => "MissingSemicolon",
            ParseErrorKind::MissingNamespace => "MissingNamespace",
            ParseErrorKind::InvalidNamespace => "InvalidNamespace",
            ParseErrorKind::DuplicateNamespace => "DuplicateNamespace",
            ParseErrorKind::UnterminatedBlock => "UnterminatedBlock",
            ParseErrorKind::UnexpectedEof => "UnexpectedEof",
            ParseErrorKind::Lex(LexErrorKind::UnterminatedString) => "UnterminatedString",
            ParseErrorKind::Lex(LexErrorKind::UnterminatedComment) => "UnterminatedComment",
            ParseErrorKind::Lex(LexErrorKind::InvalidNumericLiteral) => "InvalidNumericLiteral",
            ParseErrorKind::Lex(LexErrorKind::InvalidCharacter) => "InvalidCharacter",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A structural error with its location.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{message}")]
#[diagnostic(code(udmf::parse))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[label("here")]
    pub span: Span,
    #[help]
    pub help: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            help: None,
        }
    }

    /// Add help text to this error.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn line(&self) -> u32 {
        self.span.line()
    }

    pub fn column(&self) -> u32 {
        self.span.column()
    }
}
