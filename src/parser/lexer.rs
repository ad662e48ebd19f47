//! Tokenizer for UDMF text.
//!
//! The lexer works on bytes (the grammar is ASCII; non-ASCII only appears
//! inside strings and comments) and tracks line/column as it goes, so token
//! spans cost nothing extra. Whitespace and comments (`// ...`, `/* ... */`)
//! are skipped.
//!
//! Malformed input never stops the stream: the lexer yields a
//! [`TokenKind::Error`] token covering the bad text and carries on, so the
//! parser can report several problems in one pass.

use std::borrow::Cow;
use std::fmt;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace};

use crate::cancel::{self, CancelToken};
use crate::error::Result;
use crate::types::{unescape_string, Value};

use super::span::{Location, Span};

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Integer(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Why a run of text could not be tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedComment,
    InvalidNumericLiteral,
    InvalidCharacter,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::UnterminatedComment => "unterminated block comment",
            LexErrorKind::InvalidNumericLiteral => "invalid numeric literal",
            LexErrorKind::InvalidCharacter => "invalid character",
        };
        f.write_str(text)
    }
}

/// A malformed token.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
#[error("{kind} at {}", .span.start)]
#[diagnostic(code(udmf::lex))]
pub struct LexError {
    pub kind: LexErrorKind,
    #[label("here")]
    pub span: Span,
}

/// What a token is.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'src> {
    Identifier(&'src str),
    Number(Number),
    /// Unescaped contents; borrowed when the literal had no escapes.
    StringLiteral(Cow<'src, str>),
    BooleanLiteral(bool),
    /// `=`
    Equals,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `;`
    Semicolon,
    Error(LexErrorKind),
    Eof,
}

impl TokenKind<'_> {
    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Number(_) => "number".to_string(),
            TokenKind::StringLiteral(_) => "string".to_string(),
            TokenKind::BooleanLiteral(_) => "boolean".to_string(),
            TokenKind::Equals => "'='".to_string(),
            TokenKind::LeftBrace => "'{'".to_string(),
            TokenKind::RightBrace => "'}'".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Error(kind) => kind.to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// The literal value, if this token is one.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            TokenKind::Number(n) => Some((*n).into()),
            TokenKind::StringLiteral(s) => Some(Value::String(s.to_string())),
            TokenKind::BooleanLiteral(b) => Some(Value::Boolean(*b)),
            _ => None,
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind<'src>,
    pub span: Span,
}

impl<'src> Token<'src> {
    /// The lex error carried by an error token.
    pub fn lex_error(&self) -> Option<LexError> {
        match self.kind {
            TokenKind::Error(kind) => Some(LexError {
                kind,
                span: self.span,
            }),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// A lazy token stream over a source string.
///
/// The lexer is cheap to clone, and [`Lexer::restart`] rewinds it to the
/// beginning of its input.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    finished: bool,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Whether `text` lexes as a single identifier token.
///
/// `true` and `false` (in any case) are keywords, not identifiers.
pub fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    matches!(bytes.first(), Some(&b) if is_ident_start(b))
        && bytes.iter().all(|&b| is_ident_continue(b))
        && !text.eq_ignore_ascii_case("true")
        && !text.eq_ignore_ascii_case("false")
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            finished: false,
        }
    }

    /// Rewind to the start of the input.
    pub fn restart(&mut self) {
        *self = Self::new(self.source);
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Current location.
    pub fn location(&self) -> Location {
        Location::new(self.pos, self.line, self.column)
    }

    fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + n).copied()
    }

    fn bump(&mut self) {
        if let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                // UTF-8 continuation bytes don't start a new column
                self.column += 1;
            }
        }
    }

    fn bump_while(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek() {
            if !pred(b) {
                break;
            }
            self.bump();
        }
    }

    /// Consume one whole character.
    fn bump_char(&mut self) {
        self.bump();
        while matches!(self.peek(), Some(b) if b & 0xC0 == 0x80) {
            self.bump();
        }
    }

    fn token(&self, kind: TokenKind<'src>, start: Location) -> Token<'src> {
        Token {
            kind,
            span: Span::new(start, self.location()),
        }
    }

    /// Produce the next token. Returns `Eof` forever once the input is spent.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(error) = self.skip_trivia() {
            return error;
        }

        let start = self.location();
        let Some(b) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match b {
            b'=' => self.single(TokenKind::Equals, start),
            b'{' => self.single(TokenKind::LeftBrace, start),
            b'}' => self.single(TokenKind::RightBrace, start),
            b';' => self.single(TokenKind::Semicolon, start),
            b'"' => self.string(start),
            b'0'..=b'9' => self.number(start),
            b'+' | b'-' if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => {
                self.number(start)
            }
            b if is_ident_start(b) => self.identifier(start),
            _ => {
                self.bump_char();
                self.token(TokenKind::Error(LexErrorKind::InvalidCharacter), start)
            }
        }
    }

    fn single(&mut self, kind: TokenKind<'src>, start: Location) -> Token<'src> {
        self.bump();
        self.token(kind, start)
    }

    /// Skip whitespace and comments. An unterminated block comment yields an
    /// error token running to end of input.
    fn skip_trivia(&mut self) -> Option<Token<'src>> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b), _) if b.is_ascii_whitespace() => self.bump(),
                (Some(b'/'), Some(b'/')) => self.bump_while(|b| b != b'\n'),
                (Some(b'/'), Some(b'*')) => {
                    let start = self.location();
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => self.bump(),
                            (None, _) => {
                                return Some(self.token(
                                    TokenKind::Error(LexErrorKind::UnterminatedComment),
                                    start,
                                ));
                            }
                        }
                    }
                }
                _ => return None,
            }
        }
    }

    fn identifier(&mut self, start: Location) -> Token<'src> {
        self.bump_while(is_ident_continue);
        let text = &self.source[start.offset..self.pos];

        let kind = if text.eq_ignore_ascii_case("true") {
            TokenKind::BooleanLiteral(true)
        } else if text.eq_ignore_ascii_case("false") {
            TokenKind::BooleanLiteral(false)
        } else {
            TokenKind::Identifier(text)
        };
        self.token(kind, start)
    }

    fn string(&mut self, start: Location) -> Token<'src> {
        self.bump(); // opening quote
        let content_start = self.pos;
        let mut escaped = false;

        loop {
            match self.peek() {
                Some(b'"') => break,
                Some(b'\\') => {
                    escaped = true;
                    self.bump();
                    if self.peek().is_some() {
                        self.bump();
                    }
                }
                Some(_) => self.bump(),
                None => {
                    return self.token(TokenKind::Error(LexErrorKind::UnterminatedString), start);
                }
            }
        }

        let raw = &self.source[content_start..self.pos];
        self.bump(); // closing quote

        let contents = if escaped {
            Cow::Owned(unescape_string(raw))
        } else {
            Cow::Borrowed(raw)
        };
        self.token(TokenKind::StringLiteral(contents), start)
    }

    fn number(&mut self, start: Location) -> Token<'src> {
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.bump();
        }

        let digits_start = self.pos;
        let hex = self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X'));

        let number = if hex {
            self.bump();
            self.bump();
            let hex_start = self.pos;
            self.bump_while(|b| b.is_ascii_hexdigit());
            let digits = &self.source[hex_start..self.pos];
            let sign = &self.source[start.offset..digits_start];
            if digits.is_empty() {
                None
            } else {
                i64::from_str_radix(&format!("{}{}", sign, digits), 16)
                    .ok()
                    .map(Number::Integer)
            }
        } else {
            self.decimal(start)
        };

        // Anything glued to the literal makes the whole run invalid: `12abc`, `1.2.3`.
        let glued = matches!(self.peek(), Some(b) if is_ident_continue(b) || b == b'.');
        if glued {
            self.bump_while(|b| is_ident_continue(b) || b == b'.');
        }

        match number {
            Some(n) if !glued => self.token(TokenKind::Number(n), start),
            _ => self.token(TokenKind::Error(LexErrorKind::InvalidNumericLiteral), start),
        }
    }

    fn decimal(&mut self, start: Location) -> Option<Number> {
        self.bump_while(|b| b.is_ascii_digit());
        let mut is_float = false;

        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            self.bump_while(|b| b.is_ascii_digit());
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exponent_digit = match self.peek_at(1) {
                Some(b'+' | b'-') => self.peek_at(2),
                other => other,
            };
            if matches!(exponent_digit, Some(d) if d.is_ascii_digit()) {
                is_float = true;
                self.bump();
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.bump();
                }
                self.bump_while(|b| b.is_ascii_digit());
            }
        }

        let text = &self.source[start.offset..self.pos];
        if is_float {
            text.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Number::Float)
        } else {
            text.parse::<i64>().ok().map(Number::Integer)
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    /// Yields every token including a single trailing `Eof`, then `None`.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is_eof() {
            self.finished = true;
        }
        Some(token)
    }
}

/// Tokenize a whole input, `Eof` included.
///
/// The cancellation token is checked after every `;` and `}`.
pub fn tokenize<'src>(source: &'src str, cancel: Option<&CancelToken>) -> Result<Vec<Token<'src>>> {
    let mut tokens = Vec::new();

    for token in Lexer::new(source) {
        trace!(kind = ?token.kind, span = %token.span, "token");
        let boundary = matches!(token.kind, TokenKind::Semicolon | TokenKind::RightBrace);
        tokens.push(token);
        if boundary {
            cancel::check(cancel)?;
        }
    }

    debug!(count = tokens.len(), bytes = source.len(), "tokenized input");
    Ok(tokens)
}
