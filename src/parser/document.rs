//! Document parsing.
//!
//! ```text
//! Document   := Statement*          // first statement must be `namespace = "...";`
//! Statement  := Assignment | Block
//! Assignment := Identifier '=' Value ';'
//! Block      := Identifier '{' Assignment* '}'
//! ```
//!
//! Block kinds are lowercased; field keys keep their source casing.
//!
//! In [`ParseMode::Strict`] the first error aborts the parse. In
//! [`ParseMode::Permissive`] errors are collected, the parser skips to the
//! next `;` or `}` and carries on, and the caller gets a best-effort document.

use tracing::debug;

use crate::cancel::{self, CancelToken};
use crate::error::{Result, UdmfError};
use crate::types::{Block, Document, Field, Value};

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Lexer, Token, TokenKind};
use super::span::{Location, Span};

/// How the parser reacts to grammar errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Stop at the first error.
    #[default]
    Strict,
    /// Record errors, resynchronise and keep going.
    Permissive,
}

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Checked after each top-level statement.
    pub cancel: Option<CancelToken>,
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self {
            mode: ParseMode::Permissive,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// A parsed document and the errors collected on the way.
///
/// `diagnostics` is always empty in strict mode.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Parse UDMF text in strict mode.
pub fn parse(source: &str) -> Result<ParseOutput> {
    parse_with(source, &ParseOptions::strict())
}

/// Parse UDMF text with explicit options.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<ParseOutput> {
    let mut parser = Parser::new(source, options);
    let document = parser.parse_document()?;

    debug!(
        namespace = %document.namespace,
        blocks = document.blocks.len(),
        diagnostics = parser.diagnostics.len(),
        "parsed document"
    );

    Ok(ParseOutput {
        document,
        diagnostics: parser.diagnostics,
    })
}

enum Statement {
    Assignment(Field),
    Block(Block),
}

impl Statement {
    fn span(&self) -> Span {
        match self {
            Statement::Assignment(field) => field.span,
            Statement::Block(block) => block.span,
        }
    }
}

/// Which boundary a resync stopped on.
enum Boundary {
    Semicolon,
    RightBrace,
    Eof,
}

struct Parser<'src, 'opt> {
    lexer: Lexer<'src>,
    current: Token<'src>,
    /// End of the last consumed token.
    prev_end: Location,
    mode: ParseMode,
    cancel: Option<&'opt CancelToken>,
    diagnostics: Vec<ParseError>,
}

type PResult<T> = std::result::Result<T, ParseError>;

impl<'src, 'opt> Parser<'src, 'opt> {
    fn new(source: &'src str, options: &'opt ParseOptions) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            prev_end: Location::start(),
            mode: options.mode,
            cancel: options.cancel.as_ref(),
            diagnostics: Vec::new(),
        }
    }

    fn advance(&mut self) -> Token<'src> {
        let next = self.lexer.next_token();
        let token = std::mem::replace(&mut self.current, next);
        self.prev_end = token.span.end;
        token
    }

    /// Strict: turn the error into a failure. Permissive: record it.
    fn report(&mut self, error: ParseError) -> Result<()> {
        match self.mode {
            ParseMode::Strict => Err(UdmfError::Parse(error)),
            ParseMode::Permissive => {
                self.diagnostics.push(error);
                Ok(())
            }
        }
    }

    /// Skip to just past the next `;` or `}`.
    fn recover(&mut self) -> Boundary {
        loop {
            match self.current.kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return Boundary::Semicolon;
                }
                TokenKind::RightBrace => {
                    self.advance();
                    return Boundary::RightBrace;
                }
                TokenKind::Eof => return Boundary::Eof,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let kind = match self.current.kind {
            TokenKind::Error(lex) => ParseErrorKind::Lex(lex),
            TokenKind::Eof => ParseErrorKind::UnexpectedEof,
            _ => ParseErrorKind::UnexpectedToken,
        };
        ParseError::new(
            kind,
            self.current.span,
            format!("expected {}, found {}", expected, self.current.kind.describe()),
        )
    }

    fn parse_document(&mut self) -> Result<Document> {
        let mut document = Document::default();
        let mut namespace_set = false;
        let mut namespace_reported = false;
        let mut first = true;

        while !self.current.is_eof() {
            let start = self.current.span;
            let names_namespace = matches!(
                self.current.kind,
                TokenKind::Identifier(name) if name.eq_ignore_ascii_case("namespace")
            );

            let statement = match self.parse_statement() {
                Ok(statement) => statement,
                Err(error) => {
                    self.report(error)?;
                    // a broken namespace line has its own error
                    if first && !names_namespace && !namespace_reported {
                        namespace_reported = true;
                        self.report(Self::missing_namespace(start))?;
                    }
                    self.recover();
                    first = false;
                    cancel::check(self.cancel)?;
                    continue;
                }
            };

            match statement {
                Statement::Assignment(field) if field.is("namespace") => {
                    let span = field.span;
                    if namespace_set {
                        self.report(ParseError::new(
                            ParseErrorKind::DuplicateNamespace,
                            span,
                            "namespace is already declared",
                        ))?;
                    } else if let Value::String(namespace) = field.value {
                        // a late namespace is still adopted once the missing one was reported
                        document.namespace = namespace;
                        document.namespace_span = span;
                        namespace_set = true;
                    } else {
                        namespace_reported = true;
                        self.report(
                            ParseError::new(
                                ParseErrorKind::InvalidNamespace,
                                span,
                                format!(
                                    "namespace must be a string, found {}",
                                    field.value.type_name()
                                ),
                            )
                            .with_help("write namespace = \"name\";"),
                        )?;
                    }
                }
                statement => {
                    if first && !namespace_reported {
                        namespace_reported = true;
                        self.report(Self::missing_namespace(statement.span()))?;
                    }
                    match statement {
                        Statement::Assignment(field) => document.fields.push(field),
                        Statement::Block(block) => document.blocks.push(block),
                    }
                }
            }

            first = false;
            cancel::check(self.cancel)?;
        }

        if !namespace_set && !namespace_reported {
            self.report(Self::missing_namespace(self.current.span))?;
        }

        Ok(document)
    }

    fn missing_namespace(span: Span) -> ParseError {
        ParseError::new(
            ParseErrorKind::MissingNamespace,
            span,
            "document must start with a namespace declaration",
        )
        .with_help("add namespace = \"ringracers\"; as the first line")
    }

    fn parse_statement(&mut self) -> PResult<Statement> {
        let TokenKind::Identifier(name) = self.current.kind else {
            return Err(self.unexpected("an assignment or a block"));
        };
        let ident = self.advance();

        match self.current.kind {
            TokenKind::Equals => Ok(Statement::Assignment(
                self.parse_assignment_rest(name, ident.span)?,
            )),
            TokenKind::LeftBrace => {
                Ok(Statement::Block(self.parse_block_rest(name, ident.span)?))
            }
            _ => Err(self.unexpected("'=' or '{'")),
        }
    }

    /// Parse the rest of `key = value;` after the key.
    fn parse_assignment_rest(&mut self, key: &str, key_span: Span) -> PResult<Field> {
        if matches!(self.current.kind, TokenKind::LeftBrace) {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                self.current.span,
                format!("blocks cannot be nested; '{}' opens a block inside another", key),
            ));
        }
        if !matches!(self.current.kind, TokenKind::Equals) {
            let mut error = self.unexpected("'='");
            if error.kind == ParseErrorKind::UnexpectedToken {
                error.kind = ParseErrorKind::MissingEquals;
            }
            return Err(error);
        }
        self.advance();

        let value = match self.current.kind.to_value() {
            Some(value) => value,
            None => {
                return Err(match self.current.kind {
                    TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof => {
                        ParseError::new(
                            ParseErrorKind::MissingValue,
                            self.current.span,
                            format!(
                                "expected a value for '{}', found {}",
                                key,
                                self.current.kind.describe()
                            ),
                        )
                    }
                    _ => self.unexpected("a value"),
                });
            }
        };
        self.advance();

        if matches!(self.current.kind, TokenKind::Semicolon) {
            self.advance();
        } else {
            let error = ParseError::new(
                ParseErrorKind::MissingSemicolon,
                self.current.span,
                format!("expected ';' after '{}', found {}", key, self.current.kind.describe()),
            );
            match self.mode {
                ParseMode::Strict => return Err(error),
                // keep the assignment; the next statement starts at the current token
                ParseMode::Permissive => self.diagnostics.push(error),
            }
        }

        let span = Span::new(key_span.start, self.prev_end);
        Ok(Field::new(key, value, span))
    }

    /// Parse `{ Assignment* }` after the block kind.
    fn parse_block_rest(&mut self, kind: &str, kind_span: Span) -> PResult<Block> {
        let mut block = Block::new(kind);
        self.advance(); // '{'

        loop {
            match self.current.kind {
                TokenKind::RightBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let error = ParseError::new(
                        ParseErrorKind::UnterminatedBlock,
                        self.current.span,
                        format!("block '{}' is missing its closing '}}'", block.kind),
                    );
                    match self.mode {
                        ParseMode::Strict => return Err(error),
                        ParseMode::Permissive => {
                            self.diagnostics.push(error);
                            break;
                        }
                    }
                }
                _ => {}
            }

            let result = match self.current.kind {
                TokenKind::Identifier(key) => {
                    let key_token = self.advance();
                    self.parse_assignment_rest(key, key_token.span)
                }
                _ => Err(self.unexpected("a field assignment or '}'")),
            };

            match result {
                Ok(field) => block.fields.push(field),
                Err(error) if self.mode == ParseMode::Strict => return Err(error),
                Err(error) => {
                    self.diagnostics.push(error);
                    match self.recover() {
                        Boundary::Semicolon => {}
                        Boundary::RightBrace => break,
                        Boundary::Eof => {}
                    }
                }
            }
        }

        block.span = Span::new(kind_span.start, self.prev_end);
        Ok(block)
    }
}
