//! Lexing and parsing of UDMF text maps.
//!
//! A UDMF document is a flat list of assignments and blocks:
//!
//! ```text
//! namespace = "ringracers";
//!
//! vertex
//! {
//!   x = 64.0;
//!   y = -32.0;
//! }
//! ```
//!
//! # Usage
//!
//! ```
//! use udmf::parser::{parse_with, ParseOptions};
//!
//! let source = "namespace = \"ringracers\"; vertex { x = 0.0; y = 0.0; }";
//! let output = parse_with(source, &ParseOptions::permissive()).unwrap();
//!
//! assert!(output.diagnostics.is_empty());
//! assert_eq!(output.document.blocks[0].kind, "vertex");
//! ```

mod document;
mod error;
pub mod lexer;
pub mod span;

pub use document::{parse, parse_with, ParseMode, ParseOptions, ParseOutput};
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{is_identifier, tokenize, LexError, LexErrorKind, Lexer, Number, Token, TokenKind};
pub use span::{Location, Span, Spanned};
