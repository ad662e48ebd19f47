//! udmf - a format engine for UDMF text maps
//!
//! Lexes, parses, validates and canonically prints the `TEXTMAP` lumps used
//! by Doom-engine games, with a layered schema registry describing which
//! fields each block kind may carry.
//!
//! ```
//! use udmf::{parse, print, validate, SchemaRegistry};
//!
//! let source = "namespace = \"ringracers\"; vertex { y = 0.0; x = 1; }";
//! let registry = SchemaRegistry::builtin("ringracers").unwrap();
//!
//! let parsed = parse(source).unwrap();
//! let (document, diagnostics) = validate(&parsed.document, &registry);
//! assert!(diagnostics.is_ok());
//!
//! assert_eq!(
//!     print(&document).unwrap(),
//!     "namespace = \"ringracers\";\n\nvertex\n{\n  x = 1;\n  y = 0.0;\n}\n"
//! );
//! ```

pub mod cancel;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod output;
pub mod parser;
pub mod render;
pub mod schema;
pub mod types;
pub mod validation;

pub use cancel::{CancelSource, CancelToken};
pub use error::{Result, UdmfError};
pub use parser::{
    parse, parse_with, tokenize, Lexer, ParseError, ParseMode, ParseOptions, ParseOutput, Span,
};
pub use render::{print, print_with, PrintError, PrintOptions};
pub use schema::{BuiltinProfiles, RegistryBuilder, SchemaError, SchemaLayer, SchemaRegistry};
pub use types::{Block, BlockId, Document, Field, Value, ValueType};
pub use validation::{
    reorder_fields, validate, validate_with, Diagnostic, DiagnosticCode, DuplicatePolicy, Severity,
    ValidatedDocument, ValidationOptions, ValidationResult,
};
