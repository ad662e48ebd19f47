//! Canonical UDMF text output.
//!
//! Layout:
//!
//! ```text
//! namespace = "ringracers";
//! version = 2;
//!
//! linedef
//! {
//!   id = 0;
//!   v1 = 0;
//! }
//!
//! vertex
//! {
//!   x = 64.0;
//! }
//! ```
//!
//! Fields are written in the order the document stores them. Validated
//! documents already hold schema'd fields in declaration order, so printing
//! never reorders and `parse(print(d)) == d` holds for any parsed document.

use std::fmt::Write;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::cancel::{self, CancelToken};
use crate::error::Result;
use crate::parser::is_identifier;
use crate::types::{Document, Field};

const INDENT: &str = "  ";

/// A hand-built document that cannot be written as UDMF.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum PrintError {
    #[error("Field '{key}' holds {value}, which has no UDMF literal")]
    #[diagnostic(code(udmf::print::unprintable_value))]
    UnprintableValue { key: String, value: String },

    #[error("'{name}' cannot be written as a {context}")]
    #[diagnostic(
        code(udmf::print::invalid_identifier),
        help("Keys and block kinds must match [A-Za-z_][A-Za-z0-9_]* and not be true/false")
    )]
    InvalidIdentifier { name: String, context: &'static str },
}

/// Printer configuration.
#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    /// Checked after each block.
    pub cancel: Option<CancelToken>,
}

/// Print a document as canonical UDMF text.
pub fn print(document: &Document) -> Result<String> {
    print_with(document, &PrintOptions::default())
}

/// Print with explicit options.
pub fn print_with(document: &Document, options: &PrintOptions) -> Result<String> {
    let mut out = String::with_capacity(estimate_size(document));

    write_field(&mut out, "", &Field::synthesized("namespace", document.namespace.as_str()))?;
    for field in &document.fields {
        if field.is("namespace") {
            return Err(PrintError::InvalidIdentifier {
                name: field.key.clone(),
                context: "top-level field (namespace is written from the document)",
            }
            .into());
        }
        write_field(&mut out, "", field)?;
    }

    for block in &document.blocks {
        if !is_identifier(&block.kind) {
            return Err(PrintError::InvalidIdentifier {
                name: block.kind.clone(),
                context: "block kind",
            }
            .into());
        }

        out.push('\n');
        out.push_str(&block.kind);
        out.push_str("\n{\n");
        for field in &block.fields {
            write_field(&mut out, INDENT, field)?;
        }
        out.push_str("}\n");

        cancel::check(options.cancel.as_ref())?;
    }

    debug!(bytes = out.len(), blocks = document.blocks.len(), "printed document");
    Ok(out)
}

fn write_field(
    out: &mut String,
    indent: &str,
    field: &Field,
) -> std::result::Result<(), PrintError> {
    if !is_identifier(&field.key) {
        return Err(PrintError::InvalidIdentifier {
            name: field.key.clone(),
            context: "field key",
        });
    }
    if !field.value.is_printable() {
        return Err(PrintError::UnprintableValue {
            key: field.key.clone(),
            value: format!("{:?}", field.value),
        });
    }

    // writing to a String cannot fail
    let _ = writeln!(out, "{}{} = {};", indent, field.key, field.value);
    Ok(())
}

fn estimate_size(document: &Document) -> usize {
    let fields: usize = document.blocks.iter().map(|b| b.fields.len()).sum();
    64 + document.blocks.len() * 16 + (fields + document.fields.len()) * 24
}
