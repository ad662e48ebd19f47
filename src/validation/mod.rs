//! Schema validation for parsed documents.
//!
//! Validation never fails on content: it always hands back a
//! [`ValidatedDocument`] together with every diagnostic it found, and the
//! caller decides whether `Error` diagnostics should stop it. The only
//! failure is cooperative cancellation through [`validate_with`].

mod checks;
mod diagnostic;

use std::collections::HashSet;
use std::ops::Deref;

use tracing::debug;

use crate::cancel::{self, CancelToken};
use crate::error::Result;
use crate::output::Printer;
use crate::schema::{SchemaDef, SchemaRegistry};
use crate::types::{Block, Document, Field};

pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticRecord, Severity, ValidationResult};

/// How repeated keys inside one block are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep the first occurrence and report `DuplicateField`.
    #[default]
    Strict,
    /// Keep the last occurrence, silently.
    Permissive,
}

/// Validator configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    pub duplicates: DuplicatePolicy,
    /// Checked after each block.
    pub cancel: Option<CancelToken>,
}

impl ValidationOptions {
    pub fn permissive() -> Self {
        Self {
            duplicates: DuplicatePolicy::Permissive,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// A document that has been through the validator.
///
/// Defaults are injected, duplicates collapsed and schema'd blocks carry
/// their fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDocument(Document);

impl ValidatedDocument {
    pub fn document(&self) -> &Document {
        &self.0
    }

    pub fn into_inner(self) -> Document {
        self.0
    }
}

impl Deref for ValidatedDocument {
    type Target = Document;

    fn deref(&self) -> &Document {
        &self.0
    }
}

impl AsRef<Document> for ValidatedDocument {
    fn as_ref(&self) -> &Document {
        &self.0
    }
}

/// Validate with the default options.
pub fn validate(
    document: &Document,
    registry: &SchemaRegistry,
) -> (ValidatedDocument, ValidationResult) {
    let mut validator = Validator::new(document, registry, DuplicatePolicy::default());
    for block in &document.blocks {
        validator.block(block);
    }
    validator.finish()
}

/// Validate with explicit options.
pub fn validate_with(
    document: &Document,
    registry: &SchemaRegistry,
    options: &ValidationOptions,
) -> Result<(ValidatedDocument, ValidationResult)> {
    let mut validator = Validator::new(document, registry, options.duplicates);
    for block in &document.blocks {
        validator.block(block);
        cancel::check(options.cancel.as_ref())?;
    }
    Ok(validator.finish())
}

/// Put every schema'd block's fields in canonical order and change nothing else.
///
/// No defaults are injected, duplicates are kept and no diagnostics are
/// produced. Blocks without a schema are left as they are.
pub fn reorder_fields(document: &Document, registry: &SchemaRegistry) -> Document {
    let Some(def) = registry.namespace(&document.namespace) else {
        return document.clone();
    };

    let mut ordered = document.clone();
    for block in &mut ordered.blocks {
        if let Some(schema) = def.block(&block.kind) {
            checks::order_fields(&mut block.fields, schema);
        }
    }
    ordered
}

struct Validator<'a> {
    document: &'a Document,
    /// `None` when the namespace has no schema.
    schema: Option<&'a SchemaDef>,
    policy: DuplicatePolicy,
    fields: Vec<Field>,
    blocks: Vec<Block>,
    unknown_kinds: HashSet<String>,
    result: ValidationResult,
}

impl<'a> Validator<'a> {
    fn new(document: &'a Document, registry: &'a SchemaRegistry, policy: DuplicatePolicy) -> Self {
        let schema = registry.namespace(&document.namespace);
        let mut result = ValidationResult::new();

        if schema.is_none() {
            let known: Vec<&str> = registry
                .namespaces()
                .map(|def| def.namespace.as_str())
                .collect();
            let namespace = document.namespace();
            let mut diagnostic = Diagnostic::warning(
                DiagnosticCode::UnknownNamespace,
                namespace.span,
                format!(
                    "no schema for namespace \"{}\"; blocks are not checked",
                    namespace.value
                ),
            );
            if !known.is_empty() {
                diagnostic =
                    diagnostic.with_help(format!("known namespaces: {}", known.join(", ")));
            }
            result.push(diagnostic);
        }

        let fields = checks::check_duplicates(&document.fields, "top level", policy, &mut result);

        Self {
            document,
            schema,
            policy,
            fields,
            blocks: Vec::with_capacity(document.blocks.len()),
            unknown_kinds: HashSet::new(),
            result,
        }
    }

    fn block(&mut self, block: &Block) {
        let Some(def) = self.schema else {
            let unchecked = self.unchecked(block);
            self.blocks.push(unchecked);
            return;
        };

        match def.block(&block.kind) {
            Some(schema) => {
                let checked = checks::check_block(block, schema, self.policy, &mut self.result);
                self.blocks.push(checked);
            }
            None => {
                if self.unknown_kinds.insert(block.kind.clone()) {
                    self.result.push(Diagnostic::warning(
                        DiagnosticCode::UnknownBlock,
                        block.span,
                        format!(
                            "no schema for block '{}' in namespace \"{}\"",
                            block.kind, def.namespace
                        ),
                    ));
                }
                let unchecked = self.unchecked(block);
                self.blocks.push(unchecked);
            }
        }
    }

    /// A block without a schema still gets the duplicate policy.
    fn unchecked(&mut self, block: &Block) -> Block {
        Block {
            kind: block.kind.clone(),
            fields: checks::check_duplicates(
                &block.fields,
                &block.kind,
                self.policy,
                &mut self.result,
            ),
            span: block.span,
        }
    }

    fn finish(self) -> (ValidatedDocument, ValidationResult) {
        debug!(
            blocks = self.blocks.len(),
            errors = self.result.error_count(),
            warnings = self.result.warning_count(),
            infos = self.result.info_count(),
            "validated document"
        );

        let document = Document {
            namespace: self.document.namespace.clone(),
            namespace_span: self.document.namespace_span,
            fields: self.fields,
            blocks: self.blocks,
        };
        (ValidatedDocument(document), self.result)
    }
}

/// Print diagnostics to stderr, prefixed with `origin:line:column`.
pub fn print_diagnostics(result: &ValidationResult, origin: &str, printer: &Printer) {
    for d in result.iter() {
        let location = format!("{}:{}:{}", origin, d.span.line(), d.span.column());
        let message = format!(
            "{} {} {}",
            printer.cyan(&location),
            d.message,
            printer.dim(&format!("[{}]", d.code))
        );
        match d.severity {
            Severity::Error => printer.error("error", &message),
            Severity::Warning => printer.warning("warning", &message),
            Severity::Info => printer.info("info", &message),
        }
        if let Some(related) = d.related {
            printer.info("", &printer.dim(&format!("see also {}:{}", origin, related.start)));
        }
        if let Some(help) = &d.help {
            printer.info("help", help);
        }
    }
}
