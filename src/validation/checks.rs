//! Per-block checks against a [`BlockSchema`].
//!
//! Each check reads the block, records diagnostics into a
//! [`ValidationResult`] and returns the fields that survive it.

use std::collections::HashMap;

use crate::schema::BlockSchema;
use crate::types::{Block, Field};

use super::diagnostic::{Diagnostic, DiagnosticCode, ValidationResult};
use super::DuplicatePolicy;

/// Run every check on one block and return its validated form.
pub fn check_block(
    block: &Block,
    schema: &BlockSchema,
    policy: DuplicatePolicy,
    result: &mut ValidationResult,
) -> Block {
    let fields = check_duplicates(&block.fields, &block.kind, policy, result);
    check_fields(block, &fields, schema, result);
    let mut fields = inject_defaults(block, fields, schema, result);
    order_fields(&mut fields, schema);

    Block {
        kind: block.kind.clone(),
        fields,
        span: block.span,
    }
}

/// Declared fields in schema order, then the rest in source order.
pub fn order_fields(fields: &mut [Field], schema: &BlockSchema) {
    // stable, so undeclared fields keep their relative order
    fields.sort_by_key(|field| schema.position(&field.key).unwrap_or(usize::MAX));
}

/// Collapse repeated keys according to `policy`.
///
/// `context` names where the fields live (a block kind, or the top level)
/// for the diagnostic message.
pub fn check_duplicates(
    fields: &[Field],
    context: &str,
    policy: DuplicatePolicy,
    result: &mut ValidationResult,
) -> Vec<Field> {
    let mut kept: Vec<Field> = Vec::with_capacity(fields.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for field in fields {
        let key = field.key.to_ascii_lowercase();
        match index.get(&key) {
            None => {
                index.insert(key, kept.len());
                kept.push(field.clone());
            }
            Some(&slot) => match policy {
                DuplicatePolicy::Strict => {
                    let first = &kept[slot];
                    result.push(
                        Diagnostic::error(
                            DiagnosticCode::DuplicateField,
                            field.span,
                            format!(
                                "duplicate field '{}' in {} (first set at {})",
                                field.key, context, first.span.start
                            ),
                        )
                        .with_related(first.span)
                        .with_help("remove one of the assignments; the first one is kept"),
                    );
                }
                DuplicatePolicy::Permissive => kept[slot] = field.clone(),
            },
        }
    }

    kept
}

/// Type-check declared fields and flag undeclared ones.
pub fn check_fields(
    block: &Block,
    fields: &[Field],
    schema: &BlockSchema,
    result: &mut ValidationResult,
) {
    let opt_out = schema.is_opt_out();

    for field in fields {
        match schema.get(&field.key) {
            Some(spec) if !spec.ty.accepts(&field.value) => {
                result.push(Diagnostic::error(
                    DiagnosticCode::TypeMismatch,
                    field.span,
                    format!(
                        "field '{}' in {} expects {}, found {}",
                        field.key,
                        block.kind,
                        spec.ty,
                        field.value.type_name()
                    ),
                ));
            }
            Some(_) => {}
            None if opt_out => {}
            None => {
                result.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnknownField,
                        field.span,
                        format!("unknown field '{}' in {}", field.key, block.kind),
                    )
                    .with_help("declare it in a schema layer, or mark the block opt_out"),
                );
            }
        }
    }
}

/// Fill in absent required fields that have a default.
pub fn inject_defaults(
    block: &Block,
    mut fields: Vec<Field>,
    schema: &BlockSchema,
    result: &mut ValidationResult,
) -> Vec<Field> {
    for (name, spec) in schema.required_fields() {
        if fields.iter().any(|field| field.is(name)) {
            continue;
        }

        match &spec.default {
            Some(default) => {
                result.push(Diagnostic::info(
                    DiagnosticCode::DefaultInjected,
                    block.span,
                    format!("{} is missing '{}'; using default {}", block.kind, name, default),
                ));
                fields.push(Field::synthesized(name, default.clone()));
            }
            None => {
                result.push(
                    Diagnostic::error(
                        DiagnosticCode::MissingRequiredField,
                        block.span,
                        format!("{} is missing required field '{}'", block.kind, name),
                    )
                    .with_help(format!("add {} = <{}>;", name, spec.ty)),
                );
            }
        }
    }

    fields
}
