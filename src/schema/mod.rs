//! Layered schema registry.
//!
//! The registry answers one question: which fields may a block of a given
//! kind carry in a given namespace. It is assembled from an ordered list of
//! [`SchemaLayer`]s (a base profile followed by user overrides) and is
//! immutable once built, so a single registry can back any number of
//! concurrent validations.
//!
//! # Example
//!
//! ```
//! use udmf::schema::{BuiltinProfiles, RegistryBuilder, SchemaLayer};
//!
//! let overrides = SchemaLayer::parse(
//!     "namespace: ringracers\nblocks:\n  linedef:\n    fields:\n      - { name: sidefront, required: true, default: 0 }\n",
//! ).unwrap();
//!
//! let mut builder = RegistryBuilder::new();
//! builder.add_builtin(BuiltinProfiles::DEFAULT).unwrap();
//! builder.add_layer(overrides);
//!
//! let registry = builder.build().unwrap();
//! let linedef = registry.schema_for("ringracers", "linedef").unwrap();
//! assert!(linedef.get("sidefront").unwrap().required);
//! ```

mod builtin;
pub mod config;
pub mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::parser::is_identifier;
use crate::types::{Value, ValueType};

pub use builtin::BuiltinProfiles;
pub use config::{BlockDirective, FieldDirective, SchemaLayer};
pub use types::{BlockSchema, FieldSpec, SchemaDef};

/// Malformed schema configuration.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Failed to read schema layer {path}: {message}")]
    #[diagnostic(code(udmf::schema::io))]
    Io { path: PathBuf, message: String },

    #[error("Invalid schema layer {origin}: {message}")]
    #[diagnostic(code(udmf::schema::invalid), help("Check the layer's YAML syntax"))]
    Invalid { origin: String, message: String },

    #[error("Schema layer has an empty namespace")]
    #[diagnostic(code(udmf::schema::empty_namespace))]
    EmptyNamespace,

    #[error("'{name}' is not a valid {what} name")]
    #[diagnostic(
        code(udmf::schema::invalid_name),
        help("Names start with a letter or '_' and contain only letters, digits and '_'")
    )]
    InvalidName { what: &'static str, name: String },

    #[error("Field '{field}' is declared twice for block '{block}'")]
    #[diagnostic(code(udmf::schema::duplicate_field))]
    DuplicateField { block: String, field: String },

    #[error("Field '{block}.{field}' has no type")]
    #[diagnostic(
        code(udmf::schema::missing_type),
        help("Fields introduced by a layer must declare `type`")
    )]
    MissingType { block: String, field: String },

    #[error("Default for '{block}.{field}' is a {found}, but the field is declared {expected}")]
    #[diagnostic(code(udmf::schema::invalid_default))]
    InvalidDefault {
        block: String,
        field: String,
        expected: ValueType,
        found: &'static str,
    },

    #[error("Default for '{block}.{field}' is {value}, which has no UDMF literal")]
    #[diagnostic(
        code(udmf::schema::non_finite_default),
        help("Use a finite number; .inf and .nan cannot be written to a map")
    )]
    NonFiniteDefault {
        block: String,
        field: String,
        value: f64,
    },

    #[error("Unknown schema profile '{name}'")]
    #[diagnostic(code(udmf::schema::unknown_profile))]
    UnknownProfile {
        name: String,
        #[help]
        help: Option<String>,
    },
}

/// The merged, read-only schema set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    namespaces: IndexMap<String, SchemaDef>,
}

impl SchemaRegistry {
    /// A registry holding only the named builtin profile.
    pub fn builtin(name: &str) -> Result<Self, SchemaError> {
        let mut builder = RegistryBuilder::new();
        builder.add_builtin(name)?;
        builder.build()
    }

    /// Look up the schema for a block kind in a namespace.
    pub fn schema_for(&self, namespace: &str, kind: &str) -> Option<&BlockSchema> {
        self.namespace(namespace)?.block(kind)
    }

    pub fn namespace(&self, namespace: &str) -> Option<&SchemaDef> {
        self.namespaces.get(namespace.to_ascii_lowercase().as_str())
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespace(namespace).is_some()
    }

    /// All namespaces in the order their first layer introduced them.
    pub fn namespaces(&self) -> impl Iterator<Item = &SchemaDef> {
        self.namespaces.values()
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Flatten the registry back into one fully-specified layer per namespace.
    pub fn to_layers(&self) -> Vec<SchemaLayer> {
        self.namespaces
            .values()
            .map(|def| SchemaLayer {
                namespace: def.namespace.clone(),
                blocks: def
                    .blocks
                    .values()
                    .map(|schema| {
                        let fields = schema
                            .fields
                            .iter()
                            .map(|(name, spec)| FieldDirective {
                                name: name.clone(),
                                ty: Some(spec.ty),
                                required: spec.required.then_some(true),
                                default: spec.default.clone(),
                                opt_out: spec.opt_out.then_some(true),
                            })
                            .collect();
                        let directive = BlockDirective {
                            opt_out: schema.opt_out.then_some(true),
                            fields,
                        };
                        (schema.kind.clone(), directive)
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Builder for constructing a [`SchemaRegistry`].
///
/// Layers are merged in the order they were added; later layers win.
#[derive(Debug, Default, Clone)]
pub struct RegistryBuilder {
    layers: Vec<SchemaLayer>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer on top of the ones already added.
    pub fn add_layer(&mut self, layer: SchemaLayer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    /// Add multiple layers.
    pub fn add_layers(&mut self, layers: impl IntoIterator<Item = SchemaLayer>) -> &mut Self {
        for layer in layers {
            self.add_layer(layer);
        }
        self
    }

    /// Add a builtin profile by name.
    pub fn add_builtin(&mut self, name: &str) -> Result<&mut Self, SchemaError> {
        match BuiltinProfiles::get(name)? {
            Some(layer) => Ok(self.add_layer(layer)),
            None => Err(SchemaError::UnknownProfile {
                name: name.to_string(),
                help: Some(format!(
                    "Builtin profiles: {}. Pass a path to load a layer file instead",
                    BuiltinProfiles::names().join(", ")
                )),
            }),
        }
    }

    /// Add a layer loaded from a YAML file.
    pub fn add_file(&mut self, path: &Path) -> Result<&mut Self, SchemaError> {
        let layer = SchemaLayer::load(path)?;
        Ok(self.add_layer(layer))
    }

    /// Merge every layer, in order, into a registry.
    pub fn build(&self) -> Result<SchemaRegistry, SchemaError> {
        let namespaces = self.layers.iter().try_fold(IndexMap::new(), merge_layer)?;

        debug!(
            layers = self.layers.len(),
            namespaces = namespaces.len(),
            "built schema registry"
        );

        Ok(SchemaRegistry { namespaces })
    }
}

/// Fold one layer over the schemas merged so far.
fn merge_layer(
    mut namespaces: IndexMap<String, SchemaDef>,
    layer: &SchemaLayer,
) -> Result<IndexMap<String, SchemaDef>, SchemaError> {
    let namespace = layer.namespace.trim();
    if namespace.is_empty() {
        return Err(SchemaError::EmptyNamespace);
    }
    check_name("namespace", namespace)?;

    let def = namespaces
        .entry(namespace.to_ascii_lowercase())
        .or_insert_with(|| SchemaDef::new(namespace));

    for (kind, directive) in &layer.blocks {
        check_name("block", kind)?;
        let schema = def
            .blocks
            .entry(kind.to_ascii_lowercase())
            .or_insert_with(|| BlockSchema::new(kind));

        if let Some(opt_out) = directive.opt_out {
            schema.opt_out = opt_out;
        }

        let mut seen = HashSet::new();
        for field in &directive.fields {
            check_name("field", &field.name)?;
            let key = field.name.to_ascii_lowercase();
            if !seen.insert(key.clone()) {
                return Err(SchemaError::DuplicateField {
                    block: schema.kind.clone(),
                    field: field.name.clone(),
                });
            }

            let spec = merge_field(&schema.kind, schema.fields.get(&key), field)?;
            // existing keys keep their declaration slot
            schema.fields.insert(key, spec);
        }
    }

    Ok(namespaces)
}

/// Apply a directive to the spec it overrides, if any.
fn merge_field(
    block: &str,
    existing: Option<&FieldSpec>,
    directive: &FieldDirective,
) -> Result<FieldSpec, SchemaError> {
    let ty = match (directive.ty, existing) {
        (Some(ty), _) => ty,
        (None, Some(existing)) => existing.ty,
        (None, None) => {
            return Err(SchemaError::MissingType {
                block: block.to_string(),
                field: directive.name.clone(),
            })
        }
    };

    let default = directive
        .default
        .clone()
        .or_else(|| existing.and_then(|spec| spec.default.clone()));
    let default = match default {
        Some(value) => {
            let found = value.type_name();
            let coerced = ty.coerce(value).ok_or_else(|| SchemaError::InvalidDefault {
                block: block.to_string(),
                field: directive.name.clone(),
                expected: ty,
                found,
            })?;
            if let Value::Float(value) = coerced {
                if !value.is_finite() {
                    return Err(SchemaError::NonFiniteDefault {
                        block: block.to_string(),
                        field: directive.name.clone(),
                        value,
                    });
                }
            }
            Some(coerced)
        }
        None => None,
    };

    Ok(FieldSpec {
        ty,
        required: directive
            .required
            .or(existing.map(|spec| spec.required))
            .unwrap_or(false),
        default,
        opt_out: directive
            .opt_out
            .or(existing.map(|spec| spec.opt_out))
            .unwrap_or(false),
    })
}

fn check_name(what: &'static str, name: &str) -> Result<(), SchemaError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            what,
            name: name.to_string(),
        })
    }
}
