//! Resolved schema definitions.
//!
//! These are the merged, immutable shapes the validator consults. Field keys
//! and block kinds are stored lowercased; lookups lowercase their argument.

use indexmap::IndexMap;

use crate::types::{Value, ValueType};

/// What a single field may contain.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub ty: ValueType,
    pub required: bool,
    /// Injected when a required field is absent.
    pub default: Option<Value>,
    /// Marks the whole block as tolerating undeclared fields.
    pub opt_out: bool,
}

impl FieldSpec {
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            required: false,
            default: None,
            opt_out: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// The declared fields of one block kind, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockSchema {
    pub kind: String,
    pub fields: IndexMap<String, FieldSpec>,
    /// Block-level opt-out policy.
    pub opt_out: bool,
}

impl BlockSchema {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// Add or replace a field spec (builder style).
    pub fn field(mut self, name: &str, spec: FieldSpec) -> Self {
        self.fields.insert(name.to_ascii_lowercase(), spec);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key.to_ascii_lowercase().as_str())
    }

    /// Declaration index of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.get_index_of(key.to_ascii_lowercase().as_str())
    }

    /// Whether undeclared fields pass through silently.
    pub fn is_opt_out(&self) -> bool {
        self.opt_out || self.fields.values().any(|spec| spec.opt_out)
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, spec)| (name.as_str(), spec))
    }
}

/// Every block schema for one namespace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaDef {
    pub namespace: String,
    pub blocks: IndexMap<String, BlockSchema>,
}

impl SchemaDef {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_ascii_lowercase(),
            blocks: IndexMap::new(),
        }
    }

    pub fn block(&self, kind: &str) -> Option<&BlockSchema> {
        self.blocks.get(kind.to_ascii_lowercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linedef() -> BlockSchema {
        BlockSchema::new("Linedef")
            .field("id", FieldSpec::new(ValueType::Int).required().with_default(-1i64))
            .field("v1", FieldSpec::new(ValueType::Int).required())
            .field("special", FieldSpec::new(ValueType::Int).with_default(0i64))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let schema = linedef();
        assert_eq!(schema.kind, "linedef");
        assert!(schema.get("ID").is_some());
        assert_eq!(schema.position("V1"), Some(1));
        assert_eq!(schema.position("v2"), None);
    }

    #[test]
    fn test_required_fields_in_order() {
        let def = linedef();
        let names: Vec<&str> = def.required_fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "v1"]);
    }

    #[test]
    fn test_opt_out_from_any_field() {
        let mut schema = linedef();
        assert!(!schema.is_opt_out());

        let mut spec = FieldSpec::new(ValueType::String);
        spec.opt_out = true;
        schema = schema.field("comment", spec);
        assert!(schema.is_opt_out());
    }
}
