//! Schema layer files.
//!
//! A layer is a YAML document naming the namespace it applies to and the
//! field directives for each block kind:
//!
//! ```yaml
//! namespace: ringracers
//! blocks:
//!   linedef:
//!     fields:
//!       - { name: sidefront, type: int, required: true, default: 0 }
//!   thing:
//!     opt_out: true
//! ```
//!
//! In an override layer every directive property is optional; whatever is
//! left out is inherited from the layers below.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{Value, ValueType};

use super::SchemaError;

/// One layer of schema configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaLayer {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub blocks: IndexMap<String, BlockDirective>,
}

/// Directives for one block kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDirective {
    #[serde(default, alias = "optOut", skip_serializing_if = "Option::is_none")]
    pub opt_out: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDirective>,
}

/// Directives for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDirective {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, alias = "optOut", skip_serializing_if = "Option::is_none")]
    pub opt_out: Option<bool>,
}

impl FieldDirective {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            required: None,
            default: None,
            opt_out: None,
        }
    }
}

impl SchemaLayer {
    /// Load a layer from a YAML file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| match error {
            SchemaError::Invalid { message, .. } => SchemaError::Invalid {
                origin: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a layer from YAML text.
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(content).map_err(|e| SchemaError::Invalid {
            origin: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Render the layer back to YAML.
    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(self).map_err(|e| SchemaError::Invalid {
            origin: self.namespace.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layer() {
        let yaml = r#"
namespace: ringracers
blocks:
  linedef:
    fields:
      - { name: id, type: int, required: true, default: -1 }
      - { name: twosided, type: boolean, default: false }
  thing:
    optOut: true
"#;
        let layer = SchemaLayer::parse(yaml).unwrap();
        assert_eq!(layer.namespace, "ringracers");

        let kinds: Vec<&str> = layer.blocks.keys().map(|k| k.as_str()).collect();
        assert_eq!(kinds, vec!["linedef", "thing"]);

        let linedef = &layer.blocks["linedef"];
        assert_eq!(linedef.fields[0].ty, Some(ValueType::Int));
        assert_eq!(linedef.fields[0].default, Some(Value::Integer(-1)));
        assert_eq!(linedef.fields[1].ty, Some(ValueType::Bool));
        assert_eq!(layer.blocks["thing"].opt_out, Some(true));
    }

    #[test]
    fn test_override_fields_are_partial() {
        let yaml = "namespace: ringracers\nblocks:\n  linedef:\n    fields:\n      - { name: sidefront, required: true }\n";
        let layer = SchemaLayer::parse(yaml).unwrap();
        let field = &layer.blocks["linedef"].fields[0];
        assert_eq!(field.ty, None);
        assert_eq!(field.required, Some(true));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = SchemaLayer::parse("namespace: x\ncolour: red\n");
        assert!(matches!(result, Err(SchemaError::Invalid { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SchemaLayer::load(Path::new("/nonexistent/layer.yaml"));
        assert!(matches!(result, Err(SchemaError::Io { .. })));
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut layer = SchemaLayer {
            namespace: "srb2".to_string(),
            ..Default::default()
        };
        layer.blocks.insert(
            "vertex".to_string(),
            BlockDirective {
                opt_out: None,
                fields: vec![FieldDirective::new("x", ValueType::Float)],
            },
        );

        let yaml = layer.to_yaml().unwrap();
        assert_eq!(SchemaLayer::parse(&yaml).unwrap(), layer);
    }
}
