//! The document tree produced by the parser.
//!
//! A [`Document`] is a namespace, the remaining top-level assignments and an
//! ordered list of blocks. Blocks live in a flat `Vec` addressed by
//! [`BlockId`]; there are no cross-block references at this layer.
//!
//! Documents are values. Edits go through the `with_*`/`without_*` methods,
//! which leave the receiver untouched and return a new document, so a parsed
//! document can be shared freely between readers.
//!
//! Equality is structural: spans are source metadata and are ignored, so a
//! document compares equal to the result of printing and re-parsing it.

use serde::Serialize;
use thiserror::Error;

use crate::parser::span::{Span, Spanned};

use super::value::Value;

/// Positional index of a block within its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// A single `key = value;` assignment.
#[derive(Debug, Clone, Serialize)]
pub struct Field {
    /// Key with its original casing.
    pub key: String,
    pub value: Value,
    /// Span of the whole assignment, key through `;`.
    #[serde(skip)]
    pub span: Span,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>, span: Span) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            span,
        }
    }

    /// Build a field that has no source position.
    pub fn synthesized(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(key, value, Span::default())
    }

    /// Whether this field's key matches `key`, ignoring ASCII case.
    pub fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

/// A named group of fields, e.g. one `linedef { ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Lowercased block kind.
    pub kind: String,
    pub fields: Vec<Field>,
    /// Span of the block from its kind identifier through `}`.
    #[serde(skip)]
    pub span: Span,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.fields == other.fields
    }
}

/// Error for typed field access on a [`Block`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("field '{key}' is {found}, expected {expected}")]
    InvalidType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl Block {
    /// Create an empty block. The kind is lowercased.
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self {
            kind: kind.as_ref().to_ascii_lowercase(),
            fields: Vec::new(),
            span: Span::default(),
        }
    }

    /// Builder-style field append.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field::synthesized(key, value));
        self
    }

    /// First field with the given key (ASCII case-insensitive).
    pub fn get_field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.is(key))
    }

    /// First value with the given key (ASCII case-insensitive).
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_field(key).map(|f| &f.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_field(key).is_some()
    }

    fn require(&self, key: &str) -> Result<&Value, ValueError> {
        self.get(key)
            .ok_or_else(|| ValueError::MissingField(key.to_owned()))
    }

    fn invalid(key: &str, expected: &'static str, found: &Value) -> ValueError {
        ValueError::InvalidType {
            key: key.to_owned(),
            expected,
            found: found.type_name(),
        }
    }

    /// Gets a value as an integer.
    pub fn get_int(&self, key: &str) -> Result<i64, ValueError> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| Self::invalid(key, "integer", value))
    }

    /// Gets a value as a float. Integers widen.
    pub fn get_float(&self, key: &str) -> Result<f64, ValueError> {
        let value = self.require(key)?;
        value.as_float().ok_or_else(|| Self::invalid(key, "float", value))
    }

    /// Gets a value as an optional float.
    pub fn get_optional_float(&self, key: &str) -> Result<Option<f64>, ValueError> {
        self.get(key)
            .map(|value| value.as_float().ok_or_else(|| Self::invalid(key, "float", value)))
            .transpose()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ValueError> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| Self::invalid(key, "boolean", value))
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ValueError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| Self::invalid(key, "string", value))
    }

    /// Excludes all the keys passed.
    pub fn without(mut self, keys: &[&str]) -> Self {
        self.fields.retain(|f| !keys.iter().any(|k| f.is(k)));
        self
    }

    /// Replace the first field matching `key`, or append a new one.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.is(key)) {
            Some(field) => field.value = value,
            None => self.fields.push(Field::synthesized(key, value)),
        }
        self
    }
}

/// A parsed UDMF document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// The declared dialect.
    pub namespace: String,
    /// Span of the `namespace = "...";` assignment.
    #[serde(skip)]
    pub namespace_span: Span,
    /// Top-level assignments other than `namespace`, in source order.
    pub fields: Vec<Field>,
    /// Blocks in source order.
    pub blocks: Vec<Block>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.fields == other.fields
            && self.blocks == other.blocks
    }
}

impl Document {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// The namespace with its source span.
    pub fn namespace(&self) -> Spanned<&str> {
        Spanned::new(self.namespace.as_str(), self.namespace_span)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    /// Iterate blocks with their ids.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter().enumerate().map(|(i, b)| (BlockId(i), b))
    }

    /// Blocks of a kind (case-insensitive), with ids.
    pub fn blocks_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (BlockId, &'a Block)> + 'a {
        self.iter_blocks()
            .filter(move |(_, b)| b.kind.eq_ignore_ascii_case(kind))
    }

    /// Top-level field by key (case-insensitive).
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.is(key))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// New document with `block` appended. Returns its id alongside.
    pub fn with_block(&self, block: Block) -> (Document, BlockId) {
        let mut doc = self.clone();
        doc.blocks.push(block);
        let id = BlockId(doc.blocks.len() - 1);
        (doc, id)
    }

    /// New document without the block at `id`. Later ids shift down by one.
    pub fn without_block(&self, id: BlockId) -> Document {
        let mut doc = self.clone();
        if id.0 < doc.blocks.len() {
            doc.blocks.remove(id.0);
        }
        doc
    }

    /// New document where block `id` has `key` set to `value`.
    ///
    /// An existing field keeps its position; a new one is appended.
    pub fn with_field(&self, id: BlockId, key: &str, value: impl Into<Value>) -> Document {
        let mut doc = self.clone();
        if let Some(block) = doc.blocks.get_mut(id.0) {
            *block = block.clone().with(key, value);
        }
        doc
    }

    /// New document where block `id` no longer has `key`.
    pub fn without_field(&self, id: BlockId, key: &str) -> Document {
        let mut doc = self.clone();
        if let Some(block) = doc.blocks.get_mut(id.0) {
            block.fields.retain(|f| !f.is(key));
        }
        doc
    }

    /// New document with a top-level assignment set.
    ///
    /// `namespace` is routed to the namespace itself when given a string.
    pub fn with_top_level_field(&self, key: &str, value: impl Into<Value>) -> Document {
        let mut doc = self.clone();
        let value = value.into();
        if key.eq_ignore_ascii_case("namespace") {
            if let Value::String(ns) = value {
                doc.namespace = ns;
            }
            return doc;
        }
        match doc.fields.iter_mut().find(|f| f.is(key)) {
            Some(field) => field.value = value,
            None => doc.fields.push(Field::synthesized(key, value)),
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::span::Location;

    fn vertex(x: f64, y: f64) -> Block {
        Block::new("VERTEX").field("x", x).field("y", y)
    }

    #[test]
    fn test_block_kind_lowercased() {
        assert_eq!(Block::new("LineDef").kind, "linedef");
    }

    #[test]
    fn test_typed_getters() {
        let thing = Block::new("thing")
            .field("x", 43.0)
            .field("angle", 30)
            .field("arg0", "WADSUP")
            .field("arg1", true);

        assert_eq!(thing.get_float("x"), Ok(43.0));
        assert_eq!(thing.get_float("angle"), Ok(30.0));
        assert_eq!(thing.get_int("angle"), Ok(30));
        assert_eq!(thing.get_str("arg0"), Ok("WADSUP"));
        assert_eq!(thing.get_bool("arg1"), Ok(true));
        assert_eq!(thing.get_optional_float("height"), Ok(None));
        assert_eq!(
            thing.get_int("type"),
            Err(ValueError::MissingField("type".to_string()))
        );
        assert!(matches!(
            thing.get_int("x"),
            Err(ValueError::InvalidType { found: "float", .. })
        ));
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let block = Block::new("sector").field("LightLevel", 160);
        assert_eq!(block.get("lightlevel"), Some(&Value::Integer(160)));
    }

    #[test]
    fn test_without() {
        let thing = Block::new("thing").field("x", 1.0).field("y", 2.0).field("type", 1);
        let rest = thing.without(&["x", "Y"]);
        assert_eq!(rest.fields.len(), 1);
        assert!(rest.contains("type"));
    }

    #[test]
    fn test_equality_ignores_spans() {
        let span = Span::new(Location::new(4, 1, 5), Location::new(10, 1, 11));
        let a = Field::new("id", 1, span);
        let b = Field::synthesized("id", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_edits_do_not_touch_original() {
        let doc = Document::new("ringracers");
        let (doc2, id) = doc.with_block(vertex(0.0, 0.0));
        let doc3 = doc2.with_field(id, "x", 64.0);

        assert!(doc.is_empty());
        assert_eq!(doc2.block(id).unwrap().get_float("x"), Ok(0.0));
        assert_eq!(doc3.block(id).unwrap().get_float("x"), Ok(64.0));
        // edited field keeps its slot
        assert_eq!(doc3.block(id).unwrap().fields[0].key, "x");
    }

    #[test]
    fn test_without_block_and_field() {
        let doc = Document::new("ringracers");
        let (doc, first) = doc.with_block(vertex(0.0, 0.0));
        let (doc, _) = doc.with_block(vertex(1.0, 1.0));

        let trimmed = doc.without_field(first, "y");
        assert!(!trimmed.block(first).unwrap().contains("y"));
        assert!(doc.block(first).unwrap().contains("y"));

        let removed = doc.without_block(first);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed.block(BlockId(0)).unwrap().get_float("x"), Ok(1.0));
    }

    #[test]
    fn test_blocks_of_kind() {
        let doc = Document::new("ringracers");
        let (doc, _) = doc.with_block(vertex(0.0, 0.0));
        let (doc, _) = doc.with_block(Block::new("sector"));
        let (doc, _) = doc.with_block(vertex(1.0, 0.0));

        let ids: Vec<BlockId> = doc.blocks_of_kind("Vertex").map(|(id, _)| id).collect();
        assert_eq!(ids, vec![BlockId(0), BlockId(2)]);
    }

    #[test]
    fn test_top_level_edits() {
        let doc = Document::new("ringracers")
            .with_top_level_field("version", 1)
            .with_top_level_field("version", 2)
            .with_top_level_field("namespace", "srb2");

        assert_eq!(doc.namespace, "srb2");
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.field("version").unwrap().value, Value::Integer(2));
    }
}
