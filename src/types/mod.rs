//! Core domain types for udmf.
//!
//! - `Value` / `ValueType` - tagged literal values and their type tags
//! - `Document`, `Block`, `Field` - the ordered document tree

mod document;
mod value;

pub use document::{Block, BlockId, Document, Field, ValueError};
pub use value::{escape_string, unescape_string, Value, ValueType};
