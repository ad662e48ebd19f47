//! Schema profiles shipped with the binary.

use super::config::SchemaLayer;
use super::SchemaError;

const RINGRACERS: &str = include_str!("profiles/ringracers.yaml");

/// Collection of builtin base profiles.
pub struct BuiltinProfiles;

impl BuiltinProfiles {
    /// Profile used when none is named.
    pub const DEFAULT: &'static str = "ringracers";

    /// Names of all builtin profiles.
    pub fn names() -> &'static [&'static str] {
        &["ringracers"]
    }

    /// Get a builtin profile by name.
    ///
    /// Returns `Ok(None)` for names that are not builtin.
    pub fn get(name: &str) -> Result<Option<SchemaLayer>, SchemaError> {
        let source = match name.to_ascii_lowercase().as_str() {
            "ringracers" => RINGRACERS,
            _ => return Ok(None),
        };
        SchemaLayer::parse(source).map(Some)
    }
}
