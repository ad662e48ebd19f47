use miette::Diagnostic;
use thiserror::Error;

use crate::parser::ParseError;
use crate::render::PrintError;
use crate::schema::SchemaError;

/// Main error type for udmf operations
#[derive(Error, Diagnostic, Debug)]
pub enum UdmfError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(udmf::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Print(#[from] PrintError),

    #[error("Operation cancelled")]
    #[diagnostic(code(udmf::cancelled))]
    Cancelled,
}

impl UdmfError {
    /// Whether this is a cooperative cancellation rather than a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, UdmfError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, UdmfError>;
