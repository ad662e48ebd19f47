//! Rendering documents back to text.
//!
//! The printer is the last stage of the pipeline and the inverse of the
//! parser: any document the parser or validator produced prints, re-parses
//! to an equal document, and prints again byte for byte.

mod text;

pub use text::{print, print_with, PrintError, PrintOptions};
