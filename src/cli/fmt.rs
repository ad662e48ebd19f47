//! Fmt command implementation.
//!
//! Rewrites text maps in canonical layout. Fields of schema'd blocks are put
//! in declaration order; nothing is injected or dropped, so a map with
//! validation problems still formats to the same content.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use miette::{NamedSource, Report};

use crate::discovery::scan_paths;
use crate::error::{Result, UdmfError};
use crate::output::{display_path, plural, Printer};
use crate::parser::parse;
use crate::render::print;
use crate::schema::SchemaRegistry;
use crate::validation::reorder_fields;

use super::SchemaSource;

/// Rewrite text maps in canonical form
#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Files or directories to format (directories are searched for TEXTMAP, *.textmap, *.udmf)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaSource,

    /// Report files that would change without writing them
    #[arg(long)]
    pub check: bool,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    /// Rewritten, or would be under `--check`.
    Changed,
    Failed,
}

/// Tally of a fmt run. `ok()` is false if anything failed, or changed under `--check`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FmtSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub failed: usize,
    pub check: bool,
}

impl FmtSummary {
    pub fn ok(&self) -> bool {
        self.failed == 0 && !(self.check && self.changed > 0)
    }
}

pub fn run(args: FmtArgs, printer: &Printer) -> Result<FmtSummary> {
    let registry = args.schema.registry()?;
    let files = scan_paths(&args.paths);
    let mut summary = FmtSummary {
        check: args.check,
        ..Default::default()
    };

    for file in &files {
        match format_file(file, &registry, args.check, printer)? {
            FileStatus::Unchanged => summary.unchanged += 1,
            FileStatus::Changed => summary.changed += 1,
            FileStatus::Failed => summary.failed += 1,
        }
    }

    let verb = if args.check { "Checked" } else { "Formatted" };
    let message = format!(
        "{} ({} changed, {} failed)",
        plural(files.len(), "file", "files"),
        summary.changed,
        summary.failed
    );
    if summary.ok() {
        printer.status(verb, &message);
    } else {
        printer.warning(verb, &message);
    }

    Ok(summary)
}

/// Format one file. Parse errors are reported and counted, not returned.
pub fn format_file(
    path: &Path,
    registry: &SchemaRegistry,
    check: bool,
    printer: &Printer,
) -> Result<FileStatus> {
    let source = fs::read_to_string(path).map_err(|e| UdmfError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read file: {}", e),
    })?;

    let document = match parse(&source) {
        Ok(parsed) => parsed.document,
        Err(UdmfError::Parse(error)) => {
            let report = Report::new(error)
                .with_source_code(NamedSource::new(display_path(path), source));
            eprintln!("{:?}", report);
            return Ok(FileStatus::Failed);
        }
        Err(other) => return Err(other),
    };

    let formatted = print(&reorder_fields(&document, registry))?;
    if formatted == source {
        return Ok(FileStatus::Unchanged);
    }

    if check {
        printer.warning("Unformatted", &display_path(path));
    } else {
        fs::write(path, &formatted).map_err(|e| UdmfError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to write file: {}", e),
        })?;
        printer.status("Rewrote", &display_path(path));
    }
    Ok(FileStatus::Changed)
}
