//! Parse command implementation.
//!
//! Exit codes: `0` success, `1` parse failure, `2` validation errors in
//! strict mode. Permissive mode reports everything and exits `0`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, ValueEnum};
use miette::{NamedSource, Report};
use serde::Serialize;

use crate::error::{Result, UdmfError};
use crate::output::{display_path, plural, Printer};
use crate::parser::{parse_with, ParseError, ParseMode, ParseOptions};
use crate::render::print;
use crate::validation::{
    print_diagnostics, validate_with, DiagnosticRecord, DuplicatePolicy, ValidatedDocument,
    ValidationOptions, ValidationResult,
};

use super::SchemaSource;

/// How a parse run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    ParseFailure,
    /// Error-severity validation diagnostics in strict mode.
    ValidationFailure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::ParseFailure => ExitCode::from(1),
            Outcome::ValidationFailure => ExitCode::from(2),
        }
    }
}

/// Parse and validate a text map
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// TEXTMAP file to read
    pub file: PathBuf,

    #[command(flatten)]
    pub schema: SchemaSource,

    /// Stop at the first parse error and fail on validation errors (default)
    #[arg(long, conflicts_with = "permissive")]
    pub strict: bool,

    /// Recover from parse errors and report everything
    #[arg(long)]
    pub permissive: bool,

    /// How diagnostics are reported
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Also write the validated document to stdout
    #[arg(long, value_enum)]
    pub emit: Option<Emit>,
}

impl ParseArgs {
    fn mode(&self) -> ParseMode {
        if self.permissive {
            ParseMode::Permissive
        } else {
            ParseMode::Strict
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable, on stderr
    Text,
    /// One JSON object on stdout
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// Canonical UDMF text
    Text,
    /// The document tree as JSON
    Json,
}

/// JSON report for `--format json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    mode: &'static str,
    namespace: Option<&'a str>,
    blocks: usize,
    diagnostics: Vec<DiagnosticRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<serde_json::Value>,
}

pub fn run(args: ParseArgs, printer: &Printer) -> Result<Outcome> {
    let registry = args.schema.registry()?;
    let source = std::fs::read_to_string(&args.file).map_err(|e| UdmfError::Io {
        path: args.file.clone(),
        message: format!("Failed to read file: {}", e),
    })?;
    let origin = display_path(&args.file);
    let mode = args.mode();

    printer.status("Parsing", &origin);

    let parsed = match parse_with(&source, &ParseOptions { mode, cancel: None }) {
        Ok(parsed) => parsed,
        Err(UdmfError::Parse(error)) => {
            match args.format {
                Format::Text => report_parse_error(&error, &args.file, &source),
                Format::Json => {
                    let report = JsonReport {
                        file: origin,
                        mode: mode_name(mode),
                        namespace: None,
                        blocks: 0,
                        diagnostics: vec![DiagnosticRecord::from(&error)],
                        document: None,
                    };
                    write_json(&report)?;
                }
            }
            printer.error("Failed", &format!("{} could not be parsed", display_path(&args.file)));
            return Ok(Outcome::ParseFailure);
        }
        Err(other) => return Err(other),
    };

    let duplicates = match mode {
        ParseMode::Strict => DuplicatePolicy::Strict,
        ParseMode::Permissive => DuplicatePolicy::Permissive,
    };
    let options = ValidationOptions {
        duplicates,
        cancel: None,
    };
    let (document, result) = validate_with(&parsed.document, &registry, &options)?;

    match args.format {
        Format::Text => {
            for error in &parsed.diagnostics {
                report_parse_error(error, &args.file, &source);
            }
            print_diagnostics(&result, &origin, printer);
            if let Some(emit) = args.emit {
                print!("{}", emit_document(&document, emit)?);
            }
        }
        Format::Json => {
            let mut diagnostics: Vec<DiagnosticRecord> =
                parsed.diagnostics.iter().map(DiagnosticRecord::from).collect();
            diagnostics.extend(result.records());

            let emitted = match args.emit {
                Some(Emit::Json) => Some(to_json_value(document.document())?),
                Some(Emit::Text) => Some(serde_json::Value::String(print(&document)?)),
                None => None,
            };
            let report = JsonReport {
                file: origin.clone(),
                mode: mode_name(mode),
                namespace: Some(document.namespace.as_str()),
                blocks: document.blocks.len(),
                diagnostics,
                document: emitted,
            };
            write_json(&report)?;
        }
    }

    summarize(printer, &origin, &document, &parsed.diagnostics, &result);

    if mode == ParseMode::Strict && result.has_errors() {
        return Ok(Outcome::ValidationFailure);
    }
    Ok(Outcome::Success)
}

fn mode_name(mode: ParseMode) -> &'static str {
    match mode {
        ParseMode::Strict => "strict",
        ParseMode::Permissive => "permissive",
    }
}

/// Render a parse error with its source snippet.
fn report_parse_error(error: &ParseError, path: &Path, source: &str) {
    let report = Report::new(error.clone())
        .with_source_code(NamedSource::new(display_path(path), source.to_string()));
    eprintln!("{:?}", report);
}

fn emit_document(document: &ValidatedDocument, emit: Emit) -> Result<String> {
    match emit {
        Emit::Text => print(document),
        Emit::Json => {
            let value = to_json_value(document.document())?;
            Ok(format!("{:#}\n", value))
        }
    }
}

fn to_json_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| UdmfError::Io {
        path: PathBuf::from("<stdout>"),
        message: format!("Failed to encode JSON: {}", e),
    })
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| UdmfError::Io {
        path: PathBuf::from("<stdout>"),
        message: format!("Failed to encode JSON: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

fn summarize(
    printer: &Printer,
    origin: &str,
    document: &ValidatedDocument,
    parse_errors: &[ParseError],
    result: &ValidationResult,
) {
    let errors = result.error_count() + parse_errors.len();
    let message = format!(
        "{} ({}, {}, {}, {})",
        origin,
        plural(document.blocks.len(), "block", "blocks"),
        plural(errors, "error", "errors"),
        plural(result.warning_count(), "warning", "warnings"),
        plural(result.info_count(), "note", "notes"),
    );

    if errors > 0 {
        printer.warning("Checked", &message);
    } else {
        printer.status("Checked", &message);
    }
}
