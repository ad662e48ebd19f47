//! Schema command implementation.

use clap::Args;

use crate::error::Result;
use crate::output::{plural, Printer};
use crate::schema::SchemaLayer;

use super::SchemaSource;

/// Print the merged schema as YAML
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub source: SchemaSource,

    /// Only print this namespace
    #[arg(long)]
    pub namespace: Option<String>,
}

/// Returns the rendered YAML; the caller writes it to stdout.
pub fn run(args: SchemaArgs, printer: &Printer) -> Result<String> {
    let registry = args.source.registry()?;

    let layers: Vec<SchemaLayer> = registry
        .to_layers()
        .into_iter()
        .filter(|layer| match &args.namespace {
            Some(ns) => layer.namespace.eq_ignore_ascii_case(ns),
            None => true,
        })
        .collect();

    if layers.is_empty() {
        if let Some(ns) = &args.namespace {
            printer.warning("Empty", &format!("no schema for namespace \"{}\"", ns));
        }
    }

    let mut out = String::new();
    for (i, layer) in layers.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&layer.to_yaml()?);
    }

    let blocks: usize = layers.iter().map(|layer| layer.blocks.len()).sum();
    printer.status(
        "Merged",
        &format!(
            "{} across {}",
            plural(blocks, "block schema", "block schemas"),
            plural(layers.len(), "namespace", "namespaces")
        ),
    );

    Ok(out)
}
