pub mod completions;
pub mod fmt;
pub mod parse;
pub mod schema;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::error::Result;
use crate::schema::{BuiltinProfiles, RegistryBuilder, SchemaError, SchemaRegistry};

/// udmf - UDMF text map parser, validator and formatter
#[derive(Parser, Debug)]
#[command(name = "udmf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and validate a text map
    Parse(parse::ParseArgs),

    /// Rewrite text maps in canonical form
    Fmt(fmt::FmtArgs),

    /// Print the merged schema as YAML
    Schema(schema::SchemaArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Where the schema registry comes from.
#[derive(Args, Debug, Clone)]
pub struct SchemaSource {
    /// Base profile: a builtin name or a path to a layer file
    #[arg(long, value_name = "PROFILE", default_value = BuiltinProfiles::DEFAULT)]
    pub schema: String,

    /// Override layer applied on top of the base (repeatable, in order)
    #[arg(long = "override", value_name = "PATH")]
    pub overrides: Vec<PathBuf>,
}

impl SchemaSource {
    /// Build the registry: the base profile, then each override in order.
    pub fn registry(&self) -> Result<SchemaRegistry> {
        let mut builder = RegistryBuilder::new();

        if BuiltinProfiles::get(&self.schema)?.is_some() {
            builder.add_builtin(&self.schema)?;
        } else {
            let path = PathBuf::from(&self.schema);
            if !path.is_file() {
                return Err(SchemaError::UnknownProfile {
                    name: self.schema.clone(),
                    help: Some(format!(
                        "Use one of the builtin profiles ({}) or a path to a layer file",
                        BuiltinProfiles::names().join(", ")
                    )),
                }
                .into());
            }
            builder.add_file(&path)?;
        }

        for path in &self.overrides {
            builder.add_file(path)?;
        }

        Ok(builder.build()?)
    }
}

impl Default for SchemaSource {
    fn default() -> Self {
        Self {
            schema: BuiltinProfiles::DEFAULT.to_string(),
            overrides: Vec::new(),
        }
    }
}
