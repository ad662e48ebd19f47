use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use udmf::cli::{Cli, Commands};
use udmf::output::Printer;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let printer = Printer::new();

    let code = match cli.command {
        Commands::Parse(args) => udmf::cli::parse::run(args, &printer)?.into(),
        Commands::Fmt(args) => {
            if udmf::cli::fmt::run(args, &printer)?.ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Schema(args) => {
            print!("{}", udmf::cli::schema::run(args, &printer)?);
            ExitCode::SUCCESS
        }
        Commands::Completions(args) => {
            udmf::cli::completions::run(args, &mut std::io::stdout())?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "udmf=warn",
        1 => "udmf=debug",
        _ => "udmf=trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
