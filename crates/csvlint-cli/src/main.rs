//! csvlint CLI - validate CSV documents.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            source,
            schema,
            dialect,
            limit_lines,
            no_schema_checks,
            no_locate,
            format,
        } => commands::validate::run(
            commands::validate::Options {
                source,
                schema,
                dialect,
                limit_lines,
                schema_checks: !no_schema_checks,
                locate: !no_locate,
                format,
            },
            cli.verbose,
        ),

        Commands::Classify { values } => commands::classify::run(values, cli.verbose).map(|_| true),

        Commands::Links { header } => commands::links::run(header, cli.verbose).map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr so reports on stdout stay machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "csvlint=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
