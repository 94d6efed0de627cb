//! Validate command - run the validator and render its report.

use std::path::PathBuf;

use colored::Colorize;
use csvlint::{
    DialectFragment, Severity, Source, TableGroup, ValidationReport, Validator, ValidatorConfig,
};

use crate::cli::OutputFormat;

/// Arguments for one validate run.
pub struct Options {
    pub source: String,
    pub schema: Option<PathBuf>,
    pub dialect: Option<String>,
    pub limit_lines: Option<usize>,
    pub schema_checks: bool,
    pub locate: bool,
    pub format: OutputFormat,
}

/// Returns whether the source is valid.
pub fn run(options: Options, verbose: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let mut config = ValidatorConfig::default()
        .with_schema_validation(options.schema_checks)
        .with_schema_location(options.locate);
    if let Some(ref json) = options.dialect {
        config = config.with_dialect(DialectFragment::from_json(json)?);
    }
    if let Some(limit) = options.limit_lines {
        config = config.with_limit_lines(limit);
    }

    let mut validator = Validator::new()?.with_config(config);
    if let Some(ref path) = options.schema {
        validator = validator.with_schema(TableGroup::from_file(path)?);
    }

    let source = Source::from_arg(&options.source);
    let report = validator.validate(&source);

    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => report.diagnostics.write_csv(std::io::stdout().lock())?,
        OutputFormat::Text => print_text(&report, verbose),
    }

    Ok(report.is_valid())
}

fn print_text(report: &ValidationReport, verbose: bool) {
    println!("{} {}", "Validating".cyan().bold(), report.source.white());
    if let Some(ref schema) = report.schema_url {
        println!("  Schema: {}", schema);
    }
    if verbose {
        if let Some(ref digest) = report.digest {
            println!("  Digest: {}", digest);
        }
        println!("  Size:   {} bytes", report.size_bytes);
    }
    println!(
        "  Rows:   {} ({} columns)",
        report.row_count, report.expected_columns
    );
    println!();

    for diagnostic in &report.diagnostics {
        let label = match diagnostic.kind {
            Severity::Error => "error  ".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info   ".blue(),
        };
        println!("  {} {}", label, diagnostic.describe());
        if verbose {
            if let Some(ref content) = diagnostic.content {
                println!("          {}", content.trim_end().dimmed());
            }
        }
    }
    if !report.diagnostics.is_empty() {
        println!();
    }

    let errors = report.errors().count();
    let warnings = report.warnings().count();
    if errors == 0 {
        println!(
            "{} ({} warnings)",
            "Valid".green().bold(),
            warnings.to_string().yellow()
        );
    } else {
        println!(
            "{} ({} errors, {} warnings)",
            "Invalid".red().bold(),
            errors.to_string().red(),
            warnings.to_string().yellow()
        );
    }
}
