//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// csvlint: validate CSV files and the metadata that describes them
#[derive(Parser)]
#[command(name = "csvlint")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a CSV file or URL
    Validate {
        /// Path or URL of the CSV document
        #[arg(value_name = "SOURCE")]
        source: String,

        /// CSVW-style JSON metadata to bind before validating
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Dialect overrides as JSON, e.g. '{"delimiter": ";"}'
        #[arg(short, long)]
        dialect: Option<String>,

        /// Stop after this many rows
        #[arg(long)]
        limit_lines: Option<usize>,

        /// Don't run header, row or foreign key checks from the schema
        #[arg(long)]
        no_schema_checks: bool,

        /// Don't look for metadata next to the source
        #[arg(long)]
        no_locate: bool,

        /// Report format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the inferred format of each value
    Classify {
        /// Values to classify
        #[arg(value_name = "VALUE", required = true)]
        values: Vec<String>,
    },

    /// Parse an HTTP Link header value
    Links {
        /// Link header field value
        #[arg(value_name = "HEADER")]
        header: String,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use text, json, or csv.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
