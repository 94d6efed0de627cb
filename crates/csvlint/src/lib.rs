//! csvlint: a validation engine for CSV documents.
//!
//! A run reads a source once, inspects its transport metadata, locates a
//! schema for it, resolves the dialect, and classifies every row. Every
//! problem found becomes a [`Diagnostic`] in one ordered stream.
//!
//! # Core Principles
//!
//! - **Keep going**: a malformed row is reported and parsing continues
//! - **One stream**: structure, schema and context findings share a collector
//! - **Pluggable collaborators**: fetching ([`Transport`]) and schema checks
//!   ([`Schema`]) sit behind traits
//!
//! # Example
//!
//! ```no_run
//! use csvlint::{Source, Validator};
//!
//! let mut validator = Validator::new().unwrap();
//! let report = validator.validate(&Source::file("data.csv"));
//!
//! for diagnostic in report.errors() {
//!     println!("{}", diagnostic.describe());
//! }
//! ```

pub mod dialect;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod input;
pub mod link;
pub mod metadata;
pub mod parser;
pub mod schema;

mod validator;

pub use crate::validator::{ValidationReport, Validator, ValidatorConfig};
pub use dialect::{Dialect, DialectFragment, LineTerminator};
pub use diagnostics::{Category, Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use error::{CsvlintError, Result};
pub use format::{Format, FormatClassifier};
pub use input::{DefaultTransport, MockTransport, Source, SourceMetadata, Transport};
pub use link::{LinkRelation, parse_link_header};
pub use schema::{Schema, SchemaLoader, TableGroup};
