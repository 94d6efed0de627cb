//! Top-level validator and its report.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dialect::{Dialect, DialectFragment, resolve_dialect};
use crate::diagnostics::{Category, Diagnostic, DiagnosticCode, Diagnostics, Severity};
use crate::error::Result;
use crate::format::{ColumnFormatProfile, check_consistency};
use crate::input::{DefaultTransport, Source, Transport};
use crate::metadata::inspect_metadata;
use crate::parser::{ParseOutcome, Row, RowParser};
use crate::schema::{CsvwLoader, Schema, SchemaLoader, SchemaLocator, schema_mismatch};

/// Configuration for a [`Validator`].
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Caller-supplied dialect; overrides any schema dialect.
    pub dialect: Option<DialectFragment>,
    /// Maximum rows to read (None = all).
    pub limit_lines: Option<usize>,
    /// Ask the bound schema to check headers, rows and foreign keys.
    pub validate_schema: bool,
    /// Look for a schema when none describes the source.
    pub locate_schema: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            dialect: None,
            limit_lines: None,
            validate_schema: true,
            locate_schema: true,
        }
    }
}

impl ValidatorConfig {
    pub fn with_dialect(mut self, dialect: DialectFragment) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_limit_lines(mut self, limit: usize) -> Self {
        self.limit_lines = Some(limit);
        self
    }

    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    pub fn with_schema_location(mut self, enabled: bool) -> Self {
        self.locate_schema = enabled;
        self
    }
}

/// Result of validating one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Canonical URL of the source, or `"stream"`.
    pub source: String,
    /// SHA-256 digest of the body, when it could be read.
    pub digest: Option<String>,
    /// Body size in bytes.
    pub size_bytes: u64,
    /// Effective dialect, when parsing got that far.
    pub dialect: Option<Dialect>,
    /// Width of the first data row.
    pub expected_columns: usize,
    /// Number of data rows parsed.
    pub row_count: usize,
    /// Every diagnostic, in emission order.
    pub diagnostics: Diagnostics,
    /// Format counts per column.
    pub formats: ColumnFormatProfile,
    /// URL of the schema used for this run.
    pub schema_url: Option<String>,
}

impl ValidationReport {
    fn new(source: String) -> Self {
        Self {
            source,
            digest: None,
            size_bytes: 0,
            dialect: None,
            expected_columns: 0,
            row_count: 0,
            diagnostics: Diagnostics::new(),
            formats: ColumnFormatProfile::new(),
            schema_url: None,
        }
    }

    /// True when no error was reported.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.of_kind(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.of_kind(Severity::Warning)
    }

    pub fn info_messages(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.of_kind(Severity::Info)
    }

    /// Whether any diagnostic carries `code`.
    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.diagnostics.has(code)
    }
}

/// Validates CSV sources.
///
/// A validator may hold a bound schema. It is kept across runs for as long
/// as it describes the sources being validated; a schema found by discovery
/// replaces it and is kept for later runs in the same way. When discovery is
/// off, or the source is a stream, a schema that does not fit the source is
/// reported as `schema_mismatch` and ignored for that run.
pub struct Validator {
    config: ValidatorConfig,
    transport: Box<dyn Transport>,
    loader: Box<dyn SchemaLoader>,
    schema: Option<Box<dyn Schema>>,
    rows: Vec<Row>,
}

impl Validator {
    /// Create a validator that fetches over HTTP and reads local files.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(DefaultTransport::from_env()?))
    }

    /// Create a validator that fetches through `transport`.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            config: ValidatorConfig::default(),
            transport: Box::new(transport),
            loader: Box::new(CsvwLoader),
            schema: None,
            rows: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind a schema up front.
    pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Box::new(schema));
        self
    }

    /// Replace the loader used for discovered metadata documents.
    pub fn with_loader(mut self, loader: impl SchemaLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The schema currently bound, if any.
    pub fn schema(&self) -> Option<&dyn Schema> {
        self.schema.as_deref()
    }

    pub fn into_schema(self) -> Option<Box<dyn Schema>> {
        self.schema
    }

    /// Rows read by the last run, header included.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Validate `source`.
    ///
    /// Problems with the source are reported as diagnostics, never as an
    /// error.
    pub fn validate(&mut self, source: &Source) -> ValidationReport {
        let mut diagnostics = Diagnostics::new();
        let mut report = ValidationReport::new(source.label());
        self.rows.clear();

        if source.is_spreadsheet() {
            diagnostics.push(
                Diagnostic::warning(DiagnosticCode::Excel, Category::Context)
                    .with_content(source.label()),
            );
            report.diagnostics = diagnostics;
            return report;
        }

        let opened = match source.open(self.transport.as_ref()) {
            Ok(opened) => opened,
            Err(e) => {
                tracing::debug!(source = %source.label(), error = %e, "cannot open source");
                let code = if e.is_not_found() {
                    DiagnosticCode::NotFound
                } else {
                    DiagnosticCode::FetchError
                };
                diagnostics.push(Diagnostic::error(code, Category::Context).with_content(e.to_string()));
                report.diagnostics = diagnostics;
                return report;
            }
        };
        report.digest = Some(opened.digest());
        report.size_bytes = opened.size_bytes();

        let inspection = inspect_metadata(
            opened.metadata.as_ref(),
            self.config.dialect.is_some(),
            &mut diagnostics,
        );

        let table_url = match source.canonical_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(source = %source.label(), error = %e, "no canonical URL, skipping discovery");
                None
            }
        };
        if let Some(ref url) = table_url {
            report.source = url.to_string();
            if self.config.locate_schema {
                let locator = SchemaLocator::new(self.transport.as_ref(), self.loader.as_ref());
                self.schema = locator.reconcile(
                    self.schema.take(),
                    url,
                    opened.metadata.as_ref(),
                    source.is_remote(),
                    &mut diagnostics,
                );
            }
        }
        // A schema that cannot place this source stays bound but is not used.
        let schema_applies = match self.schema.as_deref() {
            Some(schema) if schema.applies_to(table_url.as_ref()) => true,
            Some(schema) => {
                tracing::debug!(
                    schema = ?schema.url().map(Url::as_str),
                    source = %report.source,
                    "bound schema does not apply to source, ignoring"
                );
                diagnostics.push(schema_mismatch(schema.url()));
                false
            }
            None => false,
        };
        let mut schema = if schema_applies {
            self.schema.as_deref_mut()
        } else {
            None
        };
        report.schema_url = schema
            .as_deref()
            .and_then(|s| s.url())
            .map(|u| u.to_string());

        let schema_dialect = schema
            .as_deref()
            .and_then(|s| s.dialect_for(table_url.as_ref()));
        let (dialect, options) = resolve_dialect(
            schema_dialect.as_ref(),
            self.config.dialect.as_ref(),
            inspection.header,
        );

        if self.config.validate_schema {
            if let Some(schema) = schema.as_deref_mut() {
                schema.begin_table(table_url.as_ref());
            }
        }

        tracing::debug!(source = %report.source, "parsing rows");
        let outcome = RowParser::new(&options)
            .with_limit_lines(self.config.limit_lines)
            .with_schema_validation(self.config.validate_schema)
            .parse(
                &opened.body,
                inspection.encoding.as_deref(),
                schema.as_deref_mut(),
                table_url.as_ref(),
                &mut diagnostics,
            );

        check_structure(&outcome, &mut diagnostics);
        check_consistency(&outcome.profile, &mut diagnostics);

        if self.config.validate_schema {
            if let Some(schema) = schema.filter(|s| s.is_table_group()) {
                diagnostics.merge(schema.validate_foreign_keys(table_url.as_ref()));
            }
        }

        report.dialect = Some(dialect);
        report.expected_columns = outcome.expected_columns;
        report.row_count = outcome.data_row_count();
        report.formats = outcome.profile;
        report.diagnostics = diagnostics;
        self.rows = outcome.rows;

        tracing::debug!(
            source = %report.source,
            rows = report.row_count,
            diagnostics = report.diagnostics.len(),
            "validation finished"
        );
        report
    }
}

/// Whole-body checks that need every row first.
fn check_structure(outcome: &ParseOutcome, diagnostics: &mut Diagnostics) {
    if let Some(&first) = outcome.column_counts.first() {
        let mean = outcome.column_counts.iter().sum::<usize>() as f64
            / outcome.column_counts.len() as f64;
        if (first as f64) < mean {
            diagnostics.warning(DiagnosticCode::TitleRow, Category::Structure);
        }
    }

    if outcome.expected_columns == 1 {
        diagnostics.warning(DiagnosticCode::CheckOptions, Category::Structure);
    }

    if outcome.line_breaks.len() > 1 && !diagnostics.has(DiagnosticCode::LineBreaks) {
        diagnostics.error(DiagnosticCode::LineBreaks, Category::Structure);
    }
}
