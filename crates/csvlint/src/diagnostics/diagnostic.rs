//! Diagnostic record types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// The source does not exist.
    NotFound,
    /// The source could not be fetched for another reason.
    FetchError,
    /// Content-Type is not `text/csv`.
    WrongContentType,
    /// Header presence was never declared.
    UndeclaredHeader,
    /// A row made only of empty cells.
    BlankRows,
    /// A row whose width differs from the expected width.
    RaggedRows,
    /// Missing or stray quote.
    StrayQuote,
    /// Illegal quoting, usually whitespace around a quoted field.
    Whitespace,
    /// A quoted field that is never closed.
    UnclosedQuote,
    /// Line breaks that do not match the dialect.
    LineBreaks,
    /// A row failed to parse for an unrecognised reason.
    UnknownError,
    /// Bytes that do not decode in the declared encoding.
    InvalidEncoding,
    /// A blank header cell.
    EmptyColumnName,
    /// A header cell repeating an earlier one.
    DuplicateColumnName,
    /// A column without a dominant value format.
    InconsistentValues,
    /// Schema metadata that does not describe this source.
    SchemaMismatch,
    /// The first row looks like a title rather than a header.
    TitleRow,
    /// Only one column was found; the dialect is probably wrong.
    CheckOptions,
    /// No charset was declared.
    NoEncoding,
    /// A charset other than UTF-8 was declared.
    Encoding,
    /// No Content-Type was supplied.
    NoContentType,
    /// Header presence was assumed.
    AssumedHeader,
    /// Line terminator other than CRLF.
    NonrfcLineBreaks,
    /// A spreadsheet rather than CSV.
    Excel,
    /// Header cells disagree with the schema's column titles.
    InvalidHeader,
    /// A required value is missing.
    Required,
    /// A foreign key value with no matching referenced value.
    UnmatchedForeignKeyReference,
}

impl DiagnosticCode {
    /// The snake_case name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::NotFound => "not_found",
            DiagnosticCode::FetchError => "fetch_error",
            DiagnosticCode::WrongContentType => "wrong_content_type",
            DiagnosticCode::UndeclaredHeader => "undeclared_header",
            DiagnosticCode::BlankRows => "blank_rows",
            DiagnosticCode::RaggedRows => "ragged_rows",
            DiagnosticCode::StrayQuote => "stray_quote",
            DiagnosticCode::Whitespace => "whitespace",
            DiagnosticCode::UnclosedQuote => "unclosed_quote",
            DiagnosticCode::LineBreaks => "line_breaks",
            DiagnosticCode::UnknownError => "unknown_error",
            DiagnosticCode::InvalidEncoding => "invalid_encoding",
            DiagnosticCode::EmptyColumnName => "empty_column_name",
            DiagnosticCode::DuplicateColumnName => "duplicate_column_name",
            DiagnosticCode::InconsistentValues => "inconsistent_values",
            DiagnosticCode::SchemaMismatch => "schema_mismatch",
            DiagnosticCode::TitleRow => "title_row",
            DiagnosticCode::CheckOptions => "check_options",
            DiagnosticCode::NoEncoding => "no_encoding",
            DiagnosticCode::Encoding => "encoding",
            DiagnosticCode::NoContentType => "no_content_type",
            DiagnosticCode::AssumedHeader => "assumed_header",
            DiagnosticCode::NonrfcLineBreaks => "nonrfc_line_breaks",
            DiagnosticCode::Excel => "excel",
            DiagnosticCode::InvalidHeader => "invalid_header",
            DiagnosticCode::Required => "required",
            DiagnosticCode::UnmatchedForeignKeyReference => "unmatched_foreign_key_reference",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Observational, not a judgement.
    Info,
    /// Quality concern; the file is still structurally valid.
    Warning,
    /// The row or file fails conformance.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Which layer a diagnostic concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Tokenization and shape.
    Structure,
    /// Declared schema or header names.
    Schema,
    /// Transport and metadata.
    Context,
}

impl Category {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::Schema => "schema",
            Category::Context => "context",
        }
    }
}

/// A single finding about the validated source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub kind: Severity,
    /// What was found.
    pub code: DiagnosticCode,
    /// Which layer it concerns.
    pub category: Category,
    /// 1-based line (logical row) number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// 1-based column number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    /// Raw source text of the offending row, or another short excerpt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Additional structured context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Diagnostic {
    /// Create a diagnostic with no position.
    pub fn new(kind: Severity, code: DiagnosticCode, category: Category) -> Self {
        Self {
            kind,
            code,
            category,
            row: None,
            column: None,
            content: None,
            context: None,
        }
    }

    /// Create an error.
    pub fn error(code: DiagnosticCode, category: Category) -> Self {
        Self::new(Severity::Error, code, category)
    }

    /// Create a warning.
    pub fn warning(code: DiagnosticCode, category: Category) -> Self {
        Self::new(Severity::Warning, code, category)
    }

    /// Create an info message.
    pub fn info(code: DiagnosticCode, category: Category) -> Self {
        Self::new(Severity::Info, code, category)
    }

    /// Set the row.
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    /// Set the column.
    pub fn at_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Set the content excerpt.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set structured context.
    pub fn with_context(mut self, context: impl Into<Value>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// One-line human readable rendering.
    pub fn describe(&self) -> String {
        let mut out = format!("{} ({})", self.code, self.category.label());
        match (self.row, self.column) {
            (Some(row), Some(col)) => out.push_str(&format!(" at row {}, column {}", row, col)),
            (Some(row), None) => out.push_str(&format!(" at row {}", row)),
            (None, Some(col)) => out.push_str(&format!(" at column {}", col)),
            (None, None) => {}
        }
        out
    }
}
