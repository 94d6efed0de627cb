//! End-to-end tests for csvlint.

use std::io::Write;
use tempfile::NamedTempFile;

use csvlint::format::Format;
use csvlint::{
    Category, DialectFragment, DiagnosticCode, MockTransport, Severity, Source, SourceMetadata,
    ValidationReport, Validator, ValidatorConfig,
};

/// Helper to create a temporary file with given content.
fn create_test_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".csv").expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

/// Validate an in-memory body with no transport metadata.
fn validate_stream(body: &[u8]) -> ValidationReport {
    Validator::with_transport(MockTransport::new()).validate(&Source::stream(body.to_vec()))
}

fn validate_with_metadata(body: &str, content_type: &str) -> ValidationReport {
    let metadata = SourceMetadata::from_content_type(content_type);
    Validator::with_transport(MockTransport::new())
        .validate(&Source::stream_with_metadata(body, metadata))
}

fn errors(report: &ValidationReport) -> Vec<(DiagnosticCode, Option<usize>)> {
    report.errors().map(|d| (d.code, d.row)).collect()
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn test_ragged_row_in_local_file() {
    let file = create_test_file("a,b,c\n1,2,3\n4,5\n");

    let mut validator = Validator::new().expect("Failed to create validator");
    let report = validator.validate(&Source::file(file.path()));

    assert_eq!(errors(&report), vec![(DiagnosticCode::RaggedRows, Some(3))]);
    let ragged = report.errors().next().unwrap();
    assert_eq!(ragged.category, Category::Structure);
    assert_eq!(report.expected_columns, 3);
    assert_eq!(report.row_count, 2);
    assert!(report.source.starts_with("file://"));
    assert!(!report.is_valid());
}

#[test]
fn test_local_file_gets_no_context_warnings() {
    let file = create_test_file("a,b\r\n1,2\r\n");

    let mut validator = Validator::new().expect("Failed to create validator");
    let report = validator.validate(&Source::file(file.path()));

    assert!(report.is_valid());
    assert!(report.warnings().next().is_none());
    assert!(report.has(DiagnosticCode::AssumedHeader));
    assert_eq!(report.size_bytes, 10);
}

#[test]
fn test_duplicate_column_name() {
    let report = validate_stream(b"a,a\n1,2\n");

    let duplicates: Vec<_> = report
        .warnings()
        .filter(|d| d.code == DiagnosticCode::DuplicateColumnName)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].column, Some(2));
    assert_eq!(duplicates[0].category, Category::Schema);
}

#[test]
fn test_empty_column_name() {
    let report = validate_stream(b"a,,c\r\n1,2,3\r\n");

    let empty: Vec<_> = report
        .warnings()
        .filter(|d| d.code == DiagnosticCode::EmptyColumnName)
        .map(|d| d.column)
        .collect();
    assert_eq!(empty, vec![Some(2)]);
}

#[test]
fn test_malformed_rows_do_not_stop_parsing() {
    let body = "a,b\r\n\"x\"y,2\r\n1, \"2\"\r\n,\r\n3,4\r\n5,\"open\r\n";
    let report = validate_stream(body.as_bytes());

    assert_eq!(
        errors(&report),
        vec![
            (DiagnosticCode::StrayQuote, Some(2)),
            (DiagnosticCode::Whitespace, Some(3)),
            (DiagnosticCode::BlankRows, Some(4)),
            (DiagnosticCode::UnclosedQuote, Some(6)),
        ]
    );
    assert_eq!(report.row_count, 2);
}

#[test]
fn test_failed_row_keeps_raw_content() {
    let report = validate_stream(b"a,b\r\n\"x\"y,2\r\n");

    let stray = report.errors().next().unwrap();
    assert_eq!(stray.content.as_deref(), Some("\"x\"y,2\r\n"));
}

#[test]
fn test_nonrfc_line_breaks_is_info_only() {
    let report = validate_stream(b"a,b\n1,2\n");

    assert!(report.is_valid());
    let info: Vec<_> = report.info_messages().map(|d| d.code).collect();
    assert_eq!(
        info,
        vec![DiagnosticCode::AssumedHeader, DiagnosticCode::NonrfcLineBreaks]
    );
}

#[test]
fn test_invalid_encoding_reported_once() {
    let report = validate_stream(b"a,b\n\xff,1\n\xfe,2\n");

    assert_eq!(report.diagnostics.count(DiagnosticCode::InvalidEncoding), 1);
    assert_eq!(report.row_count, 0);
}

#[test]
fn test_declared_charset_is_used_for_decoding() {
    let report = validate_with_metadata("a,b\r\n1,2\r\n", "text/csv; charset=iso-8859-1");

    assert!(report.has(DiagnosticCode::Encoding));
    assert!(!report.has(DiagnosticCode::InvalidEncoding));
    assert!(report.is_valid());
}

#[test]
fn test_title_row_and_check_options() {
    let report = validate_stream(b"Quarterly numbers\r\nq,value,unit\r\n1,2,3\r\n");
    assert!(report.has(DiagnosticCode::TitleRow));

    let report = validate_stream(b"a|b\r\n1|2\r\n");
    assert!(report.has(DiagnosticCode::CheckOptions));
}

#[test]
fn test_limit_lines() {
    let config = ValidatorConfig::default().with_limit_lines(3);
    let mut validator = Validator::with_transport(MockTransport::new()).with_config(config);
    let report = validator.validate(&Source::stream("a\r\n1\r\n2\r\n3\r\n4\r\n"));

    assert_eq!(report.row_count, 2);
    assert_eq!(validator.rows().len(), 3);
    assert!(validator.rows()[0].is_header);
}

// =============================================================================
// Transport metadata
// =============================================================================

#[test]
fn test_text_csv_without_charset() {
    let report = validate_with_metadata("a,b\r\n1,2\r\n", "text/csv");

    let codes: Vec<_> = report.diagnostics.iter().map(|d| (d.kind, d.code)).collect();
    assert_eq!(
        codes,
        vec![
            (Severity::Warning, DiagnosticCode::NoEncoding),
            (Severity::Info, DiagnosticCode::AssumedHeader),
        ]
    );
}

#[test]
fn test_wrong_content_type() {
    let report = validate_with_metadata("a,b\r\n1,2\r\n", "text/plain; charset=utf-8");

    assert_eq!(
        errors(&report),
        vec![
            (DiagnosticCode::WrongContentType, None),
            (DiagnosticCode::UndeclaredHeader, None),
        ]
    );
    assert!(!report.has(DiagnosticCode::AssumedHeader));
}

#[test]
fn test_header_absent_parameter() {
    let report = validate_with_metadata("1,2\r\n3,4\r\n", "text/csv; charset=utf-8; header=absent");

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.row_count, 2);
}

#[test]
fn test_explicit_dialect_suppresses_assumed_header() {
    let config =
        ValidatorConfig::default().with_dialect(DialectFragment::new().with_delimiter('\t'));
    let mut validator = Validator::with_transport(MockTransport::new()).with_config(config);
    let report = validator.validate(&Source::stream("a\tb\r\n1\t2\r\n"));

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.expected_columns, 2);
}

// =============================================================================
// Formats
// =============================================================================

#[test]
fn test_format_profile() {
    let report = validate_stream(
        b"when,link\r\nfoo,http://example.com\r\nbar,http://example.com/a\r\n2020-01-01,http://example.com/b\r\n",
    );

    let when = report.formats.counts(0).unwrap();
    assert_eq!(when.get(&Format::String), Some(&2));
    assert_eq!(when.get(&Format::DateDb), Some(&1));
    let link = report.formats.counts(1).unwrap();
    assert_eq!(link.get(&Format::Uri), Some(&3));

    let inconsistent: Vec<_> = report
        .warnings()
        .filter(|d| d.code == DiagnosticCode::InconsistentValues)
        .map(|d| d.column)
        .collect();
    assert_eq!(inconsistent, vec![Some(1)]);
}

#[test]
fn test_header_is_not_profiled() {
    let report = validate_stream(b"2020-01-01\r\nfoo\r\n");

    let counts = report.formats.counts(0).unwrap();
    assert_eq!(counts.get(&Format::DateDb), None);
    assert_eq!(counts.get(&Format::String), Some(&1));
}

// =============================================================================
// Early exits
// =============================================================================

#[test]
fn test_missing_file_is_the_only_diagnostic() {
    let mut validator = Validator::new().expect("Failed to create validator");
    let report = validator.validate(&Source::file("/definitely/not/here.csv"));

    assert_eq!(report.diagnostics.len(), 1);
    let only = report.diagnostics.iter().next().unwrap();
    assert_eq!(only.code, DiagnosticCode::NotFound);
    assert_eq!(only.kind, Severity::Error);
    assert_eq!(only.category, Category::Context);
}

#[test]
fn test_spreadsheet_early_exit() {
    let file = NamedTempFile::with_suffix(".xls").expect("Failed to create temp file");

    let mut validator = Validator::new().expect("Failed to create validator");
    let report = validator.validate(&Source::file(file.path()));

    let codes: Vec<_> = report.diagnostics.iter().map(|d| (d.kind, d.code)).collect();
    assert_eq!(codes, vec![(Severity::Warning, DiagnosticCode::Excel)]);
    assert!(report.is_valid());
}

// =============================================================================
// Reporting
// =============================================================================

#[test]
fn test_report_serializes_snake_case_codes() {
    let report = validate_stream(b"a,b,c\n1,2,3\n4,5\n");
    let json = serde_json::to_value(&report).unwrap();

    let codes: Vec<_> = json["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap().to_string())
        .collect();
    assert!(codes.contains(&"ragged_rows".to_string()));
    assert_eq!(json["expected_columns"], 3);
    assert_eq!(json["formats"]["0"]["numeric"], 2);
}

#[test]
fn test_diagnostics_as_csv() {
    let report = validate_stream(b"a,b,c\r\n1,2,3\r\n4,5\r\n");

    let mut out = Vec::new();
    report.diagnostics.write_csv(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("type,category,code,row,column,content"));
    assert_eq!(lines.next(), Some("info,structure,assumed_header,,,"));
    // The raw row keeps its CRLF, so the content field is quoted.
    assert!(text.contains("error,structure,ragged_rows,3,,\"4,5\r\n\""));
}
