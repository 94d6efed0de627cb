//! The row loop: parse, classify failures, profile formats, check shape.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dialect::ParseOptions;
use crate::diagnostics::{Category, Diagnostic, DiagnosticCode, Diagnostics};
use crate::format::{ColumnFormatProfile, FormatClassifier};
use crate::schema::Schema;

use super::reader::{CRLF, LineReader};
use super::tokenizer::{RowTokenizer, TokenizeError, Tokenized};

/// One parsed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Cell values.
    pub cells: Vec<String>,
    /// 1-based row number.
    pub line: usize,
    /// Source text, including any terminators.
    pub raw: String,
    /// Whether this is the header row.
    pub is_header: bool,
}

/// Everything the row loop learned about the body.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    /// Every successfully parsed row, header included.
    pub rows: Vec<Row>,
    /// Header names after trimming, if a header row was read.
    pub header: Option<Vec<String>>,
    /// Format counts of data cells.
    pub profile: ColumnFormatProfile,
    /// Non-blank width of every parsed row, in order.
    pub column_counts: Vec<usize>,
    /// Width of the first data row; 0 until one is seen.
    pub expected_columns: usize,
    /// Distinct line breaks outside quoted fields.
    pub line_breaks: Vec<String>,
}

impl ParseOutcome {
    /// Number of data rows parsed.
    pub fn data_row_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_header).count()
    }
}

/// Drives tokenizing and per-row checks over one body.
pub struct RowParser<'o> {
    options: &'o ParseOptions,
    limit_lines: Option<usize>,
    validate_schema: bool,
    classifier: FormatClassifier,
}

impl<'o> RowParser<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            limit_lines: None,
            validate_schema: true,
            classifier: FormatClassifier::new(),
        }
    }

    /// Stop after this many rows.
    pub fn with_limit_lines(mut self, limit: Option<usize>) -> Self {
        self.limit_lines = limit;
        self
    }

    /// Whether a bound schema is asked to check headers and rows.
    pub fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.validate_schema = enabled;
        self
    }

    /// Parse `body`, appending diagnostics as rows are read.
    pub fn parse(
        &self,
        body: &[u8],
        charset: Option<&str>,
        mut schema: Option<&mut (dyn Schema + '_)>,
        table_url: Option<&Url>,
        diagnostics: &mut Diagnostics,
    ) -> ParseOutcome {
        let mut reader = LineReader::new(
            body,
            charset,
            &self.options.line_terminator,
            self.options.quote_char,
        );
        let tokenizer = RowTokenizer::new(self.options);
        let terminator = reader.terminator().to_string();

        if let Some(detected) = reader.detected_terminator() {
            if detected != CRLF {
                diagnostics.info(DiagnosticCode::NonrfcLineBreaks, Category::Structure);
            }
        }

        let mut outcome = ParseOutcome {
            line_breaks: reader.line_breaks().to_vec(),
            ..Default::default()
        };
        let mut line = 0;

        'rows: loop {
            let Some(first) = reader.next() else {
                break;
            };
            line += 1;
            if self.limit_lines.is_some_and(|limit| line > limit) {
                break;
            }

            let Ok(mut raw) = first else {
                report_invalid_encoding(line, diagnostics);
                break;
            };

            let parsed = loop {
                match tokenizer.tokenize(strip_terminator(&raw, &terminator)) {
                    Ok(Tokenized::Incomplete) => match reader.next() {
                        Some(Ok(more)) => raw.push_str(&more),
                        Some(Err(_)) => {
                            report_invalid_encoding(line, diagnostics);
                            break 'rows;
                        }
                        None => break Err(TokenizeError::UnclosedQuote),
                    },
                    Ok(Tokenized::Row(cells)) => break Ok(cells),
                    Err(e) => break Err(e),
                }
            };

            let cells = match parsed {
                Ok(cells) => cells,
                Err(failure) => {
                    let code = classify_failure(&failure, &raw, &terminator);
                    tracing::debug!(line, %failure, %code, "malformed row");
                    diagnostics.push(
                        Diagnostic::error(code, Category::Structure)
                            .at_row(line)
                            .with_content(raw),
                    );
                    continue;
                }
            };

            if line == 1 && self.options.header {
                let header = self.read_header(cells, schema.as_deref_mut(), table_url, diagnostics);
                outcome.column_counts.push(non_blank_width(&header));
                outcome.header = Some(header.clone());
                outcome.rows.push(Row {
                    cells: header,
                    line,
                    raw,
                    is_header: true,
                });
                continue;
            }

            outcome.profile.record_row(&self.classifier, &cells);
            outcome.column_counts.push(non_blank_width(&cells));
            if outcome.expected_columns == 0 {
                outcome.expected_columns = cells.len();
            }

            if cells.iter().all(|c| is_blank(c)) {
                diagnostics.push(
                    Diagnostic::error(DiagnosticCode::BlankRows, Category::Structure)
                        .at_row(line)
                        .with_content(raw.clone()),
                );
            }

            match schema.as_deref_mut().filter(|_| self.validate_schema) {
                Some(schema) => {
                    diagnostics.merge(schema.validate_row(&cells, line, table_url));
                }
                None => {
                    if !cells.is_empty() && cells.len() != outcome.expected_columns {
                        diagnostics.push(
                            Diagnostic::error(DiagnosticCode::RaggedRows, Category::Structure)
                                .at_row(line)
                                .with_content(raw.clone()),
                        );
                    }
                }
            }

            outcome.rows.push(Row {
                cells,
                line,
                raw,
                is_header: false,
            });
        }

        outcome
    }

    /// Trim and check header names, then let the schema check them.
    fn read_header(
        &self,
        mut cells: Vec<String>,
        schema: Option<&mut (dyn Schema + '_)>,
        table_url: Option<&Url>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<String> {
        while cells.last().is_some_and(|c| is_blank(c)) {
            cells.pop();
        }
        if self.options.trim {
            for cell in &mut cells {
                *cell = cell.trim().to_string();
            }
        }

        {
            let mut seen = HashSet::new();
            for (i, name) in cells.iter().enumerate() {
                if is_blank(name) {
                    diagnostics
                        .warning(DiagnosticCode::EmptyColumnName, Category::Schema)
                        .column = Some(i + 1);
                } else if !seen.insert(name.as_str()) {
                    diagnostics
                        .warning(DiagnosticCode::DuplicateColumnName, Category::Schema)
                        .column = Some(i + 1);
                }
            }
        }

        if let Some(schema) = schema {
            if self.validate_schema {
                diagnostics.merge(schema.validate_header(&cells, table_url));
            }
        }

        cells
    }
}

/// Map a tokenizer failure to a diagnostic code.
///
/// A stray quote on a line that lacks the expected terminator is really a
/// terminator mismatch and is reported as `line_breaks`.
pub fn classify_failure(failure: &TokenizeError, raw: &str, terminator: &str) -> DiagnosticCode {
    match failure {
        TokenizeError::StrayQuote if !raw.contains(terminator) => DiagnosticCode::LineBreaks,
        TokenizeError::StrayQuote => DiagnosticCode::StrayQuote,
        TokenizeError::IllegalQuoting => DiagnosticCode::Whitespace,
        TokenizeError::UnclosedQuote => DiagnosticCode::UnclosedQuote,
        TokenizeError::UnquotedLineBreak => DiagnosticCode::LineBreaks,
        TokenizeError::Other(_) => DiagnosticCode::UnknownError,
    }
}

fn report_invalid_encoding(line: usize, diagnostics: &mut Diagnostics) {
    if diagnostics.has(DiagnosticCode::InvalidEncoding) {
        return;
    }
    diagnostics.push(
        Diagnostic::error(DiagnosticCode::InvalidEncoding, Category::Structure).at_row(line),
    );
}

fn strip_terminator<'r>(raw: &'r str, terminator: &str) -> &'r str {
    raw.strip_suffix(terminator).unwrap_or(raw)
}

fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

fn non_blank_width(cells: &[String]) -> usize {
    cells.iter().filter(|c| !is_blank(c)).count()
}
