//! Append-only diagnostic collector shared by every stage of a run.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::diagnostic::{Category, Diagnostic, DiagnosticCode, Severity};

/// Ordered collection of diagnostics.
///
/// Emission order is preserved; nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::trace!(code = %diagnostic.code, row = ?diagnostic.row, "diagnostic");
        self.entries.push(diagnostic);
    }

    /// Append an error with no position and return it for further decoration.
    pub fn error(&mut self, code: DiagnosticCode, category: Category) -> &mut Diagnostic {
        self.push_new(Severity::Error, code, category)
    }

    /// Append a warning with no position and return it for further decoration.
    pub fn warning(&mut self, code: DiagnosticCode, category: Category) -> &mut Diagnostic {
        self.push_new(Severity::Warning, code, category)
    }

    /// Append an info message with no position and return it for further decoration.
    pub fn info(&mut self, code: DiagnosticCode, category: Category) -> &mut Diagnostic {
        self.push_new(Severity::Info, code, category)
    }

    fn push_new(
        &mut self,
        kind: Severity,
        code: DiagnosticCode,
        category: Category,
    ) -> &mut Diagnostic {
        self.push(Diagnostic::new(kind, code, category));
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Merge diagnostics produced by a collaborator, keeping their order.
    pub fn merge(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    /// All diagnostics in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of one severity.
    pub fn of_kind(&self, kind: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Whether any diagnostic carries `code`.
    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    /// Number of diagnostics carrying `code`.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the collector.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// Write the diagnostics as CSV, one row per diagnostic.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["type", "category", "code", "row", "column", "content"])?;

        for d in &self.entries {
            out.write_record([
                d.kind.label().to_lowercase(),
                d.category.label().to_string(),
                d.code.to_string(),
                d.row.map(|r| r.to_string()).unwrap_or_default(),
                d.column.map(|c| c.to_string()).unwrap_or_default(),
                d.content.clone().unwrap_or_default(),
            ])?;
        }

        out.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
