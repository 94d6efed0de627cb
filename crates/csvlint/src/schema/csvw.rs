//! CSVW-flavoured JSON table metadata.
//!
//! Supports the subset needed to bind a CSV file to a schema: table URLs,
//! dialects, column names/titles, `required`, and single-column foreign keys.
//!
//! ```json
//! {
//!   "tables": [{
//!     "url": "countries.csv",
//!     "tableSchema": {
//!       "columns": [{"name": "code", "titles": "Code", "required": true}]
//!     }
//!   }]
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::dialect::DialectFragment;
use crate::diagnostics::{Category, Diagnostic, DiagnosticCode};
use crate::error::{CsvlintError, Result};

use super::{Schema, SchemaLoader};

// =============================================================================
// DOCUMENT MODEL
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    tables: Option<Vec<TableDoc>>,
    #[serde(default)]
    dialect: Option<DialectFragment>,
    #[serde(default)]
    table_schema: Option<TableSchemaDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableDoc {
    url: String,
    #[serde(default)]
    dialect: Option<DialectFragment>,
    #[serde(default)]
    table_schema: Option<TableSchemaDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableSchemaDoc {
    #[serde(default)]
    columns: Vec<ColumnDoc>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKeyDoc>,
}

#[derive(Debug, Deserialize)]
struct ColumnDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    titles: Option<Titles>,
    #[serde(default)]
    required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Titles {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForeignKeyDoc {
    column_reference: String,
    reference: ReferenceDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceDoc {
    resource: String,
    column_reference: String,
}

// =============================================================================
// RESOLVED MODEL
// =============================================================================

#[derive(Debug, Clone)]
struct Column {
    name: Option<String>,
    titles: Vec<String>,
    required: bool,
}

impl Column {
    fn accepts_title(&self, title: &str) -> bool {
        if self.titles.is_empty() && self.name.is_none() {
            return true;
        }
        self.titles.iter().any(|t| t == title) || self.name.as_deref() == Some(title)
    }
}

#[derive(Debug, Clone)]
struct ForeignKey {
    column: usize,
    target_table: usize,
    target_column: usize,
}

#[derive(Debug, Clone)]
struct Table {
    url: Url,
    dialect: Option<DialectFragment>,
    columns: Vec<Column>,
    foreign_keys: Vec<ForeignKey>,
    /// Values remembered for foreign key checks: column -> (line, value).
    tracked: HashMap<usize, Vec<(usize, String)>>,
    seen: bool,
}

impl Table {
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
    }
}

/// Table metadata loaded from a CSVW-style JSON document.
#[derive(Debug, Clone)]
pub struct TableGroup {
    url: Url,
    dialect: Option<DialectFragment>,
    tables: Vec<Table>,
    is_group: bool,
}

impl TableGroup {
    /// Parse a metadata document fetched from `url`.
    pub fn from_json(body: &[u8], url: &Url) -> Result<Self> {
        let doc: Document = serde_json::from_slice(body)
            .map_err(|e| CsvlintError::Metadata(format!("{}: {}", url, e)))?;

        let is_group = doc.tables.is_some();
        let table_docs = match (doc.tables, doc.url) {
            (Some(tables), _) => tables,
            (None, Some(table_url)) => vec![TableDoc {
                url: table_url,
                dialect: None,
                table_schema: doc.table_schema,
            }],
            (None, None) => {
                return Err(CsvlintError::Metadata(format!(
                    "{}: metadata declares neither 'tables' nor 'url'",
                    url
                )));
            }
        };

        let mut tables = Vec::with_capacity(table_docs.len());
        let mut pending_keys = Vec::new();
        for (index, table) in table_docs.into_iter().enumerate() {
            let schema = table.table_schema.unwrap_or_default();
            let columns = schema
                .columns
                .into_iter()
                .map(|c| Column {
                    name: c.name,
                    titles: match c.titles {
                        Some(Titles::One(t)) => vec![t],
                        Some(Titles::Many(ts)) => ts,
                        None => Vec::new(),
                    },
                    required: c.required,
                })
                .collect();
            pending_keys.extend(schema.foreign_keys.into_iter().map(|fk| (index, fk)));

            tables.push(Table {
                url: url.join(&table.url).map_err(|e| {
                    CsvlintError::Metadata(format!("table url '{}': {}", table.url, e))
                })?,
                dialect: table.dialect,
                columns,
                foreign_keys: Vec::new(),
                tracked: HashMap::new(),
                seen: false,
            });
        }

        for (index, fk) in pending_keys {
            let resolved = resolve_foreign_key(&tables, index, &fk, url)?;
            tables[index].tracked.entry(resolved.column).or_default();
            tables[resolved.target_table]
                .tracked
                .entry(resolved.target_column)
                .or_default();
            tables[index].foreign_keys.push(resolved);
        }

        Ok(Self {
            url: url.clone(),
            dialect: doc.dialect,
            tables,
            is_group,
        })
    }

    /// Load a metadata document from a local file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read(path).map_err(|e| CsvlintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let absolute = std::path::absolute(path).map_err(|e| CsvlintError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            CsvlintError::Config(format!("cannot express '{}' as a file URL", absolute.display()))
        })?;
        Self::from_json(&body, &url)
    }

    /// URLs of the declared tables.
    pub fn table_urls(&self) -> impl Iterator<Item = &Url> {
        self.tables.iter().map(|t| &t.url)
    }

    fn table_index(&self, table_url: Option<&Url>) -> Option<usize> {
        match table_url {
            Some(url) => self.tables.iter().position(|t| &t.url == url),
            None if self.tables.len() == 1 => Some(0),
            None => None,
        }
    }
}

fn resolve_foreign_key(
    tables: &[Table],
    index: usize,
    fk: &ForeignKeyDoc,
    base: &Url,
) -> Result<ForeignKey> {
    let column = tables[index]
        .column_index(&fk.column_reference)
        .ok_or_else(|| {
            CsvlintError::Metadata(format!(
                "foreign key references unknown column '{}'",
                fk.column_reference
            ))
        })?;
    let resource = base.join(&fk.reference.resource)?;
    let target_table = tables
        .iter()
        .position(|t| t.url == resource)
        .ok_or_else(|| {
            CsvlintError::Metadata(format!(
                "foreign key references table '{}' outside this group",
                resource
            ))
        })?;
    let target_column = tables[target_table]
        .column_index(&fk.reference.column_reference)
        .ok_or_else(|| {
            CsvlintError::Metadata(format!(
                "foreign key references unknown column '{}' in '{}'",
                fk.reference.column_reference, resource
            ))
        })?;

    Ok(ForeignKey {
        column,
        target_table,
        target_column,
    })
}

/// Table dialect keys win over group dialect keys.
fn layered(group: Option<&DialectFragment>, table: Option<&DialectFragment>) -> Option<DialectFragment> {
    match (group, table) {
        (None, None) => None,
        (Some(g), None) => Some(g.clone()),
        (None, Some(t)) => Some(t.clone()),
        (Some(g), Some(t)) => Some(DialectFragment {
            header: t.header.or(g.header),
            delimiter: t.delimiter.or(g.delimiter),
            skip_initial_space: t.skip_initial_space.or(g.skip_initial_space),
            line_terminator: t.line_terminator.clone().or_else(|| g.line_terminator.clone()),
            quote_char: t.quote_char.or(g.quote_char),
            trim: t.trim.or(g.trim),
        }),
    }
}

impl Schema for TableGroup {
    fn url(&self) -> Option<&Url> {
        Some(&self.url)
    }

    fn describes(&self, table_url: &Url) -> bool {
        self.tables.iter().any(|t| &t.url == table_url)
    }

    fn applies_to(&self, table_url: Option<&Url>) -> bool {
        self.table_index(table_url).is_some()
    }

    fn begin_table(&mut self, table_url: Option<&Url>) {
        let Some(index) = self.table_index(table_url) else {
            return;
        };
        let table = &mut self.tables[index];
        table.seen = true;
        for values in table.tracked.values_mut() {
            values.clear();
        }
    }

    fn dialect_for(&self, table_url: Option<&Url>) -> Option<DialectFragment> {
        let table = self.table_index(table_url).map(|i| &self.tables[i]);
        layered(self.dialect.as_ref(), table.and_then(|t| t.dialect.as_ref()))
    }

    fn validate_header(&mut self, header: &[String], table_url: Option<&Url>) -> Vec<Diagnostic> {
        let Some(index) = self.table_index(table_url) else {
            return Vec::new();
        };
        let table = &mut self.tables[index];
        table.seen = true;
        if table.columns.is_empty() {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        let width = header.len().max(table.columns.len());
        for i in 0..width {
            let ok = match (header.get(i), table.columns.get(i)) {
                (Some(title), Some(column)) => column.accepts_title(title),
                _ => false,
            };
            if !ok {
                let mut diagnostic =
                    Diagnostic::warning(DiagnosticCode::InvalidHeader, Category::Schema)
                        .at_column(i + 1);
                if let Some(title) = header.get(i) {
                    diagnostic = diagnostic.with_content(title.clone());
                }
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }

    fn validate_row(
        &mut self,
        row: &[String],
        line: usize,
        table_url: Option<&Url>,
    ) -> Vec<Diagnostic> {
        let Some(index) = self.table_index(table_url) else {
            return Vec::new();
        };
        let table = &mut self.tables[index];
        table.seen = true;

        let mut diagnostics = Vec::new();
        if !table.columns.is_empty() && row.len() != table.columns.len() {
            diagnostics.push(
                Diagnostic::error(DiagnosticCode::RaggedRows, Category::Structure)
                    .at_row(line)
                    .with_context(json!({
                        "expected": table.columns.len(),
                        "found": row.len(),
                    })),
            );
        }

        for (i, column) in table.columns.iter().enumerate() {
            let blank = row.get(i).map(|v| v.trim().is_empty()).unwrap_or(true);
            if column.required && blank {
                diagnostics.push(
                    Diagnostic::error(DiagnosticCode::Required, Category::Schema)
                        .at_row(line)
                        .at_column(i + 1),
                );
            }
        }

        for (column, values) in table.tracked.iter_mut() {
            if let Some(value) = row.get(*column) {
                values.push((line, value.clone()));
            }
        }

        diagnostics
    }

    fn validate_foreign_keys(&mut self, table_url: Option<&Url>) -> Vec<Diagnostic> {
        let Some(index) = self.table_index(table_url) else {
            return Vec::new();
        };
        let table = &self.tables[index];
        let mut diagnostics = Vec::new();

        for fk in &table.foreign_keys {
            let target = &self.tables[fk.target_table];
            if !table.seen || !target.seen {
                continue;
            }
            let known: HashSet<&str> = target
                .tracked
                .get(&fk.target_column)
                .map(|values| values.iter().map(|(_, v)| v.as_str()).collect())
                .unwrap_or_default();

            let Some(values) = table.tracked.get(&fk.column) else {
                continue;
            };
            for (line, value) in values {
                if value.is_empty() || known.contains(value.as_str()) {
                    continue;
                }
                diagnostics.push(
                    Diagnostic::error(DiagnosticCode::UnmatchedForeignKeyReference, Category::Schema)
                        .at_row(*line)
                        .at_column(fk.column + 1)
                        .with_content(value.clone())
                        .with_context(json!({ "table": table.url.as_str() })),
                );
            }
        }

        diagnostics
    }

    fn is_table_group(&self) -> bool {
        self.is_group
    }
}

/// Loads [`TableGroup`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvwLoader;

impl SchemaLoader for CsvwLoader {
    fn load(&self, url: &Url, body: &[u8]) -> Result<Box<dyn Schema>> {
        Ok(Box::new(TableGroup::from_json(body, url)?))
    }
}
