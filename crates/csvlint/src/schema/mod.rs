//! Schema collaborators and schema discovery.
//!
//! The validator does not interpret schemas itself. It asks a [`Schema`] for
//! a dialect, hands it header and data rows, and merges whatever diagnostics
//! it returns. [`TableGroup`] is the bundled implementation for CSVW-style
//! JSON metadata; [`SchemaLocator`] finds metadata for a source.

mod csvw;
mod locator;

use url::Url;

use crate::dialect::DialectFragment;
use crate::diagnostics::Diagnostic;
use crate::error::Result;

pub use csvw::{CsvwLoader, TableGroup};
pub use locator::{METADATA_MEDIA_TYPES, SchemaLocator, WELL_KNOWN_PATH};
pub(crate) use locator::mismatch as schema_mismatch;

/// A schema the validator can check rows against.
///
/// `table_url` is the canonical URL of the source being validated, absent for
/// in-memory streams.
pub trait Schema {
    /// URL of the metadata document this schema was loaded from.
    fn url(&self) -> Option<&Url>;

    /// Whether this schema declares a table for `table_url`.
    fn describes(&self, table_url: &Url) -> bool;

    /// Whether rows of `table_url` can be checked against this schema.
    /// A stream has no URL and only fits a schema that leaves no choice of
    /// table.
    fn applies_to(&self, table_url: Option<&Url>) -> bool {
        table_url.is_some_and(|url| self.describes(url))
    }

    /// Forget what an earlier pass over `table_url` recorded.
    fn begin_table(&mut self, _table_url: Option<&Url>) {}

    /// Dialect declared for the table, if any.
    fn dialect_for(&self, table_url: Option<&Url>) -> Option<DialectFragment>;

    /// Check a header row.
    fn validate_header(&mut self, header: &[String], table_url: Option<&Url>) -> Vec<Diagnostic>;

    /// Check a data row. `line` is the 1-based row number.
    fn validate_row(&mut self, row: &[String], line: usize, table_url: Option<&Url>)
    -> Vec<Diagnostic>;

    /// Check the foreign keys of `table_url` against the tables validated
    /// so far.
    fn validate_foreign_keys(&mut self, table_url: Option<&Url>) -> Vec<Diagnostic>;

    /// Whether this schema groups tables and can check foreign keys.
    fn is_table_group(&self) -> bool;
}

/// Turns a fetched metadata document into a [`Schema`].
pub trait SchemaLoader {
    /// Parse `body`, fetched from `url`.
    fn load(&self, url: &Url, body: &[u8]) -> Result<Box<dyn Schema>>;
}
