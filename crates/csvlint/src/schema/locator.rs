//! Schema discovery for a source.
//!
//! Candidates are tried in order: `describedby` Link headers, the
//! well-known probe (remote sources, advisory only), then the
//! `{+url}-metadata.json` and `csv-metadata.json` templates.

use url::Url;

use crate::diagnostics::{Category, Diagnostic, DiagnosticCode, Diagnostics};
use crate::error::CsvlintError;
use crate::input::{SourceMetadata, Transport};
use crate::link::parse_link_header;

use super::{Schema, SchemaLoader};

/// Media types a `describedby` link must declare to be considered.
pub const METADATA_MEDIA_TYPES: [&str; 3] = [
    "application/csvm+json",
    "application/ld+json",
    "application/json",
];

/// Well-known discovery document path, relative to the source origin.
pub const WELL_KNOWN_PATH: &str = "/.well-known/csvm";

/// Finds the schema describing a source.
pub struct SchemaLocator<'a> {
    transport: &'a dyn Transport,
    loader: &'a dyn SchemaLoader,
}

impl<'a> SchemaLocator<'a> {
    pub fn new(transport: &'a dyn Transport, loader: &'a dyn SchemaLoader) -> Self {
        Self { transport, loader }
    }

    /// Keep `bound` if it describes `table_url`, otherwise discard it and
    /// run discovery.
    ///
    /// A discarded bound schema is reported as `schema_mismatch`.
    pub fn reconcile(
        &self,
        bound: Option<Box<dyn Schema>>,
        table_url: &Url,
        metadata: Option<&SourceMetadata>,
        remote: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Box<dyn Schema>> {
        if let Some(schema) = bound {
            if schema.describes(table_url) {
                return Some(schema);
            }
            tracing::debug!(
                schema = ?schema.url().map(Url::as_str),
                table = %table_url,
                "bound schema does not describe source, discarding"
            );
            diagnostics.push(mismatch(schema.url()));
        }
        self.locate(table_url, metadata, remote, diagnostics)
    }

    /// Run discovery for `table_url`.
    pub fn locate(
        &self,
        table_url: &Url,
        metadata: Option<&SourceMetadata>,
        remote: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Box<dyn Schema>> {
        if let Some(schema) = metadata.and_then(|m| self.from_link_headers(m, table_url, diagnostics)) {
            return Some(schema);
        }

        if remote {
            self.probe_well_known(table_url);
        }

        self.from_templates(table_url, diagnostics)
    }

    fn from_link_headers(
        &self,
        metadata: &SourceMetadata,
        table_url: &Url,
        diagnostics: &mut Diagnostics,
    ) -> Option<Box<dyn Schema>> {
        for raw in &metadata.link_headers {
            let links = match parse_link_header(raw) {
                Ok(links) => links,
                Err(e) => {
                    tracing::warn!(header = %raw, error = %e, "ignoring unparseable Link header");
                    continue;
                }
            };

            let candidates = links.iter().filter(|link| {
                link.has_rel("describedby")
                    && link
                        .media_type()
                        .is_some_and(|t| METADATA_MEDIA_TYPES.iter().any(|m| m.eq_ignore_ascii_case(t)))
            });

            for link in candidates {
                let url = match table_url.join(&link.uri) {
                    Ok(url) => url,
                    Err(e) => {
                        tracing::warn!(uri = %link.uri, error = %e, "cannot resolve Link target");
                        continue;
                    }
                };
                tracing::debug!(candidate = %url, "trying Link header metadata");

                match self.load(&url) {
                    Ok(schema) if schema.describes(table_url) => return Some(schema),
                    Ok(_) => diagnostics.push(mismatch(Some(&url))),
                    Err(e) if is_missing(&e) => {
                        tracing::debug!(candidate = %url, error = %e, "Link header metadata unavailable");
                    }
                    Err(e) => {
                        tracing::warn!(candidate = %url, error = %e, "unusable Link header metadata");
                        diagnostics.push(mismatch(Some(&url)));
                    }
                }
            }
        }
        None
    }

    /// Advisory only: the outcome is logged and otherwise ignored.
    fn probe_well_known(&self, table_url: &Url) {
        let Ok(url) = table_url.join(WELL_KNOWN_PATH) else {
            return;
        };
        match self.transport.fetch(&url) {
            Ok(fetched) => {
                tracing::debug!(url = %url, bytes = fetched.body.len(), "well-known document found")
            }
            Err(e) => tracing::debug!(url = %url, error = %e, "no well-known document"),
        }
    }

    fn from_templates(&self, table_url: &Url, diagnostics: &mut Diagnostics) -> Option<Box<dyn Schema>> {
        let templates = [
            format!("{}-metadata.json", table_url.as_str()),
            "csv-metadata.json".to_string(),
        ];

        for template in &templates {
            let Ok(url) = table_url.join(template) else {
                continue;
            };
            tracing::debug!(candidate = %url, "trying metadata template");

            match self.load(&url) {
                Ok(schema) if schema.describes(table_url) => return Some(schema),
                Ok(_) => diagnostics.push(mismatch(Some(&url))),
                Err(e @ CsvlintError::Metadata(_)) => {
                    tracing::warn!(candidate = %url, error = %e, "unusable metadata document");
                    diagnostics.push(mismatch(Some(&url)));
                }
                Err(e) => tracing::debug!(candidate = %url, error = %e, "no metadata document"),
            }
        }
        None
    }

    fn load(&self, url: &Url) -> crate::Result<Box<dyn Schema>> {
        let fetched = self.transport.fetch(url)?;
        self.loader.load(url, &fetched.body)
    }
}

/// A `schema_mismatch` warning naming the metadata document, if known.
pub(crate) fn mismatch(candidate: Option<&Url>) -> Diagnostic {
    let diagnostic = Diagnostic::warning(DiagnosticCode::SchemaMismatch, Category::Context);
    match candidate {
        Some(url) => diagnostic.with_content(url.as_str()),
        None => diagnostic,
    }
}

fn is_missing(error: &CsvlintError) -> bool {
    error.is_not_found() || matches!(error, CsvlintError::RequestFailed { .. })
}
