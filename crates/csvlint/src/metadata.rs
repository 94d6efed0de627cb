//! Inspection of transport metadata: content type, charset, header presence.

use crate::diagnostics::{Category, DiagnosticCode, Diagnostics};
use crate::input::{SourceMetadata, content_type_param};

/// What the transport metadata says about the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataInspection {
    /// Whether a header row is believed to be present.
    pub header: bool,
    /// Declared character set, if any.
    pub encoding: Option<String>,
}

/// Derive header presence and encoding from a metadata bundle.
///
/// `supplied_dialect` is true when the caller passed an explicit dialect;
/// a caller who did so is not relying on an assumed header.
pub fn inspect_metadata(
    metadata: Option<&SourceMetadata>,
    supplied_dialect: bool,
    diagnostics: &mut Diagnostics,
) -> MetadataInspection {
    let mut header = true;
    let mut assumed_header = !supplied_dialect;
    let mut undeclared_header = !supplied_dialect;

    let Some(bundle) = metadata else {
        if assumed_header {
            diagnostics.info(DiagnosticCode::AssumedHeader, Category::Structure);
        }
        return MetadataInspection {
            header,
            encoding: None,
        };
    };

    let content_type = bundle.content_type.as_deref();
    let is_csv = content_type.map(is_text_csv).unwrap_or(false);

    if is_csv {
        header = true;
        assumed_header = !supplied_dialect;
        undeclared_header = false;
    }

    if let Some(declared) = content_type.and_then(|ct| content_type_param(ct, "header")) {
        if declared.eq_ignore_ascii_case("present") {
            header = true;
            undeclared_header = false;
            assumed_header = false;
        } else if declared.eq_ignore_ascii_case("absent") {
            header = false;
            undeclared_header = false;
            assumed_header = false;
        }
    }

    match bundle.charset.as_deref() {
        None => {
            diagnostics.warning(DiagnosticCode::NoEncoding, Category::Context);
        }
        Some(charset) if !is_utf8(charset) => {
            diagnostics
                .warning(DiagnosticCode::Encoding, Category::Context)
                .content = Some(charset.to_string());
        }
        Some(_) => {}
    }

    if content_type.is_none() {
        diagnostics.warning(DiagnosticCode::NoContentType, Category::Context);
    }

    if !is_csv {
        let diagnostic = diagnostics.error(DiagnosticCode::WrongContentType, Category::Context);
        diagnostic.content = content_type.map(str::to_string);
    }

    if undeclared_header {
        diagnostics.error(DiagnosticCode::UndeclaredHeader, Category::Structure);
        assumed_header = false;
    }

    if assumed_header {
        diagnostics.info(DiagnosticCode::AssumedHeader, Category::Structure);
    }

    MetadataInspection {
        header,
        encoding: bundle.charset.clone(),
    }
}

/// Whether a Content-Type value names `text/csv`, ignoring parameters.
fn is_text_csv(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case("text/csv"))
        .unwrap_or(false)
}

fn is_utf8(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8")
}
