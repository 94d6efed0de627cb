//! Data source abstraction and transport metadata.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{CsvlintError, Result};

use super::transport::Transport;

/// Metadata supplied by the transport alongside a source body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Declared character set, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Raw Content-Type header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Raw Link header field values, one entry per header line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub link_headers: Vec<String>,
}

impl SourceMetadata {
    /// Create an empty metadata bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bundle from a Content-Type value, pulling out its charset.
    pub fn from_content_type(content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        Self {
            charset: content_type_param(&content_type, "charset"),
            content_type: Some(content_type),
            link_headers: Vec::new(),
        }
    }

    /// Add a raw Link header value.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link_headers.push(link.into());
        self
    }

    /// Override the charset.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }
}

/// Look up a `name=value` parameter in a media type, case-insensitively.
pub(crate) fn content_type_param(content_type: &str, name: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Something that can be validated.
#[derive(Debug, Clone)]
pub enum Source {
    /// In-memory bytes. Never locatable for schema discovery.
    Stream {
        data: Vec<u8>,
        metadata: Option<SourceMetadata>,
    },
    /// A local file.
    File(PathBuf),
    /// A remote (or `file:`) URL.
    Url(String),
}

impl Source {
    /// In-memory source with no transport metadata.
    pub fn stream(data: impl Into<Vec<u8>>) -> Self {
        Source::Stream {
            data: data.into(),
            metadata: None,
        }
    }

    /// In-memory source with a transport metadata bundle.
    pub fn stream_with_metadata(data: impl Into<Vec<u8>>, metadata: SourceMetadata) -> Self {
        Source::Stream {
            data: data.into(),
            metadata: Some(metadata),
        }
    }

    /// Local file source.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Source::File(path.as_ref().to_path_buf())
    }

    /// URL source.
    pub fn url(url: impl Into<String>) -> Self {
        Source::Url(url.into())
    }

    /// Guess the source kind from a command-line argument.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") || arg.starts_with("file:") {
            Source::url(arg)
        } else {
            Source::file(arg)
        }
    }

    /// Canonical URL used to match the source against schema tables.
    ///
    /// Streams have none. Files become `file:` URLs of their absolute path.
    pub fn canonical_url(&self) -> Result<Option<Url>> {
        match self {
            Source::Stream { .. } => Ok(None),
            Source::File(path) => {
                let absolute = std::path::absolute(path).map_err(|e| CsvlintError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                Url::from_file_path(&absolute).map(Some).map_err(|_| {
                    CsvlintError::Config(format!(
                        "cannot express '{}' as a file URL",
                        absolute.display()
                    ))
                })
            }
            Source::Url(url) => Ok(Some(Url::parse(url)?)),
        }
    }

    /// Whether the source is fetched over the network.
    pub fn is_remote(&self) -> bool {
        match self {
            Source::Url(url) => url.starts_with("http://") || url.starts_with("https://"),
            _ => false,
        }
    }

    /// Whether the source names a spreadsheet rather than a CSV document.
    pub fn is_spreadsheet(&self) -> bool {
        let name = match self {
            Source::Stream { .. } => return false,
            Source::File(path) => path.to_string_lossy().into_owned(),
            Source::Url(url) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
        };
        let lower = name.to_ascii_lowercase();
        lower.ends_with(".xls") || lower.ends_with(".xlsx")
    }

    /// Short label for reports.
    pub fn label(&self) -> String {
        match self {
            Source::Stream { .. } => "stream".to_string(),
            Source::File(path) => path.display().to_string(),
            Source::Url(url) => url.clone(),
        }
    }

    /// Read the source body once.
    ///
    /// The returned value owns (or borrows) the bytes for the duration of one
    /// run; dropping it releases the source.
    pub fn open<'a>(&'a self, transport: &dyn Transport) -> Result<OpenedSource<'a>> {
        match self {
            Source::Stream { data, metadata } => {
                Ok(OpenedSource::new(Cow::Borrowed(data.as_slice()), metadata.clone()))
            }
            Source::File(path) => {
                let body = std::fs::read(path).map_err(|e| CsvlintError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                Ok(OpenedSource::new(Cow::Owned(body), None))
            }
            Source::Url(url) => {
                let fetched = transport.fetch(&Url::parse(url)?)?;
                Ok(OpenedSource::new(Cow::Owned(fetched.body), fetched.metadata))
            }
        }
    }
}

/// A source whose body has been read.
#[derive(Debug)]
pub struct OpenedSource<'a> {
    /// Raw bytes.
    pub body: Cow<'a, [u8]>,
    /// Transport metadata, absent for local files.
    pub metadata: Option<SourceMetadata>,
}

impl<'a> OpenedSource<'a> {
    fn new(body: Cow<'a, [u8]>, metadata: Option<SourceMetadata>) -> Self {
        Self { body, metadata }
    }

    /// SHA-256 digest of the body, `sha256:`-prefixed.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.body);
        format!("sha256:{:x}", hasher.finalize())
    }

    /// Body size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.body.len() as u64
    }
}
