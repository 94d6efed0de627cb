//! Fetching sources and candidate metadata documents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, LINK};
use url::Url;

use crate::error::{CsvlintError, Result};

use super::source::SourceMetadata;

/// Default request timeout for remote fetches.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A fetched document.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    /// Response body.
    pub body: Vec<u8>,
    /// Transport metadata, when the transport has any.
    pub metadata: Option<SourceMetadata>,
}

impl Fetched {
    /// A body with no metadata.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            metadata: None,
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Fetches documents by URL.
///
/// Implementations must report a missing resource as
/// [`CsvlintError::NotFound`] (or an IO error of kind `NotFound`) and any
/// other failure as [`CsvlintError::RequestFailed`].
pub trait Transport {
    /// Fetch the document at `url`.
    fn fetch(&self, url: &Url) -> Result<Fetched>;
}

/// Reads `file:` URLs from disk and fetches `http(s):` URLs over the network.
pub struct DefaultTransport {
    client: Client,
}

impl DefaultTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport honouring `CSVLINT_HTTP_TIMEOUT` (seconds).
    pub fn from_env() -> Result<Self> {
        let secs = match std::env::var("CSVLINT_HTTP_TIMEOUT") {
            Ok(value) => value.trim().parse::<u64>().map_err(|_| {
                CsvlintError::Config(format!("CSVLINT_HTTP_TIMEOUT is not a number: {}", value))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::with_timeout(Duration::from_secs(secs))
    }

    /// Create a transport with a specific request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CsvlintError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn fetch_file(&self, url: &Url) -> Result<Fetched> {
        let path = url
            .to_file_path()
            .map_err(|_| CsvlintError::NotFound {
                location: url.to_string(),
            })?;
        let body = std::fs::read(&path).map_err(|e| CsvlintError::Io { path, source: e })?;
        Ok(Fetched::new(body))
    }

    fn fetch_http(&self, url: &Url) -> Result<Fetched> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| CsvlintError::RequestFailed {
                location: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(CsvlintError::NotFound {
                location: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(CsvlintError::RequestFailed {
                location: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let headers = response.headers();
        let mut metadata = match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(content_type) => SourceMetadata::from_content_type(content_type),
            None => SourceMetadata::new(),
        };
        metadata.link_headers = headers
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();

        let body = response.bytes().map_err(|e| CsvlintError::RequestFailed {
            location: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Fetched::new(body.to_vec()).with_metadata(metadata))
    }
}

impl Transport for DefaultTransport {
    fn fetch(&self, url: &Url) -> Result<Fetched> {
        tracing::debug!(url = %url, "fetching");
        match url.scheme() {
            "file" => self.fetch_file(url),
            "http" | "https" => self.fetch_http(url),
            other => Err(CsvlintError::RequestFailed {
                location: url.to_string(),
                message: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

/// In-memory transport that serves canned documents.
///
/// Unknown URLs are reported as not found. Every requested URL is recorded,
/// so callers can assert on probe order.
#[derive(Default)]
pub struct MockTransport {
    resources: HashMap<String, Fetched>,
    failures: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create an empty mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url` with no metadata.
    pub fn with_resource(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(url.into(), Fetched::new(body));
        self
    }

    /// Serve `body` at `url` with transport metadata.
    pub fn with_response(
        mut self,
        url: impl Into<String>,
        body: impl Into<Vec<u8>>,
        metadata: SourceMetadata,
    ) -> Self {
        self.resources
            .insert(url.into(), Fetched::new(body).with_metadata(metadata));
        self
    }

    /// Fail requests to `url` with a non-404 error.
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(url.into(), message.into());
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn fetch(&self, url: &Url) -> Result<Fetched> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        if let Some(message) = self.failures.get(url.as_str()) {
            return Err(CsvlintError::RequestFailed {
                location: url.to_string(),
                message: message.clone(),
            });
        }

        self.resources
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| CsvlintError::NotFound {
                location: url.to_string(),
            })
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn fetch(&self, url: &Url) -> Result<Fetched> {
        (**self).fetch(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_serves_and_records() {
        let transport = MockTransport::new()
            .with_resource("http://example.com/a.csv", "a,b\n")
            .with_failure("http://example.com/b.csv", "boom");

        let url = Url::parse("http://example.com/a.csv").unwrap();
        let fetched = transport.fetch(&url).unwrap();
        assert_eq!(fetched.body, b"a,b\n");

        let missing = Url::parse("http://example.com/missing.csv").unwrap();
        assert!(transport.fetch(&missing).unwrap_err().is_not_found());

        let failing = Url::parse("http://example.com/b.csv").unwrap();
        let err = transport.fetch(&failing).unwrap_err();
        assert!(matches!(err, CsvlintError::RequestFailed { .. }));

        assert_eq!(
            transport.requests(),
            vec![
                "http://example.com/a.csv",
                "http://example.com/missing.csv",
                "http://example.com/b.csv"
            ]
        );
    }

    #[test]
    fn test_default_transport_reads_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x,y\n").unwrap();

        let transport = DefaultTransport::new().unwrap();
        let url = Url::from_file_path(&path).unwrap();
        assert_eq!(transport.fetch(&url).unwrap().body, b"x,y\n");

        let missing = Url::from_file_path(dir.path().join("nope.csv")).unwrap();
        assert!(transport.fetch(&missing).unwrap_err().is_not_found());
    }
}
