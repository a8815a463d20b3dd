//! Fetching of metadata and key-set documents.
//!
//! A configuration URI may point at a remote HTTP(S) endpoint or at a local
//! file. Anything that does not parse as an http/https URL is treated as a
//! filesystem path. Both sources collapse into a single failure kind: the
//! configuration could not be found.

use std::fs;
use std::time::Duration;

use url::Url;

/// Default HTTP request timeout for metadata and key-set fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The document could not be read from the remote endpoint or local file.
    #[error("Configuration not found: {uri}")]
    NotFound {
        /// The URI that could not be fetched.
        uri: String,
    },
}

impl FetchError {
    pub(crate) fn not_found(uri: &str) -> Self {
        Self::NotFound {
            uri: uri.to_string(),
        }
    }
}

/// Source of raw metadata and key-set bytes.
///
/// The configuration loader only depends on this trait, so tests can inject
/// a fetcher that counts or denies fetches.
pub trait Fetch: Send + Sync {
    /// Returns the raw bytes behind `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] if the document is unreachable or
    /// missing.
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError>;
}

/// Default fetcher: blocking HTTP GET for http/https URLs, a filesystem
/// read for everything else.
pub struct DefaultFetcher {
    http_client: reqwest::blocking::Client,
}

impl DefaultFetcher {
    /// Creates a new fetcher with the default request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new() -> Self {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self { http_client }
    }

    fn fetch_remote(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .http_client
            .get(uri)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| {
                tracing::warn!("Failed to fetch {}: {}", uri, e);
                FetchError::not_found(uri)
            })?;

        if !response.status().is_success() {
            tracing::warn!("Fetch of {} returned status {}", uri, response.status());
            return Err(FetchError::not_found(uri));
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| {
                tracing::warn!("Failed to read response body from {}: {}", uri, e);
                FetchError::not_found(uri)
            })
    }

    fn fetch_local(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        fs::read(uri).map_err(|e| {
            tracing::warn!("Failed to read {}: {}", uri, e);
            FetchError::not_found(uri)
        })
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for DefaultFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote(uri) {
            self.fetch_remote(uri)
        } else {
            self.fetch_local(uri)
        }
    }
}

/// Returns `true` if `uri` is a well-formed http/https locator.
fn is_remote(uri: &str) -> bool {
    Url::parse(uri)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://login.microsoftonline.com/common/v2.0"));
        assert!(is_remote("http://adfs.example.com/adfs"));
        assert!(!is_remote("/etc/microsoft/metadata.json"));
        assert!(!is_remote("relative/metadata.json"));
        assert!(!is_remote("ftp://example.com/metadata.json"));
    }

    #[test]
    fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"issuer\":\"x\"}").unwrap();

        let fetcher = DefaultFetcher::new();
        let bytes = fetcher.fetch(file.path().to_str().unwrap()).unwrap();
        assert_eq!(bytes, b"{\"issuer\":\"x\"}");
    }

    #[test]
    fn test_fetch_missing_file() {
        let fetcher = DefaultFetcher::new();
        let err = fetcher.fetch("/definitely/not/there.json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration not found: /definitely/not/there.json"
        );
    }
}
