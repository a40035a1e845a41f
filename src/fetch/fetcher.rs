//! Document fetching with redirect, timeout and cancellation handling.

use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::utils::{has_pdf_magic, HttpClient, DEFAULT_USER_AGENT, MAX_REDIRECTS};

/// Default time allowed for one document fetch
pub const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors produced while retrieving a document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP {status} when fetching {url}")]
    Status { status: u16, url: String },

    #[error("too many redirects (more than {max}) when fetching {url}")]
    TooManyRedirects { url: String, max: usize },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("fetch of {url} was cancelled")]
    Cancelled { url: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A fetched document: raw body plus what the server said about it
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Response body bytes
    pub body: Vec<u8>,

    /// Final URL after redirects
    pub final_url: String,

    /// Content-Type header value, or empty
    pub content_type: String,
}

impl FetchedDocument {
    /// Whether the document looks like a PDF by header, URL or magic bytes
    pub fn is_pdf(&self) -> bool {
        detect_pdf(&self.body, &self.content_type, &self.final_url)
    }

    /// Whether the server labelled the document as HTML
    pub fn is_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("text/html")
    }
}

/// Decide whether a fetched body is a PDF.
///
/// True when the content type mentions `application/pdf`, the URL path ends
/// in `.pdf` (any case), or the body starts with `%PDF`.
pub fn detect_pdf(body: &[u8], content_type: &str, fetched_url: &str) -> bool {
    if content_type.to_ascii_lowercase().contains("application/pdf") {
        return true;
    }

    let path = url::Url::parse(fetched_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| fetched_url.to_string());
    if path.to_ascii_lowercase().ends_with(".pdf") {
        return true;
    }

    has_pdf_magic(body)
}

/// HTTP GET with a per-document timeout and bounded redirects
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: HttpClient,
    timeout: Duration,
    max_redirects: usize,
}

impl Fetcher {
    /// Create a fetcher with the default timeout and redirect limit
    pub fn new() -> Result<Self, FetchError> {
        Self::with_limits(DOCUMENT_TIMEOUT, MAX_REDIRECTS)
    }

    /// Create a fetcher with explicit limits
    pub fn with_limits(timeout: Duration, max_redirects: usize) -> Result<Self, FetchError> {
        let client = HttpClient::with_redirect_limit(DEFAULT_USER_AGENT, max_redirects)
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            max_redirects,
        })
    }

    /// Per-document timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch `url`, following up to the configured number of redirects.
    ///
    /// Any non-2xx final status is an error. The request is abandoned as soon
    /// as `cancel` fires.
    pub async fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchedDocument, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled { url: url.to_string() }),
            result = self.fetch_inner(parsed) => result,
        }
    }

    async fn fetch_inner(&self, url: url::Url) -> Result<FetchedDocument, FetchError> {
        let requested = url.to_string();
        tracing::debug!(url = %requested, "fetching document");

        let response = self
            .client
            .client()
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(&requested, e))?;

        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: final_url.clone(),
                }
            } else {
                FetchError::Body {
                    url: final_url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(
            url = %final_url,
            bytes = body.len(),
            content_type = %content_type,
            "document fetched"
        );

        Ok(FetchedDocument {
            body: body.to_vec(),
            final_url,
            content_type,
        })
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_redirect() {
            FetchError::TooManyRedirects {
                url,
                max: self.max_redirects,
            }
        } else {
            FetchError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}
