//! Academic search sources with a uniform trait-based interface.
//!
//! Every source implements [`Source`] and is registered with the
//! [`SourceRegistry`] under a stable identifier. The search tool fans a query
//! out over the registry; each source only has to turn one query into a
//! [`SearchResponse`] or a [`SourceError`].
//!
//! # Sources
//!
//! | id                 | API                         | key required |
//! |--------------------|-----------------------------|--------------|
//! | `openalex`         | OpenAlex works search       | no           |
//! | `arxiv`            | arXiv Atom query API        | no           |
//! | `plos`             | PLOS Solr search            | no           |
//! | `crossref`         | Crossref REST works         | no           |
//! | `doaj`             | DOAJ article search         | no           |
//! | `dblp`             | DBLP publication search     | no           |
//! | `pubmed`           | NCBI E-utilities (PMC)      | no           |
//! | `semantic_scholar` | Semantic Scholar Graph API  | optional     |
//! | `springer`         | Springer Nature open access | yes          |
//! | `ieee`             | IEEE Xplore                 | yes          |
//! | `elsevier`         | ScienceDirect search        | yes          |
//! | `lens`             | Lens scholarly search       | yes          |
//!
//! Keyed sources without a configured key stay registered and fail each
//! search with [`SourceError::MissingApiKey`], so the caller sees why they
//! were skipped.
//!
//! Two DOI lookups used by citation enrichment live here as well:
//! [`CrossRefSource::lookup_work`] and [`UnpaywallClient::lookup`].

mod arxiv;
mod crossref;
mod dblp;
mod doaj;
mod elsevier;
mod ieee_xplore;
mod lens;
mod openalex;
mod plos;
mod pubmed;
mod registry;
mod semantic;
mod springer;
mod unpaywall;

pub mod mock;

pub use arxiv::ArxivSource;
pub use crossref::{CrossRefSource, WorkMetadata};
pub use dblp::DblpSource;
pub use doaj::DoajSource;
pub use elsevier::ElsevierSource;
pub use ieee_xplore::IeeeXploreSource;
pub use lens::LensSource;
pub use mock::MockSource;
pub use openalex::OpenAlexSource;
pub use plos::PlosSource;
pub use pubmed::PubMedSource;
pub use registry::{SourceCapabilities, SourceRegistry};
pub use semantic::SemanticScholarSource;
pub use springer::SpringerSource;
pub use unpaywall::{OpenAccessStatus, UnpaywallClient};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::models::{SearchQuery, SearchResponse};

/// Time allowed for one search request
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Time allowed for one by-DOI metadata or open-access lookup
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// The Source trait defines the interface for all search source plugins.
///
/// # Implementing a New Source
///
/// 1. Create a struct holding an [`HttpClient`](crate::utils::HttpClient) and a base URL
/// 2. Implement `id`, `name` and `search`
/// 3. Add it to [`SourceRegistry::from_config`] or register it dynamically
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "arxiv", "semantic_scholar")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Describe the capabilities of this source
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Whether searches need an API key
    fn requires_api_key(&self) -> bool {
        false
    }

    /// Search for papers matching the query
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("network error: {0}")]
    Network(String),

    /// Response body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Upstream answered 429
    #[error("rate limited")]
    RateLimit,

    /// Record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Upstream answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// The source needs a key that is not configured
    #[error("no API key configured")]
    MissingApiKey,

    /// The caller's cancellation token fired mid-request
    #[error("request was cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

/// Check the status of an API response and deserialize its JSON body.
///
/// 429 becomes [`SourceError::RateLimit`]; any other non-2xx becomes
/// [`SourceError::Api`] carrying the status and the start of the body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
    let body = read_body(response).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Like [`read_json`] but returns the raw body text.
pub(crate) async fn read_body(response: Response) -> Result<String, SourceError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SourceError::RateLimit);
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(SourceError::Api(format!(
            "HTTP {}: {}",
            status.as_u16(),
            crate::models::truncate_chars(body.trim(), 200)
        )));
    }
    Ok(body)
}

/// Render a JSON scalar as text; some APIs send years as numbers, others as strings.
pub(crate) fn json_scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// First four characters of a date string, when they look like a year.
pub(crate) fn year_prefix(date: &str) -> String {
    let year: String = date.chars().take(4).collect();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        year
    } else {
        String::new()
    }
}
