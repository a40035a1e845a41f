//! Search request and response models.

use serde::{Deserialize, Serialize};

use super::PaperResult;

/// Results requested from each source when the caller does not say otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound accepted for per-source result counts.
pub const MAX_RESULTS_LIMIT: usize = 20;

/// Search query parameters passed to every source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query string
    pub query: String,

    /// Maximum number of results each source should return
    pub max_results: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Set the per-source result cap
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }
}

/// Results returned by a single source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Papers in the order the source ranked them
    pub papers: Vec<PaperResult>,

    /// Display name of the source
    pub source: String,

    /// The query that produced these results
    pub query: String,
}

impl SearchResponse {
    /// Create a new search response
    pub fn new(papers: Vec<PaperResult>, source: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            papers,
            source: source.into(),
            query: query.into(),
        }
    }

    /// Number of papers returned
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    /// Whether the source returned nothing
    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}
