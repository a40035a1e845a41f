//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::{PaperResult, SearchQuery, SearchResponse};
use crate::sources::{Source, SourceCapabilities, SourceError};

#[derive(Debug, Clone)]
enum Outcome {
    Papers(Vec<PaperResult>),
    Fail(String),
}

/// A mock source that returns canned papers or a canned failure.
#[derive(Debug)]
pub struct MockSource {
    id: String,
    outcome: Outcome,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock with the given id that returns no papers.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outcome: Outcome::Papers(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these papers from every search (truncated to the query's max).
    pub fn with_papers(mut self, papers: Vec<PaperResult>) -> Self {
        self.outcome = Outcome::Papers(papers);
        self
    }

    /// Fail every search with an API error carrying `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.outcome = Outcome::Fail(message.into());
        self
    }

    /// Number of searches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Papers(papers) => Ok(SearchResponse::new(
                papers.iter().take(query.max_results).cloned().collect(),
                self.name(),
                &query.query,
            )),
            Outcome::Fail(message) => Err(SourceError::Api(message.clone())),
        }
    }
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(title: &str, source: &str) -> PaperResult {
    PaperResult::new(source, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_papers_respect_max() {
        let mock = MockSource::new("m").with_papers(vec![
            make_paper("one", "M"),
            make_paper("two", "M"),
            make_paper("three", "M"),
        ]);

        let response = mock
            .search(&SearchQuery::new("q").max_results(2))
            .await
            .unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockSource::new("m").failing("boom");
        let err = mock.search(&SearchQuery::new("q")).await.unwrap_err();
        assert_eq!(err.to_string(), "API error: boom");
    }
}
