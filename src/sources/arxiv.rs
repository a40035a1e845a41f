//! arXiv research source implementation.
//!
//! Queries the Atom export API and parses the feed with `feed-rs`.

use async_trait::async_trait;
use feed_rs::parser;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_body, Source, SourceError};
use crate::utils::HttpClient;

/// Base URL for arXiv API
const ARXIV_API_BASE: &str = "https://export.arxiv.org";

/// arXiv is slower than the JSON APIs
const ARXIV_TIMEOUT: Duration = Duration::from_secs(20);

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: ARXIV_API_BASE.to_string(),
            timeout: ARXIV_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Parse arXiv Atom feed entry into a result
    fn parse_entry(entry: feed_rs::model::Entry) -> PaperResult {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim().to_string())
            .unwrap_or_default();

        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .unwrap_or_default();

        let year = entry
            .published
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_default();

        let mut page_url = entry.id.clone();
        let mut pdf_url = String::new();
        for link in &entry.links {
            let is_pdf = link.title.as_deref() == Some("pdf")
                || link.media_type.as_deref() == Some("application/pdf");
            if is_pdf {
                pdf_url = link.href.clone();
            } else if link.rel.as_deref() == Some("alternate") {
                page_url = link.href.clone();
            }
        }

        // abs/<id> pages have a pdf/<id> twin
        if pdf_url.is_empty() && entry.id.contains("arxiv.org/abs/") {
            pdf_url = entry.id.replacen("/abs/", "/pdf/", 1);
        }

        PaperBuilder::new("arXiv", title)
            .authors(entry.authors.iter().map(|a| a.name.clone()))
            .year(year)
            .abstract_text(abstract_text)
            .url(page_url)
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn name(&self) -> &str {
        "arXiv"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = format!(
            "{}/api/query?search_query=all:{}&start=0&max_results={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let body = read_body(response).await?;

        let feed = parser::parse(body.as_bytes())
            .map_err(|e| SourceError::Parse(format!("Atom feed: {}", e)))?;

        let papers = feed.entries.into_iter().map(Self::parse_entry).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>arXiv Query Results</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2023-01-16T00:00:00Z</updated>
  <entry>
    <id>http://arxiv.org/abs/2301.12345v1</id>
    <updated>2023-01-15T10:00:00Z</updated>
    <title>Sparse Attention
      Revisited</title>
    <summary>  We revisit sparse attention.  </summary>
    <published>2023-01-15T10:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2301.12345v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2301.12345v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2302.00001v2</id>
    <updated>2023-02-01T10:00:00Z</updated>
    <title>No Links</title>
    <published>2022-12-31T23:00:00Z</published>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn test_search_parses_feed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search_query".into(), "all:sparse attention".into()),
                Matcher::UrlEncoded("max_results".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let source = ArxivSource::new().unwrap().with_base_url(server.url());
        let response = source
            .search(&SearchQuery::new("sparse attention").max_results(2))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.len(), 2);

        let first = &response.papers[0];
        assert!(first.title.starts_with("Sparse Attention"));
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(first.year, "2023");
        assert_eq!(first.abstract_text, "We revisit sparse attention.");
        assert_eq!(first.url, "http://arxiv.org/abs/2301.12345v1");
        assert_eq!(first.pdf_url, "http://arxiv.org/pdf/2301.12345v1");

        let second = &response.papers[1];
        assert_eq!(second.year, "2022");
        assert_eq!(second.url, "http://arxiv.org/abs/2302.00001v2");
        assert_eq!(second.pdf_url, "http://arxiv.org/pdf/2302.00001v2");
    }

    #[tokio::test]
    async fn test_search_rejects_garbage() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("this is not a feed")
            .create_async()
            .await;

        let source = ArxivSource::new().unwrap().with_base_url(server.url());
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
