//! Lens.org scholarly search.
//!
//! Unlike the other adapters this one POSTs a JSON query body and
//! authenticates with a bearer token.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::models::{doi_page_url, PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const LENS_API_BASE: &str = "https://api.lens.org";

const INCLUDE_FIELDS: [&str; 8] = [
    "title",
    "authors",
    "year_published",
    "abstract",
    "doi",
    "open_access",
    "external_ids",
    "scholarly_citations_count",
];

/// Lens.org research source (API token required)
#[derive(Debug, Clone)]
pub struct LensSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl LensSource {
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: LENS_API_BASE.to_string(),
            api_key,
            timeout: SEARCH_TIMEOUT,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_record(record: LensRecord) -> PaperResult {
        let doi = record.doi.unwrap_or_default();
        let page_url = if doi.is_empty() {
            String::new()
        } else {
            doi_page_url(&doi)
        };

        PaperBuilder::new("Lens.org", record.title.unwrap_or_default())
            .authors(record.authors.into_iter().filter_map(|a| a.display_name))
            .year(
                record
                    .year_published
                    .filter(|y| *y > 0)
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            )
            .abstract_text(record.r#abstract.unwrap_or_default())
            .doi(doi)
            .url(page_url)
            .build()
    }
}

#[async_trait]
impl Source for LensSource {
    fn id(&self) -> &str {
        "lens"
    }

    fn name(&self) -> &str {
        "Lens.org"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::MissingApiKey)?;

        let payload = json!({
            "query": { "match": { "title": query.query } },
            "size": query.max_results,
            "include": INCLUDE_FIELDS,
        });

        let response = self
            .client
            .post(&format!("{}/scholarly/search", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;
        let data: LensResponse = read_json(response).await?;

        let papers = data.data.into_iter().map(Self::parse_record).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct LensResponse {
    #[serde(default)]
    data: Vec<LensRecord>,
}

#[derive(Debug, Deserialize)]
struct LensRecord {
    title: Option<String>,
    year_published: Option<i32>,
    r#abstract: Option<String>,
    doi: Option<String>,
    #[serde(default)]
    authors: Vec<LensAuthor>,
}

#[derive(Debug, Deserialize)]
struct LensAuthor {
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_posts_json_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/scholarly/search")
            .match_header("authorization", "Bearer lk")
            .match_body(Matcher::PartialJson(json!({
                "query": {"match": {"title": "coral reefs"}},
                "size": 3
            })))
            .with_status(200)
            .with_body(
                r#"{"total":1,"data":[{"title":"Coral reefs","year_published":2016,
                    "doi":"10.1000/reef","authors":[{"display_name":"C. Reef"}]}]}"#,
            )
            .create_async()
            .await;

        let source = LensSource::new(Some("lk".to_string()))
            .unwrap()
            .with_base_url(server.url());
        let response = source
            .search(&SearchQuery::new("coral reefs").max_results(3))
            .await
            .unwrap();

        mock.assert_async().await;
        let paper = &response.papers[0];
        assert_eq!(paper.year, "2016");
        assert_eq!(paper.url, "https://doi.org/10.1000/reef");
        assert_eq!(paper.authors, vec!["C. Reef"]);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let source = LensSource::new(None).unwrap();
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingApiKey));
    }
}
