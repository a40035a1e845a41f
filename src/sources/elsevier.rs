//! Elsevier ScienceDirect research source implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, year_prefix, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const ELSEVIER_API_BASE: &str = "https://api.elsevier.com";

/// ScienceDirect search (API key required, sent as `X-ELS-APIKey`)
#[derive(Debug, Clone)]
pub struct ElsevierSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ElsevierSource {
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: ELSEVIER_API_BASE.to_string(),
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

    fn parse_entry(entry: ElsevierEntry) -> PaperResult {
        // the search view carries only the first creator
        PaperBuilder::new("Elsevier ScienceDirect", entry.title.unwrap_or_default())
            .authors(entry.creator)
            .year(year_prefix(entry.cover_date.as_deref().unwrap_or_default()))
            .doi(entry.doi.unwrap_or_default())
            .url(entry.url.unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl Source for ElsevierSource {
    fn id(&self) -> &str {
        "elsevier"
    }

    fn name(&self) -> &str {
        "Elsevier ScienceDirect"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::MissingApiKey)?;

        let url = format!(
            "{}/content/search/sciencedirect?query={}&count={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        let response = self
            .client
            .get(&url)
            .header("X-ELS-APIKey", api_key)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        let data: ElsevierResponse = read_json(response).await?;

        let papers = data
            .search_results
            .entry
            .into_iter()
            .map(Self::parse_entry)
            .collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct ElsevierResponse {
    #[serde(rename = "search-results", default)]
    search_results: ElsevierResults,
}

#[derive(Debug, Default, Deserialize)]
struct ElsevierResults {
    #[serde(default)]
    entry: Vec<ElsevierEntry>,
}

#[derive(Debug, Deserialize)]
struct ElsevierEntry {
    #[serde(rename = "dc:title")]
    title: Option<String>,
    #[serde(rename = "prism:doi")]
    doi: Option<String>,
    #[serde(rename = "dc:creator")]
    creator: Option<String>,
    #[serde(rename = "prism:url")]
    url: Option<String>,
    #[serde(rename = "prism:coverDate")]
    cover_date: Option<String>,
}
