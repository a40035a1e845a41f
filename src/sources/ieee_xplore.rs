//! IEEE Xplore research source implementation.
//!
//! API documentation: <https://developer.ieee.org/docs>

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{json_scalar_to_string, read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const IEEE_API_BASE: &str = "https://ieeexploreapi.ieee.org";

/// IEEE Xplore research source (API key required)
#[derive(Debug, Clone)]
pub struct IeeeXploreSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl IeeeXploreSource {
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: IEEE_API_BASE.to_string(),
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

    fn parse_article(article: IeeeArticle) -> PaperResult {
        let authors = article
            .authors
            .map(|a| a.authors)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.full_name);

        PaperBuilder::new("IEEE Xplore", article.title.unwrap_or_default())
            .authors(authors)
            .year(json_scalar_to_string(&article.publication_year))
            .abstract_text(article.r#abstract.unwrap_or_default())
            .doi(article.doi.unwrap_or_default())
            .url(article.html_url.unwrap_or_default())
            .pdf_url(article.pdf_url.unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl Source for IeeeXploreSource {
    fn id(&self) -> &str {
        "ieee"
    }

    fn name(&self) -> &str {
        "IEEE Xplore"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::MissingApiKey)?;

        let url = format!(
            "{}/api/v1/search/articles?querytext={}&max_records={}&apikey={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            urlencoding::encode(api_key)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        let data: IeeeResponse = read_json(response).await?;

        let papers = data.articles.into_iter().map(Self::parse_article).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct IeeeResponse {
    #[serde(default)]
    articles: Vec<IeeeArticle>,
}

#[derive(Debug, Deserialize)]
struct IeeeArticle {
    title: Option<String>,
    doi: Option<String>,
    /// string in some records, number in others
    #[serde(default)]
    publication_year: serde_json::Value,
    r#abstract: Option<String>,
    html_url: Option<String>,
    pdf_url: Option<String>,
    authors: Option<IeeeAuthors>,
}

#[derive(Debug, Deserialize)]
struct IeeeAuthors {
    #[serde(default)]
    authors: Vec<IeeeAuthor>,
}

#[derive(Debug, Deserialize)]
struct IeeeAuthor {
    full_name: Option<String>,
}
