//! DOAJ (Directory of Open Access Journals) research source implementation.
//!
//! API documentation: <https://doaj.org/api/docs>
//!
//! DOAJ is free and requires no API key for article search.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{doi_page_url, PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const DOAJ_API_BASE: &str = "https://doaj.org";

/// DOAJ research source
#[derive(Debug, Clone)]
pub struct DoajSource {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl DoajSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: DOAJ_API_BASE.to_string(),
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

    fn parse_result(article: DoajArticle) -> PaperResult {
        let bib = article.bibjson;

        let doi = bib
            .identifier
            .iter()
            .filter(|id| id.kind.as_deref() == Some("doi"))
            .filter_map(|id| id.id.clone())
            .last()
            .unwrap_or_default();

        let mut page_url = String::new();
        let mut pdf_url = String::new();
        for link in bib.link {
            match link.kind.as_deref() {
                Some("fulltext") => page_url = link.url.unwrap_or_default(),
                Some("pdf") => pdf_url = link.url.unwrap_or_default(),
                _ => {}
            }
        }
        if page_url.is_empty() && !doi.is_empty() {
            page_url = doi_page_url(&doi);
        }

        PaperBuilder::new("DOAJ", bib.title.unwrap_or_default())
            .authors(bib.author.into_iter().filter_map(|a| a.name))
            .year(bib.year.unwrap_or_default())
            .abstract_text(bib.r#abstract.unwrap_or_default())
            .doi(doi)
            .url(page_url)
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for DoajSource {
    fn id(&self) -> &str {
        "doaj"
    }

    fn name(&self) -> &str {
        "DOAJ"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        // the query is a path segment, not a parameter
        let url = format!(
            "{}/api/search/articles/{}?pageSize={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;
        let data: DoajResponse = read_json(response).await?;

        let papers = data.results.into_iter().map(Self::parse_result).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct DoajResponse {
    #[serde(default)]
    results: Vec<DoajArticle>,
}

#[derive(Debug, Deserialize)]
struct DoajArticle {
    #[serde(default)]
    bibjson: DoajBibJson,
}

#[derive(Debug, Default, Deserialize)]
struct DoajBibJson {
    title: Option<String>,
    r#abstract: Option<String>,
    year: Option<String>,
    #[serde(default)]
    author: Vec<DoajAuthor>,
    #[serde(default)]
    identifier: Vec<DoajIdentifier>,
    #[serde(default)]
    link: Vec<DoajLink>,
}

#[derive(Debug, Deserialize)]
struct DoajAuthor {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajIdentifier {
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DoajLink {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
}
