//! PubMed Central research source implementation.
//!
//! Two NCBI E-utilities calls per search: `esearch` for PMC ids, then
//! `esummary` for their metadata. Every PMC article has a stable landing
//! page and a `/pdf/` twin.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, year_prefix, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const EUTILS_API_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

const PMC_ARTICLE_BASE: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles";

/// PubMed Central research source
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl PubMedSource {
    /// The key is optional; NCBI only raises the rate limit with it
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: EUTILS_API_BASE.to_string(),
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

    fn key_param(&self) -> String {
        self.api_key
            .as_deref()
            .map(|k| format!("&api_key={}", urlencoding::encode(k)))
            .unwrap_or_default()
    }

    async fn search_ids(&self, query: &SearchQuery) -> Result<Vec<String>, SourceError> {
        let url = format!(
            "{}/esearch.fcgi?db=pmc&term={}&retmax={}&retmode=json{}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            self.key_param()
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: ESearchResponse = read_json(response).await?;

        let mut ids = data.esearchresult.idlist;
        ids.truncate(query.max_results);
        Ok(ids)
    }

    async fn summaries(&self, ids: &[String]) -> Result<Vec<PaperResult>, SourceError> {
        let url = format!(
            "{}/esummary.fcgi?db=pmc&id={}&retmode=json{}",
            self.base_url,
            ids.join(","),
            self.key_param()
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let mut data: ESummaryResponse = read_json(response).await?;

        // keep esearch order; ids missing from the summary or malformed are skipped
        let papers = ids
            .iter()
            .filter_map(|id| {
                let raw = data.result.remove(id)?;
                let summary: PmcSummary = serde_json::from_value(raw).ok()?;
                Some(Self::parse_summary(id, summary))
            })
            .collect();
        Ok(papers)
    }

    fn parse_summary(id: &str, summary: PmcSummary) -> PaperResult {
        let page_url = format!("{}/PMC{}/", PMC_ARTICLE_BASE, id);
        let pdf_url = format!("{}pdf/", page_url);

        PaperBuilder::new("PubMed Central", summary.title.unwrap_or_default())
            .authors(summary.authors.into_iter().filter_map(|a| a.name))
            .year(year_prefix(summary.pubdate.as_deref().unwrap_or_default()))
            .doi(summary.elocationid.unwrap_or_default())
            .url(page_url)
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed Central"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let ids = self.search_ids(query).await?;
        if ids.is_empty() {
            return Ok(SearchResponse::new(Vec::new(), self.name(), &query.query));
        }

        let papers = self.summaries(&ids).await?;
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PmcSummary {
    title: Option<String>,
    pubdate: Option<String>,
    #[serde(default)]
    authors: Vec<PmcAuthor>,
    elocationid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PmcAuthor {
    name: Option<String>,
}
