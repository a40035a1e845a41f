//! OpenAlex research source implementation.
//!
//! API documentation: <https://docs.openalex.org/api-entities/works>

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::{normalize_doi, HttpClient};

const OPENALEX_API_BASE: &str = "https://api.openalex.org";

const SELECT_FIELDS: &str =
    "id,title,doi,open_access,primary_location,publication_year,authorships";

/// OpenAlex works search
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
    timeout: Duration,
}

impl OpenAlexSource {
    /// `email` joins the polite pool when set
    pub fn new(email: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: OPENALEX_API_BASE.to_string(),
            email,
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

    fn parse_work(work: OpenAlexWork) -> PaperResult {
        let authors = work
            .authorships
            .into_iter()
            .filter_map(|a| a.author.and_then(|author| author.display_name));

        let location = work.primary_location.unwrap_or_default();
        let mut pdf_url = location.pdf_url.unwrap_or_default();
        if pdf_url.is_empty() {
            if let Some(oa) = work.open_access.filter(|oa| oa.is_oa) {
                pdf_url = oa.oa_url.unwrap_or_default();
            }
        }

        PaperBuilder::new("OpenAlex", work.title.unwrap_or_default())
            .authors(authors)
            .year(
                work.publication_year
                    .filter(|y| *y > 0)
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            )
            .doi(work.doi.as_deref().map(normalize_doi).unwrap_or_default())
            .url(location.landing_page_url.unwrap_or_default())
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for OpenAlexSource {
    fn id(&self) -> &str {
        "openalex"
    }

    fn name(&self) -> &str {
        "OpenAlex"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let mut url = format!(
            "{}/works?search={}&per-page={}&select={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            SELECT_FIELDS
        );
        if let Some(email) = &self.email {
            url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
        }

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: OpenAlexResponse = read_json(response).await?;

        let papers = data.results.into_iter().map(Self::parse_work).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct OpenAlexResponse {
    #[serde(default)]
    results: Vec<OpenAlexWork>,
}

#[derive(Debug, Deserialize)]
struct OpenAlexWork {
    title: Option<String>,
    doi: Option<String>,
    publication_year: Option<i32>,
    open_access: Option<OpenAccess>,
    primary_location: Option<Location>,
    #[serde(default)]
    authorships: Vec<Authorship>,
}

#[derive(Debug, Deserialize)]
struct OpenAccess {
    #[serde(default)]
    is_oa: bool,
    oa_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Location {
    landing_page_url: Option<String>,
    pdf_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<AuthorRef>,
}

#[derive(Debug, Deserialize)]
struct AuthorRef {
    display_name: Option<String>,
}
