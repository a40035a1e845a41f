//! Semantic Scholar research source implementation.
//!
//! Uses the Graph API paper search. Works without a key at a lower rate
//! limit; a configured key is sent as `x-api-key`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const SEMANTIC_SCHOLAR_API_BASE: &str = "https://api.semanticscholar.org";

const SEARCH_FIELDS: &str = "title,authors,year,abstract,openAccessPdf,externalIds,url";

/// Semantic Scholar research source
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl SemanticScholarSource {
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: SEMANTIC_SCHOLAR_API_BASE.to_string(),
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

    /// Add API key to request headers if available
    fn add_api_key_if_present(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("x-api-key", key),
            None => builder,
        }
    }

    fn parse_paper(paper: S2Paper) -> PaperResult {
        PaperBuilder::new("Semantic Scholar", paper.title.unwrap_or_default())
            .authors(paper.authors.into_iter().filter_map(|a| a.name))
            .year(
                paper
                    .year
                    .filter(|y| *y > 0)
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            )
            .abstract_text(paper.r#abstract.unwrap_or_default())
            .doi(paper.external_ids.and_then(|ids| ids.doi).unwrap_or_default())
            .url(paper.url.unwrap_or_default())
            .pdf_url(paper.open_access_pdf.and_then(|pdf| pdf.url).unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl Source for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic_scholar"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = format!(
            "{}/graph/v1/paper/search?query={}&limit={}&fields={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            SEARCH_FIELDS
        );

        let response = self
            .add_api_key_if_present(self.client.get(&url))
            .timeout(self.timeout)
            .send()
            .await?;
        let data: S2SearchResponse = read_json(response).await?;

        let papers = data.data.into_iter().map(Self::parse_paper).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    data: Vec<S2Paper>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    title: Option<String>,
    year: Option<i32>,
    r#abstract: Option<String>,
    url: Option<String>,
    #[serde(default)]
    authors: Vec<S2Author>,
    open_access_pdf: Option<S2OpenAccessPdf>,
    external_ids: Option<S2ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2OpenAccessPdf {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2ExternalIds {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_sends_key_and_parses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/graph/v1/paper/search")
            .match_query(Matcher::UrlEncoded("query".into(), "graph neural".into()))
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body(
                r#"{"total":1,"offset":0,"data":[{
                    "paperId":"abc","title":"GNNs","year":2019,"abstract":null,
                    "url":"https://www.semanticscholar.org/paper/abc",
                    "authors":[{"authorId":"1","name":"G. Neural"}],
                    "openAccessPdf":{"url":"https://arxiv.org/pdf/1901.00596"},
                    "externalIds":{"DOI":"10.1109/TNNLS.2020.2978386","ArXiv":"1901.00596"}}]}"#,
            )
            .create_async()
            .await;

        let source = SemanticScholarSource::new(Some("secret".to_string()))
            .unwrap()
            .with_base_url(server.url());
        let response = source
            .search(&SearchQuery::new("graph neural"))
            .await
            .unwrap();

        mock.assert_async().await;
        let paper = &response.papers[0];
        assert_eq!(paper.doi, "10.1109/TNNLS.2020.2978386");
        assert_eq!(paper.pdf_url, "https://arxiv.org/pdf/1901.00596");
        assert_eq!(paper.year, "2019");
        assert_eq!(paper.abstract_text, "");
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/graph/v1/paper/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let source = SemanticScholarSource::new(None)
            .unwrap()
            .with_base_url(server.url());
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimit));
    }
}
