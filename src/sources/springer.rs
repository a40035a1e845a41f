//! Springer Nature open access research source implementation.
//!
//! API documentation: <https://dev.springernature.com/>

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, year_prefix, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const SPRINGER_API_BASE: &str = "https://api.springernature.com";

/// Springer Nature open access search
///
/// Requires an API key; without one every search fails with
/// [`SourceError::MissingApiKey`] before touching the network.
#[derive(Debug, Clone)]
pub struct SpringerSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl SpringerSource {
    pub fn new(api_key: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: SPRINGER_API_BASE.to_string(),
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

    fn parse_record(record: SpringerRecord) -> PaperResult {
        let mut page_url = String::new();
        let mut pdf_url = String::new();
        for link in record.url {
            let value = link.value.unwrap_or_default();
            if link.format.as_deref() == Some("pdf") {
                pdf_url = value;
            } else if page_url.is_empty() {
                page_url = value;
            }
        }

        PaperBuilder::new("Springer", record.title.unwrap_or_default())
            .authors(record.creators.into_iter().filter_map(|c| c.creator))
            .year(year_prefix(record.publication_date.as_deref().unwrap_or_default()))
            .abstract_text(record.r#abstract.unwrap_or_default())
            .doi(record.doi.unwrap_or_default())
            .url(page_url)
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for SpringerSource {
    fn id(&self) -> &str {
        "springer"
    }

    fn name(&self) -> &str {
        "Springer"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let api_key = self.api_key.as_deref().ok_or(SourceError::MissingApiKey)?;

        let url = format!(
            "{}/openaccess/json?q={}&p={}&api_key={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            urlencoding::encode(api_key)
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: SpringerResponse = read_json(response).await?;

        let papers = data.records.into_iter().map(Self::parse_record).collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct SpringerResponse {
    #[serde(default)]
    records: Vec<SpringerRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpringerRecord {
    title: Option<String>,
    doi: Option<String>,
    #[serde(default)]
    url: Vec<SpringerUrl>,
    #[serde(default)]
    creators: Vec<SpringerCreator>,
    publication_date: Option<String>,
    r#abstract: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpringerUrl {
    format: Option<String>,
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpringerCreator {
    creator: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let source = SpringerSource::new(None)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = source.search(&SearchQuery::new("x")).await.unwrap_err();
        assert_eq!(err.to_string(), "no API key configured");
        assert!(source.requires_api_key());
    }

    #[tokio::test]
    async fn test_search_parses_records() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/openaccess/json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "soil".into()),
                Matcher::UrlEncoded("api_key".into(), "k1".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"records":[{"title":"Soil carbon","doi":"10.1007/s1",
                    "publicationDate":"2022-03-01","abstract":"Carbon.",
                    "creators":[{"creator":"Loam, L."}],
                    "url":[{"format":"html","value":"https://link.springer.com/s1"},
                           {"format":"pdf","value":"https://link.springer.com/s1.pdf"}]}]}"#,
            )
            .create_async()
            .await;

        let source = SpringerSource::new(Some("k1".to_string()))
            .unwrap()
            .with_base_url(server.url());
        let response = source.search(&SearchQuery::new("soil")).await.unwrap();

        let paper = &response.papers[0];
        assert_eq!(paper.url, "https://link.springer.com/s1");
        assert_eq!(paper.pdf_url, "https://link.springer.com/s1.pdf");
        assert_eq!(paper.year, "2022");
        assert_eq!(paper.authors, vec!["Loam, L."]);
    }
}
