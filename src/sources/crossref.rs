//! CrossRef research source implementation.
//!
//! Provides keyword search over `/works` and the by-DOI metadata lookup used
//! to enrich extracted citations.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::models::{doi_page_url, PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{
    read_json, Source, SourceCapabilities, SourceError, LOOKUP_TIMEOUT, SEARCH_TIMEOUT,
};
use crate::utils::{encode_doi_path, HttpClient};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

/// Bibliographic metadata for one DOI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub year: String,
}

/// CrossRef research source
///
/// Sends the contact email as `mailto` so requests land in the polite pool.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
    email: Option<String>,
    timeout: Duration,
    lookup_timeout: Duration,
}

impl CrossRefSource {
    pub fn new(email: Option<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: CROSSREF_API_BASE.to_string(),
            email,
            timeout: SEARCH_TIMEOUT,
            lookup_timeout: LOOKUP_TIMEOUT,
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

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    fn mailto(&self, separator: char) -> String {
        self.email
            .as_deref()
            .map(|e| format!("{}mailto={}", separator, urlencoding::encode(e)))
            .unwrap_or_default()
    }

    /// Look up title, authors and year for a DOI.
    ///
    /// Fails on transport errors, non-2xx statuses and unparseable bodies;
    /// callers doing best-effort enrichment simply ignore the error.
    /// Returns [`SourceError::Cancelled`] as soon as `cancel` fires.
    pub async fn lookup_work(
        &self,
        doi: &str,
        cancel: &CancellationToken,
    ) -> Result<WorkMetadata, SourceError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            work = self.fetch_work(doi) => work,
        }
    }

    async fn fetch_work(&self, doi: &str) -> Result<WorkMetadata, SourceError> {
        let url = format!(
            "{}/works/{}{}",
            self.base_url,
            encode_doi_path(doi),
            self.mailto('?')
        );

        let response = self
            .client
            .get(&url)
            .timeout(self.lookup_timeout)
            .send()
            .await?;
        let data: CrossRefWorkResponse = read_json(response).await?;
        let work = data.message;

        Ok(WorkMetadata {
            title: work.title.into_iter().next().unwrap_or_default(),
            authors: work.author.iter().filter_map(CrossRefAuthor::full_name).collect(),
            year: work.published.and_then(|p| p.year()).unwrap_or_default(),
        })
    }

    fn parse_item(item: CrossRefWork) -> PaperResult {
        let doi = item.doi.unwrap_or_default();
        let pdf_url = item
            .link
            .iter()
            .filter(|l| l.content_type.as_deref() == Some("application/pdf"))
            .filter_map(|l| l.url.clone())
            .last()
            .unwrap_or_default();

        PaperBuilder::new("Crossref", item.title.into_iter().next().unwrap_or_default())
            .authors(item.author.iter().filter_map(CrossRefAuthor::full_name))
            .year(item.published.and_then(|p| p.year()).unwrap_or_default())
            .abstract_text(item.r#abstract.unwrap_or_default())
            .url(if doi.is_empty() {
                String::new()
            } else {
                doi_page_url(&doi)
            })
            .doi(doi)
            .pdf_url(pdf_url)
            .build()
    }
}

#[async_trait]
impl Source for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "Crossref"
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::DOI_LOOKUP
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = format!(
            "{}/works?query={}&rows={}&select=title,author,published,DOI,link,abstract{}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results,
            self.mailto('&')
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: CrossRefSearchResponse = read_json(response).await?;

        let papers = data
            .message
            .items
            .into_iter()
            .map(Self::parse_item)
            .collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefSearchResponse {
    message: CrossRefItems,
}

#[derive(Debug, Deserialize)]
struct CrossRefItems {
    #[serde(default)]
    items: Vec<CrossRefWork>,
}

#[derive(Debug, Deserialize)]
struct CrossRefWorkResponse {
    message: CrossRefWork,
}

#[derive(Debug, Deserialize)]
struct CrossRefWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    r#abstract: Option<String>,
    published: Option<CrossRefDate>,
    #[serde(default)]
    author: Vec<CrossRefAuthor>,
    #[serde(default)]
    link: Vec<CrossRefLink>,
}

#[derive(Debug, Deserialize)]
struct CrossRefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossRefDate {
    fn year(self) -> Option<String> {
        self.date_parts
            .first()
            .and_then(|parts| parts.first().copied().flatten())
            .map(|y| y.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefAuthor {
    given: Option<String>,
    family: Option<String>,
}

impl CrossRefAuthor {
    fn full_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.given.as_deref().unwrap_or_default(),
            self.family.as_deref().unwrap_or_default()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefLink {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "content-type")]
    content_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_lookup_work() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/works/10.1038/nature14539")
            .match_query(Matcher::UrlEncoded("mailto".into(), "me@example.org".into()))
            .with_status(200)
            .with_body(
                r#"{"status":"ok","message":{
                    "title":["Deep learning"],
                    "author":[{"given":"Yann","family":"LeCun"},{"family":"Bengio"},{}],
                    "published":{"date-parts":[[2015,5,27]]}}}"#,
            )
            .create_async()
            .await;

        let crossref = CrossRefSource::new(Some("me@example.org".to_string()))
            .unwrap()
            .with_base_url(server.url());
        let work = crossref
            .lookup_work("10.1038/nature14539", &CancellationToken::new())
            .await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            work,
            WorkMetadata {
                title: "Deep learning".to_string(),
                authors: vec!["Yann LeCun".to_string(), "Bengio".to_string()],
                year: "2015".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_lookup_work_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works/10.1000/missing")
            .with_status(404)
            .with_body("Resource not found.")
            .create_async()
            .await;

        let crossref = CrossRefSource::new(None).unwrap().with_base_url(server.url());
        assert!(crossref
            .lookup_work("10.1000/missing", &CancellationToken::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_lookup_work_cancelled_while_waiting() {
        // accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let _accept = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let crossref = CrossRefSource::new(None)
            .unwrap()
            .with_base_url(base)
            .with_lookup_timeout(Duration::from_secs(30));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            crossref.lookup_work("10.1000/slow", &cancel),
        )
        .await
        .expect("lookup ignored cancellation");
        assert!(matches!(result, Err(SourceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_search_parses_items() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works")
            .match_query(Matcher::UrlEncoded("query".into(), "deep learning".into()))
            .with_status(200)
            .with_body(
                r#"{"message":{"items":[{
                    "title":["Deep learning"],"DOI":"10.1038/nature14539",
                    "published":{"date-parts":[[2015]]},
                    "author":[{"given":"Yann","family":"LeCun"}],
                    "link":[{"URL":"https://x.org/a.xml","content-type":"text/xml"},
                            {"URL":"https://x.org/a.pdf","content-type":"application/pdf"}]}]}}"#,
            )
            .create_async()
            .await;

        let crossref = CrossRefSource::new(None).unwrap().with_base_url(server.url());
        let response = crossref
            .search(&SearchQuery::new("deep learning"))
            .await
            .unwrap();

        let paper = &response.papers[0];
        assert_eq!(paper.source, "Crossref");
        assert_eq!(paper.url, "https://doi.org/10.1038/nature14539");
        assert_eq!(paper.pdf_url, "https://x.org/a.pdf");
        assert_eq!(paper.year, "2015");
    }
}
