//! DBLP computer science bibliography search.
//!
//! API documentation: <https://dblp.org/faq/How+to+use+the+dblp+search+API.html>

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const DBLP_API_BASE: &str = "https://dblp.org";

/// DBLP research source
#[derive(Debug, Clone)]
pub struct DblpSource {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl DblpSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: DBLP_API_BASE.to_string(),
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

    fn parse_hit(hit: DblpHit) -> PaperResult {
        let info = hit.info;
        let authors = match info.authors.and_then(|a| a.author) {
            Some(OneOrMany::One(author)) => vec![author.into_name()],
            Some(OneOrMany::Many(authors)) => {
                authors.into_iter().map(DblpAuthor::into_name).collect()
            }
            None => Vec::new(),
        };

        PaperBuilder::new("DBLP", info.title.unwrap_or_default())
            .authors(authors)
            .year(info.year.unwrap_or_default())
            .doi(info.doi.unwrap_or_default())
            .url(info.url.unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl Source for DblpSource {
    fn id(&self) -> &str {
        "dblp"
    }

    fn name(&self) -> &str {
        "DBLP"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = format!(
            "{}/search/publ/api?q={}&format=json&h={}",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: DblpResponse = read_json(response).await?;

        let papers = data
            .result
            .hits
            .hit
            .into_iter()
            .map(Self::parse_hit)
            .collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct DblpResponse {
    result: DblpResult,
}

#[derive(Debug, Deserialize)]
struct DblpResult {
    #[serde(default)]
    hits: DblpHits,
}

#[derive(Debug, Default, Deserialize)]
struct DblpHits {
    #[serde(default)]
    hit: Vec<DblpHit>,
}

#[derive(Debug, Deserialize)]
struct DblpHit {
    info: DblpInfo,
}

#[derive(Debug, Deserialize)]
struct DblpInfo {
    title: Option<String>,
    year: Option<String>,
    url: Option<String>,
    doi: Option<String>,
    authors: Option<DblpAuthors>,
}

#[derive(Debug, Deserialize)]
struct DblpAuthors {
    author: Option<OneOrMany<DblpAuthor>>,
}

/// A single author is sent bare; several come as a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Older responses send plain names, newer ones `{"@pid": .., "text": ..}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DblpAuthor {
    Name(String),
    Record { text: String },
}

impl DblpAuthor {
    fn into_name(self) -> String {
        match self {
            DblpAuthor::Name(name) | DblpAuthor::Record { text: name } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_single_and_multiple_authors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "raft consensus".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"result":{"hits":{"@total":"2","hit":[
                    {"info":{"title":"In Search of an Understandable Consensus Algorithm.",
                      "year":"2014","doi":"10.5555/2643634.2643666",
                      "url":"https://dblp.org/rec/conf/usenix/OngaroO14",
                      "authors":{"author":[{"@pid":"1","text":"Diego Ongaro"},"John K. Ousterhout"]}}},
                    {"info":{"title":"Solo","year":"2020","authors":{"author":"Only One"}}}
                ]}}}"#,
            )
            .create_async()
            .await;

        let source = DblpSource::new().unwrap().with_base_url(server.url());
        let response = source
            .search(&SearchQuery::new("raft consensus"))
            .await
            .unwrap();

        assert_eq!(response.len(), 2);
        assert_eq!(
            response.papers[0].authors,
            vec!["Diego Ongaro", "John K. Ousterhout"]
        );
        assert_eq!(response.papers[0].doi, "10.5555/2643634.2643666");
        assert_eq!(response.papers[1].authors, vec!["Only One"]);
    }

    #[tokio::test]
    async fn test_search_no_hits() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search/publ/api")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result":{"hits":{"@total":"0"}}}"#)
            .create_async()
            .await;

        let source = DblpSource::new().unwrap().with_base_url(server.url());
        let response = source.search(&SearchQuery::new("zzz")).await.unwrap();
        assert!(response.is_empty());
    }
}
