//! PLOS research source implementation.
//!
//! Uses the PLOS Solr search API. Every PLOS article id is its DOI.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{doi_page_url, PaperBuilder, PaperResult, SearchQuery, SearchResponse};
use crate::sources::{read_json, year_prefix, Source, SourceError, SEARCH_TIMEOUT};
use crate::utils::HttpClient;

const PLOS_API_BASE: &str = "https://api.plos.org";

/// PLOS journals search
#[derive(Debug, Clone)]
pub struct PlosSource {
    client: HttpClient,
    base_url: String,
    timeout: Duration,
}

impl PlosSource {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: PLOS_API_BASE.to_string(),
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

    fn parse_doc(doc: PlosDoc) -> PaperResult {
        let doi = doc.id.unwrap_or_default();
        // PLOS exposes no stable PDF link; the resolver lands on the article
        let resolver = if doi.is_empty() {
            String::new()
        } else {
            doi_page_url(&doi)
        };

        PaperBuilder::new("PLOS", doc.title.unwrap_or_default())
            .authors(doc.author)
            .year(year_prefix(doc.publication_date.as_deref().unwrap_or_default()))
            .abstract_text(doc.r#abstract.into_iter().next().unwrap_or_default())
            .doi(doi)
            .url(resolver.clone())
            .pdf_url(resolver)
            .build()
    }
}

#[async_trait]
impl Source for PlosSource {
    fn id(&self) -> &str {
        "plos"
    }

    fn name(&self) -> &str {
        "PLOS"
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SourceError> {
        let url = format!(
            "{}/search?q={}&rows={}&fl=id,title,author,abstract,publication_date",
            self.base_url,
            urlencoding::encode(&query.query),
            query.max_results
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        let data: PlosResponse = read_json(response).await?;

        let papers = data
            .response
            .docs
            .into_iter()
            .map(Self::parse_doc)
            .collect();
        Ok(SearchResponse::new(papers, self.name(), &query.query))
    }
}

#[derive(Debug, Deserialize)]
struct PlosResponse {
    #[serde(default)]
    response: PlosDocs,
}

#[derive(Debug, Default, Deserialize)]
struct PlosDocs {
    #[serde(default)]
    docs: Vec<PlosDoc>,
}

#[derive(Debug, Deserialize)]
struct PlosDoc {
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    r#abstract: Vec<String>,
    publication_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_parses_docs() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "malaria".into()))
            .with_status(200)
            .with_body(
                r#"{"response":{"numFound":1,"docs":[{
                    "id":"10.1371/journal.pone.0000001",
                    "title":"Malaria vectors",
                    "author":["J. Doe","R. Roe"],
                    "abstract":["\nMosquitoes matter.\n"],
                    "publication_date":"2007-12-19T00:00:00Z"}]}}"#,
            )
            .create_async()
            .await;

        let source = PlosSource::new().unwrap().with_base_url(server.url());
        let response = source.search(&SearchQuery::new("malaria")).await.unwrap();

        let paper = &response.papers[0];
        assert_eq!(paper.doi, "10.1371/journal.pone.0000001");
        assert_eq!(paper.url, "https://doi.org/10.1371/journal.pone.0000001");
        assert_eq!(paper.year, "2007");
        assert_eq!(paper.abstract_text, "Mosquitoes matter.");
        assert_eq!(paper.authors.len(), 2);
    }
}
