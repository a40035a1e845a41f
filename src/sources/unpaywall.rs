//! Unpaywall open access lookup.
//!
//! API documentation: <https://unpaywall.org/products/api>
//!
//! Unpaywall needs no key but refuses requests without a contact email, so
//! [`UnpaywallClient`] can only be built with one.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::sources::{read_json, SourceError, LOOKUP_TIMEOUT};
use crate::utils::{encode_doi_path, HttpClient};

const UNPAYWALL_API_BASE: &str = "https://api.unpaywall.org";

/// Open access status of one DOI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAccessStatus {
    /// A free copy exists; `url` prefers the direct PDF over the landing page
    Open { url: String },
    /// No free copy is known
    Closed,
}

/// Client for the Unpaywall per-DOI endpoint
#[derive(Debug, Clone)]
pub struct UnpaywallClient {
    client: HttpClient,
    base_url: String,
    email: String,
    timeout: Duration,
}

impl UnpaywallClient {
    pub fn new(email: impl Into<String>) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: UNPAYWALL_API_BASE.to_string(),
            email: email.into(),
            timeout: LOOKUP_TIMEOUT,
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

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Ask Unpaywall whether `doi` has a free copy.
    ///
    /// An open record without any location URL counts as closed. Gives up
    /// with [`SourceError::Cancelled`] once `cancel` fires.
    pub async fn lookup(
        &self,
        doi: &str,
        cancel: &CancellationToken,
    ) -> Result<OpenAccessStatus, SourceError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SourceError::Cancelled),
            status = self.fetch_status(doi) => status,
        }
    }

    async fn fetch_status(&self, doi: &str) -> Result<OpenAccessStatus, SourceError> {
        let url = format!(
            "{}/v2/{}?email={}",
            self.base_url,
            encode_doi_path(doi),
            urlencoding::encode(&self.email)
        );

        let response = self.client.get(&url).timeout(self.timeout).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("DOI {} unknown to Unpaywall", doi)));
        }
        let record: UnpaywallRecord = read_json(response).await?;

        if !record.is_oa {
            return Ok(OpenAccessStatus::Closed);
        }

        let location = record.best_oa_location.unwrap_or_default();
        let url = location
            .url_for_pdf
            .filter(|u| !u.is_empty())
            .or(location.url.filter(|u| !u.is_empty()));

        Ok(match url {
            Some(url) => OpenAccessStatus::Open { url },
            None => OpenAccessStatus::Closed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UnpaywallRecord {
    #[serde(default)]
    is_oa: bool,
    best_oa_location: Option<OaLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct OaLocation {
    url_for_pdf: Option<String>,
    url: Option<String>,
}
