//! `academic_fetch_paper`: download one paper by URL or DOI, PDF first.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{ToolError, ToolResult};
use crate::config::OnDoiNotOpenAccess;
use crate::fetch::{find_pdf_url_in_html, html_to_text, FetchedDocument, Fetcher};
use crate::fs::FileSystem;
use crate::models::DOI_RESOLVER;
use crate::sources::{OpenAccessStatus, SourceError, UnpaywallClient};
use crate::utils::{validate_doi, validate_url};

/// Arguments accepted by [`FetchPaperTool::execute`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchPaperArgs {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    #[serde(default)]
    pub save_to: Option<String>,
}

/// Fetches a paper and saves either the PDF or the page text
#[derive(Debug, Clone)]
pub struct FetchPaperTool {
    fetcher: Fetcher,
    unpaywall: Option<UnpaywallClient>,
    on_not_open_access: OnDoiNotOpenAccess,
    doi_resolver: String,
    fs: Arc<dyn FileSystem>,
}

impl FetchPaperTool {
    /// `unpaywall` is `None` when no contact email is configured
    pub fn new(
        fetcher: Fetcher,
        unpaywall: Option<UnpaywallClient>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            fetcher,
            unpaywall,
            on_not_open_access: OnDoiNotOpenAccess::default(),
            doi_resolver: DOI_RESOLVER.to_string(),
            fs,
        }
    }

    pub fn with_not_open_access_policy(mut self, policy: OnDoiNotOpenAccess) -> Self {
        self.on_not_open_access = policy;
        self
    }

    /// Base URL that closed DOIs fall back to, `https://doi.org` by default
    pub fn with_doi_resolver(mut self, base: impl Into<String>) -> Self {
        self.doi_resolver = base.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn execute(&self, args: FetchPaperArgs, cancel: &CancellationToken) -> ToolResult {
        match self.run(args, cancel).await {
            Ok(result) => result,
            Err(e) => e.into(),
        }
    }

    async fn run(
        &self,
        args: FetchPaperArgs,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let save_to = non_empty(args.save_to).ok_or(ToolError::MissingArgument("save_to"))?;

        let target = match (non_empty(args.url), non_empty(args.doi)) {
            (Some(url), _) => url,
            (None, Some(doi)) => self.resolve_doi(&doi, cancel).await?,
            (None, None) => return Err(ToolError::MissingUrlOrDoi),
        };

        let url = validate_url(&target).map_err(|_| ToolError::UnsupportedScheme(target.clone()))?;

        let mut document = self.fetcher.fetch(url.as_str(), cancel).await?;
        let mut is_pdf = document.is_pdf();

        if !is_pdf && document.is_html() {
            if let Some(upgraded) = self.follow_pdf_link(&document, cancel).await {
                document = upgraded;
                is_pdf = true;
            }
        }

        let (data, kind) = if is_pdf {
            (document.body, "PDF")
        } else {
            (render_text(&document).into_bytes(), "text")
        };

        self.fs
            .write_file(Path::new(&save_to), &data)
            .await
            .map_err(|source| ToolError::Write {
                context: "failed to save file",
                source,
            })?;

        tracing::info!(path = %save_to, kind, bytes = data.len(), "saved paper");
        Ok(ToolResult::text(format!(
            "Paper saved as {} ({} bytes) to {}",
            kind,
            data.len(),
            save_to
        )))
    }

    /// Turn a DOI into a URL worth fetching.
    async fn resolve_doi(
        &self,
        doi: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let unpaywall = self
            .unpaywall
            .as_ref()
            .ok_or(ToolError::MissingContactEmail)?;
        let doi = validate_doi(doi).map_err(ToolError::InvalidDoi)?;
        let doi = doi.as_str();

        let status = unpaywall
            .lookup(doi, cancel)
            .await
            .map_err(|source| match source {
                SourceError::Cancelled => ToolError::Cancelled("DOI lookup"),
                source => ToolError::OpenAccessLookup {
                    doi: doi.to_string(),
                    source,
                },
            })?;

        match status {
            OpenAccessStatus::Open { url } => {
                tracing::debug!(doi, url = %url, "open access copy found");
                Ok(url)
            }
            OpenAccessStatus::Closed => match self.on_not_open_access {
                OnDoiNotOpenAccess::FallbackToLandingPage => {
                    tracing::info!(doi, "no open access copy, trying the DOI landing page");
                    Ok(format!("{}/{}", self.doi_resolver, doi))
                }
                OnDoiNotOpenAccess::Fail => Err(ToolError::NotOpenAccess(doi.to_string())),
            },
        }
    }

    /// Look for a PDF link on a landing page and fetch it.
    ///
    /// Only a confirmed PDF replaces the page; any failure keeps the page.
    async fn follow_pdf_link(
        &self,
        page: &FetchedDocument,
        cancel: &CancellationToken,
    ) -> Option<FetchedDocument> {
        let html = String::from_utf8_lossy(&page.body);
        let link = find_pdf_url_in_html(&html, &page.final_url)?;
        tracing::debug!(link = %link, "found PDF link on landing page");

        match self.fetcher.fetch(&link, cancel).await {
            Ok(document) if document.is_pdf() => Some(document),
            Ok(_) => {
                tracing::debug!(link = %link, "linked document is not a PDF");
                None
            }
            Err(e) => {
                tracing::warn!(link = %link, error = %e, "failed to fetch linked PDF");
                None
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Text artifact: provenance header followed by the readable content
fn render_text(document: &FetchedDocument) -> String {
    let body = String::from_utf8_lossy(&document.body);
    let text = if document.is_html() {
        html_to_text(&body)
    } else {
        body.into_owned()
    };

    format!(
        "Source: {}\nFetched: {}\n\n{}",
        document.final_url,
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        text
    )
}
