//! The three agent-facing operations.
//!
//! | tool                         | what it does                                        |
//! |------------------------------|-----------------------------------------------------|
//! | `academic_search`            | fan a query out over the source registry             |
//! | `academic_fetch_paper`       | save one paper by URL or DOI, preferring the PDF     |
//! | `academic_extract_citations` | parse, enrich and optionally download a paper's refs |
//!
//! Every tool returns a [`ToolResult`]; failures are folded into it rather
//! than surfaced as `Err`, so transports can forward the envelope as-is.

mod extract_citations;
mod fetch_paper;
mod result;
mod search;

pub use extract_citations::{
    ExtractCitationsArgs, ExtractCitationsTool, DEFAULT_MAX_CITATIONS, MAX_CITATIONS_LIMIT,
};
pub use fetch_paper::{FetchPaperArgs, FetchPaperTool};
pub use result::{ToolError, ToolResult};
pub use search::{SearchArgs, SearchTool};

use std::path::PathBuf;
use std::sync::Arc;

use crate::citations::CitationEnricher;
use crate::config::Config;
use crate::fetch::Fetcher;
use crate::fs::{FileSystem, FsError, HostFs, SandboxFs};
use crate::sources::{CrossRefSource, SourceRegistry, UnpaywallClient};

/// All three tools, wired from one [`Config`]
#[derive(Debug, Clone)]
pub struct Toolbox {
    pub search: SearchTool,
    pub fetch_paper: FetchPaperTool,
    pub extract_citations: ExtractCitationsTool,
}

impl Toolbox {
    pub fn from_config(config: &Config) -> Result<Self, ToolError> {
        let setup = |e: &dyn std::fmt::Display| ToolError::Setup(e.to_string());

        let fs = file_system(config).map_err(|e| setup(&e))?;
        let registry = Arc::new(SourceRegistry::from_config(config).map_err(|e| setup(&e))?);

        let fetcher =
            Fetcher::with_limits(config.fetch.document_timeout(), config.fetch.max_redirects)
                .map_err(|e| setup(&e))?;

        let email = config.contact_email().map(str::to_string);
        let unpaywall = match &email {
            Some(email) => Some(
                UnpaywallClient::new(email.clone())
                    .map_err(|e| setup(&e))?
                    .with_timeout(config.fetch.lookup_timeout()),
            ),
            None => None,
        };
        let crossref = CrossRefSource::new(email)
            .map_err(|e| setup(&e))?
            .with_lookup_timeout(config.fetch.lookup_timeout());

        let search = SearchTool::new(registry, fs.clone())
            .with_default_max_results(config.search.max_results_per_source)
            .with_max_concurrent(config.search.max_concurrent_sources)
            .with_default_sources(config.search.default_sources.clone());

        let fetch_paper = FetchPaperTool::new(fetcher.clone(), unpaywall.clone(), fs.clone())
            .with_not_open_access_policy(config.fetch.on_doi_not_open_access);

        let enricher = CitationEnricher::new(crossref, unpaywall, fetcher);
        let extract_citations = ExtractCitationsTool::new(enricher, fs);

        Ok(Self {
            search,
            fetch_paper,
            extract_citations,
        })
    }
}

/// Sandboxed under the workspace root when restricted, otherwise the host
fn file_system(config: &Config) -> Result<Arc<dyn FileSystem>, FsError> {
    if !config.workspace.restrict_to_workspace {
        return Ok(Arc::new(HostFs));
    }

    let root = config
        .workspace
        .root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let sandbox = SandboxFs::new(root)?;
    tracing::debug!(root = %sandbox.root().display(), "file access restricted to workspace");
    Ok(Arc::new(sandbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_toolbox_from_default_config() {
        let mut config = Config::default();
        config.contact.email = None;
        let toolbox = Toolbox::from_config(&config).unwrap();
        assert_eq!(toolbox.search.registry().len(), 12);

        // no email configured: DOI fetches must fail before any request
        let dir = tempfile::tempdir().unwrap();
        let result = toolbox
            .fetch_paper
            .execute(
                FetchPaperArgs {
                    doi: Some("10.1000/x".to_string()),
                    save_to: Some(dir.path().join("x").to_string_lossy().to_string()),
                    ..FetchPaperArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_error);
        assert!(result.for_llm.contains("contact email"));
    }

    #[tokio::test]
    async fn test_restricted_workspace_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.workspace.restrict_to_workspace = true;
        config.workspace.root = Some(dir.path().to_path_buf());

        let toolbox = Toolbox::from_config(&config).unwrap();
        let result = toolbox
            .extract_citations
            .execute(
                ExtractCitationsArgs {
                    file_path: Some("../outside.txt".to_string()),
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_error);
        assert!(result.for_llm.contains("outside the workspace"));
    }
}
