//! `academic_extract_citations`: mine a saved paper's reference list.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{ToolError, ToolResult};
use crate::citations::{
    extract_citation_section, parse_citation_refs, CitationEnricher, DownloadTarget,
    EnrichmentSummary,
};
use crate::fs::FileSystem;
use crate::models::CitationRef;
use crate::utils::{extract_text_from_pdf, has_pdf_magic};

/// Citations processed when the caller gives no limit
pub const DEFAULT_MAX_CITATIONS: usize = 20;

/// Largest accepted `max_citations`
pub const MAX_CITATIONS_LIMIT: usize = 50;

const NO_CITATIONS_MESSAGE: &str =
    "No citations could be extracted from the paper (no reference section or DOIs found)";

/// Arguments accepted by [`ExtractCitationsTool::execute`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractCitationsArgs {
    #[serde(default)]
    pub file_path: Option<String>,

    /// Honoured only within 1..=50
    #[serde(default)]
    pub max_citations: Option<i64>,

    #[serde(default)]
    pub download_available: bool,

    #[serde(default)]
    pub save_dir: Option<String>,

    #[serde(default)]
    pub save_report_to: Option<String>,
}

/// Reads a paper, parses its references and enriches each one
#[derive(Debug, Clone)]
pub struct ExtractCitationsTool {
    enricher: CitationEnricher,
    fs: Arc<dyn FileSystem>,
}

impl ExtractCitationsTool {
    pub fn new(enricher: CitationEnricher, fs: Arc<dyn FileSystem>) -> Self {
        Self { enricher, fs }
    }

    pub async fn execute(
        &self,
        args: ExtractCitationsArgs,
        cancel: &CancellationToken,
    ) -> ToolResult {
        match self.run(args, cancel).await {
            Ok(result) => result,
            Err(e) => e.into(),
        }
    }

    async fn run(
        &self,
        args: ExtractCitationsArgs,
        cancel: &CancellationToken,
    ) -> Result<ToolResult, ToolError> {
        let file_path = non_empty(args.file_path).ok_or(ToolError::MissingArgument("file_path"))?;

        let max_citations = match args.max_citations {
            Some(n) if n >= 1 && n <= MAX_CITATIONS_LIMIT as i64 => n as usize,
            _ => DEFAULT_MAX_CITATIONS,
        };

        let save_dir = non_empty(args.save_dir);
        if args.download_available && save_dir.is_none() {
            return Err(ToolError::MissingSaveDir);
        }

        let data = self
            .fs
            .read_file(Path::new(&file_path))
            .await
            .map_err(ToolError::Read)?;

        let text = if has_pdf_magic(&data) {
            extract_text_from_pdf(&data)
        } else {
            String::from_utf8_lossy(&data).into_owned()
        };
        if text.trim().is_empty() {
            return Err(ToolError::NoText);
        }

        // without a recognizable header, scan the whole document
        let section = extract_citation_section(&text)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&text);

        let mut refs = parse_citation_refs(section, max_citations);
        if refs.is_empty() {
            tracing::info!(path = %file_path, "no citations found");
            return Ok(ToolResult::text(NO_CITATIONS_MESSAGE));
        }
        tracing::info!(path = %file_path, citations = refs.len(), "parsed reference list");

        let download = match (&save_dir, args.download_available) {
            (Some(dir), true) => Some(DownloadTarget {
                fs: self.fs.as_ref(),
                dir: Path::new(dir),
            }),
            _ => None,
        };
        let summary = self.enricher.enrich(&mut refs, download, cancel).await;

        let report = self.render_report(&file_path, &refs, &summary, args.download_available);

        match non_empty(args.save_report_to) {
            Some(report_path) => {
                self.fs
                    .write_file(Path::new(&report_path), report.as_bytes())
                    .await
                    .map_err(|source| ToolError::Write {
                        context: "analysis done but failed to save report",
                        source,
                    })?;
                Ok(ToolResult::success(
                    format!(
                        "Found {} citations ({} open access). Report saved to {}",
                        refs.len(),
                        summary.open_access,
                        report_path
                    ),
                    report,
                ))
            }
            None => Ok(ToolResult::text(report)),
        }
    }

    fn render_report(
        &self,
        file_path: &str,
        refs: &[CitationRef],
        summary: &EnrichmentSummary,
        download: bool,
    ) -> String {
        let mut out = format!(
            "Citation analysis of {}\nFound {} citations",
            file_path,
            refs.len()
        );
        // OA lookups are skipped entirely without a contact email
        if self.enricher.checks_open_access() {
            out.push_str(&format!(", {} open access", summary.open_access));
        }
        if download {
            out.push_str(&format!(", {} downloaded", summary.downloaded));
        }
        out.push('\n');
        if summary.cancelled {
            out.push_str(&format!(
                "Cancelled after processing {} citations\n",
                summary.processed
            ));
        }
        out.push('\n');

        for (i, citation) in refs.iter().enumerate() {
            out.push_str(&format!("--- Citation {} ---\n", i + 1));
            out.push_str(&citation.format());
            out.push('\n');
        }
        out
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Fetcher;
    use crate::fs::HostFs;
    use crate::sources::CrossRefSource;
    use mockito::Matcher;

    fn tool_with(crossref_base: &str) -> ExtractCitationsTool {
        let enricher = CitationEnricher::new(
            CrossRefSource::new(None).unwrap().with_base_url(crossref_base),
            None,
            Fetcher::new().unwrap(),
        );
        ExtractCitationsTool::new(enricher, Arc::new(HostFs))
    }

    fn write(dir: &tempfile::TempDir, name: &str, body: &[u8]) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_download_requires_save_dir() {
        let result = tool_with("http://127.0.0.1:1")
            .execute(
                ExtractCitationsArgs {
                    file_path: Some("/does/not/matter.pdf".to_string()),
                    download_available: true,
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_error);
        assert_eq!(result.for_llm, "save_dir is required when download_available=true");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool_with("http://127.0.0.1:1")
            .execute(
                ExtractCitationsArgs {
                    file_path: Some(dir.path().join("nope.txt").to_string_lossy().to_string()),
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(result.is_error);
        assert!(result.for_llm.starts_with("failed to read file: "));
    }

    #[tokio::test]
    async fn test_empty_file_has_no_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.txt", b"   \n ");
        let result = tool_with("http://127.0.0.1:1")
            .execute(
                ExtractCitationsArgs {
                    file_path: Some(path),
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(result.for_llm, "no text content could be extracted from the file");
    }

    #[tokio::test]
    async fn test_no_citations_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "plain.txt", b"Just an essay with no references at all.");
        let result = tool_with("http://127.0.0.1:1")
            .execute(
                ExtractCitationsArgs {
                    file_path: Some(path),
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;
        assert!(!result.is_error);
        assert_eq!(result.for_llm, NO_CITATIONS_MESSAGE);
    }

    #[tokio::test]
    async fn test_report_for_numbered_references() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works/10.1000/alpha")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"message":{"title":["Alpha paper"],"author":[{"given":"Ann","family":"Alpha"}]}}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let paper = "Intro text.\nReferences\n[1] A. Alpha. Alpha paper. 2001. doi:10.1000/alpha.\n[2] B. Beta. Beta paper. 1999.\n[3] C. Gamma. Gamma. 2015.\n";
        let path = write(&dir, "paper.txt", paper.as_bytes());
        let report_path = dir.path().join("report.txt");

        let result = tool_with(&server.url())
            .execute(
                ExtractCitationsArgs {
                    file_path: Some(path.clone()),
                    max_citations: Some(2),
                    save_report_to: Some(report_path.to_string_lossy().to_string()),
                    ..ExtractCitationsArgs::default()
                },
                &CancellationToken::new(),
            )
            .await;

        assert!(!result.is_error, "{}", result.for_llm);
        assert!(result.for_llm.starts_with("Found 2 citations (0 open access). Report saved to "));

        let report = std::fs::read_to_string(&report_path).unwrap();
        assert_eq!(report, result.for_user);
        assert!(report.starts_with(&format!("Citation analysis of {}\nFound 2 citations\n\n", path)));
        assert!(report.contains("--- Citation 1 ---\n[1] Title: Alpha paper"));
        assert!(report.contains("Authors: Ann Alpha"));
        assert!(report.contains("--- Citation 2 ---"));
        assert!(!report.contains("--- Citation 3 ---"));
    }

    #[tokio::test]
    async fn test_report_notes_cancellation() {
        let cancel = CancellationToken::new();
        let base = crate::citations::enrich_tests::answer_first_then_cancel(
            r#"{"message":{"title":["Only finished one"]}}"#,
            cancel.clone(),
        )
        .await;

        let dir = tempfile::tempdir().unwrap();
        let paper = "Body.\nReferences\n[1] A. One. 2001. doi:10.1000/one\n[2] B. Two. 2002. doi:10.1000/two\n[3] C. Three. 2003. doi:10.1000/three\n";
        let path = write(&dir, "paper.txt", paper.as_bytes());

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            tool_with(&base).execute(
                ExtractCitationsArgs {
                    file_path: Some(path.clone()),
                    ..ExtractCitationsArgs::default()
                },
                &cancel,
            ),
        )
        .await
        .expect("extraction ignored cancellation");

        assert!(!result.is_error, "{}", result.for_llm);
        let report = &result.for_llm;
        assert!(report.starts_with(&format!(
            "Citation analysis of {}\nFound 1 citations\nCancelled after processing 1 citations\n\n",
            path
        )));
        assert!(report.contains("Title: Only finished one"));
        assert!(!report.contains("--- Citation 2 ---"));
    }
}
