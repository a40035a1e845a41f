//! Per-citation metadata and open-access enrichment, with optional download.

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::fetch::{FetchError, Fetcher};
use crate::fs::FileSystem;
use crate::models::CitationRef;
use crate::sources::{CrossRefSource, OpenAccessStatus, SourceError, UnpaywallClient};
use crate::utils::doi_file_stem;

/// Where open-access copies of cited papers are written
#[derive(Debug, Clone, Copy)]
pub struct DownloadTarget<'a> {
    pub fs: &'a dyn FileSystem,
    pub dir: &'a Path,
}

/// Counts gathered over one enrichment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    /// Records visited before finishing or being cancelled
    pub processed: usize,
    pub open_access: usize,
    pub downloaded: usize,
    pub cancelled: bool,
}

/// A lookup or download gave up because the run was cancelled
#[derive(Debug)]
struct Interrupted;

/// Fills in citation metadata from Crossref and open-access links from Unpaywall
///
/// Every lookup is best effort: a failure leaves the record as it was and
/// moves on to the next one.
#[derive(Debug, Clone)]
pub struct CitationEnricher {
    crossref: CrossRefSource,
    unpaywall: Option<UnpaywallClient>,
    fetcher: Fetcher,
}

impl CitationEnricher {
    /// Without an Unpaywall client no record is marked open access
    pub fn new(
        crossref: CrossRefSource,
        unpaywall: Option<UnpaywallClient>,
        fetcher: Fetcher,
    ) -> Self {
        Self {
            crossref,
            unpaywall,
            fetcher,
        }
    }

    pub fn checks_open_access(&self) -> bool {
        self.unpaywall.is_some()
    }

    /// Enrich `refs` in document order.
    ///
    /// Cancellation is checked between records and interrupts in-flight
    /// lookups and downloads. On cancel the list is cut down to the records
    /// fully processed; the interrupted one is dropped.
    pub async fn enrich(
        &self,
        refs: &mut Vec<CitationRef>,
        download: Option<DownloadTarget<'_>>,
        cancel: &CancellationToken,
    ) -> EnrichmentSummary {
        let mut summary = EnrichmentSummary::default();

        for citation in refs.iter_mut() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            match self.enrich_one(citation, download, cancel).await {
                Ok(downloaded) => {
                    if downloaded {
                        summary.downloaded += 1;
                    }
                    summary.processed += 1;
                }
                Err(Interrupted) => {
                    summary.cancelled = true;
                    break;
                }
            }
        }

        if summary.cancelled {
            tracing::info!(
                processed = summary.processed,
                total = refs.len(),
                "citation enrichment cancelled"
            );
            refs.truncate(summary.processed);
        }
        summary.open_access = refs.iter().filter(|r| r.is_oa).count();
        summary
    }

    /// Returns whether an open-access copy was saved
    async fn enrich_one(
        &self,
        citation: &mut CitationRef,
        download: Option<DownloadTarget<'_>>,
        cancel: &CancellationToken,
    ) -> Result<bool, Interrupted> {
        if !citation.doi.is_empty() {
            self.lookup_metadata(citation, cancel).await?;
            self.lookup_open_access(citation, cancel).await?;
        }

        match download {
            Some(target) if citation.is_oa && !citation.pdf_url.is_empty() => {
                self.download(citation, target, cancel).await
            }
            _ => Ok(false),
        }
    }

    async fn lookup_metadata(
        &self,
        citation: &mut CitationRef,
        cancel: &CancellationToken,
    ) -> Result<(), Interrupted> {
        let work = match self.crossref.lookup_work(&citation.doi, cancel).await {
            Ok(work) => work,
            Err(SourceError::Cancelled) => return Err(Interrupted),
            Err(e) => {
                tracing::warn!(doi = %citation.doi, error = %e, "Crossref lookup failed");
                return Ok(());
            }
        };

        if !work.title.is_empty() {
            citation.title = work.title;
        }
        if !work.authors.is_empty() {
            citation.authors = work.authors.join(", ");
        }
        if !work.year.is_empty() {
            citation.year = work.year;
        }
        Ok(())
    }

    async fn lookup_open_access(
        &self,
        citation: &mut CitationRef,
        cancel: &CancellationToken,
    ) -> Result<(), Interrupted> {
        let Some(unpaywall) = &self.unpaywall else {
            return Ok(());
        };

        match unpaywall.lookup(&citation.doi, cancel).await {
            Ok(OpenAccessStatus::Open { url }) => {
                citation.is_oa = true;
                citation.pdf_url = url;
            }
            Ok(OpenAccessStatus::Closed) => {
                tracing::debug!(doi = %citation.doi, "no open access copy");
            }
            Err(SourceError::Cancelled) => return Err(Interrupted),
            Err(e) => {
                tracing::warn!(doi = %citation.doi, error = %e, "Unpaywall lookup failed");
            }
        }
        Ok(())
    }

    async fn download(
        &self,
        citation: &CitationRef,
        target: DownloadTarget<'_>,
        cancel: &CancellationToken,
    ) -> Result<bool, Interrupted> {
        let document = match self.fetcher.fetch(&citation.pdf_url, cancel).await {
            Ok(document) => document,
            Err(FetchError::Cancelled { .. }) => return Err(Interrupted),
            Err(e) => {
                tracing::warn!(url = %citation.pdf_url, error = %e, "citation download failed");
                return Ok(false);
            }
        };

        // landing pages behind "open access" links are common
        if !document.is_pdf() {
            tracing::warn!(url = %citation.pdf_url, "citation download is not a PDF");
            return Ok(false);
        }

        let path = citation_save_path(target.dir, citation);
        match target.fs.write_file(&path, &document.body).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = document.body.len(), "saved cited paper");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to save cited paper");
                Ok(false)
            }
        }
    }
}

/// `<dir>/<name>.pdf` where name comes from the DOI, else the index, else the clock
pub fn citation_save_path(dir: &Path, citation: &CitationRef) -> PathBuf {
    let name = if !citation.doi.is_empty() {
        doi_file_stem(&citation.doi)
    } else if citation.index > 0 {
        format!("citation_{}", citation.index)
    } else {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        format!("citation_{}", nanos)
    };
    dir.join(format!("{}.pdf", name))
}
