//! Citation mining: find the reference list, split it into records, enrich them.
//!
//! The pipeline runs in this order:
//!
//! 1. [`extract_citation_section`] locates the text after a "References"-style header
//! 2. [`parse_citation_refs`] splits it on `[n]` or `n.` markers, or falls back to bare DOIs
//! 3. [`CitationEnricher`] adds Crossref metadata and Unpaywall open-access links,
//!    and can save open-access PDFs

mod enrich;
mod parser;
mod section;

#[cfg(test)]
pub(crate) use enrich::tests as enrich_tests;

pub use enrich::{citation_save_path, CitationEnricher, DownloadTarget, EnrichmentSummary};
pub use parser::{extract_doi_from_text, extract_year_from_text, parse_citation_refs};
pub use section::{extract_citation_section, SECTION_HEADERS};
