//! Citation model for entries mined from a paper's reference list.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::paper::push_field;
use super::truncate_chars;

/// Raw reference text longer than this is cut when rendered.
pub const RAW_TEXT_DISPLAY_CHARS: usize = 200;

/// One reference extracted from a paper, optionally enriched with metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationRef {
    /// Numeric marker from the reference list (`[3]` or `3.`), or 0 when unnumbered
    pub index: u32,

    /// The reference text as it appeared in the paper
    pub raw_text: String,

    /// Bare DOI, if one was found in the text
    #[serde(default)]
    pub doi: String,

    /// Title from Crossref
    #[serde(default)]
    pub title: String,

    /// Comma-joined author list from Crossref
    #[serde(default)]
    pub authors: String,

    /// Four-digit year
    #[serde(default)]
    pub year: String,

    /// Whether Unpaywall reported an open-access copy
    #[serde(default)]
    pub is_oa: bool,

    /// Open-access PDF (or best landing) URL from Unpaywall
    #[serde(default)]
    pub pdf_url: String,

    /// DOI resolver URL
    #[serde(default)]
    pub page_url: String,
}

impl CitationRef {
    /// A reference recovered from a bare DOI mention in free text
    pub fn from_doi(doi: impl Into<String>) -> Self {
        let doi = doi.into();
        Self {
            raw_text: doi.clone(),
            page_url: doi_page_url(&doi),
            doi,
            ..Self::default()
        }
    }

    /// Render the citation as the block used in citation reports.
    pub fn format(&self) -> String {
        let mut out = String::new();
        if self.index > 0 {
            out.push_str(&format!("[{}] ", self.index));
        }
        push_field(&mut out, "Title", &self.title);
        push_field(&mut out, "Authors", &self.authors);
        push_field(&mut out, "Year", &self.year);
        push_field(&mut out, "DOI", &self.doi);
        push_field(&mut out, "URL", &self.page_url);
        push_field(&mut out, "PDF", &self.pdf_url);
        out.push_str(&format!("Open Access: {}\n", self.is_oa));
        if !self.raw_text.is_empty() {
            push_field(
                &mut out,
                "Raw",
                &truncate_chars(&self.raw_text, RAW_TEXT_DISPLAY_CHARS),
            );
        }
        out
    }
}

impl fmt::Display for CitationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Public DOI resolver
pub const DOI_RESOLVER: &str = "https://doi.org";

/// Resolver URL for a bare DOI
pub fn doi_page_url(doi: &str) -> String {
    format!("{}/{}", DOI_RESOLVER, doi)
}
