//! Paper model for a single search hit from any academic source.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::truncate_chars;

/// Abstracts longer than this many characters are cut when rendered.
pub const ABSTRACT_DISPLAY_CHARS: usize = 500;

/// A paper as reported by one search source.
///
/// All textual fields use the empty string for "unknown"; the renderer skips
/// empty fields instead of printing blanks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperResult {
    /// Display name of the source that produced this result (e.g. "OpenAlex")
    pub source: String,

    /// Paper title
    pub title: String,

    /// Author names in the order the source returned them
    #[serde(default)]
    pub authors: Vec<String>,

    /// Four-digit publication year, as text
    #[serde(default)]
    pub year: String,

    /// Abstract text
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,

    /// Bare DOI (no resolver prefix)
    #[serde(default)]
    pub doi: String,

    /// Landing page URL
    #[serde(default)]
    pub url: String,

    /// Direct PDF URL, when the source knows one
    #[serde(default)]
    pub pdf_url: String,
}

impl PaperResult {
    /// Create a result with only the required fields populated
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Whether a direct PDF link is known
    pub fn has_pdf(&self) -> bool {
        !self.pdf_url.is_empty()
    }

    /// Render the paper as the multi-line block used by the search tool.
    pub fn format(&self) -> String {
        let mut out = String::new();
        push_field(&mut out, "Title", &self.title);
        if !self.authors.is_empty() {
            push_field(&mut out, "Authors", &self.authors.join(", "));
        }
        push_field(&mut out, "Year", &self.year);
        push_field(&mut out, "DOI", &self.doi);
        push_field(&mut out, "URL", &self.url);
        push_field(&mut out, "PDF", &self.pdf_url);
        if !self.abstract_text.is_empty() {
            push_field(
                &mut out,
                "Abstract",
                &truncate_chars(&self.abstract_text, ABSTRACT_DISPLAY_CHARS),
            );
        }
        push_field(&mut out, "Source", &self.source);
        out
    }
}

impl fmt::Display for PaperResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

pub(crate) fn push_field(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push_str(label);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

/// Builder for constructing [`PaperResult`] values inside source adapters
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: PaperResult,
}

impl PaperBuilder {
    /// Start a builder with the source display name and title
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            paper: PaperResult::new(source, title),
        }
    }

    /// Set authors, dropping blank names
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paper.authors = authors
            .into_iter()
            .map(Into::into)
            .map(|name: String| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        self
    }

    /// Set the publication year
    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.paper.year = year.into();
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.paper.abstract_text = abstract_text.into().trim().to_string();
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = doi.into();
        self
    }

    /// Set landing page URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.paper.url = url.into();
        self
    }

    /// Set PDF URL
    pub fn pdf_url(mut self, url: impl Into<String>) -> Self {
        self.paper.pdf_url = url.into();
        self
    }

    /// Build the final result
    pub fn build(self) -> PaperResult {
        self.paper
    }
}
