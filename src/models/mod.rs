//! Core data models for papers, citations and search operations.

use std::borrow::Cow;

mod citation;
mod paper;
mod search;

pub use citation::{doi_page_url, CitationRef, DOI_RESOLVER, RAW_TEXT_DISPLAY_CHARS};
pub use paper::{PaperBuilder, PaperResult, ABSTRACT_DISPLAY_CHARS};
pub use search::{SearchQuery, SearchResponse, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};

/// Cut `text` to at most `max` characters, appending "..." when anything was removed.
///
/// Counts characters rather than bytes so multi-byte text never splits mid-codepoint.
pub fn truncate_chars(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}...", &text[..byte_idx])),
        None => Cow::Borrowed(text),
    }
}
