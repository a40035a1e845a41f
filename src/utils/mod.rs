//! Utility modules shared by sources, fetchers and tools.
//!
//! - [`HttpClient`]: pooled reqwest client with a bounded redirect policy
//! - [`extract_text_from_pdf`]: heuristic text recovery from raw PDF bytes
//! - [`validate_url`] / [`validate_doi`]: input checks for tool arguments

mod http;
mod pdf;
mod validate;

pub use http::{HttpClient, DEFAULT_USER_AGENT, MAX_REDIRECTS};
pub use pdf::{
    extract_printable_ascii, extract_text_from_pdf, has_pdf_magic, MIN_TEXT_OBJECT_CHARS,
};
pub use validate::{
    doi_file_stem, encode_doi_path, normalize_doi, validate_doi, validate_url, ValidationError,
};
