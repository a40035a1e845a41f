//! Retrieving papers over HTTP and making sense of what comes back.
//!
//! - [`Fetcher`]: GET with a 120 s default timeout, at most five redirects and cancellation
//! - [`detect_pdf`]: content-type / URL / magic-byte PDF sniffing
//! - [`find_pdf_url_in_html`]: landing-page PDF link discovery
//! - [`html_to_text`]: readable text from an HTML page

mod fetcher;
mod html;
mod pdf_link;

pub use fetcher::{detect_pdf, FetchError, FetchedDocument, Fetcher, DOCUMENT_TIMEOUT};
pub use html::html_to_text;
pub use pdf_link::find_pdf_url_in_html;
