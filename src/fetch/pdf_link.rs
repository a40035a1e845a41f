//! Locating a PDF link inside a publisher landing page.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Link patterns in priority order; the first pattern with a match wins.
static PDF_LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)<meta[^>]+name=["']citation_pdf_url["'][^>]+content=["']([^"']+)["']"#,
        r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+name=["']citation_pdf_url["']"#,
        r#"(?i)data-pdf-url=["']([^"']+)["']"#,
        r#"(?i)href=["']([^"']+\.pdf(?:[?#][^"']*)?)["']"#,
        r#"(?i)href=["']([^"']+)["'][^>]+type=["']application/pdf["']"#,
        r#"(?i)type=["']application/pdf["'][^>]+href=["']([^"']+)["']"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid PDF link regex"))
    .collect()
});

/// Find the most likely PDF URL in an HTML page.
///
/// Candidates are tried in this order: `citation_pdf_url` meta tags (either
/// attribute order), `data-pdf-url` attributes, hrefs ending in `.pdf`, then
/// links typed `application/pdf`. Relative links are resolved against
/// `base_url` when it parses; otherwise the raw match is returned.
pub fn find_pdf_url_in_html(html: &str, base_url: &str) -> Option<String> {
    PDF_LINK_PATTERNS.iter().find_map(|pattern| {
        let candidate = pattern.captures(html)?.get(1)?.as_str();
        Some(resolve(candidate, base_url))
    })
}

fn resolve(candidate: &str, base_url: &str) -> String {
    // already absolute, or nothing to resolve against
    if Url::parse(candidate).is_ok() || base_url.is_empty() {
        return candidate.to_string();
    }
    Url::parse(base_url)
        .and_then(|base| base.join(candidate))
        .map(String::from)
        .unwrap_or_else(|_| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_pdf_url_meta() {
        let html = r#"<html><head>
            <meta name="citation_title" content="A paper">
            <meta name="citation_pdf_url" content="https://pub.example/files/a.pdf">
            </head></html>"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/article/1").as_deref(),
            Some("https://pub.example/files/a.pdf")
        );
    }

    #[test]
    fn test_meta_content_before_name() {
        let html = r#"<meta content='/download/7' name='citation_pdf_url'>"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/article/7").as_deref(),
            Some("https://pub.example/download/7")
        );
    }

    #[test]
    fn test_meta_beats_earlier_anchor() {
        let html = r#"<a href="/supplement.pdf">Supplement</a>
            <meta name="citation_pdf_url" content="https://pub.example/main.pdf">"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/").as_deref(),
            Some("https://pub.example/main.pdf")
        );
    }

    #[test]
    fn test_data_attribute() {
        let html = r#"<button data-pdf-url="/pdf/123">Download</button>"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/a/").as_deref(),
            Some("https://pub.example/pdf/123")
        );
    }

    #[test]
    fn test_relative_pdf_href_resolved() {
        let html = r#"<a class="btn" href="files/paper.pdf?download=true">PDF</a>"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/articles/9").as_deref(),
            Some("https://pub.example/articles/files/paper.pdf?download=true")
        );
    }

    #[test]
    fn test_relative_href_with_http_prefix_resolved() {
        let html = r#"<a href="httpdocs/a.pdf">PDF</a>"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/article/3").as_deref(),
            Some("https://pub.example/article/httpdocs/a.pdf")
        );
    }

    #[test]
    fn test_typed_links() {
        let html = r#"<link href="/get/5" rel="alternate" type="application/pdf">"#;
        assert_eq!(
            find_pdf_url_in_html(html, "https://pub.example/x").as_deref(),
            Some("https://pub.example/get/5")
        );

        let html = r#"<link type="application/pdf" rel="alternate" href="https://cdn.example/5">"#;
        assert_eq!(
            find_pdf_url_in_html(html, "").as_deref(),
            Some("https://cdn.example/5")
        );
    }

    #[test]
    fn test_relative_without_base_kept_raw() {
        let html = r#"<a href="paper.pdf">x</a>"#;
        assert_eq!(find_pdf_url_in_html(html, "").as_deref(), Some("paper.pdf"));
        assert_eq!(
            find_pdf_url_in_html(html, "::not a url::").as_deref(),
            Some("paper.pdf")
        );
    }

    #[test]
    fn test_no_link() {
        assert_eq!(find_pdf_url_in_html("<p>Nothing here</p>", "https://x.org"), None);
    }
}
