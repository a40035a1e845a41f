//! Input validation for URLs, DOIs and DOI-derived filenames.

use thiserror::Error;
use url::Url;

/// Validation error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("only http/https URLs are supported")]
    UnsupportedScheme(String),

    #[error("Invalid DOI format: {0}")]
    InvalidDoi(String),
}

/// Validate that `url` is an absolute http or https URL.
///
/// Returns the parsed URL so callers can reuse it.
pub fn validate_url(url: &str) -> Result<Url, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::InvalidUrl("empty URL".to_string()));
    }

    if url.contains(['\0', '\n', '\r']) {
        return Err(ValidationError::InvalidUrl(
            "contains control characters".to_string(),
        ));
    }

    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ValidationError::UnsupportedScheme(other.to_string())),
    }
}

/// Strip resolver prefixes from a DOI and trim whitespace.
///
/// Accepts `doi:10.x/y`, `https://doi.org/10.x/y`, `http://dx.doi.org/10.x/y`
/// and bare DOIs. Case is preserved.
pub fn normalize_doi(doi: &str) -> String {
    let mut doi = doi.trim();
    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
    ] {
        if doi.len() >= prefix.len() && doi[..prefix.len()].eq_ignore_ascii_case(prefix) {
            doi = &doi[prefix.len()..];
            break;
        }
    }
    if doi.len() >= 4 && doi[..4].eq_ignore_ascii_case("doi:") {
        doi = doi[4..].trim_start();
    }
    doi.to_string()
}

/// Validate a DOI and return its normalized form
///
/// DOIs have the format "10.xxxx/xxxxxx" where xxxx is a registrant code
/// and xxxxxx is an item ID.
pub fn validate_doi(doi: &str) -> Result<String, ValidationError> {
    let doi = normalize_doi(doi);

    if doi.is_empty() {
        return Err(ValidationError::InvalidDoi("empty DOI".to_string()));
    }

    if !doi.starts_with("10.") {
        return Err(ValidationError::InvalidDoi(
            "DOI must start with '10.'".to_string(),
        ));
    }

    if !doi.contains('/') {
        return Err(ValidationError::InvalidDoi(
            "DOI must contain a slash".to_string(),
        ));
    }

    Ok(doi)
}

/// Percent-encode a DOI for use as URL path segments, keeping its slashes.
pub fn encode_doi_path(doi: &str) -> String {
    doi.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// File stem for a DOI: `/`, `:` and spaces become underscores.
pub fn doi_file_stem(doi: &str) -> String {
    doi.chars()
        .map(|c| match c {
            '/' | ':' | ' ' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.org/paper.pdf").is_ok());
        assert!(validate_url("http://127.0.0.1:8080/x").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_other_schemes() {
        assert_eq!(
            validate_url("ftp://example.org/file"),
            Err(ValidationError::UnsupportedScheme("ftp".to_string()))
        );
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(ValidationError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(validate_url(""), Err(ValidationError::InvalidUrl(_))));
    }

    #[test]
    fn test_normalize_doi() {
        assert_eq!(normalize_doi("10.1234/ABC"), "10.1234/ABC");
        assert_eq!(normalize_doi("doi:10.1234/abc"), "10.1234/abc");
        assert_eq!(normalize_doi("DOI: 10.1234/abc"), "10.1234/abc");
        assert_eq!(normalize_doi("https://doi.org/10.1234/abc"), "10.1234/abc");
        assert_eq!(normalize_doi(" http://dx.doi.org/10.1/x "), "10.1/x");
    }

    #[test]
    fn test_validate_doi() {
        assert_eq!(validate_doi("doi:10.1038/nature12373").unwrap(), "10.1038/nature12373");
        assert!(validate_doi("").is_err());
        assert!(validate_doi("11.1234/abc").is_err());
        assert!(validate_doi("10.1234").is_err());
    }

    #[test]
    fn test_encode_doi_path_keeps_slashes() {
        assert_eq!(encode_doi_path("10.1234/abc"), "10.1234/abc");
        assert_eq!(encode_doi_path("10.1002/(SICI)1097"), "10.1002/%28SICI%291097");
    }

    #[test]
    fn test_doi_file_stem() {
        assert_eq!(doi_file_stem("10.1000/xyz 1:2"), "10.1000_xyz_1_2");
    }
}
