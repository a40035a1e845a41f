//! Splitting a reference list into individual citation records.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::models::{doi_page_url, CitationRef};

/// Numbering styles tried in order; the first with at least two markers wins.
static NUMBERED_STYLES: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?m)^\s*\[(\d+)\]").expect("valid bracket marker regex"),
        Regex::new(r"(?m)^\s*(\d+)\.\s").expect("valid dot marker regex"),
    ]
});

static DOI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:doi:|https?://doi\.org/)?(10\.\d{4,}/[^\s\])>"',]+)"#)
        .expect("valid DOI regex")
});

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19[0-9]{2}|20[0-2][0-9])\b").expect("valid year regex"));

const DOI_TRAILING: &[char] = &['.', ',', ';', ')'];

/// Parse a reference section into at most `max` citations, in document order.
///
/// Numbered lists (`[1]` or `1.` at line start) are split marker to marker.
/// Without at least two markers of either style, every distinct DOI in the
/// section becomes its own unnumbered record.
pub fn parse_citation_refs(section: &str, max: usize) -> Vec<CitationRef> {
    if section.trim().is_empty() || max == 0 {
        return Vec::new();
    }

    for style in NUMBERED_STYLES.iter() {
        let markers: Vec<(usize, u32)> = style
            .captures_iter(section)
            .filter_map(|caps| {
                let start = caps.get(0)?.start();
                let index = caps.get(1)?.as_str().parse().unwrap_or(0);
                Some((start, index))
            })
            .collect();

        if markers.len() >= 2 {
            return split_numbered(section, &markers, max);
        }
    }

    extract_doi_refs(section, max)
}

fn split_numbered(section: &str, markers: &[(usize, u32)], max: usize) -> Vec<CitationRef> {
    let mut refs = Vec::with_capacity(markers.len().min(max));

    for (i, &(start, index)) in markers.iter().enumerate() {
        if refs.len() >= max {
            break;
        }
        let end = markers.get(i + 1).map_or(section.len(), |&(next, _)| next);
        let raw_text = section[start..end].trim();
        if raw_text.is_empty() {
            continue;
        }

        let doi = extract_doi_from_text(raw_text).unwrap_or_default();
        let page_url = if doi.is_empty() {
            String::new()
        } else {
            doi_page_url(&doi)
        };

        refs.push(CitationRef {
            index,
            raw_text: raw_text.to_string(),
            year: extract_year_from_text(raw_text).unwrap_or_default(),
            doi,
            page_url,
            ..CitationRef::default()
        });
    }

    refs
}

fn extract_doi_refs(section: &str, max: usize) -> Vec<CitationRef> {
    let mut seen = HashSet::new();
    let mut refs = Vec::new();

    for caps in DOI.captures_iter(section) {
        if refs.len() >= max {
            break;
        }
        let Some(m) = caps.get(1) else {
            continue;
        };
        let doi = m.as_str().trim_end_matches(DOI_TRAILING);
        if doi.is_empty() || !seen.insert(doi.to_string()) {
            continue;
        }
        refs.push(CitationRef::from_doi(doi));
    }

    refs
}

/// First DOI in `text`, without resolver prefix or trailing punctuation.
pub fn extract_doi_from_text(text: &str) -> Option<String> {
    let doi = DOI
        .captures(text)?
        .get(1)?
        .as_str()
        .trim_end_matches(DOI_TRAILING);
    (!doi.is_empty()).then(|| doi.to_string())
}

/// First plausible publication year (1900–2029) in `text`.
pub fn extract_year_from_text(text: &str) -> Option<String> {
    YEAR.captures(text)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_numbered() {
        let section = "[1] A. Smith. Deep things. Nature, 2019. doi:10.1038/nature12345.\n\
                       [2] B. Jones. Shallow things. 2021.\n\
                       [3] C. Wu. Other things. https://doi.org/10.1145/3366423.3380211\n";

        let refs = parse_citation_refs(section, 20);
        assert_eq!(refs.len(), 3);
        assert_eq!(
            refs.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(refs[0].doi, "10.1038/nature12345");
        assert_eq!(refs[0].year, "2019");
        assert_eq!(refs[0].page_url, "https://doi.org/10.1038/nature12345");
        assert_eq!(refs[1].doi, "");
        assert_eq!(refs[1].page_url, "");
        assert_eq!(refs[1].year, "2021");
        assert_eq!(refs[2].doi, "10.1145/3366423.3380211");
        assert!(refs[2].raw_text.starts_with("[3] C. Wu."));
    }

    #[test]
    fn test_bracket_spans_cover_wrapped_lines() {
        let section = "  [1] First entry\n    continues here\n  [2] Second entry";
        let refs = parse_citation_refs(section, 20);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].raw_text, "[1] First entry\n    continues here");
        assert_eq!(refs[1].raw_text, "[2] Second entry");
    }

    #[test]
    fn test_dot_numbered() {
        let section = "1. Knuth, D. The Art. 1968.\n2. Dijkstra, E. Notes. 1972.\n";
        let refs = parse_citation_refs(section, 20);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].index, 1);
        assert_eq!(refs[0].year, "1968");
        assert_eq!(refs[1].index, 2);
        assert_eq!(refs[1].raw_text, "2. Dijkstra, E. Notes. 1972.");
    }

    #[test]
    fn test_single_marker_falls_through_to_doi_scan() {
        let section = "[1] Only one numbered entry 10.1000/aaa and also 10.1000/bbb.";
        let refs = parse_citation_refs(section, 20);
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.index == 0));
        assert_eq!(refs[0].doi, "10.1000/aaa");
        assert_eq!(refs[1].doi, "10.1000/bbb");
    }

    #[test]
    fn test_doi_fallback_dedupes() {
        let section = "see doi:10.5555/one, and https://doi.org/10.5555/two; \
                       again 10.5555/one. more";
        let refs = parse_citation_refs(section, 20);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].raw_text, "10.5555/one");
        assert_eq!(refs[0].index, 0);
        assert_eq!(refs[1].doi, "10.5555/two");
        assert_eq!(refs[1].page_url, "https://doi.org/10.5555/two");
    }

    #[test]
    fn test_max_keeps_earliest() {
        let section: String = (1..=10)
            .map(|i| format!("[{}] Entry number {}\n", i, i))
            .collect();
        let refs = parse_citation_refs(&section, 4);
        assert_eq!(refs.len(), 4);
        assert_eq!(refs.last().map(|r| r.index), Some(4));

        let dois = "10.1/aaaa 10.1000/a 10.1000/b 10.1000/c";
        assert_eq!(parse_citation_refs(dois, 2).len(), 2);
    }

    #[test]
    fn test_nothing_to_find() {
        assert!(parse_citation_refs("", 20).is_empty());
        assert!(parse_citation_refs("Plain prose with no references.", 20).is_empty());
        assert!(parse_citation_refs("[1] a\n[2] b", 0).is_empty());
    }

    #[test]
    fn test_extract_doi_round_trip() {
        for doi in ["10.1234/abc.def", "10.12345/X-Y_Z;2", "10.1038/s41586-020-2649-2"] {
            assert_eq!(
                extract_doi_from_text(&format!("doi:{}", doi)).as_deref(),
                Some(doi)
            );
        }
        assert_eq!(
            extract_doi_from_text("(DOI:10.1000/xyz).").as_deref(),
            Some("10.1000/xyz")
        );
        assert_eq!(extract_doi_from_text("10.12/too-short-registrant"), None);
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year_from_text("Proc. 1999, rev 2005").as_deref(), Some("1999"));
        assert_eq!(extract_year_from_text("in 2031 or 1899"), None);
        assert_eq!(extract_year_from_text("id12019x"), None);
    }
}
