//! Locating the reference list inside extracted paper text.

/// Headers recognised as the start of a reference list, in priority order
pub const SECTION_HEADERS: &[&str] = &[
    "References",
    "REFERENCES",
    "Bibliography",
    "BIBLIOGRAPHY",
    "Works Cited",
    "WORKS CITED",
    "Literature Cited",
    "LITERATURE CITED",
];

/// Return the text following the first recognised reference-section header.
///
/// A header only counts when it sits on its own line: preceded by a newline
/// and followed by `\n`, `\r\n` or `:`. Headers are tried in
/// [`SECTION_HEADERS`] order, so an earlier header wins even if a later one
/// appears first in the text. Returns `None` when no header is found.
pub fn extract_citation_section(text: &str) -> Option<&str> {
    for header in SECTION_HEADERS {
        for terminator in ["\n", "\r\n", ":"] {
            let marker = format!("\n{}{}", header, terminator);
            if let Some(idx) = text.find(&marker) {
                return Some(&text[idx + marker.len()..]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_references_header() {
        let text = "Intro\nBody text.\nReferences\n[1] A. Author. Title. 2019.\n";
        assert_eq!(
            extract_citation_section(text),
            Some("[1] A. Author. Title. 2019.\n")
        );
    }

    #[test]
    fn test_crlf_and_colon_terminators() {
        assert_eq!(
            extract_citation_section("x\r\nBIBLIOGRAPHY\r\n1. Entry"),
            Some("1. Entry")
        );
        assert_eq!(
            extract_citation_section("x\nWorks Cited: [1] Entry"),
            Some(" [1] Entry")
        );
    }

    #[test]
    fn test_header_priority_over_position() {
        let text = "x\nBibliography\nold\nReferences\nnew";
        assert_eq!(extract_citation_section(text), Some("new"));
    }

    #[test]
    fn test_inline_mention_ignored() {
        assert_eq!(extract_citation_section("See References in the appendix."), None);
        assert_eq!(extract_citation_section("References\nno leading newline"), None);
    }
}
