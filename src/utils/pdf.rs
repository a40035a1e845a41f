//! Heuristic PDF text extraction.
//!
//! This is not a PDF parser. It scans the raw bytes for uncompressed text
//! objects (`BT ... ET`) and collects the literal strings shown by `Tj` and
//! `TJ`. When that yields too little text, it falls back to keeping runs of
//! printable ASCII. Compressed content streams, font encodings and layout are
//! out of reach; the output is good enough for mining reference lists and
//! DOIs from simple PDFs.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use regex::Regex as TextRegex;

/// Text objects shorter than this (after trimming) trigger the printable-ASCII fallback.
pub const MIN_TEXT_OBJECT_CHARS: usize = 200;

static TEXT_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s-u)BT\s+(.*?)\s+ET").expect("valid text object regex"));

static SHOW_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)\(([^)\\]*(?:\\.[^)\\]*)*)\)\s*Tj").expect("valid Tj regex")
});

static SHOW_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)\[([^\]]+)\]\s*TJ").expect("valid TJ regex"));

static ARRAY_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)\(([^)\\]*(?:\\.[^)\\]*)*)\)").expect("valid array string regex")
});

static BLANK_LINES: Lazy<TextRegex> =
    Lazy::new(|| TextRegex::new(r"\n{3,}").expect("valid blank line regex"));

/// Whether `data` starts with the `%PDF` magic bytes
pub fn has_pdf_magic(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}

/// Extract readable text from raw PDF bytes.
///
/// Never fails; input that yields nothing produces an empty string.
pub fn extract_text_from_pdf(data: &[u8]) -> String {
    let mut blocks = Vec::new();

    for object in TEXT_OBJECT.captures_iter(data) {
        let Some(body) = object.get(1) else {
            continue;
        };
        let strings = shown_strings(body.as_bytes());
        if !strings.is_empty() {
            blocks.push(strings.join(" "));
        }
    }

    let text = blocks.join(" ");
    if text.trim().len() < MIN_TEXT_OBJECT_CHARS {
        tracing::debug!(
            chars = text.trim().len(),
            "text objects too sparse, falling back to printable ASCII scan"
        );
        return extract_printable_ascii(data);
    }
    text
}

/// Literal strings shown inside one text object, in document order.
fn shown_strings(body: &[u8]) -> Vec<String> {
    let mut found: Vec<(usize, Vec<u8>)> = Vec::new();

    for caps in SHOW_STRING.captures_iter(body) {
        if let (Some(whole), Some(literal)) = (caps.get(0), caps.get(1)) {
            found.push((whole.start(), unescape_literal(literal.as_bytes())));
        }
    }

    for caps in SHOW_ARRAY.captures_iter(body) {
        let (Some(whole), Some(array)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let mut joined = Vec::new();
        for part in ARRAY_STRING.captures_iter(array.as_bytes()) {
            if let Some(literal) = part.get(1) {
                joined.extend(unescape_literal(literal.as_bytes()));
            }
        }
        found.push((whole.start(), joined));
    }

    found.sort_by_key(|(pos, _)| *pos);
    found
        .into_iter()
        .filter(|(_, bytes)| is_readable(bytes))
        .map(|(_, bytes)| String::from_utf8_lossy(&bytes).into_owned())
        .collect()
}

/// Decode the escapes PDF literal strings use for layout and delimiters.
fn unescape_literal(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();

    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b't') => out.push(b'\t'),
            Some(c @ (b'\\' | b'(' | b')')) => out.push(c),
            Some(other) => {
                out.push(b'\\');
                out.push(other);
            }
            None => out.push(b'\\'),
        }
    }
    out
}

/// More than half the bytes must be printable ASCII.
fn is_readable(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let printable = bytes.iter().filter(|b| (32..127).contains(*b)).count();
    printable * 2 > bytes.len()
}

/// Keep runs of printable ASCII (plus tab, CR, LF), ending each run with a newline.
///
/// Runs of three or more newlines collapse to two and the result is trimmed.
pub fn extract_printable_ascii(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / 2);
    let mut run = 0usize;

    for &b in data {
        if (32..127).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t') {
            out.push(char::from(b));
            run += 1;
        } else if run > 0 {
            out.push('\n');
            run = 0;
        }
    }

    BLANK_LINES.replace_all(&out, "\n\n").trim().to_string()
}
