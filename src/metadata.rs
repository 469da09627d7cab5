//! Document title resolution.
//!
//! A converted document's title is taken from the first non-empty source in
//! priority order:
//!
//! 1. the first heading (`<h1>`…`<h6>`) with plain-text content
//! 2. a paragraph that opens with a bold run (`<p><strong>…</strong>`)
//! 3. the first paragraph with plain-text content
//! 4. the page filename stem (`ab12_foo.html` → `ab12_foo`)
//!
//! Extraction works on the HTML text produced by the converter. Only runs of
//! text with no nested markup qualify, so `<h1>A <em>b</em></h1>` is skipped
//! in favour of the next candidate. Entities are decoded so the title can be
//! escaped once by the page templates.

use crate::naming::page_stem;
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<h[1-6][^>]*>([^<]+)</h[1-6]>").expect("heading pattern must compile")
});
static BOLD_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<p[^>]*><strong>([^<]+)</strong>").expect("bold pattern must compile")
});
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<p[^>]*>([^<]+)</p>").expect("paragraph pattern must compile")
});

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value (trimmed).
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

fn first_capture<'h>(pattern: &Regex, html: &'h str) -> Option<&'h str> {
    pattern
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|text| !text.trim().is_empty())
}

/// Title found in the converted HTML, if any.
pub fn extract_title(html: &str) -> Option<String> {
    resolve(&[
        first_capture(&HEADING, html),
        first_capture(&BOLD_LEAD, html),
        first_capture(&PARAGRAPH, html),
    ])
    .map(|t| decode_entities(&t))
}

/// Title for a page: extracted from content, else the filename stem.
pub fn resolve_title(html: &str, page_filename: &str) -> String {
    extract_title(html).unwrap_or_else(|| page_stem(page_filename).to_string())
}

/// Decode the entities a converter emits for text content.
///
/// Named entities beyond the five XML ones are left as written.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => numeric_entity(entity),
            };
            c.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn numeric_entity(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
