//! Centralized filename conventions for generated output.
//!
//! Every name written under the output directory is derived mechanically from
//! the source document's filename. Nothing here touches the filesystem.
//!
//! ## Page Filenames
//!
//! Source documents named like `{ID}-{TYPE}.docx` (ID alphanumeric, TYPE letters
//! only, optional whitespace around the dash) map to `{id}_{type}.html`. Any
//! other name is lower-cased and every run of non-alphanumeric characters
//! collapses to a single underscore:
//!
//! - `AB12-FOO.docx` → `ab12_foo.html`
//! - `AB12 - Foo Notes.docx` → `ab12_foo.html` (the pattern matches a prefix)
//! - `User Guide (v2).docx` → `user_guide_v2.html`
//! - `---.docx` → `document.html` (nothing survives, see [`EMPTY_STEM`])
//!
//! Distinct sources can sanitize to the same name. That collision is not
//! defended against: the later document overwrites the earlier one.
//!
//! ## Image Filenames
//!
//! Images extracted from a page are numbered per page, starting at 1, padded
//! to four digits. See [`ImageNaming`] for the two policies.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Stem used when sanitization leaves nothing behind.
pub const EMPTY_STEM: &str = "document";

static ID_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z0-9]+)\s*-\s*([a-z]+)").expect("ID-TYPE pattern must compile")
});

/// Map a source filename to its canonical, URL-safe page filename.
///
/// Total and pure: every input yields a non-empty `*.html` name.
pub fn sanitize_filename(source: &str) -> String {
    let stem = strip_docx_extension(source);

    if let Some(caps) = ID_TYPE.captures(stem) {
        return format!(
            "{}_{}.html",
            caps[1].to_lowercase(),
            caps[2].to_lowercase()
        );
    }

    let slug = underscore_slug(stem);
    if slug.is_empty() {
        format!("{EMPTY_STEM}.html")
    } else {
        format!("{slug}.html")
    }
}

/// The page filename without its `.html` extension.
pub fn page_stem(page_filename: &str) -> &str {
    page_filename
        .strip_suffix(".html")
        .unwrap_or(page_filename)
}

fn strip_docx_extension(name: &str) -> &str {
    let split = name.len().saturating_sub(5);
    match (name.get(..split), name.get(split..)) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(".docx") => stem,
        _ => name,
    }
}

/// Lower-case, collapse non-alphanumeric runs to `_`, trim outer underscores.
fn underscore_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_gap = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_gap && !slug.is_empty() {
                slug.push('_');
            }
            pending_gap = false;
            slug.push(c);
        } else {
            pending_gap = true;
        }
    }
    slug
}

/// How extracted images are named on disk.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ImageNaming {
    /// `{page-stem}_{NNNN}.jpeg`, unique across documents.
    #[default]
    #[value(name = "source_filename")]
    SourceFilename,
    /// `image_{NNNN}.jpeg`, unique within one document only. Several documents
    /// converted into the same output tree overwrite each other's images.
    #[value(name = "sequential")]
    Sequential,
}

impl ImageNaming {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageNaming::SourceFilename => "source_filename",
            ImageNaming::Sequential => "sequential",
        }
    }
}

/// Filename for the `index`-th image (1-based) of the page with `page_stem`.
///
/// The counter is zero-padded to four digits and widens past 9999.
pub fn image_filename(naming: ImageNaming, page_stem: &str, index: usize) -> String {
    match naming {
        ImageNaming::SourceFilename => format!("{page_stem}_{index:04}.jpeg"),
        ImageNaming::Sequential => format!("image_{index:04}.jpeg"),
    }
}
