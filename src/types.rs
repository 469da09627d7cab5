//! Shared types used across the conversion and assembly passes.
//!
//! A [`Document`] is created once per successfully converted source file and
//! lives for the duration of a single run. Nothing here is persisted.

use serde::Serialize;

/// A named bucket documents are grouped into on the index page.
///
/// `order` is the display rank; lower sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub order: u32,
}

/// One successfully converted source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Sanitized output filename, e.g. `ab12_foo.html`. Unique key in the registry.
    pub filename: String,
    /// Original source filename, e.g. `AB12-FOO.docx`.
    pub source: String,
    /// Resolved display title (heading → bold lead → paragraph → filename).
    pub title: String,
    category: Category,
}

impl Document {
    /// The category is assigned here and cannot change afterwards.
    pub fn new(
        filename: impl Into<String>,
        source: impl Into<String>,
        title: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            filename: filename.into(),
            source: source.into(),
            title: title.into(),
            category,
        }
    }

    pub fn category(&self) -> &str {
        &self.category.name
    }

    pub fn category_order(&self) -> u32 {
        self.category.order
    }
}

/// Previous/next neighbours of a document in sorted order.
///
/// Derived on demand from the registry, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination<'a> {
    pub prev: Option<&'a Document>,
    pub next: Option<&'a Document>,
}
