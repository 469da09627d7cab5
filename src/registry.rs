//! In-memory document registry and pagination.
//!
//! The registry is appended to while documents are converted and only read
//! afterwards. [`Registry::sorted_view`] is the single ordering used by both
//! the index page and prev/next pagination:
//!
//! ```text
//! (category order ascending, filename ascending)
//! ```
//!
//! Config validation keeps category orders unique. Should two categories
//! still share an order, the category name breaks the tie so each category
//! stays one contiguous run.
//!
//! Pagination is recomputed from the current registry on every call. Callers
//! must finish registering every document of a run before asking for
//! neighbours, otherwise documents registered later are missing from the
//! answer.

use crate::types::{Document, Pagination};
use tracing::warn;

#[derive(Debug, Default, Clone)]
pub struct Registry {
    documents: Vec<Document>,
}

/// Documents of one category, in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub order: u32,
    pub documents: Vec<&'a Document>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. A document with the same filename replaces the earlier
    /// record, just as its output file replaces the earlier page on disk.
    pub fn register(&mut self, document: Document) {
        if let Some(existing) = self
            .documents
            .iter_mut()
            .find(|d| d.filename == document.filename)
        {
            warn!(
                "{} and {} both map to {}; keeping the later one",
                existing.source, document.source, document.filename
            );
            *existing = document;
        } else {
            self.documents.push(document);
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.filename == filename)
    }

    /// All documents ordered by category order, then filename.
    pub fn sorted_view(&self) -> Vec<&Document> {
        let mut view: Vec<&Document> = self.documents.iter().collect();
        view.sort_by(|a, b| {
            a.category_order()
                .cmp(&b.category_order())
                .then_with(|| a.category().cmp(b.category()))
                .then_with(|| a.filename.cmp(&b.filename))
        });
        view
    }

    /// Neighbours of `filename` in [`sorted_view`](Self::sorted_view) order.
    ///
    /// Unknown filenames have no neighbours.
    pub fn pagination_for(&self, filename: &str) -> Pagination<'_> {
        let view = self.sorted_view();
        let Some(pos) = view.iter().position(|d| d.filename == filename) else {
            return Pagination::default();
        };
        Pagination {
            prev: pos.checked_sub(1).map(|i| view[i]),
            next: view.get(pos + 1).copied(),
        }
    }

    /// The sorted view split into consecutive runs of one category.
    ///
    /// Empty categories never appear.
    pub fn grouped_by_category(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
        for doc in self.sorted_view() {
            match groups.last_mut() {
                Some(group) if group.name == doc.category() && group.order == doc.category_order() => {
                    group.documents.push(doc)
                }
                _ => groups.push(CategoryGroup {
                    name: doc.category(),
                    order: doc.category_order(),
                    documents: vec![doc],
                }),
            }
        }
        groups
    }
}
