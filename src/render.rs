//! HTML page assembly.
//!
//! Pure templating: nothing here converts, classifies or touches the disk.
//!
//! ## Generated Pages
//!
//! - **Document pages** (`/{sanitized}.html`): converted content, a link back
//!   to the index and prev/next pagination
//! - **Index page** (`/index.html`): one section per non-empty category, in
//!   category order, listing its documents by title
//!
//! Every page links the shared `main.css`, written once per run from
//! `static/main.css` plus the configured color variables.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/). Titles, filenames and category
//! names are escaped on interpolation. The converted document body is the
//! only markup inserted verbatim.

use crate::config::{self, ColorConfig};
use crate::registry::Registry;
use crate::types::Pagination;
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Stylesheet filename at the output root.
pub const STYLESHEET: &str = "main.css";
/// Index filename at the output root.
pub const INDEX_PAGE: &str = "index.html";

const CSS_STATIC: &str = include_str!("../static/main.css");
const GENERATOR: &str = concat!("docx-pages ", env!("CARGO_PKG_VERSION"));

/// Full contents of `main.css`: color variables, then the static rules.
pub fn stylesheet(colors: &ColorConfig) -> String {
    format!("{}\n\n{}", config::generate_color_css(colors), CSS_STATIC)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                meta name="generator" content=(GENERATOR);
                title { (title) }
                link rel="stylesheet" href={ "./" (STYLESHEET) };
            }
            body class=[body_class] {
                (content)
            }
        }
    }
}

/// Prev/next links. An absent neighbour leaves an empty placeholder so the
/// remaining link keeps its side.
pub fn render_pagination(pagination: Pagination<'_>) -> Markup {
    html! {
        nav.pagination {
            div.prev-container {
                @if let Some(prev) = pagination.prev {
                    a.prev href={ "./" (prev.filename) } title={ "Previous: " (prev.title) } {
                        "← Previous"
                    }
                } @else {
                    span {}
                }
            }
            div.next-container {
                @if let Some(next) = pagination.next {
                    a.next href={ "./" (next.filename) } title={ "Next: " (next.title) } {
                        "Next →"
                    }
                } @else {
                    span {}
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// A document page around already image-rewritten `content`.
pub fn render_page(
    content: &str,
    title: &str,
    pagination: Pagination<'_>,
    site_title: &str,
) -> Markup {
    let body = html! {
        header.site-header {
            a.home href={ "./" (INDEX_PAGE) } { (site_title) }
        }
        main.document-page {
            article.document-content {
                (PreEscaped(content))
            }
            (render_pagination(pagination))
        }
    };
    base_document(&format!("{title} | {site_title}"), Some("document"), body)
}

/// The index page: categories in display order, documents in filename order.
pub fn render_index(registry: &Registry, site_title: &str) -> Markup {
    let groups = registry.grouped_by_category();
    let body = html! {
        header.site-header {
            h1 { (site_title) }
        }
        main.index-page {
            @if groups.is_empty() {
                p.empty { "No documents." }
            }
            @for group in &groups {
                section.category {
                    h2 { (group.name) }
                    ul.document-list {
                        @for doc in &group.documents {
                            li {
                                a href={ "./" (doc.filename) } { (doc.title) }
                            }
                        }
                    }
                }
            }
        }
    };
    base_document(site_title, Some("index"), body)
}
