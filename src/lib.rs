//! # docx-pages
//!
//! A batch generator that turns a folder of Word documents into a static,
//! paginated documentation site. The folder is the data source: every `.docx`
//! becomes one page, its filename decides the page name and category, and its
//! embedded images become files next to it.
//!
//! # Architecture: Two-Pass Pipeline
//!
//! ```text
//! 1. Convert   sources/*.docx  →  registry + page bodies  (images extracted as they go)
//! 2. Write     registry        →  output/                 (pages with prev/next, index)
//! ```
//!
//! Pagination needs to know every document's neighbours, so nothing is written
//! until every document has been converted and registered. A document that
//! fails to convert is skipped; the run only fails when no input exists or
//! nothing converted.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Discovery, both passes, and the build report |
//! | [`convert`] | The `Converter` seam, warning filtering, style maps, and the built-in DOCX backend |
//! | [`images`] | Pulls base64 `data:` images out of converted HTML into files |
//! | [`naming`] | Source filename → page filename, and image file naming |
//! | [`categories`] | First-match-wins filename classifier with a fallback |
//! | [`registry`] | Document store, sorted view, pagination, category grouping |
//! | [`metadata`] | Title resolution from converted HTML |
//! | [`render`] | Page and index HTML via Maud, plus the stylesheet |
//! | [`config`] | `config.toml` loading over stock defaults, validation, color CSS |
//! | [`types`] | Shared data model (`Document`, `Category`, `Pagination`) |
//! | [`output`] | CLI output formatting of build and check results |
//!
//! # Design Decisions
//!
//! ## Deterministic Names
//!
//! Page and image filenames are pure functions of the source filename and the
//! image's position in its document. Rebuilding the same inputs produces the
//! same tree, byte for byte, so output can be diffed and deployed by rsync.
//!
//! ## Category Order, Then Filename
//!
//! The reading order (pagination and index) is category display order, then
//! output filename. Discovery order only affects which of two colliding
//! sources wins a page name.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/). Titles, filenames
//! and category names are escaped on interpolation; only the converted
//! document body is inserted verbatim.
//!
//! ## Conversion Behind a Trait
//!
//! The pipeline only sees [`convert::Converter`]. The built-in
//! [`convert::DocxConverter`] reads the package with `zip` and `quick-xml`;
//! tests drive the pipeline with stub converters instead.

pub mod categories;
pub mod config;
pub mod convert;
pub mod images;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
