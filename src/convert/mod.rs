//! Word document conversion: the collaborator boundary.
//!
//! Turning WordprocessingML into HTML is delegated to a [`Converter`]. The
//! pipeline only relies on the contract:
//!
//! ```text
//! convert(path, options{style_map}) -> { html, warnings[] }
//! ```
//!
//! The production implementation is [`DocxConverter`], a small reader that
//! covers paragraphs, headings, bold/italic runs, hyperlinks, tables, breaks
//! and inline images (as base64 `data:` URIs). Tests of the pipeline plug in
//! stub converters instead.
//!
//! Warnings pass through a [`WarningFilter`] built from the configured
//! ignore-list before they are logged.

pub mod docx;
pub mod style_map;
pub mod warnings;

pub use docx::DocxConverter;
pub use style_map::{StyleKind, StyleMap, StyleMapError, StyleTarget};
pub use warnings::{Warning, WarningFilter, WarningKind};

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a valid .docx package: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Missing package part: {0}")]
    MissingPart(String),
    #[error("Malformed XML in {part}: {message}")]
    Xml { part: String, message: String },
    #[error("Conversion failed: {0}")]
    Failed(String),
}

/// Options passed to every conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub style_map: StyleMap,
}

/// Result of converting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    /// Body HTML fragment (no `<html>`/`<body>` wrapper).
    pub html: String,
    pub warnings: Vec<Warning>,
}

/// Converts one Word document into an HTML fragment.
pub trait Converter {
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Conversion, ConvertError>;
}
