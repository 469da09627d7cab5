//! Shared test utilities for the docx-pages test suite.
//!
//! Provides fixture builders (minimal `.docx` packages, embedded image
//! markup), test doubles for the two I/O seams ([`Converter`] and
//! [`ImageSink`]), and registry lookups that panic with what *is* available.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! DocxBuilder::new()
//!     .style("Heading1", "heading 1")
//!     .styled_paragraph("Heading1", "Overview")
//!     .write_to(&tmp.path().join("AB12-FOO.docx"));
//!
//! let converter = StubConverter::new().page("x.docx", "<h1>X</h1>");
//! ```

use crate::convert::{Conversion, ConvertError, ConvertOptions, Converter, Warning};
use crate::images::{ImageRef, ImageSink};
use crate::registry::Registry;
use crate::types::Document;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

// =========================================================================
// Embedded image markup
// =========================================================================

/// `<img>` tag carrying `bytes` as a base64 `data:` URI.
pub fn data_img(subtype: &str, bytes: &[u8]) -> String {
    format!(
        r#"<img src="data:image/{subtype};base64,{}" />"#,
        B64.encode(bytes)
    )
}

// =========================================================================
// Image sink double
// =========================================================================

/// Records every write; optionally fails the images at given indices.
#[derive(Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<(String, ImageRef)>>,
    fail_indices: Vec<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails images whose 1-based index is listed, as a full disk would.
    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            writes: Mutex::default(),
            fail_indices: indices.to_vec(),
        }
    }

    /// `(filename, bytes)` of each successful write, in order.
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(name, image)| (name.clone(), image.bytes.clone()))
            .collect()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|(_, image)| image.content_type.clone())
            .collect()
    }
}

impl ImageSink for RecordingSink {
    fn write_image(&self, filename: &str, image: &ImageRef) -> std::io::Result<()> {
        if self.fail_indices.contains(&image.index) {
            return Err(std::io::Error::other("simulated disk error"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((filename.to_string(), image.clone()));
        Ok(())
    }
}

// =========================================================================
// Converter double
// =========================================================================

/// Maps source filenames to canned HTML, warnings, or failures.
///
/// Unknown filenames fail, so a test only converts what it declared.
#[derive(Default)]
pub struct StubConverter {
    pages: HashMap<String, Conversion>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StubConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, source: &str, html: &str) -> Self {
        self.pages.insert(
            source.to_string(),
            Conversion {
                html: html.to_string(),
                warnings: Vec::new(),
            },
        );
        self
    }

    pub fn page_with_warnings(mut self, source: &str, html: &str, warnings: Vec<Warning>) -> Self {
        self.pages.insert(
            source.to_string(),
            Conversion {
                html: html.to_string(),
                warnings,
            },
        );
        self
    }

    pub fn failing(mut self, source: &str, reason: &str) -> Self {
        self.failures.insert(source.to_string(), reason.to_string());
        self
    }

    /// Source filenames in the order they were converted.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Converter for StubConverter {
    fn convert(&self, path: &Path, _options: &ConvertOptions) -> Result<Conversion, ConvertError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(name.clone());
        if let Some(reason) = self.failures.get(&name) {
            return Err(ConvertError::Failed(reason.clone()));
        }
        self.pages
            .get(&name)
            .cloned()
            .ok_or_else(|| ConvertError::Failed(format!("no stub page for {name}")))
    }
}

// =========================================================================
// Minimal .docx packages
// =========================================================================

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Builds a minimal WordprocessingML package in memory.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    styles: Vec<(String, String)>,
    relationships: Vec<(String, String, String, bool)>,
    media: Vec<(String, Vec<u8>)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!(
            "<w:p><w:r><w:t>{}</w:t></w:r></w:p>",
            xml_escape(text)
        ));
        self
    }

    pub fn styled_paragraph(mut self, style_id: &str, text: &str) -> Self {
        self.body.push_str(&format!(
            "<w:p><w:pPr><w:pStyle w:val=\"{style_id}\"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>",
            xml_escape(text)
        ));
        self
    }

    /// Body XML inserted verbatim.
    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Declare a style in `word/styles.xml`.
    pub fn style(mut self, id: &str, name: &str) -> Self {
        self.styles.push((id.to_string(), name.to_string()));
        self
    }

    pub fn relationship(mut self, id: &str, kind: &str, target: &str, external: bool) -> Self {
        self.relationships
            .push((id.to_string(), kind.to_string(), target.to_string(), external));
        self
    }

    /// Add a media part and its relationship, without referencing it.
    pub fn media(mut self, rel_id: &str, target: &str, bytes: &[u8]) -> Self {
        self = self.relationship(rel_id, "image", target, false);
        self.media.push((format!("word/{target}"), bytes.to_vec()));
        self
    }

    /// Add a media part and a paragraph holding it as an inline drawing.
    pub fn image(self, rel_id: &str, target: &str, bytes: &[u8], alt: &str) -> Self {
        let drawing = format!(
            "<w:p><w:r><w:drawing><wp:inline><wp:docPr id=\"1\" name=\"Picture\" descr=\"{}\"/>\
             <a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed=\"{rel_id}\"/>\
             </pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>",
            xml_escape(alt)
        );
        self.media(rel_id, target, bytes).raw(&drawing)
    }

    fn document_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" \
             xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\" \
             xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\" \
             xmlns:mc=\"http://schemas.openxmlformats.org/markup-compatibility/2006\" \
             xmlns:v=\"urn:schemas-microsoft-com:vml\">\
             <w:body>{}</w:body></w:document>",
            self.body
        )
    }

    fn styles_xml(&self) -> String {
        let styles: String = self
            .styles
            .iter()
            .map(|(id, name)| {
                format!(
                    "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{}\"/></w:style>",
                    xml_escape(name)
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">{styles}</w:styles>"
        )
    }

    fn rels_xml(&self) -> String {
        let rels: String = self
            .relationships
            .iter()
            .map(|(id, kind, target, external)| {
                let mode = if *external {
                    " TargetMode=\"External\""
                } else {
                    ""
                };
                format!(
                    "<Relationship Id=\"{id}\" \
                     Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/{kind}\" \
                     Target=\"{}\"{mode}/>",
                    xml_escape(target)
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{rels}</Relationships>"
        )
    }

    fn package(&self, include_document: bool) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut parts: Vec<(String, Vec<u8>)> = vec![
            ("word/styles.xml".to_string(), self.styles_xml().into_bytes()),
            (
                "word/_rels/document.xml.rels".to_string(),
                self.rels_xml().into_bytes(),
            ),
        ];
        if include_document {
            parts.push((
                "word/document.xml".to_string(),
                self.document_xml().into_bytes(),
            ));
        }
        parts.extend(self.media.iter().cloned());
        for (name, data) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(&data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.package(true)
    }

    /// A package lacking `word/document.xml`.
    pub fn to_bytes_without_document(&self) -> Vec<u8> {
        self.package(false)
    }

    pub fn write_to(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

// =========================================================================
// Registry lookups: panic with a clear message on miss
// =========================================================================

/// Find a document by output filename. Panics if not found.
pub fn find_document<'a>(registry: &'a Registry, filename: &str) -> &'a Document {
    registry.get(filename).unwrap_or_else(|| {
        let names = document_filenames(registry);
        panic!("document '{filename}' not found. Available: {names:?}")
    })
}

/// All output filenames in sorted order.
pub fn document_filenames(registry: &Registry) -> Vec<&str> {
    registry
        .sorted_view()
        .into_iter()
        .map(|d| d.filename.as_str())
        .collect()
}
