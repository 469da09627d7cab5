//! Built-in `.docx` → HTML backend.
//!
//! A `.docx` file is a zip package. Three parts are read:
//!
//! | Part | Used for |
//! |---|---|
//! | `word/document.xml` | body content (required) |
//! | `word/styles.xml` | style ID → style name, for the style map |
//! | `word/_rels/document.xml.rels` | hyperlink targets and embedded media |
//!
//! The body is streamed once with `quick-xml`. Supported content: paragraphs
//! (mapped through the [`StyleMap`], default `<p>`), runs with bold/italic and
//! mapped run styles, hyperlinks, tables, line breaks, tabs, and inline images
//! inlined as base64 `data:` URIs. Empty paragraphs are dropped.
//! `mc:Fallback` branches are skipped so alternate-content images appear once.
//!
//! Styles with no style map entry produce the warnings
//! `Unrecognised paragraph style: 'Name' (Style ID: Id)` and
//! `Unrecognised run style: ...`; each distinct warning is reported once.

use super::{
    Conversion, ConvertError, ConvertOptions, Converter, StyleKind, StyleMap, StyleTarget, Warning,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const RELS_PART: &str = "word/_rels/document.xml.rels";

/// Reads `.docx` packages from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxConverter;

impl Converter for DocxConverter {
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<Conversion, ConvertError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        convert_archive(&mut archive, &options.style_map)
    }
}

/// Convert an already-opened package.
pub fn convert_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    style_map: &StyleMap,
) -> Result<Conversion, ConvertError> {
    let document = read_part(archive, DOCUMENT_PART)?
        .ok_or_else(|| ConvertError::MissingPart(DOCUMENT_PART.to_string()))?;
    let style_names = match read_part(archive, STYLES_PART)? {
        Some(xml) => parse_style_names(&xml)?,
        None => HashMap::new(),
    };
    let relationships = match read_part(archive, RELS_PART)? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };

    let mut body = BodyWriter {
        archive,
        style_map,
        style_names: &style_names,
        relationships: &relationships,
        html: String::new(),
        paragraphs: Vec::new(),
        warnings: Vec::new(),
        in_text: false,
        in_paragraph_props: false,
        in_run_props: false,
        skip_depth: 0,
        pending_alt: None,
    };

    let mut reader = Reader::from_reader(document.as_slice());
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(DOCUMENT_PART, e))?;
        match event {
            Event::Start(e) => body.start(&e),
            Event::Empty(e) => {
                body.start(&e);
                body.end(e.name().as_ref());
            }
            Event::End(e) => body.end(e.name().as_ref()),
            Event::Text(t) if body.wants_text() => {
                let text = t.unescape().map_err(|e| xml_error(DOCUMENT_PART, e))?;
                body.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Conversion {
        html: body.html,
        warnings: body.warnings,
    })
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, ConvertError> {
    match archive.by_name(name) {
        Ok(mut part) => {
            let mut data = Vec::new();
            part.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> ConvertError {
    ConvertError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `<w:b/>` is on; `<w:b w:val="0"/>` (or false/off/none) is off.
fn toggle_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr(e, b"w:val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// ============================================================================
// styles.xml and relationships
// ============================================================================

fn parse_style_names(xml: &[u8]) -> Result<HashMap<String, String>, ConvertError> {
    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(STYLES_PART, e))?
        {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"w:style" => current_id = attr(&e, b"w:styleId"),
                b"w:name" => {
                    if let (Some(id), Some(name)) = (&current_id, attr(&e, b"w:val")) {
                        names.insert(id.clone(), name);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"w:style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    target: String,
    external: bool,
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, Relationship>, ConvertError> {
    let mut rels = HashMap::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(RELS_PART, e))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    let external = attr(&e, b"TargetMode").as_deref() == Some("External");
                    rels.insert(id, Relationship { target, external });
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rels)
}

/// Resolve a relationship target against the `word/` directory.
fn resolve_part_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "image/png",
    }
}

// ============================================================================
// Body writer
// ============================================================================

#[derive(Debug, Default)]
struct RunState {
    style_id: Option<String>,
    bold: bool,
    italic: bool,
    html: String,
}

#[derive(Debug, Default)]
struct ParagraphState {
    style_id: Option<String>,
    run: Option<RunState>,
    /// One entry per open `w:hyperlink`; true if an `<a>` was emitted for it.
    links: Vec<bool>,
    html: String,
}

struct BodyWriter<'a, R: Read + Seek> {
    archive: &'a mut ZipArchive<R>,
    style_map: &'a StyleMap,
    style_names: &'a HashMap<String, String>,
    relationships: &'a HashMap<String, Relationship>,
    html: String,
    /// Paragraphs nest when a text box sits inside a run.
    paragraphs: Vec<ParagraphState>,
    warnings: Vec<Warning>,
    in_text: bool,
    in_paragraph_props: bool,
    in_run_props: bool,
    skip_depth: usize,
    pending_alt: Option<String>,
}

impl<R: Read + Seek> BodyWriter<'_, R> {
    fn wants_text(&self) -> bool {
        self.in_text && self.skip_depth == 0
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        match e.name().as_ref() {
            b"mc:Fallback" => self.skip_depth = 1,
            b"w:p" => self.paragraphs.push(ParagraphState::default()),
            b"w:pPr" => self.in_paragraph_props = true,
            b"w:pStyle" if self.in_paragraph_props => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.style_id = attr(e, b"w:val");
                }
            }
            b"w:r" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    p.run = Some(RunState::default());
                }
            }
            b"w:rPr" if !self.in_paragraph_props => self.in_run_props = true,
            b"w:rStyle" if self.in_run_props => {
                if let Some(run) = self.current_run() {
                    run.style_id = attr(e, b"w:val");
                }
            }
            b"w:b" if self.in_run_props => {
                let on = toggle_on(e);
                if let Some(run) = self.current_run() {
                    run.bold = on;
                }
            }
            b"w:i" if self.in_run_props => {
                let on = toggle_on(e);
                if let Some(run) = self.current_run() {
                    run.italic = on;
                }
            }
            b"w:t" => self.in_text = true,
            b"w:tab" if !self.in_paragraph_props => self.push_inline("\t"),
            b"w:br" => {
                if attr(e, b"w:type").as_deref() != Some("page") {
                    self.push_inline("<br />");
                }
            }
            b"w:hyperlink" => self.open_link(e),
            b"w:tbl" => self.push_block("<table>"),
            b"w:tr" => self.push_block("<tr>"),
            b"w:tc" => self.push_block("<td>"),
            b"wp:docPr" => self.pending_alt = attr(e, b"descr"),
            _ => match e.local_name().as_ref() {
                b"blip" => {
                    if let Some(id) = attr(e, b"r:embed") {
                        self.image(&id);
                    }
                }
                b"imagedata" => {
                    if let Some(id) = attr(e, b"r:id") {
                        self.image(&id);
                    }
                }
                _ => {}
            },
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        match name {
            b"w:p" => {
                if let Some(mut p) = self.paragraphs.pop() {
                    self.close_run(&mut p);
                    let html = self.render_paragraph(p);
                    self.push_block(&html);
                }
            }
            b"w:pPr" => self.in_paragraph_props = false,
            b"w:rPr" => self.in_run_props = false,
            b"w:r" => {
                if let Some(mut p) = self.paragraphs.pop() {
                    self.close_run(&mut p);
                    self.paragraphs.push(p);
                }
            }
            b"w:t" => self.in_text = false,
            b"w:hyperlink" => {
                if let Some(p) = self.paragraphs.last_mut() {
                    if p.links.pop() == Some(true) {
                        p.html.push_str("</a>");
                    }
                }
            }
            b"w:tbl" => self.push_block("</table>"),
            b"w:tr" => self.push_block("</tr>"),
            b"w:tc" => self.push_block("</td>"),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let mut escaped = String::with_capacity(text.len());
        push_escaped(&mut escaped, text);
        self.push_inline(&escaped);
    }

    fn current_run(&mut self) -> Option<&mut RunState> {
        self.paragraphs.last_mut().and_then(|p| p.run.as_mut())
    }

    /// Append to the open run, else the open paragraph, else the body.
    fn push_inline(&mut self, html: &str) {
        match self.paragraphs.last_mut() {
            Some(p) => match p.run.as_mut() {
                Some(run) => run.html.push_str(html),
                None => p.html.push_str(html),
            },
            None => self.html.push_str(html),
        }
    }

    /// Append to the open paragraph, else the body.
    fn push_block(&mut self, html: &str) {
        match self.paragraphs.last_mut() {
            Some(p) => p.html.push_str(html),
            None => self.html.push_str(html),
        }
    }

    fn warn(&mut self, message: String) {
        let warning = Warning::warning(message);
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn style_name(&self, id: &str) -> String {
        self.style_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn close_run(&mut self, p: &mut ParagraphState) {
        let Some(run) = p.run.take() else {
            return;
        };
        if run.html.is_empty() {
            return;
        }
        let mut html = run.html;
        if run.italic {
            html = format!("<em>{html}</em>");
        }
        if run.bold {
            html = format!("<strong>{html}</strong>");
        }
        if let Some(id) = run.style_id {
            let name = self.style_name(&id);
            match self.style_map.lookup(StyleKind::Run, &name) {
                Some(target) => html = format!("{}{html}{}", target.open(), target.close()),
                None => self.warn(format!(
                    "Unrecognised run style: '{name}' (Style ID: {id})"
                )),
            }
        }
        p.html.push_str(&html);
    }

    fn render_paragraph(&mut self, p: ParagraphState) -> String {
        if p.html.trim().is_empty() {
            return String::new();
        }
        let default_target = StyleTarget {
            tag: "p".to_string(),
            classes: Vec::new(),
        };
        let target = match &p.style_id {
            Some(id) => {
                let name = self.style_name(id);
                match self.style_map.lookup(StyleKind::Paragraph, &name) {
                    Some(target) => target.clone(),
                    None => {
                        if !name.eq_ignore_ascii_case("normal") {
                            self.warn(format!(
                                "Unrecognised paragraph style: '{name}' (Style ID: {id})"
                            ));
                        }
                        default_target
                    }
                }
            }
            None => default_target,
        };
        format!("{}{}{}", target.open(), p.html, target.close())
    }

    fn open_link(&mut self, e: &BytesStart<'_>) {
        let href = match (attr(e, b"r:id"), attr(e, b"w:anchor")) {
            (Some(id), _) => self.relationships.get(&id).map(|r| r.target.clone()),
            (None, Some(anchor)) => Some(format!("#{anchor}")),
            (None, None) => None,
        };
        let Some(p) = self.paragraphs.last_mut() else {
            return;
        };
        match href {
            Some(href) => {
                p.html.push_str("<a href=\"");
                push_escaped(&mut p.html, &href);
                p.html.push_str("\">");
                p.links.push(true);
            }
            None => p.links.push(false),
        }
    }

    fn image(&mut self, rel_id: &str) {
        let alt = self.pending_alt.take();
        let Some(rel) = self.relationships.get(rel_id) else {
            self.warn(format!("Could not find image relationship {rel_id}"));
            return;
        };
        if rel.external {
            self.warn(format!("Linked image not embedded: {}", rel.target));
            return;
        }
        let path = resolve_part_path(&rel.target);
        let bytes = match read_part(self.archive, &path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.warn(format!("Could not find image file {path}"));
                return;
            }
            Err(e) => {
                self.warn(format!("Could not read image file {path}: {e}"));
                return;
            }
        };

        let content_type = content_type_for(&path);
        if matches!(content_type, "image/x-emf" | "image/x-wmf" | "image/tiff") {
            self.warn(format!(
                "Image of type {content_type} is unlikely to display in web browsers"
            ));
        }

        let mut html = String::from("<img");
        if let Some(alt) = alt.filter(|a| !a.trim().is_empty()) {
            html.push_str(" alt=\"");
            push_escaped(&mut html, &alt);
            html.push('"');
        }
        html.push_str(" src=\"data:");
        html.push_str(content_type);
        html.push_str(";base64,");
        html.push_str(&B64.encode(bytes));
        html.push_str("\" />");
        self.push_inline(&html);
    }
}
