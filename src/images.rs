//! Extraction of embedded images from converted HTML.
//!
//! The converter inlines every picture as a base64 `data:` URI. Before a page
//! is written, each such `<img>` is visited once, left to right, and:
//!
//! 1. assigned the next per-page index (starting at 1)
//! 2. decoded from base64
//! 3. written to `images/<name>` through an [`ImageSink`]
//! 4. re-pointed at `./images/<name>`
//!
//! A failure in steps 2–3 is logged and recorded; that tag keeps its original
//! `data:` URI and the remaining images are still processed. The index is
//! consumed either way, so later images keep stable names.
//!
//! Names come from [`crate::naming::image_filename`]. All images are written
//! with a `.jpeg` name regardless of their declared content type.

use crate::naming::{ImageNaming, image_filename};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, error};

/// Directory under the output root that receives extracted images.
pub const IMAGES_DIR: &str = "images";

static DATA_IMG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc="(data:image/([^;"]+);base64,([^"]*))""#)
        .expect("data image pattern must compile")
});

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One embedded image, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// 1-based position within the page.
    pub index: usize,
    /// Declared subtype, e.g. `png` from `data:image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Destination for extracted image bytes.
pub trait ImageSink {
    fn write_image(&self, filename: &str, image: &ImageRef) -> std::io::Result<()>;
}

/// Writes images into a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageSink for DirSink {
    /// Creates the directory on first use, so a run that extracts nothing
    /// leaves no trace.
    fn write_image(&self, filename: &str, image: &ImageRef) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(filename), &image.bytes)
    }
}

/// Naming inputs for one page's images. Built fresh for every page.
#[derive(Debug, Clone)]
pub struct ImageContext {
    pub naming: ImageNaming,
    /// Sanitized page filename without `.html`.
    pub page_stem: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub index: usize,
    pub filename: String,
    pub reason: String,
}

/// Rewritten HTML plus what happened to each image.
#[derive(Debug, Clone, Default)]
pub struct ExtractedImages {
    pub html: String,
    /// Filenames written, in order of appearance.
    pub written: Vec<String>,
    pub failures: Vec<ImageFailure>,
}

/// Extract every embedded image in `html`, rewriting `src` on success.
pub fn extract_images(html: &str, ctx: &ImageContext, sink: &dyn ImageSink) -> ExtractedImages {
    let mut out = String::with_capacity(html.len());
    let mut written = Vec::new();
    let mut failures = Vec::new();
    let mut last = 0;

    for (i, caps) in DATA_IMG.captures_iter(html).enumerate() {
        let index = i + 1;
        let (Some(uri), Some(subtype), Some(payload)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        let filename = image_filename(ctx.naming, &ctx.page_stem, index);
        out.push_str(&html[last..uri.start()]);

        match save_image(index, subtype.as_str(), payload.as_str(), &filename, sink) {
            Ok(()) => {
                debug!("Saved image: {filename}");
                out.push_str("./");
                out.push_str(IMAGES_DIR);
                out.push('/');
                out.push_str(&filename);
                written.push(filename);
            }
            Err(e) => {
                error!("Failed to process image {index} ({filename}): {e}");
                out.push_str(uri.as_str());
                failures.push(ImageFailure {
                    index,
                    filename,
                    reason: e.to_string(),
                });
            }
        }
        last = uri.end();
    }
    out.push_str(&html[last..]);

    ExtractedImages {
        html: out,
        written,
        failures,
    }
}

fn save_image(
    index: usize,
    subtype: &str,
    payload: &str,
    filename: &str,
    sink: &dyn ImageSink,
) -> Result<(), ImageError> {
    let image = ImageRef {
        index,
        content_type: format!("image/{subtype}"),
        bytes: B64.decode(payload.trim())?,
    };
    sink.write_image(filename, &image)
        .map_err(|source| ImageError::Write {
            path: format!("{IMAGES_DIR}/{filename}"),
            source,
        })
}
