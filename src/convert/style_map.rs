//! Style map: Word style names → HTML elements.
//!
//! Each line maps a paragraph or run style to an element:
//!
//! ```text
//! p[style-name='Heading 1'] => h1:fresh
//! p[style-name='Title'] => h1.title:fresh
//! r[style-name='Strong'] => strong
//! ```
//!
//! Style names compare case-insensitively (Word stores built-in names in lower
//! case, `heading 1`). The `:fresh` suffix is accepted for compatibility and
//! has no effect: every paragraph opens a new element anyway.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*([pr])\[style-name='([^']*)'\]\s*=>\s*([A-Za-z][A-Za-z0-9]*)((?:\.[A-Za-z0-9_-]+)*)(:fresh)?\s*$",
    )
    .expect("style map pattern must compile")
});

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StyleMapError {
    #[error("Invalid style map line: {0}")]
    InvalidLine(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Paragraph,
    Run,
}

/// Element a style is rendered as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTarget {
    pub tag: String,
    pub classes: Vec<String>,
}

impl StyleTarget {
    /// Opening tag, e.g. `<h1 class="title">`.
    pub fn open(&self) -> String {
        if self.classes.is_empty() {
            format!("<{}>", self.tag)
        } else {
            format!("<{} class=\"{}\">", self.tag, self.classes.join(" "))
        }
    }

    pub fn close(&self) -> String {
        format!("</{}>", self.tag)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    entries: HashMap<(StyleKind, String), StyleTarget>,
}

impl StyleMap {
    /// Parse style map lines. Blank lines and `#` comments are skipped.
    ///
    /// Later lines override earlier ones for the same style.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, StyleMapError> {
        let mut entries = HashMap::new();
        for line in lines {
            let line = line.as_ref();
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let caps = LINE
                .captures(line)
                .ok_or_else(|| StyleMapError::InvalidLine(line.to_string()))?;
            let kind = if &caps[1] == "p" {
                StyleKind::Paragraph
            } else {
                StyleKind::Run
            };
            let classes = caps[4]
                .split('.')
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            entries.insert(
                (kind, caps[2].to_lowercase()),
                StyleTarget {
                    tag: caps[3].to_lowercase(),
                    classes,
                },
            );
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, kind: StyleKind, style_name: &str) -> Option<&StyleTarget> {
        self.entries.get(&(kind, style_name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
