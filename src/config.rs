//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by an optional `config.toml` in the input directory, or by an
//! explicit file passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Documentation"        # Index heading and <title> suffix
//!
//! [images]
//! naming = "source_filename"     # or "sequential"
//!
//! [categories]
//! match_on = "output_filename"   # or "source_filename"
//!
//! [[categories.rules]]
//! name = "General Information"
//! pattern = "foreword|introduction"
//! order = 1
//!
//! [categories.fallback]
//! name = "Other"
//! order = 4
//!
//! [conversion]
//! style_map = ["p[style-name='Heading 1'] => h1:fresh"]
//!
//! [[conversion.ignored_warnings]]
//! kind = "warning"
//! pattern = "^Unrecognised paragraph style: 'Body'"
//!
//! [colors.light]
//! primary = "#2563eb"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables merge key by key, but arrays replace:
//! setting `[[categories.rules]]` replaces the whole stock rule table.
//!
//! Unknown keys are rejected to catch typos early.

use crate::categories::{CategoryRule, MatchTarget};
use crate::convert::{StyleMap, WarningFilter, WarningKind};
use crate::naming::ImageNaming;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the optional config file in the input directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults reproducing the stock setup. User config files
/// need only specify the values they want to override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub images: ImagesConfig,
    pub categories: CategoriesConfig,
    pub conversion: ConversionConfig,
    pub colors: ColorConfig,
}

impl SiteConfig {
    /// Check everything that would otherwise fail halfway through a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.title must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        let names = self
            .categories
            .rules
            .iter()
            .map(|r| r.name.as_str())
            .chain(std::iter::once(self.categories.fallback.name.as_str()));
        for name in names {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "category names must not be empty".into(),
                ));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Validation(format!(
                    "duplicate category name '{name}'"
                )));
            }
        }

        // The index and pagination group by order, so each order must name one category
        let mut orders = HashMap::new();
        let ranked = self
            .categories
            .rules
            .iter()
            .map(|r| (r.order, r.name.as_str()))
            .chain(std::iter::once((
                self.categories.fallback.order,
                self.categories.fallback.name.as_str(),
            )));
        for (order, name) in ranked {
            if let Some(other) = orders.insert(order, name) {
                return Err(ConfigError::Validation(format!(
                    "categories '{other}' and '{name}' share order {order}"
                )));
            }
        }

        for rule in &self.categories.rules {
            CategoryRule::new(&rule.name, &rule.pattern, rule.order)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        self.conversion.warning_filter()?;
        self.conversion.style_map()?;
        Ok(())
    }
}

/// Site-wide presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Heading of the index page; suffix of every page `<title>`.
    pub title: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// How extracted images are named. The CLI positional argument wins.
    pub naming: ImageNaming,
}

/// The ordered category rule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoriesConfig {
    /// Which filename the patterns are tested against.
    pub match_on: MatchTarget,
    /// Evaluated in order; first match wins.
    pub rules: Vec<CategoryRuleConfig>,
    /// Used when no rule matches.
    pub fallback: FallbackCategory,
}

impl Default for CategoriesConfig {
    fn default() -> Self {
        let rule = |name: &str, pattern: &str, order| CategoryRuleConfig {
            name: name.to_string(),
            pattern: pattern.to_string(),
            order,
        };
        Self {
            match_on: MatchTarget::default(),
            rules: vec![
                rule("General Information", "foreword|introduction", 1),
                rule("Technical Documentation", "technical|spec", 2),
                rule("User Guides", "guide|manual", 3),
            ],
            fallback: FallbackCategory::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRuleConfig {
    pub name: String,
    /// Case-insensitive regular expression.
    pub pattern: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackCategory {
    pub name: String,
    pub order: u32,
}

impl Default for FallbackCategory {
    fn default() -> Self {
        Self {
            name: "Other".to_string(),
            order: 4,
        }
    }
}

/// Settings handed to the converter and applied to its warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionConfig {
    /// Style map lines, e.g. `p[style-name='Heading 1'] => h1:fresh`.
    pub style_map: Vec<String>,
    /// Converter warnings that are dropped before logging.
    pub ignored_warnings: Vec<IgnoredWarning>,
}

impl ConversionConfig {
    pub fn warning_filter(&self) -> Result<WarningFilter, ConfigError> {
        let ignored = self
            .ignored_warnings
            .iter()
            .map(|w| {
                Regex::new(&w.pattern)
                    .map(|re| (w.kind, re))
                    .map_err(|e| {
                        ConfigError::Validation(format!(
                            "invalid ignored warning pattern '{}': {e}",
                            w.pattern
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(WarningFilter::new(ignored))
    }

    pub fn style_map(&self) -> Result<StyleMap, ConfigError> {
        StyleMap::parse(&self.style_map).map_err(|e| ConfigError::Validation(e.to_string()))
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        let ignore = |kind, pattern: &str| IgnoredWarning {
            kind,
            pattern: pattern.to_string(),
        };
        Self {
            style_map: STOCK_STYLE_MAP.iter().map(|s| s.to_string()).collect(),
            ignored_warnings: vec![
                ignore(
                    WarningKind::Warning,
                    "^Unrecognised paragraph style: 'Body'",
                ),
                ignore(
                    WarningKind::Warning,
                    "^Unrecognised paragraph style: 'Table Header Row'",
                ),
                ignore(
                    WarningKind::Warning,
                    "^Unrecognised paragraph style: 'Table Data'",
                ),
                ignore(
                    WarningKind::Warning,
                    "^Unrecognised paragraph style: 'Table/Graphic Header'",
                ),
                ignore(
                    WarningKind::Warning,
                    "^Unrecognised run style: 'Heading 3 Char'",
                ),
            ],
        }
    }
}

const STOCK_STYLE_MAP: &[&str] = &[
    "p[style-name='Normal'] => p:fresh",
    "p[style-name='Title'] => h1.title:fresh",
    "p[style-name='Heading 1'] => h1:fresh",
    "p[style-name='Heading 2'] => h2:fresh",
    "p[style-name='Heading 3'] => h3:fresh",
    "p[style-name='Heading 4'] => h4:fresh",
    "p[style-name='Heading 5'] => h5:fresh",
    "p[style-name='Heading 6'] => h6:fresh",
    "p[style-name='Subtitle'] => h2.subtitle:fresh",
    "p[style-name='Quote'] => blockquote:fresh",
    "p[style-name='Intense Quote'] => blockquote.intense:fresh",
    "p[style-name='List Paragraph'] => p.list:fresh",
    "p[style-name='TOC 1'] => p.toc1:fresh",
    "p[style-name='TOC 2'] => p.toc2:fresh",
    "p[style-name='TOC 3'] => p.toc3:fresh",
    "p[style-name='Caption'] => figcaption:fresh",
    "p[style-name='Footnote Text'] => p.footnote:fresh",
    "p[style-name='Endnote Text'] => p.endnote:fresh",
    "p[style-name='Bibliography'] => p.bibliography:fresh",
    "r[style-name='Strong'] => strong",
    "r[style-name='Emphasis'] => em",
    "r[style-name='Subtle Emphasis'] => em.subtle",
    "r[style-name='Intense Emphasis'] => em.intense",
    "r[style-name='Book Title'] => cite",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoredWarning {
    pub kind: WarningKind,
    /// Regular expression tested against the warning message.
    pub pattern: String,
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    /// Links, active headings, accents.
    pub primary: String,
    /// Muted text: category labels, pagination hints.
    pub secondary: String,
    pub background: String,
    pub text: String,
    pub border: String,
    /// Background of hovered index entries and pagination links.
    pub hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            primary: "#2563eb".to_string(),
            secondary: "#475569".to_string(),
            background: "#ffffff".to_string(),
            text: "#1f2937".to_string(),
            border: "#e5e7eb".to_string(),
            hover: "#f8fafc".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            primary: "#60a5fa".to_string(),
            secondary: "#94a3b8".to_string(),
            background: "#0f172a".to_string(),
            text: "#e5e7eb".to_string(),
            border: "#334155".to_string(),
            hover: "#1e293b".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer that user overrides are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    load_raw_file(&config_path).map(Some)
}

fn load_raw_file(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory, over stock defaults.
pub fn load_config(dir: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Load config from an explicit file, over stock defaults. The file must exist.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), Some(load_raw_file(path)?))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docx-pages Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as config.toml in the input directory, or pass
# --config <path>. Tables merge with the defaults key by key; arrays
# (rules, style_map, ignored_warnings) replace the defaults entirely.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Heading of index.html and suffix of every page title.
title = "Documentation"

# ---------------------------------------------------------------------------
# Extracted images
# ---------------------------------------------------------------------------
[images]
# "source_filename": <page>_0001.jpeg, unique per page.
# "sequential":      image_0001.jpeg; pages overwrite each other's images.
naming = "source_filename"

# ---------------------------------------------------------------------------
# Categories
# ---------------------------------------------------------------------------
[categories]
# Which name the patterns are tested against:
# "output_filename" (e.g. ab12_foo.html) or "source_filename" (AB12-FOO.docx).
match_on = "output_filename"

# Evaluated top to bottom; the first matching pattern wins.
# Patterns are case-insensitive regular expressions.
[[categories.rules]]
name = "General Information"
pattern = "foreword|introduction"
order = 1

[[categories.rules]]
name = "Technical Documentation"
pattern = "technical|spec"
order = 2

[[categories.rules]]
name = "User Guides"
pattern = "guide|manual"
order = 3

# Documents matching no rule.
[categories.fallback]
name = "Other"
order = 4

# ---------------------------------------------------------------------------
# Conversion
# ---------------------------------------------------------------------------
[conversion]
# Word style name -> HTML element. Unmapped paragraphs become <p>.
style_map = [
    "p[style-name='Normal'] => p:fresh",
    "p[style-name='Title'] => h1.title:fresh",
    "p[style-name='Heading 1'] => h1:fresh",
    "p[style-name='Heading 2'] => h2:fresh",
    "p[style-name='Heading 3'] => h3:fresh",
    "p[style-name='Heading 4'] => h4:fresh",
    "p[style-name='Heading 5'] => h5:fresh",
    "p[style-name='Heading 6'] => h6:fresh",
    "p[style-name='Subtitle'] => h2.subtitle:fresh",
    "p[style-name='Quote'] => blockquote:fresh",
    "p[style-name='Intense Quote'] => blockquote.intense:fresh",
    "p[style-name='List Paragraph'] => p.list:fresh",
    "p[style-name='TOC 1'] => p.toc1:fresh",
    "p[style-name='TOC 2'] => p.toc2:fresh",
    "p[style-name='TOC 3'] => p.toc3:fresh",
    "p[style-name='Caption'] => figcaption:fresh",
    "p[style-name='Footnote Text'] => p.footnote:fresh",
    "p[style-name='Endnote Text'] => p.endnote:fresh",
    "p[style-name='Bibliography'] => p.bibliography:fresh",
    "r[style-name='Strong'] => strong",
    "r[style-name='Emphasis'] => em",
    "r[style-name='Subtle Emphasis'] => em.subtle",
    "r[style-name='Intense Emphasis'] => em.intense",
    "r[style-name='Book Title'] => cite",
]

# Converter warnings to drop. kind is "warning" or "error";
# pattern is a regular expression tested against the message.
[[conversion.ignored_warnings]]
kind = "warning"
pattern = "^Unrecognised paragraph style: 'Body'"

[[conversion.ignored_warnings]]
kind = "warning"
pattern = "^Unrecognised paragraph style: 'Table Header Row'"

[[conversion.ignored_warnings]]
kind = "warning"
pattern = "^Unrecognised paragraph style: 'Table Data'"

[[conversion.ignored_warnings]]
kind = "warning"
pattern = "^Unrecognised paragraph style: 'Table/Graphic Header'"

[[conversion.ignored_warnings]]
kind = "warning"
pattern = "^Unrecognised run style: 'Heading 3 Char'"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
primary = "#2563eb"
secondary = "#475569"
background = "#ffffff"
text = "#1f2937"
border = "#e5e7eb"
hover = "#f8fafc"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
primary = "#60a5fa"
secondary = "#94a3b8"
background = "#0f172a"
text = "#e5e7eb"
border = "#334155"
hover = "#1e293b"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-primary: {light_primary};
    --color-secondary: {light_secondary};
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-border: {light_border};
    --color-hover: {light_hover};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-primary: {dark_primary};
        --color-secondary: {dark_secondary};
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-border: {dark_border};
        --color-hover: {dark_hover};
    }}
}}"#,
        light_primary = colors.light.primary,
        light_secondary = colors.light.secondary,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_border = colors.light.border,
        light_hover = colors.light.hover,
        dark_primary = colors.dark.primary,
        dark_secondary = colors.dark.secondary,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_border = colors.dark.border,
        dark_hover = colors.dark.hover,
    )
}
