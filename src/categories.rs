//! Category classification as an ordered rule table.
//!
//! Rules are evaluated in their declared order and the first pattern that
//! matches wins. A mandatory fallback arm catches everything else, so
//! [`Classifier::classify`] is total: every name gets exactly one category,
//! and the same name always gets the same one.
//!
//! Patterns are case-insensitive regular expressions tested with `is_match`,
//! i.e. anywhere in the name.
//!
//! ## Which name is matched
//!
//! Patterns can be tested against the sanitized output filename (the default)
//! or against the original source filename. The two can disagree, because
//! sanitization may drop the very substring a pattern looks for:
//!
//! ```text
//! source:  X1-REF User Guide.docx   → matches "guide" → User Guides
//! output:  x1_ref.html              → no rule matches → Other
//! ```
//!
//! The choice is explicit in config (`categories.match_on`).

use crate::config::CategoriesConfig;
use crate::types::Category;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("Invalid pattern for category '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// Which filename the category patterns are tested against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    /// The sanitized page filename, e.g. `x1_ref.html`.
    #[default]
    OutputFilename,
    /// The original document filename, e.g. `X1-REF User Guide.docx`.
    SourceFilename,
}

/// A category together with the pattern that selects it.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pattern: Regex,
}

impl CategoryRule {
    pub fn new(name: &str, pattern: &str, order: u32) -> Result<Self, CategoryError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| CategoryError::InvalidPattern {
                name: name.to_string(),
                source,
            })?;
        Ok(Self {
            category: Category {
                name: name.to_string(),
                order,
            },
            pattern,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<CategoryRule>,
    fallback: Category,
    target: MatchTarget,
}

impl Classifier {
    pub fn new(rules: Vec<CategoryRule>, fallback: Category, target: MatchTarget) -> Self {
        Self {
            rules,
            fallback,
            target,
        }
    }

    /// Compile the configured rule table.
    pub fn from_config(config: &CategoriesConfig) -> Result<Self, CategoryError> {
        let rules = config
            .rules
            .iter()
            .map(|r| CategoryRule::new(&r.name, &r.pattern, r.order))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = Category {
            name: config.fallback.name.clone(),
            order: config.fallback.order,
        };
        Ok(Self::new(rules, fallback, config.match_on))
    }

    /// First rule whose pattern matches `name`, else the fallback.
    pub fn classify(&self, name: &str) -> &Category {
        self.rules
            .iter()
            .find(|rule| rule.matches(name))
            .map(|rule| &rule.category)
            .unwrap_or(&self.fallback)
    }

    /// Classify a document by whichever of its names the config selects.
    pub fn classify_document(&self, output_filename: &str, source_filename: &str) -> &Category {
        match self.target {
            MatchTarget::OutputFilename => self.classify(output_filename),
            MatchTarget::SourceFilename => self.classify(source_filename),
        }
    }

    pub fn target(&self) -> MatchTarget {
        self.target
    }

    pub fn fallback(&self) -> &Category {
        &self.fallback
    }
}
