//! Conversion warnings and the ignore-list that filters them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Warning,
    Error,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::Warning => write!(f, "warning"),
            WarningKind::Error => write!(f, "error"),
        }
    }
}

/// A message reported by the converter alongside its HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Drops warnings matching any `(kind, pattern)` entry.
#[derive(Debug, Clone, Default)]
pub struct WarningFilter {
    ignored: Vec<(WarningKind, Regex)>,
}

impl WarningFilter {
    pub fn new(ignored: Vec<(WarningKind, Regex)>) -> Self {
        Self { ignored }
    }

    pub fn is_ignored(&self, warning: &Warning) -> bool {
        self.ignored
            .iter()
            .any(|(kind, pattern)| *kind == warning.kind && pattern.is_match(&warning.message))
    }

    /// Warnings that survive the ignore-list, in their original order.
    pub fn filter(&self, warnings: Vec<Warning>) -> Vec<Warning> {
        warnings.into_iter().filter(|w| !self.is_ignored(w)).collect()
    }
}
