//! CLI output formatting for build and check results.
//!
//! # Information-First Display
//!
//! Output is organized by what a reader browses: categories in index order,
//! then documents by title. The page filename follows each title after `→`,
//! and the source document is an indented `Source:` context line.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! General Information
//!     001 Welcome → introduction.html
//!         Source: Introduction.docx
//! Technical Documentation
//!     001 Spec Sheet → ab12_spec.html
//!         Source: AB12-SPEC.docx
//!
//! Failed
//!     broken.docx: Not a valid .docx package: invalid Zip archive
//!
//! Converted 2/3 documents, 1 failed, 4 images, 1 warning
//! ```
//!
//! ## Check
//!
//! ```text
//! General Information
//!     001 introduction.html ← Introduction.docx
//! Other
//!     001 a_b.html ← a b.docx
//!     002 a_b.html ← a_b.docx
//!
//! Collisions
//!     a_b.html ← a b.docx, a_b.docx
//!
//! 3 documents in 2 categories
//! ```
//!
//! # Architecture
//!
//! Each result has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::pipeline::{BuildReport, PlannedPage};
use crate::render::INDEX_PAGE;
use std::collections::BTreeMap;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 image`, `2 images`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    let noun = if n == 1 { singular } else { plural };
    format!("{n} {noun}")
}

// ============================================================================
// Build output
// ============================================================================

/// Format the result of a build: the generated site, failures, and a summary.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!("Home \u{2192} {INDEX_PAGE}"));
    for group in report.registry.grouped_by_category() {
        lines.push(group.name.to_string());
        for (i, doc) in group.documents.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2192} {}",
                indent(1),
                format_index(i + 1),
                doc.title,
                doc.filename
            ));
            lines.push(format!("{}Source: {}", indent(2), doc.source));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &report.failures {
            lines.push(format!("{}{}: {}", indent(1), failure.source, failure.reason));
        }
    }

    if !report.write_failures.is_empty() {
        lines.push(String::new());
        lines.push("Not written".to_string());
        for failure in &report.write_failures {
            lines.push(format!("{}{}: {}", indent(1), failure.path, failure.reason));
        }
    }

    lines.push(String::new());
    let mut summary = format!(
        "Converted {}/{} documents, {} failed, {}",
        report.converted,
        report.discovered,
        report.failures.len(),
        count(report.images_written, "image", "images")
    );
    if report.image_failures > 0 {
        summary.push_str(&format!(" ({} failed)", report.image_failures));
    }
    summary.push_str(&format!(", {}", count(report.warnings, "warning", "warnings")));
    lines.push(summary);

    lines
}

/// Print build output to stdout.
pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the planned pages of a `check` run, grouped like the index would be.
pub fn format_check_output(planned: &[PlannedPage]) -> Vec<String> {
    let mut lines = Vec::new();

    // (order, name) → pages, sorted by page filename like the registry
    let mut groups: BTreeMap<(u32, &str), Vec<&PlannedPage>> = BTreeMap::new();
    for page in planned {
        groups
            .entry((page.category.order, page.category.name.as_str()))
            .or_default()
            .push(page);
    }
    for ((_, name), pages) in &mut groups {
        pages.sort_by(|a, b| a.page.cmp(&b.page));
        lines.push(name.to_string());
        for (i, page) in pages.iter().enumerate() {
            lines.push(format!(
                "{}{} {} \u{2190} {}",
                indent(1),
                format_index(i + 1),
                page.page,
                page.source
            ));
        }
    }

    let mut by_page: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for page in planned {
        by_page
            .entry(page.page.as_str())
            .or_default()
            .push(page.source.as_str());
    }
    let collisions: Vec<_> = by_page.iter().filter(|(_, s)| s.len() > 1).collect();
    if !collisions.is_empty() {
        lines.push(String::new());
        lines.push("Collisions".to_string());
        for (page, sources) in collisions {
            lines.push(format!(
                "{}{} \u{2190} {}",
                indent(1),
                page,
                sources.join(", ")
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        count(planned.len(), "document", "documents"),
        count(groups.len(), "category", "categories")
    ));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(planned: &[PlannedPage]) {
    for line in format_check_output(planned) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
