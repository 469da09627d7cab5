//! Build orchestration.
//!
//! One run moves through these states, strictly sequentially:
//!
//! ```text
//! Discover → ConvertEach → (barrier) → PaginateEach → WriteIndex → Done
//! ```
//!
//! - **Discover**: `*.docx` directly inside the input directory, sorted by
//!   filename. Zero matches is fatal, and nothing has been written yet.
//!   Directories are only created once something is written into them, so a
//!   fatal run leaves the output tree untouched.
//! - **ConvertEach** (pass 1): convert, filter warnings, extract images,
//!   resolve the title, classify and register. A failing document is logged,
//!   recorded in the report and skipped.
//! - **Barrier**: pagination needs the complete registry, so no page is
//!   written until every document has been through pass 1.
//! - **PaginateEach** (pass 2): in registry order, write each page with its
//!   prev/next links. A write failure is recorded and the run continues.
//! - **WriteIndex**: once, if at least one document converted.
//!
//! Nothing is rolled back: pages written before a later failure stay.

use crate::categories::{CategoryError, Classifier};
use crate::config::{ConfigError, SiteConfig};
use crate::convert::{ConvertError, ConvertOptions, Converter, Warning, WarningFilter};
use crate::images::{DirSink, IMAGES_DIR, ImageContext, extract_images};
use crate::metadata::resolve_title;
use crate::naming::{ImageNaming, page_stem, sanitize_filename};
use crate::registry::Registry;
use crate::render::{self, INDEX_PAGE, STYLESHEET};
use crate::types::{Category, Document};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Category error: {0}")]
    Category(#[from] CategoryError),
    #[error("No .docx files found in {}", .0.display())]
    NoInputFiles(PathBuf),
    #[error("All {attempted} conversions failed")]
    AllConversionsFailed { attempted: usize },
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub naming: ImageNaming,
    pub config: SiteConfig,
}

/// A discovered input file and the page it will become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name as found, e.g. `AB12-FOO.docx`.
    pub name: String,
    /// Sanitized page filename, e.g. `ab12_foo.html`.
    pub page: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionFailure {
    pub source: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    /// Path relative to the output directory.
    pub path: String,
    pub reason: String,
}

/// Outcome of a run that got past discovery and converted at least one file.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub discovered: usize,
    pub converted: usize,
    pub failures: Vec<ConversionFailure>,
    /// Converter warnings that survived the ignore-list.
    pub warnings: usize,
    pub images_written: usize,
    pub image_failures: usize,
    pub write_failures: Vec<WriteFailure>,
    pub registry: Registry,
}

/// A planned page, as reported by [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage {
    pub source: String,
    pub page: String,
    pub category: Category,
}

/// List `*.docx` files directly inside `input_dir`, sorted by file name.
///
/// Word's `~$` lock files are skipped.
pub fn discover(input_dir: &Path) -> Result<Vec<SourceFile>, PipelineError> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_docx = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
        if !is_docx || name.starts_with("~$") {
            continue;
        }
        sources.push(SourceFile {
            path: entry.into_path(),
            page: sanitize_filename(&name),
            name,
        });
    }
    if sources.is_empty() {
        return Err(PipelineError::NoInputFiles(input_dir.to_path_buf()));
    }
    Ok(sources)
}

/// Discover and classify without converting or writing anything.
pub fn check(input_dir: &Path, config: &SiteConfig) -> Result<Vec<PlannedPage>, PipelineError> {
    let classifier = Classifier::from_config(&config.categories)?;
    let sources = discover(input_dir)?;
    Ok(sources
        .into_iter()
        .map(|s| PlannedPage {
            category: classifier.classify_document(&s.page, &s.name).clone(),
            source: s.name,
            page: s.page,
        })
        .collect())
}

/// Per-run state shared by every document in pass 1.
struct Converting<'a> {
    converter: &'a dyn Converter,
    options: ConvertOptions,
    filter: WarningFilter,
    classifier: Classifier,
    naming: ImageNaming,
    sink: DirSink,
}

/// Pass-1 result for one document.
struct Converted {
    document: Document,
    html: String,
    warnings: Vec<Warning>,
    images_written: usize,
    image_failures: usize,
}

impl Converting<'_> {
    fn convert(&self, source: &SourceFile) -> Result<Converted, ConvertError> {
        let conversion = self.converter.convert(&source.path, &self.options)?;
        let warnings = self.filter.filter(conversion.warnings);

        // Fresh context per document: image numbering restarts at 1
        let ctx = ImageContext {
            naming: self.naming,
            page_stem: page_stem(&source.page).to_string(),
        };
        let extracted = extract_images(&conversion.html, &ctx, &self.sink);

        let title = resolve_title(&extracted.html, &source.page);
        let category = self
            .classifier
            .classify_document(&source.page, &source.name)
            .clone();

        Ok(Converted {
            document: Document::new(&source.page, &source.name, title, category),
            images_written: extracted.written.len(),
            image_failures: extracted.failures.len(),
            html: extracted.html,
            warnings,
        })
    }
}

/// Run the whole pipeline.
pub fn build(options: &BuildOptions, converter: &dyn Converter) -> Result<BuildReport, PipelineError> {
    let sources = discover(&options.input_dir)?;

    let config = &options.config;
    let images_dir = options.output_dir.join(IMAGES_DIR);

    let ctx = Converting {
        converter,
        options: ConvertOptions {
            style_map: config.conversion.style_map()?,
        },
        filter: config.conversion.warning_filter()?,
        classifier: Classifier::from_config(&config.categories)?,
        naming: options.naming,
        sink: DirSink::new(images_dir.clone()),
    };

    let mut report = BuildReport {
        discovered: sources.len(),
        ..Default::default()
    };
    let mut registry = Registry::new();
    let mut contents: HashMap<String, String> = HashMap::new();

    // Pass 1: convert and register every document
    let total = sources.len();
    for (i, source) in sources.iter().enumerate() {
        info!("[{}%] Converting {}", (i + 1) * 100 / total, source.name);
        match ctx.convert(source) {
            Ok(converted) => {
                for warning in &converted.warnings {
                    warn!("{}: {warning}", source.name);
                }
                report.converted += 1;
                report.warnings += converted.warnings.len();
                report.images_written += converted.images_written;
                report.image_failures += converted.image_failures;
                debug!(
                    "{} → {} ({})",
                    source.name,
                    converted.document.filename,
                    converted.document.category()
                );
                contents.insert(converted.document.filename.clone(), converted.html);
                registry.register(converted.document);
            }
            Err(e) => {
                error!("Failed to convert {}: {e}", source.name);
                report.failures.push(ConversionFailure {
                    source: source.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.converted == 0 {
        return Err(PipelineError::AllConversionsFailed { attempted: total });
    }

    // Pass 2: the registry is complete, pagination is final
    let out = &options.output_dir;
    fs::create_dir_all(&images_dir)?;
    write_output(
        out,
        STYLESHEET,
        &render::stylesheet(&config.colors),
        &mut report.write_failures,
    );
    for doc in registry.sorted_view() {
        let Some(content) = contents.get(&doc.filename) else {
            continue;
        };
        let page = render::render_page(
            content,
            &doc.title,
            registry.pagination_for(&doc.filename),
            &config.site.title,
        );
        write_output(out, &doc.filename, &page.into_string(), &mut report.write_failures);
    }
    let index = render::render_index(&registry, &config.site.title);
    write_output(out, INDEX_PAGE, &index.into_string(), &mut report.write_failures);

    info!(
        "Converted {}/{} documents into {}",
        report.converted,
        report.discovered,
        out.display()
    );
    report.registry = registry;
    Ok(report)
}

fn write_output(dir: &Path, name: &str, contents: &str, failures: &mut Vec<WriteFailure>) {
    match fs::write(dir.join(name), contents) {
        Ok(()) => debug!("Wrote {name}"),
        Err(e) => {
            error!("Failed to write {name}: {e}");
            failures.push(WriteFailure {
                path: name.to_string(),
                reason: e.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::MatchTarget;
    use crate::test_helpers::{StubConverter, data_img, document_filenames, find_document};
    use tempfile::TempDir;

    /// Input dir with empty placeholder files; the stub converter ignores content.
    fn input_with(names: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in names {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        tmp
    }

    fn options(input: &Path, output: &Path) -> BuildOptions {
        BuildOptions {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            naming: ImageNaming::SourceFilename,
            config: SiteConfig::default(),
        }
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discover_filters_and_sorts() {
        let tmp = input_with(&["b.docx", "a.DOCX", "notes.txt", "~$lock.docx", "c.doc"]);
        fs::create_dir(tmp.path().join("sub.docx")).unwrap();
        let found = discover(tmp.path()).unwrap();
        let names: Vec<&str> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.DOCX", "b.docx"]);
        assert_eq!(found[0].page, "a.html");
    }

    #[test]
    fn discover_ignores_nested_files() {
        let tmp = input_with(&["top.docx"]);
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/deep.docx"), b"").unwrap();
        assert_eq!(discover(tmp.path()).unwrap().len(), 1);
    }

    #[test]
    fn discover_empty_is_fatal() {
        let tmp = input_with(&["readme.md"]);
        assert!(matches!(
            discover(tmp.path()),
            Err(PipelineError::NoInputFiles(_))
        ));
    }

    #[test]
    fn discover_missing_dir_is_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover(&tmp.path().join("absent")),
            Err(PipelineError::Walk(_))
        ));
    }

    // =========================================================================
    // Full runs
    // =========================================================================

    #[test]
    fn zero_inputs_writes_nothing() {
        let input = input_with(&[]);
        let out = TempDir::new().unwrap();
        let output_dir = out.path().join("site");
        let result = build(&options(input.path(), &output_dir), &StubConverter::new());
        assert!(matches!(result, Err(PipelineError::NoInputFiles(_))));
        assert!(!output_dir.exists());
    }

    #[test]
    fn writes_pages_index_and_stylesheet() {
        let input = input_with(&["Introduction.docx", "AB12-SPEC.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("Introduction.docx", "<h1>Welcome</h1><p>Hi</p>")
            .page("AB12-SPEC.docx", "<p><strong>Spec Sheet</strong> details</p>");

        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.discovered, 2);
        assert_eq!(report.converted, 2);

        for file in ["introduction.html", "ab12_spec.html", "index.html", "main.css"] {
            assert!(out.path().join(file).is_file(), "missing {file}");
        }
        assert!(out.path().join("images").is_dir());

        let intro = find_document(&report.registry, "introduction.html");
        assert_eq!(intro.title, "Welcome");
        assert_eq!(intro.category(), "General Information");
        let spec = find_document(&report.registry, "ab12_spec.html");
        assert_eq!(spec.title, "Spec Sheet");
        assert_eq!(spec.category(), "Technical Documentation");
    }

    #[test]
    fn converts_in_discovery_order() {
        let input = input_with(&["b.docx", "a.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("a.docx", "<p>A</p>")
            .page("b.docx", "<p>B</p>");
        build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(converter.calls(), vec!["a.docx", "b.docx"]);
    }

    #[test]
    fn first_converted_page_links_to_later_pages() {
        // guide sorts after foreword by category; both converted in name order
        let input = input_with(&["a-guide.docx", "z-foreword.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("a-guide.docx", "<h1>Guide</h1>")
            .page("z-foreword.docx", "<h1>Foreword</h1>");
        let report = build(&options(input.path(), out.path()), &converter).unwrap();

        assert_eq!(
            document_filenames(&report.registry),
            vec!["z_foreword.html", "a_guide.html"]
        );
        let foreword = fs::read_to_string(out.path().join("z_foreword.html")).unwrap();
        assert!(foreword.contains(r#"href="./a_guide.html""#));
        assert!(foreword.contains("Next: Guide"));
        let guide = fs::read_to_string(out.path().join("a_guide.html")).unwrap();
        assert!(guide.contains("Previous: Foreword"));
    }

    #[test]
    fn partial_failure_skips_file_and_continues() {
        let input = input_with(&["a.docx", "b.docx", "c.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("a.docx", "<p>A</p>")
            .failing("b.docx", "corrupt package")
            .page("c.docx", "<p>C</p>");

        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.converted, 2);
        assert_eq!(
            report.failures,
            vec![ConversionFailure {
                source: "b.docx".to_string(),
                reason: "Conversion failed: corrupt package".to_string(),
            }]
        );
        assert!(!out.path().join("b.html").exists());

        // Pagination skips the failed document
        let a = fs::read_to_string(out.path().join("a.html")).unwrap();
        assert!(a.contains(r#"href="./c.html""#));
        let index = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(!index.contains("b.html"));
    }

    #[test]
    fn all_failures_is_fatal() {
        let input = input_with(&["a.docx", "b.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .failing("a.docx", "x")
            .failing("b.docx", "y");
        let result = build(&options(input.path(), out.path()), &converter);
        assert!(matches!(
            result,
            Err(PipelineError::AllConversionsFailed { attempted: 2 })
        ));
        assert!(!out.path().join("index.html").exists());
        assert!(!out.path().join("images").exists());
    }

    #[test]
    fn ignored_warnings_are_not_counted() {
        let input = input_with(&["a.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new().page_with_warnings(
            "a.docx",
            "<p>A</p>",
            vec![
                Warning::warning("Unrecognised paragraph style: 'Body' (Style ID: Body)"),
                Warning::warning("Unrecognised paragraph style: 'Fancy' (Style ID: Fancy)"),
            ],
        );
        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.warnings, 1);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn images_are_extracted_per_page() {
        let input = input_with(&["Report.docx"]);
        let out = TempDir::new().unwrap();
        let html = format!("<p>{}</p><p>{}</p>", data_img("png", b"one"), data_img("png", b"two"));
        let converter = StubConverter::new().page("Report.docx", &html);

        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.images_written, 2);
        assert_eq!(
            fs::read(out.path().join("images/report_0001.jpeg")).unwrap(),
            b"one"
        );
        let page = fs::read_to_string(out.path().join("report.html")).unwrap();
        assert!(page.contains("./images/report_0002.jpeg"));
        assert!(!page.contains("base64"));
    }

    #[test]
    fn broken_image_keeps_page() {
        let input = input_with(&["a.docx"]);
        let out = TempDir::new().unwrap();
        let html = format!(
            r#"<img src="data:image/png;base64,@@@">{}"#,
            data_img("png", b"ok")
        );
        let converter = StubConverter::new().page("a.docx", &html);
        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.image_failures, 1);
        assert_eq!(report.images_written, 1);
        let page = fs::read_to_string(out.path().join("a.html")).unwrap();
        assert!(page.contains("base64,@@@"));
        assert!(page.contains("./images/a_0002.jpeg"));
    }

    #[test]
    fn sequential_naming_collides_across_documents() {
        // Known limitation: without a page prefix, later documents overwrite
        // earlier documents' images.
        let input = input_with(&["a.docx", "b.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("a.docx", &data_img("png", b"from-a"))
            .page("b.docx", &data_img("png", b"from-b"));
        let mut opts = options(input.path(), out.path());
        opts.naming = ImageNaming::Sequential;

        build(&opts, &converter).unwrap();
        assert_eq!(
            fs::read(out.path().join("images/image_0001.jpeg")).unwrap(),
            b"from-b"
        );
        let a = fs::read_to_string(out.path().join("a.html")).unwrap();
        assert!(a.contains("./images/image_0001.jpeg"));
    }

    // =========================================================================
    // Collisions and write failures
    // =========================================================================

    #[test]
    fn colliding_sources_keep_the_later_document() {
        let input = input_with(&["a b.docx", "a_b.docx"]);
        let out = TempDir::new().unwrap();
        let converter = StubConverter::new()
            .page("a b.docx", "<h1>First</h1>")
            .page("a_b.docx", "<h1>Second</h1>");
        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.converted, 2);
        assert_eq!(report.registry.len(), 1);
        assert_eq!(find_document(&report.registry, "a_b.html").title, "Second");
        let page = fs::read_to_string(out.path().join("a_b.html")).unwrap();
        assert!(page.contains("Second"));
    }

    #[test]
    fn page_write_failure_does_not_stop_other_pages() {
        let input = input_with(&["a.docx", "b.docx"]);
        let out = TempDir::new().unwrap();
        // A directory where the page file should go makes the write fail
        fs::create_dir(out.path().join("a.html")).unwrap();
        let converter = StubConverter::new()
            .page("a.docx", "<p>A</p>")
            .page("b.docx", "<p>B</p>");

        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(report.write_failures.len(), 1);
        assert_eq!(report.write_failures[0].path, "a.html");
        assert!(out.path().join("b.html").is_file());
        assert!(out.path().join("index.html").is_file());
    }

    // =========================================================================
    // Classification target
    // =========================================================================

    #[test]
    fn match_target_changes_category() {
        let input = input_with(&["X1-REF User Guide.docx"]);
        let converter = StubConverter::new().page("X1-REF User Guide.docx", "<p>x</p>");

        let out = TempDir::new().unwrap();
        let report = build(&options(input.path(), out.path()), &converter).unwrap();
        assert_eq!(find_document(&report.registry, "x1_ref.html").category(), "Other");

        let out = TempDir::new().unwrap();
        let mut opts = options(input.path(), out.path());
        opts.config.categories.match_on = MatchTarget::SourceFilename;
        let report = build(&opts, &converter).unwrap();
        assert_eq!(
            find_document(&report.registry, "x1_ref.html").category(),
            "User Guides"
        );
    }

    // =========================================================================
    // check
    // =========================================================================

    #[test]
    fn check_plans_without_writing() {
        let input = input_with(&["User Manual.docx", "misc.docx"]);
        let planned = check(input.path(), &SiteConfig::default()).unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].source, "User Manual.docx");
        assert_eq!(planned[0].page, "user_manual.html");
        assert_eq!(planned[0].category.name, "User Guides");
        assert_eq!(planned[1].category.name, "Other");
        let entries: Vec<_> = fs::read_dir(input.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }
}
