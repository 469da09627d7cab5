use clap::{Parser, Subcommand};
use docx_pages::config::{self, SiteConfig};
use docx_pages::convert::DocxConverter;
use docx_pages::naming::ImageNaming;
use docx_pages::output;
use docx_pages::pipeline::{self, BuildOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "docx-pages")]
#[command(about = "Turn a folder of Word documents into a paginated HTML site")]
#[command(long_about = "\
Turn a folder of Word documents into a paginated HTML site

Every .docx directly inside the input directory becomes one HTML page.
Embedded images are extracted into images/, documents are sorted into
categories by filename, and each page links to its neighbours. An index
page lists everything by category.

Input and output:

  sources/                         # Input directory
  ├── config.toml                  # Site config (optional)
  ├── Introduction.docx            # → introduction.html (General Information)
  ├── AB12-SPEC.docx               # → ab12_spec.html (Technical Documentation)
  └── User Manual.docx             # → user_manual.html (User Guides)

  output/
  ├── index.html
  ├── main.css
  ├── introduction.html
  └── images/
      └── introduction_0001.jpeg

Titles come from the first heading, else the first bold paragraph, else the
first paragraph, else the page filename.

Run 'docx-pages gen-config' to generate a documented config.toml.")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Directory containing the .docx sources
    #[arg(default_value = "./sources")]
    input_dir: PathBuf,

    /// Directory the site is written to
    #[arg(default_value = "./output")]
    output_dir: PathBuf,

    /// Image file naming; overrides [images] naming from config.toml
    #[arg(value_enum)]
    naming: Option<ImageNaming>,

    /// Use this config file instead of <INPUT_DIR>/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List the pages a build would produce, without converting anything
    Check {
        /// Directory containing the .docx sources
        #[arg(default_value = "./sources")]
        input_dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        Some(Command::GenConfig) => {
            print!("{}", config::stock_config_toml());
        }
        Some(Command::Check { input_dir }) => {
            let site_config = load_site_config(cli.config.as_deref(), &input_dir)?;
            println!("==> Checking {}", input_dir.display());
            match pipeline::check(&input_dir, &site_config) {
                Ok(planned) => output::print_check_output(&planned),
                Err(e) => {
                    eprintln!("error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        None => {
            let site_config = load_site_config(cli.config.as_deref(), &cli.input_dir)?;
            let options = BuildOptions {
                naming: cli.naming.unwrap_or(site_config.images.naming),
                input_dir: cli.input_dir,
                output_dir: cli.output_dir,
                config: site_config,
            };
            println!(
                "==> Building {} \u{2192} {}",
                options.input_dir.display(),
                options.output_dir.display()
            );
            match pipeline::build(&options, &DocxConverter) {
                Ok(report) => output::print_build_report(&report),
                Err(e) => {
                    eprintln!("error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins; otherwise `info`, lowered by `-q` and raised by `-v`.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_site_config(
    explicit: Option<&Path>,
    input_dir: &Path,
) -> Result<SiteConfig, config::ConfigError> {
    match explicit {
        Some(path) => config::load_config_file(path),
        None => config::load_config(input_dir),
    }
}
