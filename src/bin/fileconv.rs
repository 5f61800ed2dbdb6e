//! CLI binary for edgequake-convert.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs one conversion and writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_convert::{
    change_suffix, format_file_size, supported_conversions, ConversionConfig, ConversionObserver,
    ConversionOutcome, ConversionState, Converter, FormatTag, OutcomeReport, OutputArtifact,
    PdfiumEngine, SourceFile,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer ─────────────────────────────────────────────────────────

/// Drives an indicatif spinner from conversion events.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new(label: &str) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionObserver for SpinnerObserver {
    fn on_state_change(&self, state: ConversionState) {
        if state.is_terminal() {
            self.bar.finish_and_clear();
        }
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize) {
        self.bar
            .set_message(format!("rendered page {page_num}/{total_pages}"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PNG to JPG next to the input (photo.jpg)
  fileconv photo.png -f jpg

  # Image to a single-page A4 PDF
  fileconv scan.jpeg -o out/scan.pdf

  # First page of a PDF as PNG (needs libpdfium)
  fileconv report.pdf -f png --pdfium-lib ./libpdfium.so

  # Word document to PDF, machine-readable result
  fileconv notes.docx -f pdf --json

  # Show every supported conversion
  fileconv --list

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  FILECONV_PDFIUM_LIB     Same as --pdfium-lib
  FILECONV_MAX_SIZE_MB    Same as --max-size-mb
  FILECONV_QUALITY        Same as --quality
  FILECONV_TARGET_WIDTH   Same as --target-width
  RUST_LOG                Overrides the log filter (e.g. edgequake_convert=debug)
"#;

/// Convert images, PDFs and Word documents between formats.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert JPG, PNG, PDF and DOCX files between formats",
    long_about = "Convert files locally: JPG <-> PNG, images to PDF, the first page of a PDF \
to JPG/PNG, and Word (DOCX) documents to PDF. Files larger than the size limit are rejected \
before any work is done.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file path.
    input: Option<PathBuf>,

    /// Output file path. Its suffix selects the format; --format must agree.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: jpg, jpeg, png, pdf.
    #[arg(short, long)]
    format: Option<String>,

    /// List all supported conversions and exit.
    #[arg(short, long)]
    list: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Path to the pdfium shared library (PDF sources only).
    #[arg(long, env = "FILECONV_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Maximum accepted input size in MB.
    #[arg(long, env = "FILECONV_MAX_SIZE_MB", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=1024))]
    max_size_mb: u64,

    /// JPEG quality (1–100).
    #[arg(long, env = "FILECONV_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Target width in pixels for rendered PDF pages.
    #[arg(long, env = "FILECONV_TARGET_WIDTH", default_value_t = 1920)]
    target_width: u32,

    /// Disable the progress spinner.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

/// `--json` payload: the library report plus where the file was written.
#[derive(Serialize)]
struct CliReport {
    #[serde(flatten)]
    report: OutcomeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List mode ────────────────────────────────────────────────────────
    if cli.list {
        print_conversions();
        return Ok(());
    }

    let input = cli
        .input
        .clone()
        .context("An input file is required (or use --list)")?;
    let destination = resolve_destination(&cli)?;
    let output_path = match cli.output.clone() {
        Some(p) => p,
        None => default_output_path(&input, destination),
    };

    // ── Load source ──────────────────────────────────────────────────────
    let source = SourceFile::from_path(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    // ── Build converter ──────────────────────────────────────────────────
    let spinner = if show_progress {
        Some(SpinnerObserver::new(&format!(
            "{} → {}",
            source.name(),
            destination.display_name()
        )))
    } else {
        None
    };
    let config = build_config(&cli, spinner.clone())?;
    let mut converter = Converter::new(config);

    if source.declared_format() == Some(FormatTag::Pdf) {
        match PdfiumEngine::bind(cli.pdfium_lib.as_deref()) {
            Ok(engine) => converter = converter.with_raster_engine(Arc::new(engine)),
            Err(e) => warn!("{}", e),
        }
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let outcome = converter.convert(source, destination).await;
    if let Some(s) = &spinner {
        s.bar.finish_and_clear();
    }

    let written = match &outcome {
        ConversionOutcome::Success { artifact, .. } => {
            Some(write_output(artifact, &output_path).await?)
        }
        ConversionOutcome::Failure { .. } => None,
    };

    if cli.json {
        let report = CliReport {
            report: outcome.report(),
            output_path: written.as_ref().map(|p| p.display().to_string()),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    }

    match (&outcome, &written) {
        (ConversionOutcome::Success { artifact, .. }, Some(path)) => {
            if !cli.quiet && !cli.json {
                eprintln!(
                    "{}  {}  {}  {}",
                    green("✔"),
                    bold(&path.display().to_string()),
                    dim(&format_file_size(artifact.len() as u64)),
                    dim(&format!("{}ms", start.elapsed().as_millis())),
                );
            }
            Ok(())
        }
        (ConversionOutcome::Failure { message, .. }, _) => {
            if !cli.json {
                eprintln!("{} Conversion failed: {}", red("✘"), message);
            }
            std::process::exit(1);
        }
        (ConversionOutcome::Success { .. }, None) => Ok(()),
    }
}

/// Destination from the `--output` suffix, else from `--format`.
///
/// When both are given they must name the same format.
fn resolve_destination(cli: &Cli) -> Result<FormatTag> {
    let flag = cli
        .format
        .as_deref()
        .map(|f| {
            f.parse::<FormatTag>()
                .with_context(|| format!("Unknown output format '{}'", f))
        })
        .transpose()?;

    let Some(ref out) = cli.output else {
        return flag.context("Either --output or --format must be specified");
    };

    let name = out.file_name().map(|n| n.to_string_lossy().into_owned());
    let from_suffix = name
        .as_deref()
        .and_then(FormatTag::from_file_name)
        .with_context(|| {
            format!(
                "Cannot infer the output format from '{}'; use a .jpg, .png or .pdf suffix",
                out.display()
            )
        })?;

    match flag {
        Some(f) if !f.same_format(from_suffix) => anyhow::bail!(
            "--format {} does not match the suffix of '{}' ({})",
            f,
            out.display(),
            from_suffix
        ),
        _ => Ok(from_suffix),
    }
}

/// Write `artifact` to `path`, creating missing parent directories.
async fn write_output(artifact: &OutputArtifact, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    artifact
        .write_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// `dir/photo.png` + jpg → `dir/photo.jpg`.
fn default_output_path(input: &Path, destination: FormatTag) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(change_suffix(&name, destination))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    observer: Option<Arc<SpinnerObserver>>,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_file_size(cli.max_size_mb * 1024 * 1024)
        .jpeg_quality(cli.quality)
        .raster_target_width(cli.target_width);

    if let Some(obs) = observer {
        builder = builder.observer(obs as Arc<dyn ConversionObserver>);
    }

    builder.build().context("Invalid configuration")
}

fn print_conversions() {
    println!("\n{}\n", bold("=== Supported File Conversions ==="));
    for (source, targets) in supported_conversions() {
        let targets: Vec<String> = targets
            .iter()
            .map(|t| t.as_str().to_uppercase())
            .collect();
        println!(
            "{:6} -> {}  {}",
            source.as_str().to_uppercase(),
            targets.join(", "),
            dim(source.display_name())
        );
    }
    println!();
}
