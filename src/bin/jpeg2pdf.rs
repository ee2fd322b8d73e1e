//! CLI binary for jpeg2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use jpeg2pdf::convert::write_atomic;
use jpeg2pdf::{
    convert, resolve_output_path, ConversionConfig, ConversionProgressCallback, FileError,
    Magnification, PageMode, ProgressCallback, SelectionResult,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the run and one line per input.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_conversion_start
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }
}

fn kib(bytes: u64) -> String {
    format!("{:.1} KiB", bytes as f64 / 1024.0)
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Combining {total_files} images…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, selection: &SelectionResult) {
        let what = if selection.kept_original() {
            format!("kept original  {}", kib(selection.original_bytes))
        } else {
            format!(
                "recompressed   {} → {}",
                kib(selection.original_bytes),
                kib(selection.candidate_bytes)
            )
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            selection.source.display(),
            dim(&what),
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, index: usize, total: usize, error: &FileError) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&error.to_string()),
        ));
        self.bar.inc(1);
    }

    fn on_selection_complete(&self, chosen: &[PathBuf]) {
        let names: Vec<_> = chosen.iter().map(|p| p.display().to_string()).collect();
        self.bar.println(format!(
            "{} The following files will be combined into a PDF file: [{}]",
            cyan("◆"),
            names.join(", ")
        ));
    }

    fn on_conversion_complete(&self, total_files: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        if skipped == 0 {
            eprintln!(
                "{} {} images ready",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images ready  ({} skipped)",
                if success_count == 0 {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&skipped.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Two images into album.pdf
  jpeg2pdf a.png b.jpg album

  # Higher quality, numbered from 5 with a prefix
  jpeg2pdf -q 90 -p 'A-%D' --first-page-number 5 scans/*.jpg scans.pdf

  # Open at full width with the thumbnail panel shown
  jpeg2pdf --fit-horizontal --show-thumbnails *.png out.pdf

  # Machine-readable report on stdout
  jpeg2pdf --json *.jpg out.pdf > report.json

PAGE NUMBERING:
  A literal prefix optionally followed by one style token:
    %D  1, 2, 3        %R  I, II, III     %r  i, ii, iii
    %A  A, B, C        %a  a, b, c        %%  a literal '%'
  The style token must end the string.

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. jpeg2pdf=debug)
  JPEG2PDF_*              Default for the matching option (see --help)
"#;

/// Combine image files into a single PDF.
#[derive(Parser, Debug)]
#[command(
    name = "jpeg2pdf",
    version,
    about = "Combine image files into a single PDF, recompressing to JPEG only when it saves space",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Images to combine, in page order.
    #[arg(required = true, num_args = 1..)]
    input_files: Vec<PathBuf>,

    /// PDF file to write; `.pdf` is added when there is no extension.
    #[arg(required = true)]
    output_file: PathBuf,

    /// Document author.
    #[arg(short, long, env = "JPEG2PDF_AUTHOR")]
    author: Option<String>,

    /// Document title.
    #[arg(short, long, env = "JPEG2PDF_TITLE")]
    title: Option<String>,

    /// JPEG compression quality, 1 (worst) to 100 (best).
    #[arg(short, long, env = "JPEG2PDF_QUALITY", default_value_t = jpeg2pdf::DEFAULT_QUALITY as i64,
          allow_negative_numbers = true)]
    quality: i64,

    /// Always use the recompressed image, even when the original JPEG is smaller.
    #[arg(long, env = "JPEG2PDF_FORCE_RECOMPRESS")]
    force_recompress: bool,

    /// Open the document fitted to the window width.
    #[arg(long)]
    fit_horizontal: bool,

    /// Open the document fitted to the window height.
    #[arg(long)]
    fit_vertical: bool,

    /// Open the document with the whole page visible.
    #[arg(long)]
    fit_window: bool,

    /// Open the document with the page-thumbnail panel shown.
    #[arg(long, env = "JPEG2PDF_SHOW_THUMBNAILS")]
    show_thumbnails: bool,

    /// Page-numbering format, e.g. `%D`, `A-%D`, `%r`.
    #[arg(short, long, env = "JPEG2PDF_PAGE_NUMBERING")]
    page_numbering: Option<String>,

    /// Number shown on the first page.
    #[arg(long, env = "JPEG2PDF_FIRST_PAGE_NUMBER", default_value_t = 1,
          allow_negative_numbers = true)]
    first_page_number: i64,

    /// Print the per-file report (ConversionOutput) as JSON on stdout.
    #[arg(long, env = "JPEG2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "JPEG2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "JPEG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(long, env = "JPEG2PDF_QUIET")]
    quiet: bool,

    /// Include scratch file names in the per-file log lines.
    #[arg(long, env = "JPEG2PDF_DEBUG")]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress bar active the bar prints the per-file lines, the
    // skipped inputs and the final file set, so only library errors are logged.
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input_files, &config).context("Conversion failed")?;
    let path = resolve_output_path(&cli.output_file);
    if !cli.quiet {
        eprintln!("Writing {}...", path.display());
    }
    write_atomic(&path, &output.pdf)
        .with_context(|| format!("Unable to write {}", path.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.skipped == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.processed,
            stats.total_inputs,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {} kept  /  {} recompressed  ·  {}",
            dim(&stats.kept_original.to_string()),
            dim(&stats.recompressed.to_string()),
            dim(&kib(stats.pdf_bytes)),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .quality(cli.quality)
        .force_recompress(cli.force_recompress)
        .debug(cli.debug)
        .first_page_number(cli.first_page_number);

    for (requested, m) in [
        (cli.fit_horizontal, Magnification::FitWidth),
        (cli.fit_vertical, Magnification::FitHeight),
        (cli.fit_window, Magnification::FitPage),
    ] {
        if requested {
            builder = builder.request_magnification(m);
        }
    }
    if cli.show_thumbnails {
        builder = builder.request_page_mode(PageMode::ShowThumbnails);
    }
    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(ref author) = cli.author {
        builder = builder.author(author.clone());
    }
    if let Some(ref format) = cli.page_numbering {
        builder = builder.page_numbering(format.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
