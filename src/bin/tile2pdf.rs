//! CLI binary for tile2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to `FetchConfig`
//! and `CompileConfig`, runs the two phases and prints a summary.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tile2pdf::config::{DEFAULT_BASE_URL, DEFAULT_PATTERN, DEFAULT_USER_AGENT};
use tile2pdf::{
    compile, list_existing, CompileConfig, CompileOutput, FetchConfig, FetchOutcome, Fetcher,
    PageError, PageStats, ProgressCallback, ProgressReporter,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

fn mib(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while tiles are fetched (the total is not
/// known up front), then a bar while pages are compiled.
struct CliProgress {
    bar: ProgressBar,
    saved: AtomicUsize,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            saved: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Compiling");
        self.bar.set_message("");
        self.bar.reset_eta();
    }
}

impl ProgressReporter for CliProgress {
    fn on_fetch_start(&self, start_index: u64, threshold: u32) {
        self.bar.set_prefix("Downloading");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Downloading from tile {start_index}; stopping after {threshold} consecutive 404s"
            ))
        ));
    }

    fn on_tile_start(&self, index: u64) {
        self.bar.set_message(format!("tile {index}"));
    }

    fn on_tile_outcome(&self, index: u64, outcome: &FetchOutcome, misses: u32, threshold: u32) {
        let line = match outcome {
            FetchOutcome::Saved(_) => {
                let total = self.saved.fetch_add(1, Ordering::SeqCst) + 1;
                format!(
                    "  {} Tile {:>6}  {}",
                    green("✓"),
                    index,
                    dim(&format!("{total} total"))
                )
            }
            FetchOutcome::NotFound => format!(
                "  {} Tile {:>6}  {}  {}",
                red("✗"),
                index,
                "not found (404)",
                dim(&format!("{misses}/{threshold} consecutive"))
            ),
            FetchOutcome::OtherHttpError(status) => {
                format!("  {} Tile {:>6}  {}", yellow("⚠"), index, yellow(&format!("HTTP {status}")))
            }
            FetchOutcome::TransportError(e) => {
                format!("  {} Tile {:>6}  {}", yellow("⚠"), index, yellow(&e.to_string()))
            }
        };
        self.bar.println(line);
    }

    fn on_fetch_complete(&self, saved: usize) {
        self.bar.println(format!(
            "{} {} tiles downloaded",
            green("✔"),
            bold(&saved.to_string())
        ));
    }

    fn on_compile_start(&self, total_images: usize) {
        self.activate_bar(total_images);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Compiling {total_images} images into a PDF…"))
        ));
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize, stats: &PageStats) {
        if let Some(name) = stats.source.file_name() {
            self.bar.set_message(name.to_string_lossy().into_owned());
        }
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &PageError) {
        let msg = error.to_string();
        // Truncate very long error messages to keep output tidy.
        let msg = match msg.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &msg[..cut]),
            None => msg,
        };
        self.bar.println(format!(
            "  {} Image {:>4}/{:<4}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_compile_complete(&self, _total: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Download every tile of the default collection and build the PDF
  tile2pdf

  # Rebuild the PDF from tiles already on disk, smaller and lighter
  tile2pdf --skip-download --max-dimension 1600 --quality 70

  # Another collection
  tile2pdf --base-url https://example.org/scans/ --pattern 'page{number:04}.png' \
           --extension png --output-pdf scans.pdf

STOP RULE:
  Tiles are requested one by one from --start upwards. The run ends after
  --max-consecutive-404s 404 answers in a row. Any other HTTP error or a
  timeout is skipped without counting, so an archive that keeps answering
  500 is never abandoned.

PATTERN:
  --pattern must contain {number}; add a zero-padding width as {number:06}.
"#;

/// Download a numbered series of archive tiles and compile them into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "tile2pdf",
    version,
    about = "Download numbered archive tiles and compile them into one compressed PDF",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Skip downloading; compile tiles already in --output-dir.
    #[arg(long, env = "TILE2PDF_SKIP_DOWNLOAD")]
    skip_download: bool,

    /// Directory for downloaded tiles.
    #[arg(long, env = "TILE2PDF_OUTPUT_DIR", default_value = "downloaded_images")]
    output_dir: PathBuf,

    /// Output PDF path.
    #[arg(long, env = "TILE2PDF_OUTPUT_PDF", default_value = "library_of_congress_images.pdf")]
    output_pdf: PathBuf,

    /// Maximum image dimension in pixels; larger tiles are downscaled.
    #[arg(long, env = "TILE2PDF_MAX_DIMENSION", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_dimension: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "TILE2PDF_QUALITY", default_value_t = 85,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// URL every tile URL starts with.
    #[arg(long, env = "TILE2PDF_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Remote file-name pattern with a {number} placeholder.
    #[arg(long, env = "TILE2PDF_PATTERN", default_value = DEFAULT_PATTERN)]
    pattern: String,

    /// Local file extension for saved tiles.
    #[arg(long, env = "TILE2PDF_EXTENSION", default_value = "jp2")]
    extension: String,

    /// First tile number.
    #[arg(long, env = "TILE2PDF_START", default_value_t = 1)]
    start: u64,

    /// Stop after this many 404s in a row.
    #[arg(long, env = "TILE2PDF_MAX_CONSECUTIVE_404S", default_value_t = 5,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_consecutive_404s: u32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "TILE2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Pause between requests in milliseconds.
    #[arg(long, env = "TILE2PDF_DELAY_MS", default_value_t = 500)]
    delay_ms: u64,

    /// User-Agent header sent with every request.
    #[arg(long, env = "TILE2PDF_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Print the compile result as JSON on stdout.
    #[arg(long, env = "TILE2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "TILE2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TILE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TILE2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
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

    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new() as Arc<dyn ProgressReporter>)
    } else {
        None
    };

    // ── Fetch (or reuse) tiles ───────────────────────────────────────────
    let fetch_config = build_fetch_config(&cli, progress.clone())?;

    let tiles = if cli.skip_download {
        if !cli.quiet {
            eprintln!("Skipping download, using existing images…");
        }
        let tiles = list_existing(&fetch_config.output_dir, &fetch_config.extension)
            .context("Failed to list existing tiles")?;
        if tiles.is_empty() {
            bail!(
                "No images found in {}/\nRun without --skip-download to download images first.",
                fetch_config.output_dir.display()
            );
        }
        if !cli.quiet {
            eprintln!(
                "Found {} existing images in {}/",
                tiles.len(),
                fetch_config.output_dir.display()
            );
        }
        tiles
    } else {
        let fetcher = Fetcher::http(fetch_config).context("Failed to set up downloader")?;
        let tiles = fetcher
            .fetch(cli.start, cli.max_consecutive_404s)
            .await
            .context("Download failed")?;
        if tiles.is_empty() {
            bail!("No images were downloaded. Cannot create PDF.");
        }
        tiles
    };

    // ── Compile ──────────────────────────────────────────────────────────
    let compile_config = build_compile_config(&cli, progress)?;
    let output = compile(&tiles, &cli.output_pdf, &compile_config)
        .await
        .context("PDF compilation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output, tiles.len());
    }

    Ok(())
}

/// Map CLI args to `FetchConfig`.
fn build_fetch_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<FetchConfig> {
    let mut builder = FetchConfig::builder()
        .base_url(cli.base_url.as_str())
        .pattern(cli.pattern.as_str())
        .output_dir(cli.output_dir.clone())
        .extension(cli.extension.as_str())
        .timeout_secs(cli.timeout)
        .delay_ms(cli.delay_ms)
        .user_agent(cli.user_agent.as_str());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid download configuration")
}

/// Map CLI args to `CompileConfig`.
fn build_compile_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CompileConfig> {
    let mut builder = CompileConfig::builder()
        .max_dimension(cli.max_dimension)
        .quality(cli.quality);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid compile configuration")
}

fn print_summary(output: &CompileOutput, inputs: usize) {
    let report = &output.report;
    if let Some(pct) = report.reduction_percent() {
        eprintln!("Image compression: {}", bold(&format!("{pct:.1}% reduction")));
        eprintln!("  Original:   {}", mib(report.total_original_bytes));
        eprintln!("  Compressed: {}", mib(report.total_compressed_bytes));
    }

    let mark = if output.skipped.is_empty() {
        green("✔")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {}/{} images  →  {}",
        mark,
        output.page_count,
        inputs,
        bold(&output.output_path.display().to_string()),
    );
    eprintln!("   File size: {}", dim(&mib(output.pdf_bytes)));
    if !output.skipped.is_empty() {
        eprintln!("   {} images skipped", red(&output.skipped.len().to_string()));
    }
}
