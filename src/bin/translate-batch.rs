//! CLI binary for pdf-batch-translate.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig`, runs the batch and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_batch_translate::{
    discover_jobs, preflight, run_batch, BatchConfig, BatchProgressCallback, BatchReport,
    JobStage, OcrMode, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

/// Exit status when the batch ran but at least one document failed.
const EXIT_PARTIAL_FAILURE: u8 = 2;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over documents, one log line per
/// finished document.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the job currently running.
    job_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Translating");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            job_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.job_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total} document(s)…"))
        ));
    }

    fn on_job_start(&self, _index: usize, _total: usize, filename: &str) {
        if let Ok(mut t) = self.job_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(filename.to_string());
    }

    fn on_stage(&self, _index: usize, filename: &str, stage: JobStage) {
        self.bar.set_message(format!("{filename}  {}", dim(&stage.to_string())));
    }

    fn on_job_complete(&self, index: usize, total: usize, filename: &str, output: &Path) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  → {}  {}",
            green("✓"),
            index + 1,
            total,
            filename,
            dim(&output.display().to_string()),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_job_error(&self, index: usize, total: usize, filename: &str, stage: JobStage, error: &str) {
        let secs = self.elapsed_secs();

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 100 {
            let mut s: String = error.chars().take(99).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  [{}]  {}  {}",
            red("✗"),
            index + 1,
            total,
            filename,
            stage,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total: usize, _succeeded: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate every PDF in ./pdfs_a_traducir from German to Spanish
  translate-batch

  # English → French, with EPUB/MOBI conversion and OCR in English
  translate-batch --source-lang en --target-lang fr --ocr-lang eng \
      --convert-ebooks -i ./books -o ./translated

  # Born-digital PDFs: skip OCR entirely
  translate-batch --ocr off

  # Show what would be translated, without running anything
  translate-batch --dry-run

  # Machine-readable summary
  translate-batch --json > report.json

OUTPUT NAMES:
  {base}_{source}_a_{target}.pdf     e.g. report.pdf → report_de_a_es.pdf

EXIT STATUS:
  0  every document translated
  1  the batch could not start (bad config, missing directory or tool)
  2  the batch ran but at least one document failed

EXTERNAL TOOLS:
  ebook-convert   Calibre's converter, needed with --convert-ebooks
  ocrmypdf        needed unless --ocr off

ENVIRONMENT VARIABLES:
  RUST_LOG               Override log filter (e.g. pdf_batch_translate=debug)
"#;

/// Batch-translate PDF, EPUB and MOBI documents through a translation service.
#[derive(Parser, Debug)]
#[command(
    name = "translate-batch",
    version,
    about = "Batch-translate PDF, EPUB and MOBI documents through a translation service",
    long_about = "Translate every document in a directory: ebooks are converted to PDF, \
PDFs are OCR'd for the source language, each PDF is posted to the translation \
service and the translated PDF is saved as {base}_{source}_a_{target}.pdf.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the documents to translate.
    #[arg(short, long, env = "TRANSLATE_INPUT_DIR", default_value = "./pdfs_a_traducir")]
    input_dir: PathBuf,

    /// Directory receiving translated PDFs (created if missing).
    #[arg(short, long, env = "TRANSLATE_OUTPUT_DIR", default_value = "./pdfs_traducidos")]
    output_dir: PathBuf,

    /// Language code of the documents.
    #[arg(short, long, env = "TRANSLATE_SOURCE_LANG", default_value = "de")]
    source_lang: String,

    /// Language code to translate into.
    #[arg(short, long, env = "TRANSLATE_TARGET_LANG", default_value = "es")]
    target_lang: String,

    /// Source language in the OCR engine's spelling (e.g. deu, eng, fra).
    #[arg(long, env = "TRANSLATE_OCR_LANG", default_value = "deu")]
    ocr_lang: String,

    /// OCR policy: off, force (re-OCR every page), skip-text (only pages without text).
    #[arg(long, env = "TRANSLATE_OCR", value_enum, default_value = "force")]
    ocr: OcrArg,

    /// Also accept .epub and .mobi files and convert them to PDF first.
    #[arg(long, env = "TRANSLATE_CONVERT_EBOOKS")]
    convert_ebooks: bool,

    /// Translation service endpoint.
    #[arg(long, env = "TRANSLATE_API_URL", default_value = pdf_batch_translate::config::DEFAULT_API_URL)]
    api_url: String,

    /// Ebook-to-PDF converter program.
    #[arg(long, env = "TRANSLATE_EBOOK_CONVERTER", default_value = pdf_batch_translate::config::DEFAULT_EBOOK_CONVERTER)]
    ebook_converter: String,

    /// OCR program.
    #[arg(long, env = "TRANSLATE_OCR_TOOL", default_value = pdf_batch_translate::config::DEFAULT_OCR_TOOL)]
    ocr_tool: String,

    /// Directory for intermediate PDFs (default: system temp dir).
    #[arg(long, env = "TRANSLATE_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Give up on a translation request after this many seconds (default: wait forever).
    #[arg(long, env = "TRANSLATE_REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// List the documents and output names, then exit.
    #[arg(long)]
    dry_run: bool,

    /// Do not check that the external tools can be started.
    #[arg(long, env = "TRANSLATE_SKIP_PREFLIGHT")]
    skip_preflight: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "TRANSLATE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "TRANSLATE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRANSLATE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrArg {
    Off,
    Force,
    SkipText,
}

impl From<OcrArg> for OcrMode {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Off => OcrMode::Off,
            OcrArg::Force => OcrMode::Force,
            OcrArg::SkipText => OcrMode::SkipText,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress bar active, per-document lines come from the
    // callback; library INFO logs would only duplicate them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
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
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let jobs = discover_jobs(&config).context("Failed to list input directory")?;
        for job in &jobs {
            let out = config
                .output_dir
                .join(job.output_file_name(&config.source_lang, &config.target_lang));
            match job.output_claimed_by {
                Some(ref owner) => println!(
                    "{}  →  {}  {}",
                    job.filepath.display(),
                    out.display(),
                    red(&format!("(skipped: {owner} writes the same file)"))
                ),
                None => println!("{}  →  {}", job.filepath.display(), out.display()),
            }
        }
        if !cli.quiet {
            eprintln!("{} document(s) would be translated", jobs.len());
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Preflight ────────────────────────────────────────────────────────
    if !cli.skip_preflight {
        preflight(&config).await.context("Preflight check failed")?;
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let report = run_batch(&config).await.context("Batch failed to start")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }
    if !cli.quiet {
        print_summary(&report, show_progress);
    }

    if report.has_failures() {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .source_lang(&cli.source_lang)
        .target_lang(&cli.target_lang)
        .source_ocr_lang(&cli.ocr_lang)
        .ocr_mode(cli.ocr.clone().into())
        .enable_format_conversion(cli.convert_ebooks)
        .api_url(&cli.api_url)
        .input_dir(&cli.input_dir)
        .output_dir(&cli.output_dir)
        .ebook_converter(&cli.ebook_converter)
        .ocr_tool(&cli.ocr_tool);

    if let Some(ref dir) = cli.temp_dir {
        builder = builder.temp_dir(dir);
    }
    if let Some(secs) = cli.request_timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &BatchReport, show_progress: bool) {
    let stats = &report.stats;

    // Without the bar nobody has printed the per-file failures yet.
    if !show_progress {
        for job in report.failures() {
            if let Some(ref e) = job.error {
                eprintln!("  {} {}", red("✗"), e);
            }
        }
    }
    for job in &report.jobs {
        for e in &job.cleanup_errors {
            eprintln!("  {} {}", cyan("⚠"), e);
        }
    }

    let mark = if stats.failed == 0 {
        green("✔")
    } else if stats.succeeded == 0 {
        red("✘")
    } else {
        cyan("⚠")
    };
    eprintln!(
        "{}  {}/{} translated  ({} failed)  {}",
        mark,
        bold(&stats.succeeded.to_string()),
        stats.total_jobs,
        if stats.failed == 0 {
            stats.failed.to_string()
        } else {
            red(&stats.failed.to_string())
        },
        dim(&format!("{}ms", stats.total_duration_ms)),
    );
}
