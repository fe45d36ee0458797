//! # pdf-batch-translate
//!
//! Batch-translate a directory of PDF, EPUB and MOBI documents through a
//! remote translation service, saving each translated PDF under a derived
//! name.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Discover   list *.pdf (+ *.epub, *.mobi), one job per file
//!  ├─ 2. Normalize  ebook → temporary PDF via ebook-convert (PDFs pass through)
//!  ├─ 3. OCR        temporary PDF with a text layer via ocrmypdf (optional)
//!  ├─ 4. Translate  multipart POST, single attempt, whole PDF in memory
//!  └─ 5. Write      {base}_{src}_a_{tgt}.pdf in the output dir
//! ```
//!
//! Jobs run one at a time. A job that fails at any stage is logged and
//! skipped; its temporaries are removed before the next job starts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_batch_translate::{run_batch, BatchConfig, OcrMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .source_lang("de")
//!         .target_lang("es")
//!         .source_ocr_lang("deu")
//!         .ocr_mode(OcrMode::Force)
//!         .enable_format_conversion(true)
//!         .api_url("http://localhost:3000/api/translate")
//!         .input_dir("./pdfs_a_traducir")
//!         .output_dir("./pdfs_traducidos")
//!         .build()?;
//!     let report = run_batch(&config).await?;
//!     eprintln!("{}/{} translated", report.stats.succeeded, report.stats.total_jobs);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `translate-batch` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## External Tools
//!
//! | Stage | Default program | Invocation |
//! |-------|-----------------|------------|
//! | Normalize | `ebook-convert` (Calibre) | `ebook-convert <in> <out.pdf>` |
//! | OCR | `ocrmypdf` | `ocrmypdf --force-ocr -l <lang> <in> <out>` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod job;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{preflight, run_batch, run_batch_sync};
pub use config::{BatchConfig, BatchConfigBuilder, OcrMode};
pub use error::{BatchError, JobError, ToolFailure};
pub use job::{discover_jobs, output_file_name, DocumentFormat, Job, JobStage};
pub use output::{BatchReport, BatchStats, JobOutcome, JobReport};
pub use pipeline::artifact::StageArtifact;
pub use pipeline::translate::{HttpTranslator, TranslationRequest, TranslationResult, Translator};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
