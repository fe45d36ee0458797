//! Batch driver: run every eligible document through the pipeline.
//!
//! Jobs run one after another. Each job walks
//! `Normalizing → OcrProcessing → Translating → Writing`, and every artifact
//! a stage produces goes into a single per-job [`ArtifactSet`]. Whatever
//! happens, that set is released before the next job starts, so no temporary
//! outlives its job. A failing job is logged and recorded in its
//! [`JobReport`]; it never stops the batch.

use crate::config::BatchConfig;
use crate::error::{BatchError, JobError};
use crate::job::{discover_jobs, Job, JobStage};
use crate::output::{BatchReport, JobOutcome, JobReport};
use crate::pipeline::artifact::ArtifactSet;
use crate::pipeline::normalize::FormatNormalizer;
use crate::pipeline::ocr::OcrStage;
use crate::pipeline::tool::probe_tool;
use crate::pipeline::translate::{HttpTranslator, TranslationRequest, TranslationResult, Translator};
use crate::pipeline::StageError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Translate every eligible document in `config.input_dir`.
///
/// # Returns
/// `Ok(BatchReport)` once every job has been attempted, even if some failed
/// (check `report.stats.failed` or [`BatchReport::has_failures`]).
///
/// # Errors
/// Returns `Err(BatchError)` only when the batch cannot start:
/// - input directory missing or unreadable
/// - output directory cannot be created
/// - HTTP client cannot be built
pub async fn run_batch(config: &BatchConfig) -> Result<BatchReport, BatchError> {
    let start = Instant::now();
    info!(
        "Starting batch: {} → {} ({} → {})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.source_lang,
        config.target_lang
    );

    // ── Step 1: List jobs ────────────────────────────────────────────────
    let jobs = discover_jobs(config)?;
    info!("Found {} document(s) to translate", jobs.len());

    // ── Step 2: Prepare output directory and stages ──────────────────────
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| BatchError::OutputDirCreateFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    let pipeline = Pipeline {
        config,
        normalizer: FormatNormalizer::from_config(config),
        ocr: OcrStage::from_config(config),
        translator: resolve_translator(config)?,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(jobs.len());
    }

    // ── Step 3: Run jobs, strictly one at a time ─────────────────────────
    let total = jobs.len();
    let mut reports = Vec::with_capacity(total);
    for (index, job) in jobs.iter().enumerate() {
        reports.push(pipeline.run_job(index, total, job).await);
    }

    let report = BatchReport::new(reports, start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {}/{} translated, {} failed, {}ms total",
        report.stats.succeeded,
        report.stats.total_jobs,
        report.stats.failed,
        report.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(report.stats.total_jobs, report.stats.succeeded);
    }

    Ok(report)
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(config: &BatchConfig) -> Result<BatchReport, BatchError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| BatchError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(config))
}

/// Check that every external tool the config enables can be started.
///
/// Without this, a missing `ocrmypdf` would fail every job one by one.
/// Nothing is probed when a stage is disabled.
pub async fn preflight(config: &BatchConfig) -> Result<(), BatchError> {
    if config.enable_format_conversion {
        probe_tool(&config.ebook_converter)
            .await
            .map_err(|detail| BatchError::ToolUnavailable {
                program: config.ebook_converter.clone(),
                flag: "ebook-converter",
                detail,
            })?;
        debug!("Found ebook converter '{}'", config.ebook_converter);
    }
    if OcrStage::from_config(config).is_enabled() {
        probe_tool(&config.ocr_tool)
            .await
            .map_err(|detail| BatchError::ToolUnavailable {
                program: config.ocr_tool.clone(),
                flag: "ocr-tool",
                detail,
            })?;
        debug!("Found OCR tool '{}'", config.ocr_tool);
    }
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A pre-built translator wins; otherwise talk HTTP to `config.api_url`.
fn resolve_translator(config: &BatchConfig) -> Result<Arc<dyn Translator>, BatchError> {
    if let Some(ref translator) = config.translator {
        return Ok(Arc::clone(translator));
    }
    let http = HttpTranslator::new(config.api_url.clone(), config.request_timeout_secs)?;
    Ok(Arc::new(http))
}

/// The stages shared by every job of a run.
struct Pipeline<'a> {
    config: &'a BatchConfig,
    normalizer: FormatNormalizer,
    ocr: OcrStage,
    translator: Arc<dyn Translator>,
}

impl Pipeline<'_> {
    async fn run_job(&self, index: usize, total: usize, job: &Job) -> JobReport {
        let start = Instant::now();
        info!("[{}/{}] Translating: {}", index + 1, total, job.filename);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_job_start(index, total, &job.filename);
        }

        let mut artifacts = ArtifactSet::new();
        let mut stage = JobStage::Pending;
        let result = self.drive(index, job, &mut artifacts, &mut stage).await;

        // Runs for success and failure alike: the job owns nothing after this.
        let cleanup_errors: Vec<JobError> = artifacts
            .release_all()
            .into_iter()
            .map(|(path, e)| JobError::Io {
                filename: job.filename.clone(),
                path,
                detail: format!("removing temporary: {e}"),
            })
            .collect();

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(output_path) => {
                info!("Saved: {}", output_path.display());
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_job_complete(index, total, &job.filename, &output_path);
                }
                JobReport {
                    filename: job.filename.clone(),
                    input_path: job.filepath.clone(),
                    outcome: JobOutcome::Success,
                    stage: JobStage::Done,
                    failed_stage: None,
                    output_path: Some(output_path),
                    error: None,
                    cleanup_errors,
                    duration_ms,
                }
            }
            Err(e) => {
                error!("Error at stage {} for {}: {}", stage, job.filename, e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_job_error(index, total, &job.filename, stage, &e.to_string());
                }
                debug!("{}: {} → {} after {}ms", job.filename, stage, JobStage::Aborted, duration_ms);
                JobReport {
                    filename: job.filename.clone(),
                    input_path: job.filepath.clone(),
                    outcome: JobOutcome::from_error(&e),
                    stage: JobStage::Aborted,
                    failed_stage: Some(stage),
                    output_path: None,
                    error: Some(e),
                    cleanup_errors,
                    duration_ms,
                }
            }
        }
    }

    /// Walk the stages, pushing every artifact into `artifacts`.
    ///
    /// `stage` is left at the stage that failed, for reporting.
    async fn drive(
        &self,
        index: usize,
        job: &Job,
        artifacts: &mut ArtifactSet,
        stage: &mut JobStage,
    ) -> Result<PathBuf, JobError> {
        let config = self.config;

        if let Some(ref owner) = job.output_claimed_by {
            return Err(JobError::OutputConflict {
                filename: job.filename.clone(),
                output: job.output_file_name(&config.source_lang, &config.target_lang),
                claimed_by: owner.clone(),
            });
        }

        // ── Normalize ────────────────────────────────────────────────────
        self.enter(index, job, stage, JobStage::Normalizing);
        let normalized = self
            .normalizer
            .normalize(&job.filepath)
            .await
            .map_err(|e| match e {
                StageError::Tool(failure) => JobError::ConversionFailed {
                    filename: job.filename.clone(),
                    failure,
                },
                StageError::Io { path, source } => io_error(job, path, source),
            })?;
        let mut current = artifacts.push(normalized);

        // ── OCR ──────────────────────────────────────────────────────────
        if self.ocr.is_enabled() {
            self.enter(index, job, stage, JobStage::OcrProcessing);
            let ocred = self
                .ocr
                .ocr(&current, &config.source_ocr_lang)
                .await
                .map_err(|e| match e {
                    StageError::Tool(failure) => JobError::OcrFailed {
                        filename: job.filename.clone(),
                        failure,
                    },
                    StageError::Io { path, source } => io_error(job, path, source),
                })?;
            if let Some(artifact) = ocred {
                current = artifacts.push(artifact);
            }
        }

        // ── Translate ────────────────────────────────────────────────────
        self.enter(index, job, stage, JobStage::Translating);
        let request = TranslationRequest {
            pdf_path: &current,
            display_filename: &job.filename,
            source_lang: &config.source_lang,
            target_lang: &config.target_lang,
            session_id: &job.filename,
        };
        let bytes = match self.translator.translate(&request).await {
            TranslationResult::Success { bytes } => bytes,
            TranslationResult::Failure { status, message } => {
                return Err(JobError::TranslationFailed {
                    filename: job.filename.clone(),
                    status,
                    message,
                })
            }
        };

        // ── Write ────────────────────────────────────────────────────────
        self.enter(index, job, stage, JobStage::Writing);
        let out_name = job.output_file_name(&config.source_lang, &config.target_lang);
        let output_path = write_output(&config.output_dir, &out_name, &bytes)
            .await
            .map_err(|(path, source)| io_error(job, path, source))?;

        *stage = JobStage::Done;
        Ok(output_path)
    }

    fn enter(&self, index: usize, job: &Job, stage: &mut JobStage, next: JobStage) {
        info!("{}: {} → {}", job.filename, stage, next);
        *stage = next;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage(index, &job.filename, next);
        }
    }
}

fn io_error(job: &Job, path: PathBuf, source: std::io::Error) -> JobError {
    JobError::Io {
        filename: job.filename.clone(),
        path,
        detail: source.to_string(),
    }
}

/// Write `bytes` to `dir/name` atomically (temp file + rename).
///
/// A failed write never leaves a partial PDF under the final name.
async fn write_output(
    dir: &Path,
    name: &str,
    bytes: &[u8],
) -> Result<PathBuf, (PathBuf, std::io::Error)> {
    let path = dir.join(name);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| (dir.to_path_buf(), e))?;

    let tmp_path = path.with_extension("pdf.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        remove_partial(&tmp_path).await;
        return Err((tmp_path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
        remove_partial(&tmp_path).await;
        return Err((path, e));
    }
    Ok(path)
}

/// Remove a half-written output. A file that was never created is fine.
async fn remove_partial(tmp_path: &Path) {
    match tokio::fs::remove_file(tmp_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", tmp_path.display(), e),
    }
}
