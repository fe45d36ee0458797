//! Per-job and per-batch results.
//!
//! These exist for operator visibility: the CLI prints them, optionally as
//! JSON. The library never writes them to disk.

use crate::error::JobError;
use crate::job::JobStage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Success,
    ConversionError,
    OcrError,
    TranslationError,
    OutputConflict,
    IoError,
}

impl JobOutcome {
    pub fn from_error(error: &JobError) -> Self {
        match error {
            JobError::ConversionFailed { .. } => JobOutcome::ConversionError,
            JobError::OcrFailed { .. } => JobOutcome::OcrError,
            JobError::TranslationFailed { .. } => JobOutcome::TranslationError,
            JobError::OutputConflict { .. } => JobOutcome::OutputConflict,
            JobError::Io { .. } => JobOutcome::IoError,
        }
    }
}

/// Result of running one job through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Original file name (the service session id).
    pub filename: String,
    pub input_path: PathBuf,
    pub outcome: JobOutcome,
    /// Terminal stage: [`JobStage::Done`] or [`JobStage::Aborted`].
    pub stage: JobStage,
    /// Stage that failed, for aborted jobs.
    pub failed_stage: Option<JobStage>,
    /// Translated PDF, present only on success.
    pub output_path: Option<PathBuf>,
    /// Error that aborted the job.
    pub error: Option<JobError>,
    /// Temporaries that could not be removed after the job ended.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup_errors: Vec<JobError>,
    pub duration_ms: u64,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome == JobOutcome::Success
    }
}

/// Aggregate counts over a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Jobs that left at least one temporary behind.
    pub cleanup_failures: usize,
    pub total_duration_ms: u64,
}

/// Everything [`crate::run_batch`] learned about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub jobs: Vec<JobReport>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn new(jobs: Vec<JobReport>, total_duration_ms: u64) -> Self {
        let succeeded = jobs.iter().filter(|j| j.is_success()).count();
        let stats = BatchStats {
            total_jobs: jobs.len(),
            succeeded,
            failed: jobs.len() - succeeded,
            cleanup_failures: jobs.iter().filter(|j| !j.cleanup_errors.is_empty()).count(),
            total_duration_ms,
        };
        Self { jobs, stats }
    }

    /// True when any job failed or left a temporary behind.
    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0 || self.stats.cleanup_failures > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| !j.is_success())
    }
}
