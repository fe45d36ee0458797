//! Error types for the pdf-batch-translate library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`] is **fatal**: the batch cannot start at all (unreadable
//!   input directory, output directory cannot be created, invalid
//!   configuration, a required external tool is missing). Returned as
//!   `Err(BatchError)` from the top-level `run_batch*` functions.
//!
//! * [`JobError`] is **non-fatal**: a single document failed at one stage
//!   (converter crashed, OCR failed, service answered 500) but every other
//!   document is still attempted. Stored inside
//!   [`crate::output::JobReport`] so callers can inspect partial success.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-batch-translate library.
///
/// Per-document failures use [`JobError`] and are stored in
/// [`crate::output::JobReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Directory errors ──────────────────────────────────────────────────
    /// The input directory does not exist or cannot be listed.
    #[error("Cannot read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory is missing and could not be created.
    #[error("Cannot create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Tool errors ───────────────────────────────────────────────────────
    /// An enabled external tool could not be started.
    #[error("External tool '{program}' is not available: {detail}\nInstall it or point --{flag} at the executable.")]
    ToolUnavailable {
        program: String,
        flag: &'static str,
        detail: String,
    },

    // ── HTTP errors ───────────────────────────────────────────────────────
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Exit information from an external process that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ToolFailure {
    /// Program that was invoked.
    pub program: String,
    /// Exit code, `None` when the process was killed by a signal or never started.
    pub exit_code: Option<i32>,
    /// Last lines of the tool's stderr, or the spawn error.
    pub detail: String,
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "'{}' exited with status {}", self.program, code)?,
            None => write!(f, "'{}' did not exit normally", self.program)?,
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// A non-fatal error for a single document.
///
/// The batch logs it, releases the document's temporaries and moves on.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum JobError {
    /// Ebook-to-PDF conversion failed.
    #[error("{filename}: conversion to PDF failed: {failure}")]
    ConversionFailed {
        filename: String,
        failure: ToolFailure,
    },

    /// The OCR tool failed.
    #[error("{filename}: OCR failed: {failure}")]
    OcrFailed {
        filename: String,
        failure: ToolFailure,
    },

    /// The translation service rejected the document or could not be reached.
    ///
    /// `status` is `None` for transport failures (connection refused, DNS,
    /// truncated response).
    #[error("{filename}: translation failed{}: {message}", status_suffix(.status))]
    TranslationFailed {
        filename: String,
        status: Option<u16>,
        message: String,
    },

    /// An earlier job of the run already writes the same output file.
    #[error("{filename}: output '{output}' is already written by {claimed_by}")]
    OutputConflict {
        filename: String,
        output: String,
        claimed_by: String,
    },

    /// A filesystem operation on the document's files failed.
    #[error("{filename}: I/O error on '{path}': {detail}")]
    Io {
        filename: String,
        path: PathBuf,
        detail: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl JobError {
    /// Short label for the failing stage, used in logs and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::ConversionFailed { .. } => "conversion",
            JobError::OcrFailed { .. } => "ocr",
            JobError::TranslationFailed { .. } => "translation",
            JobError::OutputConflict { .. } => "conflict",
            JobError::Io { .. } => "io",
        }
    }
}
