//! Pipeline stages for one document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ ocr ──▶ translate ──▶ (batch writes output)
//! (pdf/epub/mobi) (ebook-convert) (ocrmypdf) (HTTP POST)
//! ```
//!
//! 1. [`normalize`]: pass PDFs through, convert ebooks to a temporary PDF
//! 2. [`ocr`]: rewrite the PDF with a text layer into a new temporary
//! 3. [`translate`]: multipart POST to the translation service, single attempt
//!
//! Stages never delete their input; each returns a [`artifact::StageArtifact`]
//! and the batch driver owns every artifact until the job ends.

pub mod artifact;
pub mod normalize;
pub mod ocr;
pub mod tool;
pub mod translate;

use crate::error::ToolFailure;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a local stage (normalize or OCR) failed.
#[derive(Debug, Error)]
pub enum StageError {
    /// The external program failed or could not be started.
    #[error("{0}")]
    Tool(ToolFailure),

    /// A temporary file could not be allocated or inspected.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Size of the PDF `program` wrote to `output`.
///
/// An exit status of 0 is not enough: a missing or empty output is reported
/// as a tool failure.
pub(crate) fn written_pdf_len(program: &str, output: &Path) -> Result<u64, StageError> {
    let empty = |detail: &str| {
        StageError::Tool(ToolFailure {
            program: program.to_string(),
            exit_code: Some(0),
            detail: detail.to_string(),
        })
    };
    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(empty("produced an empty PDF")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(empty("produced no output file")),
        Err(e) => Err(StageError::Io {
            path: output.to_path_buf(),
            source: e,
        }),
    }
}
