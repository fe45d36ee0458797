//! Format normalization: make sure the next stage gets a PDF.
//!
//! PDFs pass through untouched. EPUB and MOBI files are handed to the ebook
//! converter (`ebook-convert <input> <output.pdf>`), which writes into a
//! freshly allocated temporary file.

use super::artifact::{allocate_temp_pdf, StageArtifact};
use super::tool::run_tool;
use super::{written_pdf_len, StageError};
use crate::config::BatchConfig;
use crate::job::DocumentFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converts ebooks to PDF with an external converter program.
#[derive(Debug, Clone)]
pub struct FormatNormalizer {
    program: String,
    temp_dir: Option<PathBuf>,
}

impl FormatNormalizer {
    pub fn new(program: impl Into<String>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            temp_dir,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.ebook_converter.clone(), config.temp_dir.clone())
    }

    /// Return a PDF for `input`.
    ///
    /// * `.pdf` (any case) → [`StageArtifact::Original`], nothing created.
    /// * anything else → converter output in a [`StageArtifact::Temporary`].
    ///
    /// On failure the pre-allocated temporary is deleted before returning.
    pub async fn normalize(&self, input: &Path) -> Result<StageArtifact, StageError> {
        if DocumentFormat::from_path(input).is_some_and(DocumentFormat::is_canonical) {
            debug!("{} is already a PDF", input.display());
            return Ok(StageArtifact::Original(input.to_path_buf()));
        }

        let output = allocate_temp_pdf(self.temp_dir.as_deref(), "normalized-").map_err(|e| {
            StageError::Io {
                path: self.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
                source: e,
            }
        })?;

        info!("Converting {} to PDF", input.display());
        // `output` drops on every early return below, deleting the
        // possibly half-written file.
        run_tool(&self.program, [input.as_os_str(), output.as_os_str()])
            .await
            .map_err(StageError::Tool)?;

        let len = written_pdf_len(&self.program, &output)?;

        debug!("Converted {} → {} ({} bytes)", input.display(), output.display(), len);
        Ok(StageArtifact::Temporary(output))
    }
}
