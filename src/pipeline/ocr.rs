//! OCR stage: give the PDF an extractable text layer.
//!
//! Invokes the OCR program as `<tool> <mode-flag> -l <lang> <input> <output>`
//! where the mode flag comes from [`OcrMode`]. The output always goes to a
//! new temporary; the input artifact is left alone for the batch driver to
//! release.

use super::artifact::{allocate_temp_pdf, StageArtifact};
use super::tool::run_tool;
use super::{written_pdf_len, StageError};
use crate::config::{BatchConfig, OcrMode};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct OcrStage {
    program: String,
    mode: OcrMode,
    temp_dir: Option<PathBuf>,
}

impl OcrStage {
    pub fn new(program: impl Into<String>, mode: OcrMode, temp_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            mode,
            temp_dir,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.ocr_tool.clone(), config.ocr_mode, config.temp_dir.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != OcrMode::Off
    }

    /// OCR `pdf` for `ocr_lang` into a new temporary PDF.
    ///
    /// Returns `Ok(None)` when OCR is off. On failure the stage's own
    /// temporary is deleted; `pdf` is never touched.
    pub async fn ocr(&self, pdf: &Path, ocr_lang: &str) -> Result<Option<StageArtifact>, StageError> {
        let Some(flag) = self.mode.tool_flag() else {
            return Ok(None);
        };

        let output = allocate_temp_pdf(self.temp_dir.as_deref(), "ocr-").map_err(|e| {
            StageError::Io {
                path: self.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
                source: e,
            }
        })?;

        info!("OCR ({}) of {}", ocr_lang, pdf.display());
        let args: [&OsStr; 5] = [
            OsStr::new(flag),
            OsStr::new("-l"),
            OsStr::new(ocr_lang),
            pdf.as_os_str(),
            output.as_os_str(),
        ];
        run_tool(&self.program, args)
            .await
            .map_err(StageError::Tool)?;

        let len = written_pdf_len(&self.program, &output)?;
        debug!("OCR output {} ({} bytes)", output.display(), len);
        Ok(Some(StageArtifact::Temporary(output)))
    }
}
