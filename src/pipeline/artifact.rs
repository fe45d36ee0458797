//! Stage artifacts: the PDF a stage hands to the next one.
//!
//! A temporary artifact owns its file through [`tempfile::TempPath`], so the
//! file is deleted when the artifact is dropped even if the job panics or
//! returns early. [`StageArtifact::release`] deletes it explicitly and
//! reports the I/O error instead of swallowing it.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Output of the normalize or OCR stage.
#[derive(Debug)]
pub enum StageArtifact {
    /// The user's input file, passed through untouched. Never deleted.
    Original(PathBuf),
    /// A file this job created. Deleted on release or drop.
    Temporary(TempPath),
}

impl StageArtifact {
    pub fn path(&self) -> &Path {
        match self {
            StageArtifact::Original(p) => p,
            StageArtifact::Temporary(t) => t,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, StageArtifact::Temporary(_))
    }

    /// Delete the file if this job created it.
    ///
    /// A temporary that is already gone counts as released.
    pub fn release(self) -> io::Result<()> {
        match self {
            StageArtifact::Original(_) => Ok(()),
            StageArtifact::Temporary(t) => {
                let path = t.to_path_buf();
                match t.close() {
                    Ok(()) => {
                        debug!("Removed temporary {}", path.display());
                        Ok(())
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// Allocate an empty, uniquely named `.pdf` file for a stage to write into.
///
/// The `.pdf` suffix matters: the ebook converter picks its output format
/// from the extension.
pub fn allocate_temp_pdf(temp_dir: Option<&Path>, prefix: &str) -> io::Result<TempPath> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(".pdf");
    let file = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    // Close our handle; the external tool reopens the path for writing.
    Ok(file.into_temp_path())
}

/// Every artifact a job has produced, released together when the job ends.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    artifacts: Vec<StageArtifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `artifact` and return its path for the next stage.
    pub fn push(&mut self, artifact: StageArtifact) -> PathBuf {
        let path = artifact.path().to_path_buf();
        self.artifacts.push(artifact);
        path
    }

    pub fn temporary_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.is_temporary()).count()
    }

    /// Release everything, newest first. Returns the paths that could not be removed.
    pub fn release_all(&mut self) -> Vec<(PathBuf, io::Error)> {
        let mut failures = Vec::new();
        while let Some(artifact) = self.artifacts.pop() {
            let path = artifact.path().to_path_buf();
            if let Err(e) = artifact.release() {
                warn!("Failed to remove temporary {}: {}", path.display(), e);
                failures.push((path, e));
            }
        }
        failures
    }
}
