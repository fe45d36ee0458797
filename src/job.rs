//! Jobs: one input document each, discovered by listing the input directory.

use crate::config::BatchConfig;
use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Input formats the pipeline knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Epub,
    Mobi,
}

impl DocumentFormat {
    /// Detect the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "epub" => Some(DocumentFormat::Epub),
            "mobi" => Some(DocumentFormat::Mobi),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Epub => "epub",
            DocumentFormat::Mobi => "mobi",
        }
    }

    /// PDF is the canonical format; everything else goes through the converter.
    pub fn is_canonical(self) -> bool {
        self == DocumentFormat::Pdf
    }
}

/// Where a job currently is in its pipeline.
///
/// ```text
/// Pending → Normalizing → OcrProcessing → Translating → Writing → Done
///    └───────────┴──────────────┴─────────────┴───────────┴──→ Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStage {
    Pending,
    Normalizing,
    OcrProcessing,
    Translating,
    Writing,
    Done,
    Aborted,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Done | JobStage::Aborted)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStage::Pending => "pending",
            JobStage::Normalizing => "normalizing",
            JobStage::OcrProcessing => "ocr",
            JobStage::Translating => "translating",
            JobStage::Writing => "writing",
            JobStage::Done => "done",
            JobStage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// One input document.
///
/// The language codes are not copied here; they live once in
/// [`BatchConfig`] and are identical for every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Original file name; also the service-facing session id.
    pub filename: String,
    /// Path of the source document.
    pub filepath: PathBuf,
    pub format: DocumentFormat,
    /// Earlier job of the same run that already writes this job's output
    /// name (`book.epub` and `book.pdf` both map to `book_de_a_es.pdf`).
    pub output_claimed_by: Option<String>,
}

impl Job {
    /// File name without its extension.
    pub fn base_name(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    /// Name of the translated PDF for this job.
    pub fn output_file_name(&self, source_lang: &str, target_lang: &str) -> String {
        output_file_name(self.base_name(), source_lang, target_lang)
    }
}

/// `{base}_{source}_a_{target}.pdf`
pub fn output_file_name(base_name: &str, source_lang: &str, target_lang: &str) -> String {
    format!("{base_name}_{source_lang}_a_{target_lang}.pdf")
}

/// List the input directory and build one job per eligible file.
///
/// Only regular files whose extension is in
/// [`BatchConfig::accepted_extensions`] become jobs; sub-directories are not
/// descended into. Jobs are sorted by file name so runs are reproducible.
/// File names that are not valid UTF-8 are skipped, since the name is sent
/// to the service as a form field.
pub fn discover_jobs(config: &BatchConfig) -> Result<Vec<Job>, BatchError> {
    let dir = &config.input_dir;
    let unreadable = |source| BatchError::InputDirUnreadable {
        path: dir.clone(),
        source,
    };

    let accepted = config.accepted_extensions();
    let mut jobs = Vec::new();

    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();

        // Follows symlinks, unlike `DirEntry::file_type`.
        if !path.is_file() {
            continue;
        }

        let Some(format) = DocumentFormat::from_path(&path) else {
            debug!("Skipping {}: unsupported extension", path.display());
            continue;
        };
        if !accepted.contains(&format.extension()) {
            debug!("Skipping {}: {} conversion disabled", path.display(), format.extension());
            continue;
        }

        let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
            debug!("Skipping {}: file name is not UTF-8", path.display());
            continue;
        };

        jobs.push(Job {
            filename,
            filepath: path,
            format,
            output_claimed_by: None,
        });
    }

    jobs.sort_by(|a, b| a.filename.cmp(&b.filename));

    // First job in name order keeps the output; later ones are flagged.
    let mut claimed: HashMap<String, String> = HashMap::new();
    for job in &mut jobs {
        let out = job.output_file_name(&config.source_lang, &config.target_lang);
        match claimed.get(&out) {
            Some(owner) => {
                warn!("{} and {} would both write {}", owner, job.filename, out);
                job.output_claimed_by = Some(owner.clone());
            }
            None => {
                claimed.insert(out, job.filename.clone());
            }
        }
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(name: &str) -> Job {
        Job {
            filename: name.to_string(),
            filepath: PathBuf::from(name),
            format: DocumentFormat::from_path(Path::new(name)).unwrap_or(DocumentFormat::Pdf),
            output_claimed_by: None,
        }
    }

    #[test]
    fn output_name_uses_a_infix() {
        assert_eq!(output_file_name("report", "de", "es"), "report_de_a_es.pdf");
        assert_eq!(job("report.pdf").output_file_name("de", "es"), "report_de_a_es.pdf");
    }

    #[test]
    fn output_name_replaces_ebook_extension() {
        assert_eq!(job("novel.epub").output_file_name("en", "fr"), "novel_en_a_fr.pdf");
    }

    #[test]
    fn base_name_keeps_inner_dots() {
        assert_eq!(job("vol.1.final.PDF").base_name(), "vol.1.final");
    }

    #[test]
    fn format_detection_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.PDF")), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_path(Path::new("a.Epub")), Some(DocumentFormat::Epub));
        assert_eq!(DocumentFormat::from_path(Path::new("a.MOBI")), Some(DocumentFormat::Mobi));
        assert_eq!(DocumentFormat::from_path(Path::new("a.docx")), None);
        assert_eq!(DocumentFormat::from_path(Path::new("pdf")), None);
    }

    #[test]
    fn terminal_stages() {
        assert!(JobStage::Done.is_terminal());
        assert!(JobStage::Aborted.is_terminal());
        assert!(!JobStage::Writing.is_terminal());
    }

    #[test]
    fn discover_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.pdf", "A.PDF", "c.epub", "d.mobi", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let pdf_only = BatchConfig::builder().input_dir(dir.path()).build().unwrap();
        let names: Vec<_> = discover_jobs(&pdf_only)
            .unwrap()
            .into_iter()
            .map(|j| j.filename)
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);

        let ebooks = BatchConfig::builder()
            .input_dir(dir.path())
            .enable_format_conversion(true)
            .build()
            .unwrap();
        let jobs = discover_jobs(&ebooks).unwrap();
        let names: Vec<_> = jobs.iter().map(|j| j.filename.as_str()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf", "c.epub", "d.mobi"]);
        assert_eq!(jobs[2].format, DocumentFormat::Epub);
    }

    #[test]
    fn discover_flags_jobs_sharing_an_output_name() {
        let dir = TempDir::new().unwrap();
        for name in ["book.pdf", "book.epub", "book.mobi", "other.pdf"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let config = BatchConfig::builder()
            .input_dir(dir.path())
            .enable_format_conversion(true)
            .build()
            .unwrap();
        let jobs = discover_jobs(&config).unwrap();
        let claims: Vec<_> = jobs
            .iter()
            .map(|j| (j.filename.as_str(), j.output_claimed_by.as_deref()))
            .collect();
        assert_eq!(
            claims,
            vec![
                ("book.epub", None),
                ("book.mobi", Some("book.epub")),
                ("book.pdf", Some("book.epub")),
                ("other.pdf", None),
            ]
        );
    }

    #[test]
    fn discover_missing_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = BatchConfig::builder()
            .input_dir(dir.path().join("missing"))
            .build()
            .unwrap();
        let err = discover_jobs(&config).unwrap_err();
        assert!(matches!(err, BatchError::InputDirUnreadable { .. }));
    }
}
