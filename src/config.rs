//! Configuration types for a batch translation run.
//!
//! All run behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. One config drives one pipeline: which stages run
//! (ebook conversion, OCR) is decided by flags here rather than by separate
//! entry points per language pair.
//!
//! The language codes, API endpoint and directories are immutable for the
//! whole run and shared by every job.

use crate::error::BatchError;
use crate::pipeline::translate::Translator;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default endpoint of the translation service.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/translate";

/// Default ebook-to-PDF converter program.
pub const DEFAULT_EBOOK_CONVERTER: &str = "ebook-convert";

/// Default OCR program.
pub const DEFAULT_OCR_TOOL: &str = "ocrmypdf";

/// Configuration for a batch translation run.
///
/// Built via [`BatchConfig::builder()`] or using [`BatchConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_batch_translate::{BatchConfig, OcrMode};
///
/// let config = BatchConfig::builder()
///     .source_lang("en")
///     .target_lang("fr")
///     .source_ocr_lang("eng")
///     .ocr_mode(OcrMode::Off)
///     .input_dir("./in")
///     .output_dir("./out")
///     .build()
///     .unwrap();
/// assert_eq!(config.accepted_extensions(), &["pdf"]);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Language code of the documents, sent to the service. Default: "de".
    pub source_lang: String,

    /// Language code to translate into. Default: "es".
    pub target_lang: String,

    /// Language code in the OCR engine's spelling (e.g. "deu" for German).
    /// Default: "deu".
    pub source_ocr_lang: String,

    /// Accept `.epub` and `.mobi` inputs and convert them to PDF first.
    /// Default: false (PDF only).
    pub enable_format_conversion: bool,

    /// When to run the OCR stage. Default: [`OcrMode::Force`].
    pub ocr_mode: OcrMode,

    /// Translation endpoint receiving the multipart POST.
    pub api_url: String,

    /// Directory scanned (non-recursively) for input documents.
    pub input_dir: PathBuf,

    /// Directory receiving translated PDFs; created if missing.
    pub output_dir: PathBuf,

    /// Ebook converter program, invoked as `<program> <input> <output.pdf>`.
    pub ebook_converter: String,

    /// OCR program, invoked as `<program> --force-ocr -l <lang> <input> <output>`.
    pub ocr_tool: String,

    /// Where stage temporaries are allocated. If None, the system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Whole-request timeout for the translation call. Default: None.
    ///
    /// The service may take many minutes on a long book, so no limit is
    /// applied unless asked for. A timeout is still a single attempt.
    pub request_timeout_secs: Option<u64>,

    /// Pre-constructed translator. Takes precedence over `api_url`.
    pub translator: Option<Arc<dyn Translator>>,

    /// Receives per-job progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_lang: "de".to_string(),
            target_lang: "es".to_string(),
            source_ocr_lang: "deu".to_string(),
            enable_format_conversion: false,
            ocr_mode: OcrMode::default(),
            api_url: DEFAULT_API_URL.to_string(),
            input_dir: PathBuf::from("./pdfs_a_traducir"),
            output_dir: PathBuf::from("./pdfs_traducidos"),
            ebook_converter: DEFAULT_EBOOK_CONVERTER.to_string(),
            ocr_tool: DEFAULT_OCR_TOOL.to_string(),
            temp_dir: None,
            request_timeout_secs: None,
            translator: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("source_lang", &self.source_lang)
            .field("target_lang", &self.target_lang)
            .field("source_ocr_lang", &self.source_ocr_lang)
            .field("enable_format_conversion", &self.enable_format_conversion)
            .field("ocr_mode", &self.ocr_mode)
            .field("api_url", &self.api_url)
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("ebook_converter", &self.ebook_converter)
            .field("ocr_tool", &self.ocr_tool)
            .field("temp_dir", &self.temp_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("translator", &self.translator.as_ref().map(|_| "<dyn Translator>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }

    /// Lower-case extensions a file must carry to become a job.
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        if self.enable_format_conversion {
            &["pdf", "epub", "mobi"]
        } else {
            &["pdf"]
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn source_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.source_lang = lang.into();
        self
    }

    pub fn target_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.target_lang = lang.into();
        self
    }

    pub fn source_ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.source_ocr_lang = lang.into();
        self
    }

    pub fn enable_format_conversion(mut self, v: bool) -> Self {
        self.config.enable_format_conversion = v;
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn ebook_converter(mut self, program: impl Into<String>) -> Self {
        self.config.ebook_converter = program.into();
        self
    }

    pub fn ocr_tool(mut self, program: impl Into<String>) -> Self {
        self.config.ocr_tool = program.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.config.translator = Some(translator);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        validate_lang_code("source language", &c.source_lang)?;
        validate_lang_code("target language", &c.target_lang)?;
        if c.ocr_mode != OcrMode::Off {
            validate_ocr_lang(&c.source_ocr_lang)?;
        }
        if c.translator.is_none() {
            let url = reqwest::Url::parse(&c.api_url).map_err(|e| {
                BatchError::InvalidConfig(format!("API URL '{}' is invalid: {}", c.api_url, e))
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(BatchError::InvalidConfig(format!(
                    "API URL must be http or https, got '{}'",
                    url.scheme()
                )));
            }
        }
        if c.enable_format_conversion && c.ebook_converter.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Ebook converter program must not be empty".into(),
            ));
        }
        if c.ocr_mode != OcrMode::Off && c.ocr_tool.trim().is_empty() {
            return Err(BatchError::InvalidConfig(
                "OCR program must not be empty".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(BatchError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Language codes end up in output file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_lang_code(what: &str, code: &str) -> Result<(), BatchError> {
    if code.is_empty() {
        return Err(BatchError::InvalidConfig(format!("{what} must not be empty")));
    }
    if !code
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(BatchError::InvalidConfig(format!(
            "{what} '{code}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

/// Tesseract language list as passed to `-l`: codes joined with `+`
/// (`deu`, `deu+eng`). Never part of a file name.
fn validate_ocr_lang(langs: &str) -> Result<(), BatchError> {
    if langs.is_empty() {
        return Err(BatchError::InvalidConfig("OCR language must not be empty".into()));
    }
    let valid = langs.split('+').all(|code| {
        !code.is_empty()
            && code
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    });
    if !valid {
        return Err(BatchError::InvalidConfig(format!(
            "OCR language '{langs}' must be codes like 'deu' or 'deu+eng'"
        )));
    }
    Ok(())
}

// ── Enums ────────────────────────────────────────────────────────────────

/// When the OCR stage runs.
///
/// | Mode | Tool flag | Use case |
/// |------|-----------|----------|
/// | `Off` | (none) | Born-digital PDFs that already carry text |
/// | `Force` | `--force-ocr` | Scans, or PDFs whose text layer is garbage (default) |
/// | `SkipText` | `--skip-text` | Mixed batches; pages with text are left alone |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Do not run OCR; the normalized PDF goes straight to the service.
    Off,
    /// Rasterise and re-OCR every page even if text already exists. (default)
    #[default]
    Force,
    /// OCR only pages without a text layer.
    SkipText,
}

impl OcrMode {
    /// The OCR tool flag selecting this mode, or None when OCR is off.
    pub fn tool_flag(self) -> Option<&'static str> {
        match self {
            OcrMode::Off => None,
            OcrMode::Force => Some("--force-ocr"),
            OcrMode::SkipText => Some("--skip-text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_deployment() {
        let c = BatchConfig::default();
        assert_eq!(c.source_lang, "de");
        assert_eq!(c.target_lang, "es");
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(c.ocr_mode, OcrMode::Force);
        assert!(!c.enable_format_conversion);
    }

    #[test]
    fn accepted_extensions_follow_conversion_flag() {
        let pdf_only = BatchConfig::builder().build().unwrap();
        assert_eq!(pdf_only.accepted_extensions(), &["pdf"]);

        let ebooks = BatchConfig::builder()
            .enable_format_conversion(true)
            .build()
            .unwrap();
        assert_eq!(ebooks.accepted_extensions(), &["pdf", "epub", "mobi"]);
    }

    #[test]
    fn ocr_lang_accepts_tesseract_language_lists() {
        let c = BatchConfig::builder()
            .source_ocr_lang("deu+eng")
            .build()
            .unwrap();
        assert_eq!(c.source_ocr_lang, "deu+eng");
    }

    #[test]
    fn ocr_lang_rejects_empty_list_entry() {
        for bad in ["deu+", "+eng", "deu++eng", "deu eng"] {
            let err = BatchConfig::builder().source_ocr_lang(bad).build().unwrap_err();
            assert!(err.to_string().contains("OCR language"), "{bad}: {err}");
        }
    }

    #[test]
    fn service_lang_still_rejects_plus() {
        assert!(BatchConfig::builder().source_lang("de+en").build().is_err());
    }

    #[test]
    fn rejects_lang_code_with_path_separator() {
        let err = BatchConfig::builder()
            .target_lang("../es")
            .build()
            .unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)), "got: {err}");
    }

    #[test]
    fn rejects_empty_source_lang() {
        assert!(BatchConfig::builder().source_lang("").build().is_err());
    }

    #[test]
    fn ocr_lang_ignored_when_ocr_off() {
        let c = BatchConfig::builder()
            .ocr_mode(OcrMode::Off)
            .source_ocr_lang("")
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn rejects_non_http_api_url() {
        let err = BatchConfig::builder()
            .api_url("ftp://example.com/translate")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"), "got: {err}");
    }

    #[test]
    fn rejects_unparseable_api_url() {
        assert!(BatchConfig::builder().api_url("not a url").build().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(BatchConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn ocr_mode_flags() {
        assert_eq!(OcrMode::Off.tool_flag(), None);
        assert_eq!(OcrMode::Force.tool_flag(), Some("--force-ocr"));
        assert_eq!(OcrMode::SkipText.tool_flag(), Some("--skip-text"));
    }

    #[test]
    fn debug_elides_trait_objects() {
        let dbg = format!("{:?}", BatchConfig::default());
        assert!(dbg.contains("source_lang"));
        assert!(dbg.contains("translator: None"));
    }
}
