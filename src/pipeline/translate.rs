//! Translation client: submit a PDF to the remote service.
//!
//! The service is opaque. We send one multipart POST and take whatever comes
//! back: HTTP 200 means the body is the translated PDF, anything else is a
//! failure whose body text is kept verbatim for the operator. There is no
//! retry; a 503 is as final as a 400.

use crate::error::BatchError;
use async_trait::async_trait;
use reqwest::multipart;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Everything the service needs to translate one document.
#[derive(Debug, Clone, Copy)]
pub struct TranslationRequest<'a> {
    /// PDF to upload (the last stage's artifact).
    pub pdf_path: &'a Path,
    /// File name reported in the multipart part.
    pub display_filename: &'a str,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
    /// Correlates the request with service-side state. The original file name.
    pub session_id: &'a str,
}

/// Outcome of a single translation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    /// The whole translated PDF.
    Success { bytes: Vec<u8> },
    /// Non-200 response (`status` set) or transport failure (`status` None).
    Failure { status: Option<u16>, message: String },
}

/// Sends documents to a translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, request: &TranslationRequest<'_>) -> TranslationResult;
}

/// [`Translator`] speaking the service's multipart HTTP API.
///
/// Form fields: `pdfFile` (binary, `application/pdf`), `sourceLang`,
/// `targetLang`, `sessionId`.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    client: reqwest::Client,
    api_url: String,
}

impl HttpTranslator {
    /// Build a client for `api_url`. No timeout unless `timeout_secs` is set.
    pub fn new(api_url: impl Into<String>, timeout_secs: Option<u64>) -> Result<Self, BatchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BatchError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, request: &TranslationRequest<'_>) -> TranslationResult {
        let bytes = match tokio::fs::read(request.pdf_path).await {
            Ok(b) => b,
            Err(e) => {
                return TranslationResult::Failure {
                    status: None,
                    message: format!("cannot read {}: {}", request.pdf_path.display(), e),
                }
            }
        };
        let upload_len = bytes.len();

        let file_part = match multipart::Part::bytes(bytes)
            .file_name(request.display_filename.to_string())
            .mime_str("application/pdf")
        {
            Ok(p) => p,
            Err(e) => {
                return TranslationResult::Failure {
                    status: None,
                    message: format!("mime: {e}"),
                }
            }
        };

        let form = multipart::Form::new()
            .part("pdfFile", file_part)
            .text("sourceLang", request.source_lang.to_string())
            .text("targetLang", request.target_lang.to_string())
            .text("sessionId", request.session_id.to_string());

        debug!(
            "POST {} ({} bytes, {} → {})",
            self.api_url, upload_len, request.source_lang, request.target_lang
        );
        let start = Instant::now();

        let response = match self.client.post(&self.api_url).multipart(form).send().await {
            Ok(r) => r,
            Err(e) => {
                return TranslationResult::Failure {
                    status: None,
                    message: format!("request: {e}"),
                }
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return TranslationResult::Failure {
                status: Some(status.as_u16()),
                message: body,
            };
        }

        match response.bytes().await {
            Ok(body) => {
                info!(
                    "Received {} bytes for {} in {}ms",
                    body.len(),
                    request.display_filename,
                    start.elapsed().as_millis()
                );
                TranslationResult::Success {
                    bytes: body.to_vec(),
                }
            }
            Err(e) => TranslationResult::Failure {
                status: None,
                message: format!("reading response body: {e}"),
            },
        }
    }
}
