//! Shared fixtures for the integration tests.
//!
//! * fake external tools written as small `sh` scripts
//! * a scripted [`Translator`] that records every request
//! * a minimal HTTP/1.1 server on `127.0.0.1` serving canned responses

#![allow(dead_code)]

use async_trait::async_trait;
use pdf_batch_translate::{TranslationRequest, TranslationResult, Translator};
use std::collections::VecDeque;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ── Workspace ────────────────────────────────────────────────────────────────

/// Input, output and temp directories under one `TempDir`.
pub struct Workspace {
    _root: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub work: PathBuf,
    pub bin: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        init_tracing();
        let root = TempDir::new().unwrap();
        let ws = Self {
            input: root.path().join("in"),
            output: root.path().join("out"),
            work: root.path().join("work"),
            bin: root.path().join("bin"),
            _root: root,
        };
        for d in [&ws.input, &ws.work, &ws.bin] {
            std::fs::create_dir_all(d).unwrap();
        }
        ws
    }

    pub fn add_input(&self, name: &str, contents: &[u8]) -> PathBuf {
        let p = self.input.join(name);
        std::fs::write(&p, contents).unwrap();
        p
    }

    /// Write an executable `sh` script named `name` and return its path.
    pub fn tool(&self, name: &str, body: &str) -> String {
        let p = self.bin.join(name);
        std::fs::write(&p, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&p, std::fs::Permissions::from_mode(0o755)).unwrap();
        p.to_string_lossy().into_owned()
    }

    /// Converter that writes a small PDF named after its input, or fails for
    /// inputs whose name contains `fail`.
    pub fn converter(&self) -> String {
        self.tool(
            "fake-ebook-convert",
            r#"case "$(basename "$1")" in
  *fail*) echo "conversion error: unsupported input" >&2; exit 1 ;;
esac
printf '%%PDF-1.4 converted from %s' "$(basename "$1")" > "$2""#,
        )
    }

    /// OCR tool that appends an `[ocr <lang>]` marker, or fails for inputs
    /// whose name contains `scan`. Arguments: `<flag> -l <lang> <in> <out>`.
    pub fn ocr_tool(&self) -> String {
        let log = self.bin.join("ocr-args.log");
        self.tool(
            "fake-ocrmypdf",
            &format!(
                r#"echo "$@" >> '{log}'
case "$(basename "$4")" in
  *scan*) echo "ocr engine crashed" >&2; exit 1 ;;
esac
cat "$4" > "$5"
printf ' [ocr %s]' "$3" >> "$5""#,
                log = log.display()
            ),
        )
    }

    /// Argument lines the fake OCR tool has been called with.
    pub fn ocr_calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.bin.join("ocr-args.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn work_entries(&self) -> Vec<PathBuf> {
        dir_entries(&self.work)
    }

    pub fn output_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = dir_entries(&self.output)
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        names
    }
}

/// Route library logs to the test harness; `RUST_LOG=debug` shows stage
/// transitions of a failing test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(rd) => rd.filter_map(|e| e.ok().map(|e| e.path())).collect(),
        Err(_) => Vec::new(),
    }
}

// ── Scripted translator ──────────────────────────────────────────────────────

/// What the translator saw for one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub filename: String,
    pub session_id: String,
    pub source_lang: String,
    pub target_lang: String,
    pub pdf_path: PathBuf,
    pub pdf_bytes: Vec<u8>,
}

/// Returns queued results in order; once the queue is empty it echoes the
/// uploaded bytes back prefixed with `translated:`.
#[derive(Default)]
pub struct ScriptedTranslator {
    results: Mutex<VecDeque<TranslationResult>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTranslator {
    pub fn new(results: Vec<TranslationResult>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate(&self, request: &TranslationRequest<'_>) -> TranslationResult {
        let pdf_bytes = std::fs::read(request.pdf_path).unwrap_or_default();
        self.calls.lock().unwrap().push(RecordedCall {
            filename: request.display_filename.to_string(),
            session_id: request.session_id.to_string(),
            source_lang: request.source_lang.to_string(),
            target_lang: request.target_lang.to_string(),
            pdf_path: request.pdf_path.to_path_buf(),
            pdf_bytes: pdf_bytes.clone(),
        });
        let queued = self.results.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            let mut bytes = b"translated:".to_vec();
            bytes.extend_from_slice(&pdf_bytes);
            TranslationResult::Success { bytes }
        })
    }
}

// ── HTTP stub ────────────────────────────────────────────────────────────────

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A raw request as received by the stub.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn body_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct HttpStub {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl HttpStub {
    /// Serve `responses` in order, one per connection; after that, 500.
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);
        let queue = Arc::new(Mutex::new(VecDeque::from(responses)));

        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut sock).await;
                captured.lock().unwrap().push(request);
                let resp = queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| StubResponse::new(500, "stub exhausted"));
                let head = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                    resp.status,
                    if resp.status == 200 { "OK" } else { "Error" },
                    resp.body.len()
                );
                let _ = sock.write_all(head.as_bytes()).await;
                let _ = sock.write_all(&resp.body).await;
                let _ = sock.shutdown().await;
            }
        });

        Self {
            url: format!("http://{addr}/api/translate"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(sock: &mut tokio::net::TcpStream) -> CapturedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match sock.read(&mut chunk).await {
            Ok(0) | Err(_) => break buf.len(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head.lines().find_map(|l| {
        let (name, value) = l.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("content-length")
            .then(|| value.trim().parse::<usize>().ok())
            .flatten()
    });
    let chunked = head.to_ascii_lowercase().contains("transfer-encoding: chunked");

    loop {
        let body_len = buf.len() - header_end;
        let complete = match content_length {
            Some(n) => body_len >= n,
            None if chunked => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        match sock.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    CapturedRequest {
        head,
        body: buf[header_end..].to_vec(),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
