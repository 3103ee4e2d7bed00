#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing_subscriber::fmt::writer::MakeWriter;
use uuid::Uuid;
use wiremock::MockServer;

use cv_intake::config::{MatcherConfig, RetentionPolicy};
use cv_intake::errors::AppError;
use cv_intake::extract::{ExtractError, PdfTextExtractor, TextExtractor};
use cv_intake::matcher::WebhookMatcher;
use cv_intake::models::cv_record::{CvRecord, NewCvRecord};
use cv_intake::store::CvStore;
use cv_intake::uploads::UploadDir;
use cv_intake::{build_router, AppState};

pub const WEBHOOK_PATH: &str = "/webhook/compare-form-pdf";
pub const BOUNDARY: &str = "cv-intake-test-boundary";
pub const SAMPLE_PDF: &[u8] = b"%PDF-1.7\nAda Lovelace, analyst\n%%EOF";
pub const CORRUPT_PDF: &[u8] = b"%PDF-1.7\nCORRUPT xref table\n";
/// Real PDF header, body cut off mid-object.
pub const TRUNCATED_PDF: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R";
pub const EXTRACTED_TEXT: &str = "Ada Lovelace\nAnalyst at the Analytical Engine";

/// In-memory `CvStore` that records every insert.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<CvRecord>>,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<CvRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl CvStore for MemoryStore {
    async fn insert(&self, record: NewCvRecord) -> Result<CvRecord, AppError> {
        let row = CvRecord {
            id: Uuid::new_v4(),
            full_name: record.full_name,
            email: record.email,
            phone: record.phone,
            skills: record.skills,
            experience: record.experience,
            pdf_path: record.pdf_path,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }
}

/// Returns fixed text, or fails when the document contains `CORRUPT`.
pub struct StubExtractor;

#[async_trait]
impl TextExtractor for StubExtractor {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractError> {
        if document.windows(7).any(|w| w == b"CORRUPT") {
            return Err(ExtractError::Pdf("invalid cross-reference table".to_string()));
        }
        Ok(EXTRACTED_TEXT.to_string())
    }
}

pub fn matcher_config(server: &MockServer) -> MatcherConfig {
    MatcherConfig {
        url: format!("{}{}", server.uri(), WEBHOOK_PATH),
        timeout: Duration::from_millis(500),
        max_retries: 2,
        backoff_base: Duration::from_millis(10),
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub uploads_dir: TempDir,
}

impl TestApp {
    pub async fn new(server: &MockServer) -> Self {
        Self::with_retention(server, RetentionPolicy::Keep).await
    }

    pub async fn with_retention(server: &MockServer, retention: RetentionPolicy) -> Self {
        Self::build(server, retention, Arc::new(StubExtractor)).await
    }

    /// Wires the production PDF extractor instead of the stub.
    pub async fn with_pdf_extractor(server: &MockServer) -> Self {
        Self::build(server, RetentionPolicy::Keep, Arc::new(PdfTextExtractor)).await
    }

    async fn build(
        server: &MockServer,
        retention: RetentionPolicy,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let uploads_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::default());

        let state = AppState {
            store: store.clone(),
            matcher: Arc::new(WebhookMatcher::new(matcher_config(server)).unwrap()),
            extractor,
            uploads: UploadDir::open(uploads_dir.path(), retention).await.unwrap(),
            max_upload_bytes: 1024 * 1024,
        };

        Self {
            router: build_router(state),
            store,
            uploads_dir,
        }
    }

    pub fn stored_files(&self) -> usize {
        count_files(self.uploads_dir.path())
    }

    pub async fn submit(&self, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Collects formatted log output so tests can assert on what was logged.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Installs an INFO-level subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Builds a multipart body with text fields and an optional `cv` part.
pub fn multipart_body(fields: &[(&str, &str)], cv: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((file_name, data)) = cv {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"cv\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn full_form() -> Vec<(&'static str, &'static str)> {
    vec![
        ("fullName", "Ada Lovelace"),
        ("email", "ada@example.com"),
        ("phone", "+44 20 7946 0000"),
        ("skills", "mathematics, analysis"),
        ("experience", "Notes on the Analytical Engine"),
    ]
}
