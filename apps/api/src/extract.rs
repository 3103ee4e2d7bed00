//! PDF text extraction.
//!
//! `pdf-extract` is CPU-bound and can panic on hostile input, so every call
//! runs on the blocking pool and a panic is reported as an ordinary error.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF could not be parsed: {0}")]
    Pdf(String),

    #[error("extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Turns an uploaded document into plain text.
///
/// Carried in `AppState` as `Arc<dyn TextExtractor>`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractError>;
}

pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractError> {
        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&document)
                .map_err(|e| ExtractError::Pdf(e.to_string()))
        })
        .await??;

        Ok(text)
    }
}
