use std::sync::Arc;

use crate::extract::TextExtractor;
use crate::matcher::Matcher;
use crate::store::CvStore;
use crate::uploads::UploadDir;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The collaborators are trait objects so the binary wires the real
/// Postgres/webhook/pdf-extract backends and tests wire their own.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CvStore>,
    pub matcher: Arc<dyn Matcher>,
    pub extractor: Arc<dyn TextExtractor>,
    pub uploads: UploadDir,
    /// Largest accepted `cv` part. The request body limit is derived from it.
    pub max_upload_bytes: usize,
}
