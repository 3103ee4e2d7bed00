//! Serves the applicant-facing upload form.

use axum::response::Html;

const UPLOAD_PAGE: &str = include_str!("../../static/cv-upload.html");

/// GET / and GET /cv-upload
pub async fn serve_upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}
