use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::form::{read_submission, validate};
use crate::intake::pipeline::process_submission;
use crate::state::AppState;

/// POST /api/upload
///
/// Takes the applicant form plus a `cv` PDF, asks the matcher whether they
/// agree and stores a record when they do. The reply carries the matcher's
/// own status and JSON body.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = read_submission(multipart).await?;
    let (form, file) = validate(submission, state.max_upload_bytes)?;

    let submission_id = Uuid::new_v4();
    info!(%submission_id, "Processing CV submission");
    debug!(%submission_id, "Applicant '{}'", form.full_name);

    let outcome = process_submission(&state, submission_id, form, file).await?;

    info!(
        %submission_id,
        "Submission finished: verdict={:?}, record={}",
        outcome.verdict.outcome,
        outcome
            .record
            .as_ref()
            .map(|r| r.id.to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let status = StatusCode::from_u16(outcome.verdict.upstream_status).map_err(|e| {
        AppError::UpstreamCall(format!(
            "matcher status {} cannot be forwarded: {e}",
            outcome.verdict.upstream_status
        ))
    })?;

    Ok((status, Json(outcome.verdict.raw)).into_response())
}
