//! The intake pipeline: store → extract → match → persist → settle retention.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::form::{ApplicationForm, UploadedFile};
use crate::matcher::{MatchRequest, MatchVerdict};
use crate::models::cv_record::{CvRecord, NewCvRecord};
use crate::state::AppState;
use crate::uploads::UploadedDocument;

/// Result of one submission that made it through the matcher.
#[derive(Debug)]
pub struct IntakeOutcome {
    pub submission_id: Uuid,
    pub verdict: MatchVerdict,
    pub record: Option<CvRecord>,
}

pub async fn process_submission(
    state: &AppState,
    submission_id: Uuid,
    form: ApplicationForm,
    file: UploadedFile,
) -> Result<IntakeOutcome, AppError> {
    let document = state.uploads.store(&file).await?;
    info!(
        %submission_id,
        "Stored upload ({} bytes, {}) at {}",
        document.size,
        document.content_type.as_deref().unwrap_or("unknown type"),
        document.storage_path.display()
    );
    debug!(%submission_id, "Original file name '{}'", document.original_file_name);

    let result = evaluate(state, &form, &file, &document).await;

    let accepted = matches!(&result, Ok((_, Some(_))));
    match state.uploads.settle(&document, accepted).await {
        Ok(true) => info!(%submission_id, "Discarded upload per retention policy"),
        Ok(false) => {}
        Err(e) => warn!(%submission_id, "Upload retention failed: {e}"),
    }

    let (verdict, record) = result?;

    Ok(IntakeOutcome {
        submission_id,
        verdict,
        record,
    })
}

async fn evaluate(
    state: &AppState,
    form: &ApplicationForm,
    file: &UploadedFile,
    document: &UploadedDocument,
) -> Result<(MatchVerdict, Option<CvRecord>), AppError> {
    let pdf_text = state.extractor.extract(file.data.clone()).await?;
    info!("Extracted {} characters of CV text", pdf_text.chars().count());

    let verdict = state
        .matcher
        .compare(&MatchRequest::new(form, &pdf_text))
        .await?;
    info!(
        "Matcher verdict {:?} (upstream status {}): '{}'",
        verdict.outcome, verdict.upstream_status, verdict.message
    );

    if !verdict.is_match() {
        return Ok((verdict, None));
    }

    let record = state
        .store
        .insert(NewCvRecord::from_form(
            form,
            document.storage_path.display().to_string(),
        ))
        .await?;

    Ok((verdict, Some(record)))
}
