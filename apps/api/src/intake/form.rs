//! Multipart decoding and the validation stage that runs before any I/O.

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// Name of the multipart part carrying the PDF.
pub const CV_FIELD: &str = "cv";

/// Applicant metadata. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationForm {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub skills: String,
    pub experience: String,
}

/// The `cv` part, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Everything read from the request, before validation.
#[derive(Debug, Default)]
pub struct Submission {
    pub form: ApplicationForm,
    pub file: Option<UploadedFile>,
}

#[derive(Default)]
struct FieldSlots {
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    skills: Option<String>,
    experience: Option<String>,
}

impl FieldSlots {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "fullName" => Some(&mut self.full_name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "skills" => Some(&mut self.skills),
            "experience" => Some(&mut self.experience),
            _ => None,
        }
    }

    fn into_form(self) -> ApplicationForm {
        ApplicationForm {
            full_name: self.full_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            skills: self.skills.unwrap_or_default(),
            experience: self.experience.unwrap_or_default(),
        }
    }
}

/// Reads every part of the request. A repeated field keeps its first value;
/// unknown parts are skipped.
pub async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut slots = FieldSlots::default();
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        if name == CV_FIELD {
            if file.is_some() {
                continue;
            }
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;

            // Browsers send an empty unnamed part when no file was chosen.
            if file_name.is_empty() && data.is_empty() {
                continue;
            }

            file = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
            continue;
        }

        if let Some(slot) = slots.slot(&name) {
            if slot.is_none() {
                *slot = Some(field.text().await?);
            }
        }
    }

    Ok(Submission {
        form: slots.into_form(),
        file,
    })
}

/// Rejects submissions the pipeline cannot work with. Content is not
/// inspected here: an unreadable document fails later, in extraction.
pub fn validate(
    submission: Submission,
    max_upload_bytes: usize,
) -> Result<(ApplicationForm, UploadedFile), AppError> {
    let Submission { form, file } = submission;

    let file = file.ok_or(AppError::MissingFile)?;

    if file.data.len() > max_upload_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "cv file is {} bytes, limit is {max_upload_bytes}",
            file.data.len()
        )));
    }

    Ok((form, file))
}
