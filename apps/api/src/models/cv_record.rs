use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::intake::form::ApplicationForm;

/// An accepted application, as stored in `cv_records`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CvRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub pdf_path: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. Optional fields are `None` when the form left them empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCvRecord {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<String>,
    pub experience: Option<String>,
    pub pdf_path: String,
}

impl NewCvRecord {
    pub fn from_form(form: &ApplicationForm, pdf_path: impl Into<String>) -> Self {
        Self {
            full_name: form.full_name.clone(),
            email: non_empty(&form.email),
            phone: non_empty(&form.phone),
            skills: non_empty(&form.skills),
            experience: non_empty(&form.experience),
            pdf_path: pdf_path.into(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
