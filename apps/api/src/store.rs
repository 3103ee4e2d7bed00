//! Persistence sink for accepted applications.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::cv_record::{CvRecord, NewCvRecord};

/// Append-only store of accepted applications. No deduplication: every
/// insert creates a new row.
///
/// Carried in `AppState` as `Arc<dyn CvStore>`.
#[async_trait]
pub trait CvStore: Send + Sync {
    async fn insert(&self, record: NewCvRecord) -> Result<CvRecord, AppError>;
}

pub struct PgCvStore {
    pool: PgPool,
}

impl PgCvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CvStore for PgCvStore {
    async fn insert(&self, record: NewCvRecord) -> Result<CvRecord, AppError> {
        let row = sqlx::query_as::<_, CvRecord>(
            r#"
            INSERT INTO cv_records
                (full_name, email, phone, skills, experience, pdf_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, email, phone, skills, experience, pdf_path, created_at
            "#,
        )
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.skills)
        .bind(&record.experience)
        .bind(&record.pdf_path)
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted cv record {} for '{}'", row.id, row.full_name);
        Ok(row)
    }
}
