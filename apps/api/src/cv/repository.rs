//! CV persistence: the collaborator the wizard hands finished forms to.
//!
//! `AppState` holds an `Arc<dyn CvRepository>`; production uses
//! `PgCvRepository`, tests swap in an in-memory double.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cv::render::render_cv_to_md;
use crate::errors::AppError;
use crate::models::cv::CvRow;
use crate::wizard::form_data::CvFormData;

/// A complete form handed over for storage.
#[derive(Debug, Clone)]
pub struct CvSubmission {
    /// `None` for anonymous users; the repository mints an id.
    pub user_id: Option<Uuid>,
    /// Set when an existing CV is being edited.
    pub cv_id: Option<Uuid>,
    pub data: CvFormData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub cv_id: Uuid,
    /// Correlation id the wizard keeps as its `userId`.
    pub user_id: Uuid,
}

#[async_trait]
pub trait CvRepository: Send + Sync {
    async fn save(&self, submission: CvSubmission) -> Result<SubmitReceipt, AppError>;
    async fn fetch(&self, cv_id: Uuid) -> Result<Option<CvRow>, AppError>;
}

pub struct PgCvRepository {
    pool: PgPool,
    s3: aws_sdk_s3::Client,
    s3_bucket: String,
}

impl PgCvRepository {
    pub fn new(pool: PgPool, s3: aws_sdk_s3::Client, s3_bucket: String) -> Self {
        PgCvRepository {
            pool,
            s3,
            s3_bucket,
        }
    }

    async fn upload_snapshot(&self, key: &str, data: &CvFormData) -> Result<(), AppError> {
        let md = render_cv_to_md(data);
        self.s3
            .put_object()
            .bucket(&self.s3_bucket)
            .key(key)
            .body(ByteStream::from(md.into_bytes()))
            .content_type("text/markdown")
            .send()
            .await
            .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;
        info!("Uploaded CV snapshot to s3://{}/{}", self.s3_bucket, key);
        Ok(())
    }
}

#[async_trait]
impl CvRepository for PgCvRepository {
    async fn save(&self, submission: CvSubmission) -> Result<SubmitReceipt, AppError> {
        let CvSubmission {
            user_id,
            cv_id,
            data,
        } = submission;

        let user_id = user_id.unwrap_or_else(|| {
            let anonymous = Uuid::new_v4();
            info!("Submitting CV for new anonymous user {anonymous}");
            anonymous
        });
        let json = serde_json::to_value(&data).map_err(anyhow::Error::from)?;

        // Row write and export bookkeeping commit together: a failure
        // anywhere before `commit` leaves no row behind, so a retry cannot
        // duplicate the CV.
        let mut tx = self.pool.begin().await?;

        let cv_id = match cv_id {
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE cvs SET data = $1, updated_at = now() WHERE id = $2 AND user_id = $3",
                )
                .bind(&json)
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(AppError::NotFound(format!("CV {id} not found")));
                }
                id
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query("INSERT INTO cvs (id, user_id, data) VALUES ($1, $2, $3)")
                    .bind(id)
                    .bind(user_id)
                    .bind(&json)
                    .execute(&mut *tx)
                    .await?;
                id
            }
        };

        // A failed export is logged and retried on the next save.
        let s3_key = snapshot_key(user_id, cv_id);
        match self.upload_snapshot(&s3_key, &data).await {
            Ok(()) => {
                sqlx::query("UPDATE cvs SET s3_key = $1 WHERE id = $2")
                    .bind(&s3_key)
                    .bind(cv_id)
                    .execute(&mut *tx)
                    .await?;
            }
            Err(e) => warn!("CV {cv_id} saved without export: {e}"),
        }

        tx.commit().await?;
        info!("Saved CV {cv_id} for user {user_id}");
        Ok(SubmitReceipt { cv_id, user_id })
    }

    async fn fetch(&self, cv_id: Uuid) -> Result<Option<CvRow>, AppError> {
        Ok(
            sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE id = $1")
                .bind(cv_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

/// Object key of the Markdown export of a CV.
pub fn snapshot_key(user_id: Uuid, cv_id: Uuid) -> String {
    format!("cvs/{user_id}/{cv_id}.md")
}

/// Decodes a stored row back into wizard form data.
pub fn form_data_of(row: &CvRow) -> Result<CvFormData, AppError> {
    serde_json::from_value(row.data.clone()).map_err(|e| {
        AppError::UnprocessableEntity(format!("CV {} has unreadable data: {e}", row.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(data: serde_json::Value) -> CvRow {
        CvRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            data,
            s3_key: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_data_of_decodes_stored_json() {
        let mut data = CvFormData::default();
        data.hobbies = vec!["fencing".into()];
        let stored = row(serde_json::to_value(&data).unwrap());
        assert_eq!(form_data_of(&stored).unwrap(), data);
    }

    #[test]
    fn test_form_data_of_rejects_wrong_shape() {
        let stored = row(serde_json::json!({ "hobbies": "not a list" }));
        assert!(matches!(
            form_data_of(&stored),
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[test]
    fn test_snapshot_key_is_scoped_by_user() {
        let user = Uuid::nil();
        let cv = Uuid::from_u128(7);
        assert_eq!(
            snapshot_key(user, cv),
            format!("cvs/{user}/{cv}.md")
        );
    }

    /// Repository against `TEST_DATABASE_URL` with an unreachable S3 endpoint.
    /// Skipped when no test database is configured.
    async fn offline_export_repo() -> Option<PgCvRepository> {
        use aws_sdk_s3::config::{retry::RetryConfig, BehaviorVersion, Credentials, Region};

        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = crate::db::create_pool(&url).await.unwrap();
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .endpoint_url("http://127.0.0.1:1")
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .build();
        Some(PgCvRepository::new(
            pool,
            aws_sdk_s3::Client::from_conf(s3_config),
            "cvs-test".to_string(),
        ))
    }

    async fn rows_of(repo: &PgCvRepository, user_id: Uuid) -> Vec<CvRow> {
        sqlx::query_as::<_, CvRow>("SELECT * FROM cvs WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&repo.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_failed_export_still_commits_one_row() {
        let Some(repo) = offline_export_repo().await else {
            return;
        };
        let user_id = Uuid::new_v4();
        let receipt = repo
            .save(CvSubmission {
                user_id: Some(user_id),
                cv_id: None,
                data: CvFormData::default(),
            })
            .await
            .unwrap();

        let rows = rows_of(&repo, user_id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, receipt.cv_id);
        assert_eq!(rows[0].s3_key, None);
    }

    #[tokio::test]
    async fn test_rejected_edit_leaves_no_row() {
        let Some(repo) = offline_export_repo().await else {
            return;
        };
        let user_id = Uuid::new_v4();
        let result = repo
            .save(CvSubmission {
                user_id: Some(user_id),
                cv_id: Some(Uuid::new_v4()),
                data: CvFormData::default(),
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(rows_of(&repo, user_id).await.is_empty());
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = SubmitReceipt {
            cv_id: Uuid::nil(),
            user_id: Uuid::nil(),
        };
        let value = serde_json::to_value(receipt).unwrap();
        assert!(value.get("cvId").is_some());
        assert!(value.get("userId").is_some());
    }
}
